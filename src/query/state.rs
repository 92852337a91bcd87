//! Observable query state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::gateway::FetchError;

/// Lifecycle of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Nothing fetched yet and nothing in flight
  Idle,
  /// First fetch in progress, no data yet
  Loading,
  /// Last settled fetch succeeded
  Success,
  /// Last settled fetch failed after all retries; earlier data is kept
  Error,
}

/// Where the data in a `QueryResult` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
  /// Fetched within the stale time
  Fresh,
  /// Older than the stale time; a refresh may be in flight
  Stale,
  /// Nothing was ever fetched successfully, serving the built-in dataset
  Fallback,
}

/// Snapshot of one query as seen by a caller.
///
/// `data` is always populated: live, cached, or the fallback dataset.
#[derive(Debug)]
pub struct QueryResult<T> {
  pub data: Arc<T>,
  pub source: DataSource,
  pub status: QueryStatus,
  pub error: Option<FetchError>,
  /// When the data was fetched (None for fallback data)
  pub updated_at: Option<DateTime<Utc>>,
  /// A fetch for this key is in flight
  pub is_fetching: bool,
}

impl<T> Clone for QueryResult<T> {
  fn clone(&self) -> Self {
    Self {
      data: Arc::clone(&self.data),
      source: self.source,
      status: self.status,
      error: self.error.clone(),
      updated_at: self.updated_at,
      is_fetching: self.is_fetching,
    }
  }
}

impl<T> QueryResult<T> {
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn is_fallback(&self) -> bool {
    self.source == DataSource::Fallback
  }

  pub fn is_stale(&self) -> bool {
    self.source != DataSource::Fresh
  }
}
