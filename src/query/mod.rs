//! Async query cache for data fetching, inspired by TanStack Query.
//!
//! A `QueryClient<T>` caches one value per `QueryKey` and provides:
//! - cache-first reads that return immediately, even while loading
//! - stale-while-revalidate refreshes after `stale_time`
//! - interval polling for subscribed keys, coalesced per key
//! - bounded retry with exponential backoff
//! - a fixed fallback dataset whenever nothing was fetched successfully
//! - garbage collection of entries nobody observes
//!
//! # Example
//!
//! ```ignore
//! let client = QueryClient::new(QueryOptions::default(), default_projects());
//! let api = metro_api.clone();
//! let result = client
//!   .fetch(&MetroQueryKey::all_projects(), move || {
//!     let api = api.clone();
//!     async move { api.projects(None).await }
//!   })
//!   .await;
//!
//! render(&result.data);
//! if let Some(err) = &result.error {
//!   tracing::warn!(error = %err, "showing fallback data");
//! }
//! ```

mod client;
mod key;
mod options;
mod state;

pub use client::{QueryClient, QuerySubscription};
pub use key::{hash_key, QueryKey};
pub use options::QueryOptions;
pub use state::{DataSource, QueryResult, QueryStatus};
