//! Query client: cache-first fetching with background refresh and fallback data.
//!
//! Each key owns one cache entry. A read returns whatever the entry holds
//! right away (live data, stale data, or the client's fallback dataset) and
//! starts a fetch in a spawned task when the entry is missing or stale.
//! Results are applied under the entry's sequence rules and broadcast on a
//! watch channel to every subscription.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::key::QueryKey;
use super::options::QueryOptions;
use super::state::{DataSource, QueryResult, QueryStatus};
use crate::gateway::FetchError;

/// A factory for fetch futures, re-invoked on every refresh
type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync>;

struct QueryEntry<T> {
  description: String,
  fetcher: Fetcher<T>,
  data: Option<Arc<T>>,
  /// Wall-clock time of the last successful fetch
  fetched_at: Option<DateTime<Utc>>,
  /// When `data` arrived
  data_at: Option<Instant>,
  /// When the last fetch settled, successfully or not
  settled_at: Option<Instant>,
  status: QueryStatus,
  error: Option<FetchError>,
  /// Sequence number of the most recently issued fetch
  issued: u64,
  /// Sequence number of the most recently applied fetch
  applied: u64,
  /// Fetches numbered at or below this are dropped on arrival
  discard_through: u64,
  in_flight: bool,
  observers: usize,
  inactive_since: Option<Instant>,
  gc_scheduled: bool,
  poller: Option<JoinHandle<()>>,
  notify: watch::Sender<QueryResult<T>>,
}

/// A fetch that has been issued but not yet spawned.
struct FetchJob<T> {
  hash: String,
  description: String,
  seq: u64,
  fetcher: Fetcher<T>,
}

enum Eviction {
  Done,
  Wait(std::time::Duration),
}

struct Inner<T> {
  entries: Mutex<HashMap<String, QueryEntry<T>>>,
  options: QueryOptions,
  fallback: Arc<T>,
}

impl<T> Inner<T> {
  fn lock(&self) -> MutexGuard<'_, HashMap<String, QueryEntry<T>>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn idle_result(&self) -> QueryResult<T> {
    QueryResult {
      data: Arc::clone(&self.fallback),
      source: DataSource::Fallback,
      status: QueryStatus::Idle,
      error: None,
      updated_at: None,
      is_fetching: false,
    }
  }

  fn snapshot(&self, entry: &QueryEntry<T>) -> QueryResult<T> {
    let (data, source) = match &entry.data {
      Some(data) => {
        let fresh = entry
          .data_at
          .is_some_and(|at| at.elapsed() < self.options.stale_time);
        let source = if fresh {
          DataSource::Fresh
        } else {
          DataSource::Stale
        };
        (Arc::clone(data), source)
      }
      None => (Arc::clone(&self.fallback), DataSource::Fallback),
    };

    QueryResult {
      data,
      source,
      status: entry.status,
      error: entry.error.clone(),
      updated_at: entry.fetched_at,
      is_fetching: entry.in_flight,
    }
  }

  fn publish(&self, entry: &QueryEntry<T>) {
    entry.notify.send_replace(self.snapshot(entry));
  }

  fn needs_fetch(&self, entry: &QueryEntry<T>) -> bool {
    !entry.in_flight
      && entry
        .settled_at
        .map_or(true, |at| at.elapsed() >= self.options.stale_time)
  }

  fn begin_fetch(&self, hash: &str, entry: &mut QueryEntry<T>) -> FetchJob<T> {
    entry.issued += 1;
    entry.in_flight = true;
    if entry.status == QueryStatus::Idle {
      entry.status = QueryStatus::Loading;
    }
    debug!(query = %entry.description, seq = entry.issued, "starting fetch");

    FetchJob {
      hash: hash.to_string(),
      description: entry.description.clone(),
      seq: entry.issued,
      fetcher: Arc::clone(&entry.fetcher),
    }
  }

  /// Apply the outcome of fetch `seq`, unless something newer already landed
  /// or the fetch was abandoned.
  fn settle(&self, hash: &str, seq: u64, outcome: Result<T, FetchError>) {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(hash) else {
      debug!(seq, "entry evicted before fetch settled, dropping result");
      return;
    };

    if seq == entry.issued {
      entry.in_flight = false;
    }

    if seq <= entry.discard_through || seq <= entry.applied {
      debug!(
        query = %entry.description,
        seq,
        applied = entry.applied,
        "discarding superseded fetch result"
      );
      self.publish(entry);
      return;
    }

    entry.applied = seq;
    entry.settled_at = Some(Instant::now());

    match outcome {
      Ok(data) => {
        entry.data = Some(Arc::new(data));
        entry.data_at = entry.settled_at;
        entry.fetched_at = Some(Utc::now());
        entry.status = QueryStatus::Success;
        entry.error = None;
        debug!(query = %entry.description, seq, "fetch succeeded");
      }
      Err(err) => {
        let serving = if entry.data.is_some() {
          "cached data"
        } else {
          "fallback data"
        };
        warn!(query = %entry.description, error = %err, serving, "query failed");
        entry.status = QueryStatus::Error;
        entry.error = Some(err);
      }
    }

    self.publish(entry);
  }

  fn try_evict(&self, hash: &str) -> Eviction {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(hash) else {
      return Eviction::Done;
    };

    let inactive_since = match (entry.observers, entry.inactive_since) {
      (0, Some(since)) => since,
      _ => {
        entry.gc_scheduled = false;
        return Eviction::Done;
      }
    };

    let idle = inactive_since.elapsed();
    if idle < self.options.gc_time {
      return Eviction::Wait(self.options.gc_time - idle);
    }

    debug!(query = %entry.description, "evicting unused query");
    entries.remove(hash);
    Eviction::Done
  }
}

/// Cache of async query results keyed by `QueryKey`.
///
/// Every key of one client shares the same `QueryOptions` and fallback
/// dataset. Clone is cheap and shares the cache.
pub struct QueryClient<T> {
  inner: Arc<Inner<T>>,
}

impl<T> Clone for QueryClient<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<T: Send + Sync + 'static> QueryClient<T> {
  /// Create a client serving `fallback` whenever a key has no fetched data.
  pub fn new(options: QueryOptions, fallback: T) -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        options,
        fallback: Arc::new(fallback),
      }),
    }
  }

  pub fn options(&self) -> &QueryOptions {
    &self.inner.options
  }

  pub fn fallback(&self) -> Arc<T> {
    Arc::clone(&self.inner.fallback)
  }

  /// Read a query, starting a fetch if the entry is missing or stale.
  ///
  /// Never blocks and never fails: the result carries fallback data until a
  /// fetch succeeds. Must be called from within a tokio runtime.
  pub fn query<K, F, Fut>(&self, key: &K, fetcher: F) -> QueryResult<T>
  where
    K: QueryKey + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    self.acquire(key, fetcher, false).1
  }

  /// Read a query and wait for any fetch it started (or joined) to settle.
  pub async fn fetch<K, F, Fut>(&self, key: &K, fetcher: F) -> QueryResult<T>
  where
    K: QueryKey + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    let (_, result, mut receiver) = self.acquire(key, fetcher, false);
    if !result.is_fetching {
      return result;
    }

    let settled = match receiver.wait_for(|r| !r.is_fetching).await {
      Ok(settled) => QueryResult::clone(&settled),
      // Entry was evicted while we waited
      Err(_) => result,
    };
    settled
  }

  /// Observe a query: keeps the entry alive, polls it every
  /// `refetch_interval`, and notifies on every change until dropped.
  pub fn subscribe<K, F, Fut>(&self, key: &K, fetcher: F) -> QuerySubscription<T>
  where
    K: QueryKey + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    let (hash, _, receiver) = self.acquire(key, fetcher, true);
    QuerySubscription {
      client: self.clone(),
      hash,
      receiver,
    }
  }

  /// Force a new fetch for `key`, superseding any fetch in flight.
  ///
  /// Returns false if the key is not cached.
  pub fn refetch<K: QueryKey + ?Sized>(&self, key: &K) -> bool {
    self.refresh(&key.cache_hash(), true)
  }

  /// Mark `key` stale; observed keys refetch right away, others on next read.
  pub fn invalidate<K: QueryKey + ?Sized>(&self, key: &K) -> bool {
    let hash = key.cache_hash();
    let job = {
      let mut entries = self.inner.lock();
      let Some(entry) = entries.get_mut(&hash) else {
        return false;
      };
      entry.settled_at = None;
      entry.data_at = None;
      let job = (entry.observers > 0 && !entry.in_flight)
        .then(|| self.inner.begin_fetch(&hash, entry));
      self.inner.publish(entry);
      job
    };

    if let Some(job) = job {
      self.spawn_fetch(job);
    }
    true
  }

  /// Data last fetched for `key`, if any (never the fallback).
  pub fn get_query_data<K: QueryKey + ?Sized>(&self, key: &K) -> Option<Arc<T>> {
    let entries = self.inner.lock();
    entries.get(&key.cache_hash())?.data.clone()
  }

  pub fn contains<K: QueryKey + ?Sized>(&self, key: &K) -> bool {
    self.inner.lock().contains_key(&key.cache_hash())
  }

  pub fn len(&self) -> usize {
    self.inner.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Evict every unobserved entry idle for at least `gc_time`.
  pub fn garbage_collect(&self) -> usize {
    let gc_time = self.inner.options.gc_time;
    let mut entries = self.inner.lock();
    let before = entries.len();
    entries.retain(|_, entry| {
      entry.observers > 0
        || entry
          .inactive_since
          .map_or(true, |since| since.elapsed() < gc_time)
    });
    before - entries.len()
  }

  /// Look up or create the entry for `key`, register the caller, and start
  /// a fetch if one is due.
  fn acquire<K, F, Fut>(
    &self,
    key: &K,
    fetcher: F,
    observe: bool,
  ) -> (String, QueryResult<T>, watch::Receiver<QueryResult<T>>)
  where
    K: QueryKey + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    let hash = key.cache_hash();
    let fetcher: Fetcher<T> = Arc::new(move || fetcher().boxed());

    let mut entries = self.inner.lock();
    let entry = entries.entry(hash.clone()).or_insert_with(|| {
      debug!(query = %key.description(), "creating query entry");
      let (notify, _) = watch::channel(self.inner.idle_result());
      QueryEntry {
        description: key.description(),
        fetcher: Arc::clone(&fetcher),
        data: None,
        fetched_at: None,
        data_at: None,
        settled_at: None,
        status: QueryStatus::Idle,
        error: None,
        issued: 0,
        applied: 0,
        discard_through: 0,
        in_flight: false,
        observers: 0,
        inactive_since: None,
        gc_scheduled: false,
        poller: None,
        notify,
      }
    });
    // The latest closure wins, so refreshes see the caller's current captures
    entry.fetcher = fetcher;

    if observe {
      entry.observers += 1;
      entry.inactive_since = None;
      if entry.poller.is_none() {
        entry.poller = self.spawn_poller(&hash);
      }
    } else if entry.observers == 0 {
      entry.inactive_since = Some(Instant::now());
      if !entry.gc_scheduled {
        entry.gc_scheduled = self.spawn_gc(&hash);
      }
    }

    let job = self
      .inner
      .needs_fetch(entry)
      .then(|| self.inner.begin_fetch(&hash, entry));
    if job.is_some() {
      self.inner.publish(entry);
    }

    let result = self.inner.snapshot(entry);
    let receiver = entry.notify.subscribe();
    drop(entries);

    if let Some(job) = job {
      self.spawn_fetch(job);
    }
    (hash, result, receiver)
  }

  /// Start a fetch for an existing entry. Without `force`, a fetch already in
  /// flight absorbs the request. Returns false if the entry is gone.
  fn refresh(&self, hash: &str, force: bool) -> bool {
    let job = {
      let mut entries = self.inner.lock();
      let Some(entry) = entries.get_mut(hash) else {
        return false;
      };
      if entry.in_flight && !force {
        debug!(query = %entry.description, "fetch already in flight, coalescing");
        return true;
      }
      let job = self.inner.begin_fetch(hash, entry);
      self.inner.publish(entry);
      job
    };

    self.spawn_fetch(job);
    true
  }

  fn unsubscribe(&self, hash: &str) {
    let mut entries = self.inner.lock();
    let Some(entry) = entries.get_mut(hash) else {
      return;
    };

    entry.observers = entry.observers.saturating_sub(1);
    if entry.observers > 0 {
      return;
    }

    if let Some(poller) = entry.poller.take() {
      poller.abort();
    }

    if entry.in_flight {
      debug!(query = %entry.description, seq = entry.issued, "last observer left, abandoning fetch");
      entry.discard_through = entry.issued;
      entry.in_flight = false;
      if entry.status == QueryStatus::Loading {
        entry.status = QueryStatus::Idle;
      }
      self.inner.publish(entry);
    }

    entry.inactive_since = Some(Instant::now());
    if !entry.gc_scheduled {
      entry.gc_scheduled = self.spawn_gc(hash);
    }
  }

  fn spawn_fetch(&self, job: FetchJob<T>) {
    let inner = Arc::clone(&self.inner);
    tokio::spawn(async move {
      let outcome = fetch_with_retry(&job, &inner.options).await;
      inner.settle(&job.hash, job.seq, outcome);
    });
  }

  fn spawn_poller(&self, hash: &str) -> Option<JoinHandle<()>> {
    let period = self.inner.options.refetch_interval?;
    let Some(start) = Instant::now().checked_add(period) else {
      warn!(?period, "refetch interval out of range, polling disabled");
      return None;
    };
    let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
    let hash = hash.to_string();

    Some(tokio::spawn(async move {
      let mut ticker = tokio::time::interval_at(start, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
          break;
        };
        let client = QueryClient { inner };
        if !client.refresh(&hash, false) {
          break;
        }
      }
    }))
  }

  /// Schedule eviction of an unobserved entry. Returns false when no runtime
  /// is available (e.g. a subscription dropped after shutdown); the entry is
  /// then left for `garbage_collect`.
  fn spawn_gc(&self, hash: &str) -> bool {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
      return false;
    };
    let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
    let hash = hash.to_string();
    let mut delay = self.inner.options.gc_time;

    runtime.spawn(async move {
      loop {
        tokio::time::sleep(delay).await;
        let Some(inner) = weak.upgrade() else {
          return;
        };
        match inner.try_evict(&hash) {
          Eviction::Done => return,
          Eviction::Wait(remaining) => delay = remaining,
        }
      }
    });
    true
  }
}

/// Run the job's fetcher, retrying with backoff up to `max_retries` times.
async fn fetch_with_retry<T>(job: &FetchJob<T>, options: &QueryOptions) -> Result<T, FetchError> {
  let mut attempt = 0u32;
  loop {
    match (job.fetcher)().await {
      Ok(data) => return Ok(data),
      Err(err) if attempt < options.max_retries => {
        let delay = options.backoff(attempt);
        debug!(
          query = %job.description,
          attempt = attempt + 1,
          error = %err,
          ?delay,
          "fetch failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(err) => {
        return Err(FetchError::RetryExhausted {
          attempts: attempt + 1,
          last: Box::new(err),
        })
      }
    }
  }
}

/// An observer of one query. Dropping it unsubscribes.
pub struct QuerySubscription<T: Send + Sync + 'static> {
  client: QueryClient<T>,
  hash: String,
  receiver: watch::Receiver<QueryResult<T>>,
}

impl<T: Send + Sync + 'static> QuerySubscription<T> {
  /// Latest state of the query.
  pub fn current(&self) -> QueryResult<T> {
    QueryResult::clone(&self.receiver.borrow())
  }

  /// Wait for the next change. Returns None once the entry is gone.
  pub async fn changed(&mut self) -> Option<QueryResult<T>> {
    self.receiver.changed().await.ok()?;
    Some(QueryResult::clone(&self.receiver.borrow_and_update()))
  }

  /// Force a new fetch, superseding any fetch in flight.
  pub fn refetch(&self) -> bool {
    self.client.refresh(&self.hash, true)
  }
}

impl<T: Send + Sync + 'static> Drop for QuerySubscription<T> {
  fn drop(&mut self) {
    self.client.unsubscribe(&self.hash);
  }
}
