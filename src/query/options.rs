use std::time::Duration;

/// Upper bound for a single retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Cache behavior shared by every key of a `QueryClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  /// How long fetched data counts as fresh
  pub stale_time: Duration,
  /// Background refresh period for subscribed keys (None disables polling)
  pub refetch_interval: Option<Duration>,
  /// Extra attempts after the first failure
  pub max_retries: u32,
  /// How long an unobserved entry survives before eviction
  pub gc_time: Duration,
  /// Base delay for exponential retry backoff
  pub retry_delay: Duration,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_secs(5 * 60),
      refetch_interval: Some(Duration::from_secs(60)),
      max_retries: 2,
      gc_time: Duration::from_secs(10 * 60),
      retry_delay: Duration::from_secs(1),
    }
  }
}

impl QueryOptions {
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn with_refetch_interval(mut self, interval: Option<Duration>) -> Self {
    self.refetch_interval = interval;
    self
  }

  pub fn with_max_retries(mut self, max_retries: u32) -> Self {
    self.max_retries = max_retries;
    self
  }

  pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
    self.gc_time = gc_time;
    self
  }

  pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
    self.retry_delay = retry_delay;
    self
  }

  /// Delay before retry number `attempt` (0-based): base * 2^attempt, capped.
  pub fn backoff(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    self
      .retry_delay
      .checked_mul(factor)
      .unwrap_or(MAX_RETRY_DELAY)
      .min(MAX_RETRY_DELAY)
  }
}
