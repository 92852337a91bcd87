//! Cached metro client that wraps `MetroApi` with the query cache.

use futures::future::BoxFuture;
use futures::FutureExt;

use super::api::MetroApi;
use super::defaults::default_projects;
use super::keys::MetroQueryKey;
use super::types::MetroProject;
use crate::gateway::{FetchError, Gateway};
use crate::query::{QueryClient, QueryOptions, QueryResult, QuerySubscription};

pub type Projects = Vec<MetroProject>;

/// Metro client with transparent caching, background refresh and fallback
/// to the built-in project list.
#[derive(Clone)]
pub struct CachedMetroClient<G: Gateway> {
  api: MetroApi<G>,
  cache: QueryClient<Projects>,
}

impl<G: Gateway> CachedMetroClient<G> {
  pub fn new(api: MetroApi<G>, options: QueryOptions) -> Self {
    Self {
      api,
      cache: QueryClient::new(options, default_projects()),
    }
  }

  pub fn cache(&self) -> &QueryClient<Projects> {
    &self.cache
  }

  /// Current projects for `city` without waiting; starts a fetch if due.
  pub fn metro_stats(&self, city: Option<&str>) -> QueryResult<Projects> {
    let key = MetroQueryKey::metro_stats(city);
    self.cache.query(&key, self.projects_fetcher(city))
  }

  /// Projects for `city`, waiting for a due fetch to settle.
  pub async fn fetch_metro_stats(&self, city: Option<&str>) -> QueryResult<Projects> {
    let key = MetroQueryKey::metro_stats(city);
    self.cache.fetch(&key, self.projects_fetcher(city)).await
  }

  /// Keep `city`'s projects live until the subscription is dropped.
  pub fn subscribe_metro_stats(&self, city: Option<&str>) -> QuerySubscription<Projects> {
    let key = MetroQueryKey::metro_stats(city);
    self.cache.subscribe(&key, self.projects_fetcher(city))
  }

  pub fn all_projects(&self) -> QueryResult<Projects> {
    self
      .cache
      .query(&MetroQueryKey::all_projects(), self.projects_fetcher(None))
  }

  pub async fn fetch_all_projects(&self) -> QueryResult<Projects> {
    self
      .cache
      .fetch(&MetroQueryKey::all_projects(), self.projects_fetcher(None))
      .await
  }

  pub fn subscribe_all_projects(&self) -> QuerySubscription<Projects> {
    self
      .cache
      .subscribe(&MetroQueryKey::all_projects(), self.projects_fetcher(None))
  }

  fn projects_fetcher(
    &self,
    city: Option<&str>,
  ) -> impl Fn() -> BoxFuture<'static, Result<Projects, FetchError>> + Send + Sync + 'static {
    let api = self.api.clone();
    let city = city.map(String::from);
    move || {
      let api = api.clone();
      let city = city.clone();
      async move { api.projects(city.as_deref()).await }.boxed()
    }
  }
}
