//! Everything the dashboard needs, wired from one `Config`.

use std::sync::Arc;

use color_eyre::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::gateway::{Gateway, HttpGateway};
use crate::metro::{CachedMetroClient, MetroApi, NetworkSummary, Projects};
use crate::query::{QueryResult, QuerySubscription};
use crate::store::{
  FiltersState, FiltersStore, LayoutStore, PreferenceStorage, SqliteStorage, UiState, UiStore,
};

pub struct Dashboard<G: Gateway = HttpGateway> {
  config: Config,
  metro: CachedMetroClient<G>,
  layout: LayoutStore,
  filters: FiltersStore,
  ui: UiStore,
}

impl Dashboard<HttpGateway> {
  /// Connect to the configured API and open the preference database.
  pub fn open(config: Config) -> Result<Self> {
    let gateway = HttpGateway::new(&config.api)?;
    let storage = match &config.storage.path {
      Some(path) => SqliteStorage::open(path)?,
      None => SqliteStorage::open_default()?,
    };
    info!(base_url = %gateway.base_url(), "dashboard ready");
    Ok(Self::with_parts(config, gateway, Arc::new(storage)))
  }
}

impl<G: Gateway> Dashboard<G> {
  pub fn with_parts(config: Config, gateway: G, storage: Arc<dyn PreferenceStorage>) -> Self {
    let metro = CachedMetroClient::new(MetroApi::new(gateway), config.query_options());

    let mut initial_ui = UiState::default();
    if let Some(city) = config.default_city() {
      initial_ui.selected_city = city.to_string();
    }

    Self {
      layout: LayoutStore::load(storage.clone()),
      filters: FiltersStore::new(FiltersState::default()),
      ui: UiStore::load_or(storage, initial_ui),
      metro,
      config,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn metro(&self) -> &CachedMetroClient<G> {
    &self.metro
  }

  pub fn layout(&self) -> &LayoutStore {
    &self.layout
  }

  pub fn filters(&self) -> &FiltersStore {
    &self.filters
  }

  pub fn ui(&self) -> &UiStore {
    &self.ui
  }

  pub fn selected_city(&self) -> String {
    self.ui.with_state(|ui| ui.selected_city.clone())
  }

  /// Projects for the selected city, waiting for a due fetch to settle.
  pub async fn city_projects(&self) -> QueryResult<Projects> {
    let city = self.selected_city();
    debug!(city = %city, "loading city projects");
    self.metro.fetch_metro_stats(Some(&city)).await
  }

  /// Live view of the selected city's projects.
  pub fn watch_city_projects(&self) -> QuerySubscription<Projects> {
    let city = self.selected_city();
    self.metro.subscribe_metro_stats(Some(&city))
  }

  pub async fn network_summary(&self) -> NetworkSummary {
    let result = self.metro.fetch_all_projects().await;
    NetworkSummary::from_projects(&result.data)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::gateway::FetchError;
  use crate::metro::testing::ScriptedGateway;
  use crate::query::DataSource;
  use crate::store::MemoryStorage;
  use serde_json::json;

  fn config(default_city: Option<&str>) -> Config {
    let mut config = Config::default();
    config.default_city = default_city.map(String::from);
    config.query.max_retries = 0;
    config.query.retry_delay_ms = 10;
    config
  }

  #[tokio::test(start_paused = true)]
  async fn test_default_city_seeds_fresh_preferences() {
    let gateway = ScriptedGateway::default();
    gateway.push(Ok(json!([])));
    let dashboard = Dashboard::with_parts(
      config(Some("Shanghai")),
      gateway.clone(),
      Arc::new(MemoryStorage::new()),
    );

    assert_eq!(dashboard.selected_city(), "Shanghai");
    let result = dashboard.city_projects().await;
    assert!(result.is_success());
    assert_eq!(gateway.paths(), vec!["/projects?city=Shanghai"]);
  }

  #[tokio::test]
  async fn test_saved_city_wins_over_config() {
    let storage: Arc<dyn PreferenceStorage> = Arc::new(MemoryStorage::new());
    let first = Dashboard::with_parts(config(None), ScriptedGateway::default(), storage.clone());
    first.ui().set_selected_city("Riyadh");
    drop(first);

    let second = Dashboard::with_parts(config(Some("Shanghai")), ScriptedGateway::default(), storage);
    assert_eq!(second.selected_city(), "Riyadh");
  }

  #[tokio::test(start_paused = true)]
  async fn test_summary_falls_back_when_api_is_down() {
    let gateway = ScriptedGateway::default();
    gateway.push(Err(FetchError::Network("connection refused".into())));
    let dashboard = Dashboard::with_parts(config(None), gateway, Arc::new(MemoryStorage::new()));

    let summary = dashboard.network_summary().await;
    assert_eq!(summary.projects, 3);
    assert_eq!(summary.stations, 882);

    let cached = dashboard.metro().all_projects();
    assert_eq!(cached.source, DataSource::Fallback);
  }
}
