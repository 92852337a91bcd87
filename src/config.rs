use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::query::QueryOptions;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "METRODASH_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub query: QueryConfig,
  pub storage: StorageConfig,
  /// City shown when no preference has been saved yet
  pub default_city: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout_secs: u64,
  /// Extra headers sent with every request (e.g. an API key)
  pub headers: BTreeMap<String, String>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:3000/api".to_string(),
      timeout_secs: 10,
      headers: BTreeMap::new(),
    }
  }
}

/// Cache tuning, in whole seconds except for the retry delay.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
  pub stale_secs: u64,
  pub gc_secs: u64,
  /// 0 disables background polling
  pub interval_secs: u64,
  pub max_retries: u32,
  pub retry_delay_ms: u64,
}

impl Default for QueryConfig {
  fn default() -> Self {
    let options = QueryOptions::default();
    Self {
      stale_secs: options.stale_time.as_secs(),
      gc_secs: options.gc_time.as_secs(),
      interval_secs: options.refetch_interval.map_or(0, |d| d.as_secs()),
      max_retries: options.max_retries,
      retry_delay_ms: options.retry_delay.as_millis() as u64,
    }
  }
}

impl From<&QueryConfig> for QueryOptions {
  fn from(config: &QueryConfig) -> Self {
    let interval = (config.interval_secs > 0).then(|| Duration::from_secs(config.interval_secs));
    QueryOptions::default()
      .with_stale_time(Duration::from_secs(config.stale_secs))
      .with_gc_time(Duration::from_secs(config.gc_secs))
      .with_refetch_interval(interval)
      .with_max_retries(config.max_retries)
      .with_retry_delay(Duration::from_millis(config.retry_delay_ms))
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// Preference database path (defaults to $XDG_DATA_HOME/metrodash/preferences.db)
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./metrodash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/metrodash/config.yaml
  ///
  /// Without a file the defaults are used. `METRODASH_API_URL` wins over
  /// whatever the file says.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Some(url) = Self::api_url_override() {
      config.api.base_url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("metrodash.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("metrodash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  fn api_url_override() -> Option<String> {
    std::env::var(API_URL_ENV)
      .ok()
      .map(|url| url.trim().to_string())
      .filter(|url| !url.is_empty())
  }

  pub fn query_options(&self) -> QueryOptions {
    QueryOptions::from(&self.query)
  }

  pub fn default_city(&self) -> Option<&str> {
    self
      .default_city
      .as_deref()
      .map(str::trim)
      .filter(|c| !c.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config = Config::parse(
      r#"
api:
  base_url: https://metro.example.com/api
  headers:
    x-api-key: secret
query:
  max_retries: 5
  interval_secs: 0
default_city: Riyadh
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://metro.example.com/api");
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.api.headers.get("x-api-key").map(String::as_str), Some("secret"));
    assert_eq!(config.default_city(), Some("Riyadh"));
    assert!(config.storage.path.is_none());

    let options = config.query_options();
    assert_eq!(options.max_retries, 5);
    assert_eq!(options.refetch_interval, None);
    assert_eq!(options.stale_time, Duration::from_secs(300));
  }

  #[test]
  fn test_default_query_config_matches_query_options() {
    assert_eq!(Config::default().query_options(), QueryOptions::default());
  }

  #[test]
  fn test_empty_file_is_all_defaults() {
    let config = Config::parse("   \n").unwrap();
    assert_eq!(config.api.base_url, ApiConfig::default().base_url);
    assert_eq!(config.default_city(), None);
  }

  #[test]
  fn test_load_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "storage:\n  path: /tmp/metrodash-test.db").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(
      config.storage.path.as_deref(),
      Some(Path::new("/tmp/metrodash-test.db"))
    );
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let result = Config::load(Some(Path::new("/nonexistent/metrodash.yaml")));
    assert!(result.is_err());
  }

  #[test]
  fn test_invalid_yaml_is_an_error() {
    assert!(Config::parse("api: [unclosed").is_err());
  }
}
