use std::future::Future;
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::FetchError;
use crate::config::ApiConfig;

/// Read-only access to the metro data API.
pub trait Gateway: Clone + Send + Sync + 'static {
  /// GET `path` (relative to the gateway's base URL) and decode the JSON body.
  fn get<T>(&self, path: &str) -> impl Future<Output = Result<T, FetchError>> + Send
  where
    T: DeserializeOwned + Send + 'static;
}

/// reqwest-backed gateway.
/// Clone is cheap - reqwest::Client shares its connection pool.
#[derive(Clone, Debug)]
pub struct HttpGateway {
  client: Client,
  base_url: Url,
}

impl HttpGateway {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(config.base_url.trim_end_matches('/'))
      .map_err(|e| eyre!("Invalid API base URL '{}': {}", config.base_url, e))?;

    let mut headers = HeaderMap::new();
    for (key, value) in &config.headers {
      let name = HeaderName::from_bytes(key.as_bytes())
        .map_err(|e| eyre!("Invalid header name '{}': {}", key, e))?;
      let value = HeaderValue::from_str(value)
        .map_err(|e| eyre!("Invalid value for header '{}': {}", key, e))?;
      headers.insert(name, value);
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Resolve `path` against the base URL, keeping any path prefix the base has.
  fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
    let joined = format!(
      "{}/{}",
      self.base_url.as_str().trim_end_matches('/'),
      path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| FetchError::Network(format!("Invalid URL {joined}: {e}")))
  }
}

impl Gateway for HttpGateway {
  async fn get<T>(&self, path: &str) -> Result<T, FetchError>
  where
    T: DeserializeOwned + Send + 'static,
  {
    let url = self.endpoint(path)?;
    debug!(%url, "GET");

    let response = self
      .client
      .get(url)
      .header(header::ACCEPT, "application/json")
      .send()
      .await?;

    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
      return Err(FetchError::from_status(
        status.as_u16(),
        &String::from_utf8_lossy(&body),
      ));
    }

    Ok(serde_json::from_slice(&body)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gateway(base_url: &str) -> HttpGateway {
    HttpGateway::new(&ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: 5,
      ..Default::default()
    })
    .unwrap()
  }

  #[test]
  fn test_endpoint_keeps_base_path_prefix() {
    let gw = gateway("https://metro.example.com/api/");
    let url = gw.endpoint("/projects?city=Delhi").unwrap();
    assert_eq!(url.as_str(), "https://metro.example.com/api/projects?city=Delhi");
  }

  #[test]
  fn test_invalid_base_url_is_rejected() {
    let result = HttpGateway::new(&ApiConfig {
      base_url: "not a url".to_string(),
      timeout_secs: 5,
      ..Default::default()
    });
    assert!(result.is_err());
  }

  #[test]
  fn test_invalid_header_is_rejected() {
    let mut config = ApiConfig::default();
    config.headers.insert("bad header".into(), "x".into());
    assert!(HttpGateway::new(&config).is_err());
  }

  #[tokio::test]
  async fn test_unreachable_host_is_network_error() {
    // Port 9 (discard) on localhost is closed in test environments
    let gw = gateway("http://127.0.0.1:9");
    let err = gw.get::<Vec<u32>>("/projects").await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
  }
}
