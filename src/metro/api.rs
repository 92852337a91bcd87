//! Metro API endpoints over a `Gateway`.

use serde::Deserialize;
use url::form_urlencoded;

use super::types::{ApiResponse, MetroProject};
use crate::gateway::{FetchError, Gateway};

/// Project lists come back either bare or wrapped in an `ApiResponse`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectsPayload {
  Bare(Vec<MetroProject>),
  Envelope(ApiResponse<Vec<MetroProject>>),
}

/// Typed access to the metro API.
#[derive(Clone, Debug)]
pub struct MetroApi<G: Gateway> {
  gateway: G,
}

impl<G: Gateway> MetroApi<G> {
  pub fn new(gateway: G) -> Self {
    Self { gateway }
  }

  pub fn gateway(&self) -> &G {
    &self.gateway
  }

  /// Fetch projects, optionally scoped to one city.
  pub async fn projects(&self, city: Option<&str>) -> Result<Vec<MetroProject>, FetchError> {
    let path = projects_path(city);
    match self.gateway.get::<ProjectsPayload>(&path).await? {
      ProjectsPayload::Bare(projects) => Ok(projects),
      ProjectsPayload::Envelope(response) if response.success => Ok(response.data),
      ProjectsPayload::Envelope(response) => Err(FetchError::Network(format!(
        "API reported failure: {}",
        response.error.as_deref().unwrap_or("unknown error")
      ))),
    }
  }
}

fn projects_path(city: Option<&str>) -> String {
  match city.map(str::trim).filter(|c| !c.is_empty()) {
    Some(city) => {
      let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("city", city)
        .finish();
      format!("/projects?{}", query)
    }
    None => "/projects".to_string(),
  }
}

#[cfg(test)]
pub(crate) mod testing {
  //! Scripted gateway shared by the metro tests.

  use std::collections::VecDeque;
  use std::sync::{Arc, Mutex};

  use serde::de::DeserializeOwned;
  use serde_json::Value;

  use crate::gateway::{FetchError, Gateway};

  #[derive(Clone, Default)]
  pub struct ScriptedGateway {
    responses: Arc<Mutex<VecDeque<Result<Value, FetchError>>>>,
    paths: Arc<Mutex<Vec<String>>>,
  }

  impl ScriptedGateway {
    pub fn push(&self, response: Result<Value, FetchError>) {
      self.responses.lock().unwrap().push_back(response);
    }

    pub fn paths(&self) -> Vec<String> {
      self.paths.lock().unwrap().clone()
    }
  }

  impl Gateway for ScriptedGateway {
    async fn get<T>(&self, path: &str) -> Result<T, FetchError>
    where
      T: DeserializeOwned + Send + 'static,
    {
      self.paths.lock().unwrap().push(path.to_string());
      let next = self
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(FetchError::Network("connection refused".into())));
      Ok(serde_json::from_value(next?)?)
    }
  }
}
