use thiserror::Error;

/// Maximum length for response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors produced while fetching remote data.
///
/// Cloneable so the query cache can keep the last error on an entry and hand
/// copies to every observer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  #[error("Network error: {0}")]
  Network(String),

  #[error("Server returned status {status}: {body}")]
  Status { status: u16, body: String },

  #[error("Invalid response: {0}")]
  Parse(String),

  #[error("Gave up after {attempts} attempts: {last}")]
  RetryExhausted {
    attempts: u32,
    #[source]
    last: Box<FetchError>,
  },
}

impl FetchError {
  pub fn from_status(status: u16, body: &str) -> Self {
    FetchError::Status {
      status,
      body: truncate_body(body),
    }
  }

  /// The error that ended the last attempt, looking through `RetryExhausted`.
  pub fn root(&self) -> &FetchError {
    match self {
      FetchError::RetryExhausted { last, .. } => last.root(),
      other => other,
    }
  }

  pub fn is_parse(&self) -> bool {
    matches!(self.root(), FetchError::Parse(_))
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      FetchError::Parse(err.to_string())
    } else {
      FetchError::Network(err.to_string())
    }
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(err: serde_json::Error) -> Self {
    FetchError::Parse(err.to_string())
  }
}

fn truncate_body(body: &str) -> String {
  if body.len() <= MAX_ERROR_BODY_LENGTH {
    return body.to_string();
  }
  let mut end = MAX_ERROR_BODY_LENGTH;
  while !body.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_long_status_body_is_truncated() {
    let body = "x".repeat(2000);
    match FetchError::from_status(502, &body) {
      FetchError::Status { status, body } => {
        assert_eq!(status, 502);
        assert!(body.ends_with("(truncated, 2000 total bytes)"));
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn test_root_looks_through_retry_exhausted() {
    let err = FetchError::RetryExhausted {
      attempts: 3,
      last: Box::new(FetchError::Parse("expected array".into())),
    };
    assert!(err.is_parse());
    assert_eq!(err.root(), &FetchError::Parse("expected array".into()));
    assert!(err.to_string().starts_with("Gave up after 3 attempts"));
  }

  #[test]
  fn test_serde_error_maps_to_parse() {
    let err: FetchError = serde_json::from_str::<Vec<u32>>("{").unwrap_err().into();
    assert!(matches!(err, FetchError::Parse(_)));
  }
}
