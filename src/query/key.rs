//! Query identity.

use sha2::{Digest, Sha256};

/// Identifies one independently cached value.
///
/// Structurally equal keys must produce the same `cache_hash`, so
/// implementors hash a normalized textual form rather than relying on
/// pointer or insertion identity.
pub trait QueryKey {
  /// Stable, fixed-length cache key
  fn cache_hash(&self) -> String;

  /// Human-readable description for logs
  fn description(&self) -> String;
}

/// SHA256 of `input`, hex-encoded.
pub fn hash_key(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  hex::encode(hasher.finalize())
}

impl QueryKey for str {
  fn cache_hash(&self) -> String {
    hash_key(self)
  }

  fn description(&self) -> String {
    self.to_string()
  }
}

impl QueryKey for String {
  fn cache_hash(&self) -> String {
    self.as_str().cache_hash()
  }

  fn description(&self) -> String {
    self.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_equal_strings_collide() {
    assert_eq!("metroStats:delhi".cache_hash(), String::from("metroStats:delhi").cache_hash());
    assert_ne!("metroStats:delhi".cache_hash(), "metroStats:riyadh".cache_hash());
  }

  #[test]
  fn test_hash_is_fixed_length_hex() {
    let hash = hash_key("allProjects");
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
  }
}
