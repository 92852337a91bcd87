//! Query keys for metro API calls.

use crate::query::{hash_key, QueryKey};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetroQueryKey {
  /// Projects for the stats panel, optionally scoped to one city
  MetroStats { city: Option<String> },
  /// Every known project
  AllProjects,
}

impl MetroQueryKey {
  pub fn metro_stats(city: Option<&str>) -> Self {
    Self::MetroStats {
      city: city.map(String::from),
    }
  }

  pub fn all_projects() -> Self {
    Self::AllProjects
  }
}

impl QueryKey for MetroQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::MetroStats { city } => format!(
        "metroStats:{}",
        city.as_deref().map(normalize_city).unwrap_or_default()
      ),
      Self::AllProjects => "allProjects".to_string(),
    };
    hash_key(&input)
  }

  fn description(&self) -> String {
    match self {
      Self::MetroStats { city: Some(city) } => format!("metro stats for {}", city),
      Self::MetroStats { city: None } => "metro stats".to_string(),
      Self::AllProjects => "all projects".to_string(),
    }
  }
}

/// Normalize a city name for consistent hashing.
/// Trims whitespace and lowercases for case-insensitive matching.
fn normalize_city(city: &str) -> String {
  city.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_structurally_equal_keys_collide() {
    let a = MetroQueryKey::metro_stats(Some("Delhi"));
    let b = MetroQueryKey::metro_stats(Some(" delhi "));
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_distinct_keys_do_not_collide() {
    let delhi = MetroQueryKey::metro_stats(Some("Delhi")).cache_hash();
    let riyadh = MetroQueryKey::metro_stats(Some("Riyadh")).cache_hash();
    let unscoped = MetroQueryKey::metro_stats(None).cache_hash();
    let all = MetroQueryKey::all_projects().cache_hash();
    assert_ne!(delhi, riyadh);
    assert_ne!(delhi, unscoped);
    assert_ne!(unscoped, all);
  }
}
