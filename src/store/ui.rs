//! UI preferences.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use super::{Persist, Reducer, Store};

pub type UiStore = Store<UiState>;

const DEFAULT_CITY: &str = "Delhi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
  pub is_dark_mode: bool,
  pub selected_city: String,
  pub sidebar_open: bool,
  pub compact_mode: bool,
}

impl Default for UiState {
  fn default() -> Self {
    Self {
      is_dark_mode: true,
      selected_city: DEFAULT_CITY.to_string(),
      sidebar_open: true,
      compact_mode: false,
    }
  }
}

#[derive(Debug, Clone)]
pub enum UiAction {
  ToggleDarkMode,
  SetSelectedCity(String),
  ToggleSidebar,
  SetCompactMode(bool),
}

impl Reducer for UiState {
  type Action = UiAction;
  type Error = Infallible;

  fn reduce(&mut self, action: UiAction) -> Result<(), Infallible> {
    match action {
      UiAction::ToggleDarkMode => self.is_dark_mode = !self.is_dark_mode,
      UiAction::SetSelectedCity(city) => self.selected_city = city,
      UiAction::ToggleSidebar => self.sidebar_open = !self.sidebar_open,
      UiAction::SetCompactMode(compact) => self.compact_mode = compact,
    }
    Ok(())
  }
}

/// The persisted subset of `UiState`. Dark mode and the sidebar always
/// start from their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPreferences {
  pub selected_city: String,
  pub compact_mode: bool,
}

impl Persist for UiState {
  const STORAGE_KEY: &'static str = "ui-store";
  type Snapshot = UiPreferences;

  fn snapshot(&self) -> UiPreferences {
    UiPreferences {
      selected_city: self.selected_city.clone(),
      compact_mode: self.compact_mode,
    }
  }

  fn restore(prefs: UiPreferences) -> Option<Self> {
    let mut state = Self {
      compact_mode: prefs.compact_mode,
      ..Self::default()
    };
    if !prefs.selected_city.trim().is_empty() {
      state.selected_city = prefs.selected_city;
    }
    Some(state)
  }
}

impl Store<UiState> {
  pub fn toggle_dark_mode(&self) {
    self.apply(UiAction::ToggleDarkMode);
  }

  pub fn set_selected_city(&self, city: impl Into<String>) {
    self.apply(UiAction::SetSelectedCity(city.into()));
  }

  pub fn toggle_sidebar(&self) {
    self.apply(UiAction::ToggleSidebar);
  }

  pub fn set_compact_mode(&self, compact: bool) {
    self.apply(UiAction::SetCompactMode(compact));
  }
}
