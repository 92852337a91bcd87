//! Dashboard widget layout.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{Persist, Reducer, Store};

pub type LayoutStore = Store<LayoutState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
  MetroStats,
  NewsFeed,
  JobsTable,
  SystemsProfile,
  StatsPanel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardWidget {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: WidgetKind,
  pub title: String,
  pub visible: bool,
  #[serde(default)]
  pub position: u32,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub props: BTreeMap<String, Value>,
}

impl DashboardWidget {
  fn new(id: &str, kind: WidgetKind, title: &str, position: u32) -> Self {
    Self {
      id: id.to_string(),
      kind,
      title: title.to_string(),
      visible: true,
      position,
      props: BTreeMap::new(),
    }
  }

  /// Positions are handled by the reducer, which renumbers the others.
  fn apply(&mut self, patch: WidgetPatch) {
    if let Some(kind) = patch.kind {
      self.kind = kind;
    }
    if let Some(title) = patch.title {
      self.title = title;
    }
    if let Some(visible) = patch.visible {
      self.visible = visible;
    }
    if let Some(props) = patch.props {
      self.props = props;
    }
  }
}

/// Partial widget update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetPatch {
  pub kind: Option<WidgetKind>,
  pub title: Option<String>,
  pub visible: Option<bool>,
  pub position: Option<u32>,
  pub props: Option<BTreeMap<String, Value>>,
}

pub fn default_widgets() -> Vec<DashboardWidget> {
  vec![
    DashboardWidget::new("stats", WidgetKind::StatsPanel, "Stats Overview", 1),
    DashboardWidget::new("metroStats", WidgetKind::MetroStats, "Major Metro Corridors", 2),
    DashboardWidget::new("newsFeed", WidgetKind::NewsFeed, "Latest News", 3),
    DashboardWidget::new("jobsTable", WidgetKind::JobsTable, "Job Opportunities", 4),
  ]
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
  #[error("unknown widget '{0}'")]
  UnknownWidget(String),

  #[error("widget '{0}' appears more than once")]
  DuplicateWidget(String),

  #[error("expected {expected} widgets, got {actual}")]
  WrongCount { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
pub enum LayoutAction {
  Update { id: String, patch: WidgetPatch },
  Toggle(String),
  Reorder(Vec<DashboardWidget>),
  Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutState {
  pub widgets: Vec<DashboardWidget>,
}

impl Default for LayoutState {
  fn default() -> Self {
    Self {
      widgets: default_widgets(),
    }
  }
}

impl LayoutState {
  /// Visible widgets in render order.
  pub fn visible_widgets(&self) -> Vec<&DashboardWidget> {
    let mut visible: Vec<_> = self.widgets.iter().filter(|w| w.visible).collect();
    visible.sort_by_key(|w| w.position);
    visible
  }

  pub fn widget(&self, id: &str) -> Option<&DashboardWidget> {
    self.widgets.iter().find(|w| w.id == id)
  }

  fn widget_mut(&mut self, id: &str) -> Result<&mut DashboardWidget, LayoutError> {
    self
      .widgets
      .iter_mut()
      .find(|w| w.id == id)
      .ok_or_else(|| LayoutError::UnknownWidget(id.to_string()))
  }

  /// Move `id` to the 1-based `position` in render order, shifting the
  /// others. Positions past the end clamp to the last slot.
  fn move_widget(&mut self, id: &str, position: u32) {
    self.widgets.sort_by_key(|w| w.position);
    if let Some(from) = self.widgets.iter().position(|w| w.id == id) {
      let widget = self.widgets.remove(from);
      let to = (position.saturating_sub(1) as usize).min(self.widgets.len());
      self.widgets.insert(to, widget);
    }
    self.renumber();
  }

  fn renumber(&mut self) {
    for (widget, position) in self.widgets.iter_mut().zip(1..) {
      widget.position = position;
    }
  }

  /// The new sequence must hold exactly the current widget ids.
  fn check_permutation(&self, sequence: &[DashboardWidget]) -> Result<(), LayoutError> {
    if sequence.len() != self.widgets.len() {
      return Err(LayoutError::WrongCount {
        expected: self.widgets.len(),
        actual: sequence.len(),
      });
    }

    let mut seen = HashSet::with_capacity(sequence.len());
    for widget in sequence {
      if !seen.insert(widget.id.as_str()) {
        return Err(LayoutError::DuplicateWidget(widget.id.clone()));
      }
      if self.widget(&widget.id).is_none() {
        return Err(LayoutError::UnknownWidget(widget.id.clone()));
      }
    }
    Ok(())
  }
}

impl Reducer for LayoutState {
  type Action = LayoutAction;
  type Error = LayoutError;

  fn reduce(&mut self, action: LayoutAction) -> Result<(), LayoutError> {
    match action {
      LayoutAction::Update { id, mut patch } => {
        let target = patch.position.take();
        self.widget_mut(&id)?.apply(patch);
        if let Some(position) = target {
          self.move_widget(&id, position);
        }
      }
      LayoutAction::Toggle(id) => {
        let widget = self.widget_mut(&id)?;
        widget.visible = !widget.visible;
      }
      LayoutAction::Reorder(sequence) => {
        self.check_permutation(&sequence)?;
        self.widgets = sequence;
        self.renumber();
      }
      LayoutAction::Reset => self.widgets = default_widgets(),
    }
    Ok(())
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LayoutSnapshot {
  widgets: Vec<DashboardWidget>,
}

impl Persist for LayoutState {
  const STORAGE_KEY: &'static str = "dashboard-layout-store";
  type Snapshot = LayoutSnapshot;

  fn snapshot(&self) -> LayoutSnapshot {
    LayoutSnapshot {
      widgets: self.widgets.clone(),
    }
  }

  fn restore(snapshot: LayoutSnapshot) -> Option<Self> {
    let mut ids = HashSet::new();
    if !snapshot.widgets.iter().all(|w| ids.insert(w.id.clone())) {
      return None;
    }
    Some(Self {
      widgets: snapshot.widgets,
    })
  }
}

impl Store<LayoutState> {
  /// Merge `patch` into widget `id`. A position in the patch moves the
  /// widget there and renumbers the rest, so positions stay 1..=n.
  pub fn update_widget(&self, id: &str, patch: WidgetPatch) -> Result<(), LayoutError> {
    self.dispatch(LayoutAction::Update {
      id: id.to_string(),
      patch,
    })
  }

  pub fn toggle_widget(&self, id: &str) -> Result<(), LayoutError> {
    self.dispatch(LayoutAction::Toggle(id.to_string()))
  }

  /// Replace the widget sequence; positions are renumbered 1..=n in the
  /// given order.
  pub fn reorder_widgets(&self, sequence: Vec<DashboardWidget>) -> Result<(), LayoutError> {
    self.dispatch(LayoutAction::Reorder(sequence))
  }

  pub fn reset_to_default(&self) {
    let reset = self.dispatch(LayoutAction::Reset);
    debug_assert!(reset.is_ok(), "layout reset rejected: {reset:?}");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::{MemoryStorage, PreferenceStorage};
  use std::sync::Arc;

  fn ids(widgets: &[&DashboardWidget]) -> Vec<String> {
    widgets.iter().map(|w| w.id.clone()).collect()
  }

  #[test]
  fn test_toggle_twice_restores_visibility() {
    let store = LayoutStore::new(LayoutState::default());
    store.toggle_widget("newsFeed").unwrap();
    assert!(!store.get_state().widget("newsFeed").unwrap().visible);

    store.toggle_widget("newsFeed").unwrap();
    assert_eq!(store.get_state(), LayoutState::default());
  }

  #[test]
  fn test_unknown_widget_is_rejected() {
    let store = LayoutStore::new(LayoutState::default());
    assert_eq!(
      store.toggle_widget("weather"),
      Err(LayoutError::UnknownWidget("weather".into()))
    );
    assert_eq!(store.get_state(), LayoutState::default());
  }

  #[test]
  fn test_update_widget_merges_patch() {
    let store = LayoutStore::new(LayoutState::default());
    store
      .update_widget(
        "jobsTable",
        WidgetPatch {
          title: Some("Careers".into()),
          ..Default::default()
        },
      )
      .unwrap();

    let state = store.get_state();
    let widget = state.widget("jobsTable").unwrap();
    assert_eq!(widget.title, "Careers");
    assert_eq!(widget.kind, WidgetKind::JobsTable);
    assert!(widget.visible);
    assert_eq!(widget.position, 4);
  }

  #[test]
  fn test_position_patch_moves_widget_and_keeps_positions_contiguous() {
    let store = LayoutStore::new(LayoutState::default());
    store
      .update_widget(
        "jobsTable",
        WidgetPatch {
          position: Some(1),
          ..Default::default()
        },
      )
      .unwrap();

    let state = store.get_state();
    assert_eq!(
      ids(&state.visible_widgets()),
      vec!["jobsTable", "stats", "metroStats", "newsFeed"]
    );
    let mut positions: Vec<u32> = state.widgets.iter().map(|w| w.position).collect();
    positions.sort();
    assert_eq!(positions, vec![1, 2, 3, 4]);

    store
      .update_widget(
        "jobsTable",
        WidgetPatch {
          position: Some(99),
          ..Default::default()
        },
      )
      .unwrap();
    assert_eq!(store.get_state().widget("jobsTable").unwrap().position, 4);
  }

  #[test]
  fn test_reset_after_changes_restores_defaults() {
    let store = LayoutStore::new(LayoutState::default());
    store.toggle_widget("stats").unwrap();
    let mut sequence = default_widgets();
    sequence.swap(0, 3);
    store.reorder_widgets(sequence).unwrap();

    store.reset_to_default();
    assert_eq!(store.get_state(), LayoutState::default());
  }

  #[test]
  fn test_reorder_renumbers_positions() {
    let store = LayoutStore::new(LayoutState::default());
    let mut sequence = default_widgets();
    sequence.reverse();
    store.reorder_widgets(sequence).unwrap();

    let state = store.get_state();
    assert_eq!(
      ids(&state.visible_widgets()),
      vec!["jobsTable", "newsFeed", "metroStats", "stats"]
    );
    let positions: Vec<u32> = state.widgets.iter().map(|w| w.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
  }

  #[test]
  fn test_reorder_rejects_non_permutations() {
    let store = LayoutStore::new(LayoutState::default());

    let mut duplicated = default_widgets();
    duplicated[3] = duplicated[0].clone();
    assert_eq!(
      store.reorder_widgets(duplicated),
      Err(LayoutError::DuplicateWidget("stats".into()))
    );

    let mut short = default_widgets();
    short.pop();
    assert_eq!(
      store.reorder_widgets(short),
      Err(LayoutError::WrongCount {
        expected: 4,
        actual: 3
      })
    );

    let mut foreign = default_widgets();
    foreign[0].id = "weather".into();
    assert_eq!(
      store.reorder_widgets(foreign),
      Err(LayoutError::UnknownWidget("weather".into()))
    );

    assert_eq!(store.get_state(), LayoutState::default());
  }

  #[test]
  fn test_hidden_widgets_are_not_rendered() {
    let store = LayoutStore::new(LayoutState::default());
    store.toggle_widget("stats").unwrap();
    assert_eq!(
      ids(&store.get_state().visible_widgets()),
      vec!["metroStats", "newsFeed", "jobsTable"]
    );
  }

  #[test]
  fn test_layout_survives_restart_and_reset() {
    let storage = Arc::new(MemoryStorage::new());
    let store = LayoutStore::load(storage.clone());
    store.toggle_widget("metroStats").unwrap();
    drop(store);

    let store = LayoutStore::load(storage.clone());
    assert!(!store.get_state().widget("metroStats").unwrap().visible);

    store.reset_to_default();
    let store = LayoutStore::load(storage);
    assert_eq!(store.get_state(), LayoutState::default());
  }

  #[test]
  fn test_duplicate_ids_in_storage_load_defaults() {
    let storage = Arc::new(MemoryStorage::new());
    let widget = serde_json::json!({
      "id": "stats", "type": "statsPanel", "title": "Stats", "visible": false, "position": 1
    });
    let document = serde_json::json!({
      "state": { "widgets": [widget.clone(), widget] },
      "version": 0
    });
    storage
      .save(LayoutState::STORAGE_KEY, &document.to_string())
      .unwrap();

    let store = LayoutStore::load(storage);
    assert_eq!(store.get_state(), LayoutState::default());
  }

  #[test]
  fn test_widget_wire_format() {
    let value = serde_json::to_value(&default_widgets()[0]).unwrap();
    assert_eq!(
      value,
      serde_json::json!({
        "id": "stats",
        "type": "statsPanel",
        "title": "Stats Overview",
        "visible": true,
        "position": 1
      })
    );
  }
}
