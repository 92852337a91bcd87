//! Preference stores.
//!
//! A `Store<S>` owns one state value. Reads are synchronous, writes go
//! through `dispatch`, and every accepted action is broadcast on a watch
//! channel. Stores whose state implements `Persist` save an explicit
//! snapshot after each change and hydrate from it on `load`.

mod filters;
mod layout;
mod storage;
mod ui;

use std::convert::Infallible;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

pub use filters::{FiltersAction, FiltersState, FiltersStore, JobsFilters, NewsFilters};
pub use layout::{
  default_widgets, DashboardWidget, LayoutAction, LayoutError, LayoutState, LayoutStore,
  WidgetKind, WidgetPatch,
};
pub use storage::{MemoryStorage, NoopStorage, PreferenceStorage, SqliteStorage};
pub use ui::{UiAction, UiPreferences, UiState, UiStore};

/// Version written into every persisted document
const STORAGE_VERSION: u32 = 0;

/// State that changes only through actions.
pub trait Reducer: Send + Sync + 'static {
  type Action;
  type Error;

  /// Apply `action`. On error the state must be left untouched.
  fn reduce(&mut self, action: Self::Action) -> Result<(), Self::Error>;
}

/// State with a declared persisted subset.
pub trait Persist: Reducer + Default {
  /// Name of the persisted document
  const STORAGE_KEY: &'static str;

  /// The fields that survive a restart
  type Snapshot: Serialize + DeserializeOwned;

  fn snapshot(&self) -> Self::Snapshot;

  /// Rebuild state from a snapshot, or None if the snapshot is unusable.
  fn restore(snapshot: Self::Snapshot) -> Option<Self>;
}

#[derive(Serialize, Deserialize)]
struct PersistedDocument<T> {
  state: T,
  version: u32,
}

struct Persister<S> {
  storage: Arc<dyn PreferenceStorage>,
  name: &'static str,
  encode: fn(&S) -> serde_json::Result<String>,
}

/// An isolated state holder with controlled mutation.
pub struct Store<S: Reducer> {
  state: watch::Sender<S>,
  persister: Option<Persister<S>>,
}

impl<S: Reducer> Store<S> {
  /// In-memory store starting from `initial`.
  pub fn new(initial: S) -> Self {
    let (state, _) = watch::channel(initial);
    Self {
      state,
      persister: None,
    }
  }

  /// Copy of the current state.
  pub fn get_state(&self) -> S
  where
    S: Clone,
  {
    self.state.borrow().clone()
  }

  /// Read the current state without copying it.
  pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
    read(&self.state.borrow())
  }

  /// Receiver that sees every accepted change.
  pub fn subscribe(&self) -> watch::Receiver<S> {
    self.state.subscribe()
  }

  /// Apply `action`, notify subscribers and persist.
  ///
  /// Rejected actions leave the state untouched and notify nobody.
  pub fn dispatch(&self, action: S::Action) -> Result<(), S::Error> {
    let mut outcome = Ok(());
    self.state.send_if_modified(|state| match state.reduce(action) {
      Ok(()) => true,
      Err(err) => {
        outcome = Err(err);
        false
      }
    });

    if outcome.is_ok() {
      self.persist();
    }
    outcome
  }

  /// Persistence failures are logged; the in-memory state stays authoritative.
  fn persist(&self) {
    let Some(persister) = &self.persister else {
      return;
    };

    let encoded = (persister.encode)(&self.state.borrow());
    let saved = encoded
      .map_err(|e| color_eyre::eyre::eyre!("Failed to encode preferences: {}", e))
      .and_then(|data| persister.storage.save(persister.name, &data));

    match saved {
      Ok(()) => debug!(store = persister.name, "persisted preferences"),
      Err(err) => warn!(store = persister.name, error = %err, "failed to persist preferences"),
    }
  }
}

impl<S: Reducer<Error = Infallible>> Store<S> {
  /// Dispatch an action that cannot be rejected.
  pub fn apply(&self, action: S::Action) {
    match self.dispatch(action) {
      Ok(()) => {}
      Err(never) => match never {},
    }
  }
}

impl<S: Persist> Store<S> {
  /// Store hydrated from `storage`, saving back to it on every change.
  ///
  /// Missing, unreadable or incompatible documents load the defaults.
  pub fn load(storage: Arc<dyn PreferenceStorage>) -> Self {
    Self::load_or(storage, S::default())
  }

  /// Like `load`, starting from `initial` when nothing usable is stored.
  pub fn load_or(storage: Arc<dyn PreferenceStorage>, initial: S) -> Self {
    let initial = hydrate::<S>(storage.as_ref()).unwrap_or(initial);
    let (state, _) = watch::channel(initial);
    Self {
      state,
      persister: Some(Persister {
        storage,
        name: S::STORAGE_KEY,
        encode: encode::<S>,
      }),
    }
  }
}

fn encode<S: Persist>(state: &S) -> serde_json::Result<String> {
  serde_json::to_string(&PersistedDocument {
    state: state.snapshot(),
    version: STORAGE_VERSION,
  })
}

fn hydrate<S: Persist>(storage: &dyn PreferenceStorage) -> Option<S> {
  let name = S::STORAGE_KEY;
  let raw = match storage.load(name) {
    Ok(raw) => raw?,
    Err(err) => {
      warn!(store = name, error = %err, "failed to read preferences, using defaults");
      return None;
    }
  };

  let document: PersistedDocument<S::Snapshot> = match serde_json::from_str(&raw) {
    Ok(document) => document,
    Err(err) => {
      warn!(store = name, error = %err, "stored preferences have an incompatible shape, using defaults");
      return None;
    }
  };

  if document.version != STORAGE_VERSION {
    warn!(store = name, version = document.version, "unsupported preferences version, using defaults");
    return None;
  }

  let restored = S::restore(document.state);
  if restored.is_none() {
    warn!(store = name, "stored preferences are invalid, using defaults");
  }
  restored
}
