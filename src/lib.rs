//! Metro rail dashboard core.
//!
//! Live project data goes through a cached query client with stale-while-
//! revalidate semantics, interval polling, retry with backoff and a built-in
//! fallback dataset. User preferences live in small action-driven stores, two
//! of which persist a declared subset of their fields to SQLite.

pub mod config;
pub mod dashboard;
pub mod gateway;
pub mod metro;
pub mod query;
pub mod store;

pub use config::Config;
pub use dashboard::Dashboard;
