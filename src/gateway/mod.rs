//! Remote data gateway.
//!
//! A thin read-only HTTP client abstraction. Base URL, timeout and headers
//! are gateway configuration; retry policy belongs to the query cache.

mod error;
mod http;

pub use error::FetchError;
pub use http::{Gateway, HttpGateway};
