//! Metro domain: API records, endpoints, query keys and the cached client.

mod api;
mod cached_client;
mod defaults;
pub mod enhanced;
mod keys;
mod summary;
pub mod types;

pub use api::MetroApi;
pub use cached_client::{CachedMetroClient, Projects};
pub use defaults::default_projects;
pub use enhanced::{MetroProjectEnhanced, SystemStatus};
pub use keys::MetroQueryKey;
pub use summary::NetworkSummary;
pub use types::{
  ApiResponse, JobPosting, JobType, LineColor, MetroProject, MetroStats, MetroSystem, NewsArticle,
  NewsCategory, PaginatedResponse, ProjectStatus,
};

#[cfg(test)]
pub(crate) use api::testing;
