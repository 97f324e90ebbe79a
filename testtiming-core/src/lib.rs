//! testtiming core library: domain types, client configuration, pagination.
//!
//! Public API surface:
//! - [`types`]: the builder × commit data model
//! - [`config`]: [`ClientConfig`] and YAML loading
//! - [`paginate`]: [`Paginator`], the page-token driver shared by every listing
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod error;
pub mod paginate;
pub mod types;

pub use config::ClientConfig;
pub use error::CoreError;
pub use paginate::{Page, Paginator};
pub use types::{
    build_url, short_hash, BuildResult, BuildStatus, Builder, BuilderConfig, Commit, Dashboard,
    Failure, Project, TargetPlatform, TestStatus,
};
