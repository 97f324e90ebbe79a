//! # testtiming-luci
//!
//! Clients for the three remote services the dashboard is reconstructed from:
//! the source-control commit log, the build orchestration service and the
//! test-result store.
//!
//! The listing clients ([`SourceLogClient`], [`BuilderRegistry`],
//! [`BuildFetcher`]) are generic over the [`services`] traits; [`http`]
//! provides the network implementations.

pub mod builders;
pub mod builds;
pub mod error;
pub mod gitiles;
pub mod http;
pub mod resultdb;
pub mod services;
pub mod transport;
pub mod wire;

pub use builders::BuilderRegistry;
pub use builds::{BuildFetcher, BUILD_FIELDS};
pub use error::LuciError;
pub use gitiles::SourceLogClient;
pub use http::HttpServices;
pub use resultdb::{quote_meta, test_results_request};
pub use services::{BuildService, ResultStore, SourceLog};

/// Log a remote step: at info level when `trace_steps` is on, debug otherwise.
#[macro_export]
macro_rules! trace_step {
    ($config:expr, $($arg:tt)+) => {
        if $config.trace_steps {
            ::tracing::info!($($arg)+)
        } else {
            ::tracing::debug!($($arg)+)
        }
    };
}
