//! # testtiming-board
//!
//! Reconstructs the builder × commit dashboard from the remote services and
//! extracts per-test timing samples from it.
//!
//! [`DashboardAssembler::read_board`] is the entry point; it drives the
//! listing clients of `testtiming-luci` and the [`ResultReconciler`].
//! [`TestTimingExtractor`] then walks the finished [`Dashboard`].
//!
//! [`Dashboard`]: testtiming_core::Dashboard

pub mod assemble;
pub mod error;
pub mod reconcile;
pub mod timing;

pub use assemble::{layout, BuilderResults, DashboardAssembler};
pub use error::{BoardError, InvariantKind};
pub use reconcile::ResultReconciler;
pub use timing::{TestTimingExtractor, TimingRecord};
