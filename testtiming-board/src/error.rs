//! Error types for testtiming-board.

use std::fmt;

use thiserror::Error;

use testtiming_luci::LuciError;

/// Which upstream invariant a build record broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// The build's infra metadata names a different result-store host.
    ResultDbHost,
    /// The build service returned a build of a different builder than requested.
    BuilderName,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantKind::ResultDbHost => write!(f, "result-store host mismatch"),
            InvariantKind::BuilderName => write!(f, "builder mismatch"),
        }
    }
}

/// All errors that can arise assembling a dashboard or extracting timings.
#[derive(Debug, Error)]
pub enum BoardError {
    /// A remote call failed.
    #[error("remote service error: {0}")]
    Luci(#[from] LuciError),

    /// The upstream protocol changed under us. Not recoverable.
    #[error("invariant violation ({kind}): {detail}")]
    InvariantViolation { kind: InvariantKind, detail: String },

    /// The unit was stopped because a sibling failed.
    #[error("cancelled")]
    Cancelled,

    /// A worker task panicked or was aborted.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
