//! Per-test timing samples from an assembled dashboard.
//!
//! One result-store query per non-empty cell, strictly sequential, in matrix
//! order (builder-major, then commit). Downstream plotting correlates lines by
//! position, so the order is part of the output contract.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use testtiming_core::{short_hash, ClientConfig, Dashboard, TestStatus};
use testtiming_luci::{test_results_request, trace_step, ResultStore};

use crate::error::BoardError;

/// One test run at one (builder, commit). Exactly one of the two durations is
/// set: `pass_duration` for PASS, `fail_duration` for every other status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingRecord {
    pub builder: String,
    pub commit: String,
    pub commit_time: DateTime<Utc>,
    pub status: TestStatus,
    pub pass_duration: Option<Duration>,
    pub fail_duration: Option<Duration>,
}

pub struct TestTimingExtractor<R> {
    store: Arc<R>,
    config: Arc<ClientConfig>,
}

impl<R: ResultStore> TestTimingExtractor<R> {
    pub fn new(store: Arc<R>, config: Arc<ClientConfig>) -> Self {
        Self { store, config }
    }

    /// Query every populated cell for `test_id` and hand each non-skipped
    /// result to `emit` as soon as it arrives.
    pub fn for_each_record<F, E>(&self, dash: &Dashboard, test_id: &str, mut emit: F) -> Result<(), E>
    where
        F: FnMut(TimingRecord) -> Result<(), E>,
        E: From<BoardError>,
    {
        for (builder, cell) in dash.populated_cells() {
            trace_step!(
                self.config,
                builder = %builder.name,
                commit = short_hash(&cell.commit),
                time = %cell.commit_time,
                "QueryTestResults"
            );
            let request = test_results_request(&cell.invocation_id, test_id);
            let response = self
                .store
                .query_test_results(&request)
                .map_err(BoardError::from)?;
            for result in response.test_results {
                if result.status == TestStatus::Skip {
                    continue;
                }
                let duration = result.duration.unwrap_or_default();
                let (pass_duration, fail_duration) = if result.status == TestStatus::Pass {
                    (Some(duration), None)
                } else {
                    (None, Some(duration))
                };
                emit(TimingRecord {
                    builder: builder.name.clone(),
                    commit: cell.commit.clone(),
                    commit_time: cell.commit_time,
                    status: result.status,
                    pass_duration,
                    fail_duration,
                })?;
            }
        }
        Ok(())
    }

    /// Collect every record in matrix order.
    pub fn extract(&self, dash: &Dashboard, test_id: &str) -> Result<Vec<TimingRecord>, BoardError> {
        let mut records = Vec::new();
        self.for_each_record(dash, test_id, |record| {
            records.push(record);
            Ok::<_, BoardError>(())
        })?;
        Ok(records)
    }
}
