//! Collapse one builder's raw builds into one canonical result per commit.
//!
//! Rules, applied per build in input order:
//!
//! 1. Find the subject-repo commit (and the companion-repo commit, if any) in
//!    the `sources` output property. Entries naming any other repo are logged
//!    and ignored.
//! 2. No subject commit: skip the build. A successful build without one is
//!    logged; unfinished and infra-failed builds are expected to lack it.
//! 3. The build must name the expected result-store host and the requested
//!    builder; otherwise reconciliation fails with an invariant violation.
//! 4. If the commit already has a result, keep whichever build ended later.
//!    Ties keep the stored one.
//! 5. Failed builds get a run log (the "(combined output)" failure link, else
//!    the build's stderr) and a step log (the last failed step's stderr or
//!    output log).

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use testtiming_core::{build_url, short_hash, BuildResult, BuildStatus, Builder, ClientConfig};
use testtiming_luci::wire::Build;

use crate::error::{BoardError, InvariantKind};

const COMBINED_OUTPUT: &str = "(combined output)";

#[derive(Debug, Clone)]
pub struct ResultReconciler {
    repo: String,
    companion_repo: String,
    resultdb_host: String,
}

/// Commits a build's `sources` property names.
#[derive(Debug, Default, PartialEq, Eq)]
struct SourceCommits {
    commit: String,
    companion: String,
}

impl ResultReconciler {
    pub fn new(repo: impl Into<String>, config: &ClientConfig) -> Self {
        Self {
            repo: repo.into(),
            companion_repo: config.companion_repo.clone(),
            resultdb_host: config.resultdb_host.clone(),
        }
    }

    /// Reduce `builds`, all of `builder`, to a map from commit hash to result.
    pub fn reconcile(
        &self,
        builder: &Builder,
        builds: Vec<Build>,
    ) -> Result<HashMap<String, BuildResult>, BoardError> {
        let mut by_commit: HashMap<String, BuildResult> = HashMap::new();
        for build in builds {
            let sources = self.source_commits(&build);
            if sources.commit.is_empty() {
                if build.status == BuildStatus::Success {
                    tracing::warn!(build = %build_url(build.id), "empty commit");
                }
                continue;
            }
            self.check_invariants(builder, &build)?;

            let build_end_time = build.end_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let result = resolve(builder, build, sources, build_end_time);
            match by_commit.entry(result.commit.clone()) {
                Entry::Occupied(mut stored) => {
                    // Manual retries, or several companion commits for one subrepo commit.
                    if result.build_end_time > stored.get().build_end_time {
                        tracing::trace!(
                            builder = %builder.name,
                            commit = short_hash(&result.commit),
                            kept = result.id,
                            dropped = stored.get().id,
                            "duplicate build"
                        );
                        stored.insert(result);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(result);
                }
            }
        }
        Ok(by_commit)
    }

    fn source_commits(&self, build: &Build) -> SourceCommits {
        let mut found = SourceCommits::default();
        let sources = build
            .output
            .properties
            .get("sources")
            .and_then(Value::as_array);
        for source in sources.into_iter().flatten() {
            let commit = source
                .get("gitilesCommit")
                .filter(|v| !v.is_null())
                .or_else(|| source.get("gitiles_commit"));
            let field = |name: &str| {
                commit
                    .and_then(|c| c.get(name))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
            };
            let (project, id) = (field("project"), field("id"));
            if project == self.repo {
                found.commit = id.to_string();
            } else if project == self.companion_repo {
                found.companion = id.to_string();
            } else {
                tracing::warn!(
                    repo = project,
                    expected = %self.repo,
                    build = %build_url(build.id),
                    "repo mismatch"
                );
            }
        }
        found
    }

    fn check_invariants(&self, builder: &Builder, build: &Build) -> Result<(), BoardError> {
        let host = &build.infra.resultdb.hostname;
        if *host != self.resultdb_host {
            return Err(BoardError::InvariantViolation {
                kind: InvariantKind::ResultDbHost,
                detail: format!("{host} != {} ({})", self.resultdb_host, build_url(build.id)),
            });
        }
        if build.builder.builder != builder.name {
            return Err(BoardError::InvariantViolation {
                kind: InvariantKind::BuilderName,
                detail: format!(
                    "{} != {} ({})",
                    build.builder.builder,
                    builder.name,
                    build_url(build.id)
                ),
            });
        }
        Ok(())
    }
}

fn resolve(
    builder: &Builder,
    build: Build,
    sources: SourceCommits,
    build_end_time: DateTime<Utc>,
) -> BuildResult {
    let (log_url, step_log_url) = if build.status == BuildStatus::Failure {
        (failure_log_url(&build), failed_step_log_url(&build))
    } else {
        (String::new(), String::new())
    };
    BuildResult {
        id: build.id,
        status: build.status,
        commit: sources.commit,
        commit_time: DateTime::<Utc>::UNIX_EPOCH,
        companion_commit: Some(sources.companion).filter(|c| !c.is_empty()),
        build_end_time,
        builder: builder.name.clone(),
        config: builder.config.clone(),
        invocation_id: build.infra.resultdb.invocation,
        log_url,
        log_text: String::new(),
        step_log_url,
        step_log_text: String::new(),
        failures: Vec::new(),
    }
}

/// The "(combined output)" failure link, else the build's own stderr log.
fn failure_log_url(build: &Build) -> String {
    let combined = build
        .output
        .properties
        .get("failure")
        .and_then(|f| f.get("links"))
        .and_then(Value::as_array)
        .and_then(|links| {
            links.iter().find(|l| {
                l.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n.contains(COMBINED_OUTPUT))
            })
        })
        .and_then(|l| l.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !combined.is_empty() {
        return combined.to_string();
    }
    // No test output: probably a build failure.
    build
        .output
        .logs
        .iter()
        .find(|l| l.name == "stderr")
        .map(|l| l.view_url.clone())
        .unwrap_or_default()
}

/// Log of the last failed step that has one.
fn failed_step_log_url(build: &Build) -> String {
    build
        .steps
        .iter()
        .rev()
        .filter(|s| s.status == BuildStatus::Failure)
        .find_map(|s| {
            s.logs
                .iter()
                .find(|l| l.name == "stderr" || l.name == "output")
        })
        .map(|l| l.view_url.clone())
        .unwrap_or_default()
}
