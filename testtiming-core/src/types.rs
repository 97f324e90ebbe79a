//! Domain types for the builder × commit dashboard.
//!
//! Every timestamp is `DateTime<Utc>`. Status enums keep the remote services'
//! wire names and tolerate values added upstream after this crate was written.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Status of one build, as reported by the build orchestration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    #[default]
    #[serde(rename = "STATUS_UNSPECIFIED")]
    Unspecified,
    Scheduled,
    Started,
    EndedMask,
    Success,
    Failure,
    InfraFailure,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStatus::Unspecified => "STATUS_UNSPECIFIED",
            BuildStatus::Scheduled => "SCHEDULED",
            BuildStatus::Started => "STARTED",
            BuildStatus::EndedMask => "ENDED_MASK",
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::InfraFailure => "INFRA_FAILURE",
            BuildStatus::Canceled => "CANCELED",
            BuildStatus::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Status of one test result, as reported by the test-result store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    #[default]
    #[serde(rename = "STATUS_UNSPECIFIED")]
    Unspecified,
    Pass,
    Fail,
    Crash,
    Abort,
    Skip,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestStatus::Unspecified => "STATUS_UNSPECIFIED",
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
            TestStatus::Crash => "CRASH",
            TestStatus::Abort => "ABORT",
            TestStatus::Skip => "SKIP",
            TestStatus::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Target platform of a builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TargetPlatform {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub goarch: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub goos: String,
}

/// Per-builder configuration, decoded from the JSON blob the build service
/// embeds in each builder definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BuilderConfig {
    /// Repository the builder tests (`"go"` for the main repo).
    #[serde(rename = "project", skip_serializing_if = "String::is_empty")]
    pub repo: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub go_branch: String,
    pub target: TargetPlatform,
    #[serde(skip_serializing_if = "is_zero")]
    pub known_issue: i64,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

impl BuilderConfig {
    /// Decode a builder's JSON properties, falling back to the zero value when
    /// the blob is absent or malformed.
    pub fn decode_or_default(properties: &str) -> Self {
        serde_json::from_str(properties).unwrap_or_default()
    }

    /// Whether this builder runs against `repo` on `go_branch`.
    pub fn matches(&self, repo: &str, go_branch: &str) -> bool {
        self.repo == repo && self.go_branch == go_branch
    }
}

/// A named CI configuration. The config is shared with every [`BuildResult`]
/// the builder produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builder {
    pub name: String,
    pub config: Arc<BuilderConfig>,
}

impl Builder {
    pub fn new(name: impl Into<String>, config: BuilderConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
        }
    }
}

// ---------------------------------------------------------------------------
// Commits and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub time: DateTime<Utc>,
}

/// The repository/branch pair a dashboard is built for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Project {
    pub repo: String,
    pub branch: String,
}

impl Project {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
        }
    }
}

/// One failed test inside a build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Failure {
    pub test_id: String,
    pub status: TestStatus,
    pub log_url: String,
    pub log_text: String,
}

/// The canonical result of one builder at one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub id: i64,
    pub status: BuildStatus,
    pub commit: String,
    /// Commit time. Stamped from the commit log when the dashboard is
    /// assembled; the Unix epoch until then.
    pub commit_time: DateTime<Utc>,
    /// Commit of the companion repo, for cross-repo builds.
    pub companion_commit: Option<String>,
    pub build_end_time: DateTime<Utc>,
    pub builder: String,
    pub config: Arc<BuilderConfig>,
    /// Result-store invocation holding this build's test results.
    pub invocation_id: String,
    /// Log of the whole run.
    pub log_url: String,
    pub log_text: String,
    /// Log of the last failed step, if any.
    pub step_log_url: String,
    pub step_log_text: String,
    pub failures: Vec<Failure>,
}

/// Builder × commit matrix of canonical results over one time window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dashboard {
    pub project: Project,
    pub builders: Vec<Builder>,
    /// Newest first.
    pub commits: Vec<Commit>,
    /// Indexed by builder, then by commit.
    pub results: Vec<Vec<Option<BuildResult>>>,
}

impl Dashboard {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            ..Self::default()
        }
    }

    /// Non-empty cells in row-major order (builder, then commit).
    pub fn populated_cells(&self) -> impl Iterator<Item = (&Builder, &BuildResult)> {
        self.builders
            .iter()
            .zip(&self.results)
            .flat_map(|(builder, row)| row.iter().flatten().map(move |r| (builder, r)))
    }

    /// Check the matrix shape and the per-cell identity invariants.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.results.len() != self.builders.len() {
            return Err(format!(
                "{} result rows for {} builders",
                self.results.len(),
                self.builders.len()
            ));
        }
        for (builder, row) in self.builders.iter().zip(&self.results) {
            if row.len() != self.commits.len() {
                return Err(format!(
                    "row for {} has {} cells, want {}",
                    builder.name,
                    row.len(),
                    self.commits.len()
                ));
            }
            for (commit, cell) in self.commits.iter().zip(row) {
                let Some(result) = cell else { continue };
                if result.builder != builder.name
                    || result.commit != commit.hash
                    || result.commit_time != commit.time
                {
                    return Err(format!(
                        "cell ({}, {}) holds build {} for ({}, {})",
                        builder.name,
                        short_hash(&commit.hash),
                        result.id,
                        result.builder,
                        short_hash(&result.commit)
                    ));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First 8 characters of a commit hash, or the whole string if shorter.
pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(8) {
        Some((end, _)) => &hash[..end],
        None => hash,
    }
}

/// Permalink of a build. Diagnostic logging only.
pub fn build_url(build_id: i64) -> String {
    format!("https://ci.chromium.org/b/{build_id}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_truncates_to_eight() {
        assert_eq!(short_hash("0123456789abcdef"), "01234567");
        assert_eq!(short_hash("01234567"), "01234567");
        assert_eq!(short_hash("abc"), "abc");
        assert_eq!(short_hash(""), "");
    }

    #[test]
    fn build_url_is_permalink() {
        assert_eq!(build_url(8759448820419452721), "https://ci.chromium.org/b/8759448820419452721");
    }

    #[test]
    fn builder_config_decodes_nested_target() {
        let cfg = BuilderConfig::decode_or_default(
            r#"{"project":"tools","go_branch":"master","target":{"goarch":"arm64","goos":"darwin"},"known_issue":61234,"mode":0}"#,
        );
        assert_eq!(cfg.repo, "tools");
        assert_eq!(cfg.go_branch, "master");
        assert_eq!(cfg.target.goarch, "arm64");
        assert_eq!(cfg.target.goos, "darwin");
        assert_eq!(cfg.known_issue, 61234);
        assert!(cfg.matches("tools", "master"));
        assert!(!cfg.matches("go", "master"));
    }

    #[test]
    fn builder_config_malformed_decodes_to_default() {
        assert_eq!(BuilderConfig::decode_or_default("{not json"), BuilderConfig::default());
        assert_eq!(BuilderConfig::decode_or_default(""), BuilderConfig::default());
        assert_eq!(
            BuilderConfig::decode_or_default(r#"{"project": 42}"#),
            BuilderConfig::default()
        );
    }

    #[test]
    fn status_serde_uses_wire_names() {
        let s: BuildStatus = serde_json::from_str(r#""INFRA_FAILURE""#).expect("decode");
        assert_eq!(s, BuildStatus::InfraFailure);
        let s: BuildStatus = serde_json::from_str(r#""STATUS_UNSPECIFIED""#).expect("decode");
        assert_eq!(s, BuildStatus::Unspecified);
        let s: BuildStatus = serde_json::from_str(r#""SOMETHING_NEW""#).expect("decode");
        assert_eq!(s, BuildStatus::Unknown);
        let t: TestStatus = serde_json::from_str(r#""SKIP""#).expect("decode");
        assert_eq!(t, TestStatus::Skip);
        assert_eq!(TestStatus::Pass.to_string(), "PASS");
        assert_eq!(BuildStatus::Success.to_string(), "SUCCESS");
    }

    #[test]
    fn empty_dashboard_is_consistent() {
        let dash = Dashboard::new(Project::new("go", "master"));
        assert!(dash.check_invariants().is_ok());
        assert_eq!(dash.populated_cells().count(), 0);
    }

    #[test]
    fn ragged_dashboard_is_rejected() {
        let mut dash = Dashboard::new(Project::new("go", "master"));
        dash.builders.push(Builder::new("b1", BuilderConfig::default()));
        dash.commits.push(Commit {
            hash: "h1".into(),
            time: DateTime::<Utc>::UNIX_EPOCH,
        });
        dash.results.push(vec![]);
        let err = dash.check_invariants().unwrap_err();
        assert!(err.contains("b1"), "got: {err}");
    }
}
