//! Request and response messages of the three remote services.
//!
//! Field names follow the proto3 JSON mapping (lowerCamelCase). Every response
//! field defaults when absent so that a partial field-mask response decodes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use testtiming_core::{BuildStatus, TestStatus};

// ---------------------------------------------------------------------------
// Source log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub project: String,
    /// `refs/heads/<branch>`.
    pub committish: String,
    pub page_size: u32,
    pub page_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogResponse {
    /// Newest first.
    pub log: Vec<GitCommit>,
    pub next_page_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    pub id: String,
    pub committer_time: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Build orchestration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuilderId {
    pub project: String,
    pub bucket: String,
    pub builder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBuildersRequest {
    pub project: String,
    pub bucket: String,
    pub page_size: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub page_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListBuildersResponse {
    pub builders: Vec<BuilderItem>,
    pub next_page_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BuilderItem {
    pub id: BuilderId,
    pub config: BuilderItemConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BuilderItemConfig {
    /// Builder properties as a JSON document embedded in a string.
    pub properties: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBuildsRequest {
    pub predicate: BuildPredicate,
    pub mask: BuildMask,
    pub page_size: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub page_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPredicate {
    pub builder: BuilderId,
    pub create_time: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: DateTime<Utc>,
}

/// A field mask travels as a comma-separated list of camelCase paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildMask {
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchBuildsResponse {
    pub builds: Vec<Build>,
    pub next_page_token: String,
}

/// A build record, restricted to the fields the search mask asks for.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Build {
    #[serde(deserialize_with = "proto_json::int64")]
    pub id: i64,
    pub builder: BuilderId,
    pub status: BuildStatus,
    pub output: BuildOutput,
    pub steps: Vec<Step>,
    pub infra: BuildInfra,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BuildOutput {
    /// Free-form output properties (`sources`, `failure`, ...).
    pub properties: Map<String, Value>,
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Log {
    pub name: String,
    pub view_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Step {
    pub name: String,
    pub status: BuildStatus,
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BuildInfra {
    pub resultdb: ResultDbInfra,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ResultDbInfra {
    pub hostname: String,
    pub invocation: String,
}

// ---------------------------------------------------------------------------
// Test result store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTestResultsRequest {
    pub invocations: Vec<String>,
    pub predicate: TestResultPredicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultPredicate {
    pub test_id_regexp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryTestResultsResponse {
    pub test_results: Vec<TestResult>,
    pub next_page_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestResult {
    pub test_id: String,
    pub status: TestStatus,
    #[serde(deserialize_with = "proto_json::duration")]
    pub duration: Option<Duration>,
}

// ---------------------------------------------------------------------------
// proto3 JSON scalars
// ---------------------------------------------------------------------------

pub(crate) mod proto_json {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Text(String),
        Number(i64),
    }

    /// int64 arrives as a JSON string, but a bare number is accepted too.
    pub fn int64<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
        match Int64::deserialize(de)? {
            Int64::Number(n) => Ok(n),
            Int64::Text(s) => s.parse().map_err(D::Error::custom),
        }
    }

    /// `"1.500s"` → 1.5 seconds.
    pub fn duration<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
        match Option::<String>::deserialize(de)? {
            None => Ok(None),
            Some(s) => parse_duration(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid duration '{s}'"))),
        }
    }

    pub fn parse_duration(s: &str) -> Option<Duration> {
        let body = s.strip_suffix('s')?;
        let (secs, frac) = match body.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (body, ""),
        };
        if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let secs: u64 = secs.parse().ok()?;
        let nanos: u32 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<9}").parse().ok()?
        };
        Some(Duration::new(secs, nanos))
    }
}
