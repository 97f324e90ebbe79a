//! HTTP implementations of the service traits.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use testtiming_core::ClientConfig;

use crate::error::{json_err, transport_err, LuciError};
use crate::services::{BuildService, ResultStore, SourceLog};
use crate::transport::{self, read_body, strip_xssi, PrpcClient};
use crate::wire::{
    GitCommit, ListBuildersRequest, ListBuildersResponse, LogRequest, LogResponse,
    QueryTestResultsRequest, QueryTestResultsResponse, SearchBuildsRequest, SearchBuildsResponse,
};

const BUILDERS_SERVICE: &str = "buildbucket.v2.Builders";
const BUILDS_SERVICE: &str = "buildbucket.v2.Builds";
const RESULTDB_SERVICE: &str = "luci.resultdb.v1.ResultDB";

/// The three HTTP clients, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpServices {
    pub gitiles: GitilesClient,
    pub buildbucket: BuildbucketClient,
    pub resultdb: ResultDbClient,
}

impl HttpServices {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = transport::agent();
        Self {
            gitiles: GitilesClient::new(agent.clone(), &config.gitiles_host),
            buildbucket: BuildbucketClient {
                prpc: PrpcClient::new(agent.clone(), &config.buildbucket_host),
            },
            resultdb: ResultDbClient {
                prpc: PrpcClient::new(agent, &config.resultdb_host),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Gitiles (REST JSON)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GitilesClient {
    agent: ureq::Agent,
    host: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLog {
    log: Vec<RawCommit>,
    next: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCommit {
    commit: String,
    committer: RawSignature,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSignature {
    time: String,
}

impl GitilesClient {
    pub fn new(agent: ureq::Agent, host: impl Into<String>) -> Self {
        Self {
            agent,
            host: host.into(),
        }
    }

    /// `https://<host>/<project>/+log/<committish>`; paging goes in the query string.
    pub fn log_url(&self, request: &LogRequest) -> String {
        format!(
            "https://{}/{}/+log/{}",
            self.host, request.project, request.committish
        )
    }
}

impl SourceLog for GitilesClient {
    fn log(&self, request: &LogRequest) -> Result<LogResponse, LuciError> {
        const METHOD: &str = "gitiles.Log";
        let mut call = self
            .agent
            .get(&self.log_url(request))
            .query("format", "JSON")
            .query("n", &request.page_size.to_string());
        if !request.page_token.is_empty() {
            call = call.query("s", &request.page_token);
        }
        let response = call.call().map_err(|e| transport_err(METHOD, e))?;
        let body = read_body(METHOD, response)?;
        decode_log(&body)
    }
}

pub(crate) fn decode_log(body: &str) -> Result<LogResponse, LuciError> {
    let raw: RawLog =
        serde_json::from_str(strip_xssi(body)).map_err(|e| json_err("gitiles.Log", e))?;
    let log = raw
        .log
        .into_iter()
        .map(|c| {
            Ok(GitCommit {
                committer_time: parse_gitiles_time(&c.committer.time)?,
                id: c.commit,
            })
        })
        .collect::<Result<Vec<_>, LuciError>>()?;
    Ok(LogResponse {
        log,
        next_page_token: raw.next,
    })
}

/// Gitiles prints `Tue Oct 15 20:37:52 2024 +0000`; the offset is sometimes absent.
pub fn parse_gitiles_time(s: &str) -> Result<DateTime<Utc>, LuciError> {
    DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %Y %z")
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%a %b %d %H:%M:%S %Y").map(|n| n.and_utc()))
        .map_err(|_| LuciError::CommitTime(s.to_string()))
}

// ---------------------------------------------------------------------------
// Buildbucket (pRPC)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BuildbucketClient {
    prpc: PrpcClient,
}

impl BuildService for BuildbucketClient {
    fn list_builders(
        &self,
        request: &ListBuildersRequest,
    ) -> Result<ListBuildersResponse, LuciError> {
        self.prpc.call(BUILDERS_SERVICE, "ListBuilders", request)
    }

    fn search_builds(
        &self,
        request: &SearchBuildsRequest,
    ) -> Result<SearchBuildsResponse, LuciError> {
        self.prpc.call(BUILDS_SERVICE, "SearchBuilds", request)
    }
}

// ---------------------------------------------------------------------------
// ResultDB (pRPC)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ResultDbClient {
    prpc: PrpcClient,
}

impl ResultStore for ResultDbClient {
    fn query_test_results(
        &self,
        request: &QueryTestResultsRequest,
    ) -> Result<QueryTestResultsResponse, LuciError> {
        self.prpc.call(RESULTDB_SERVICE, "QueryTestResults", request)
    }
}
