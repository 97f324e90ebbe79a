//! Remote service seams.
//!
//! Each collaborator is a trait so the listing clients and the dashboard
//! pipeline can run against in-memory fakes. Implementations must be shareable
//! across the per-builder worker threads.

use crate::error::LuciError;
use crate::wire::{
    ListBuildersRequest, ListBuildersResponse, LogRequest, LogResponse, QueryTestResultsRequest,
    QueryTestResultsResponse, SearchBuildsRequest, SearchBuildsResponse,
};

/// Source-control commit log.
pub trait SourceLog: Send + Sync {
    fn log(&self, request: &LogRequest) -> Result<LogResponse, LuciError>;
}

/// Build orchestration / search service.
pub trait BuildService: Send + Sync {
    fn list_builders(&self, request: &ListBuildersRequest)
        -> Result<ListBuildersResponse, LuciError>;

    fn search_builds(&self, request: &SearchBuildsRequest)
        -> Result<SearchBuildsResponse, LuciError>;
}

/// Test-result store.
pub trait ResultStore: Send + Sync {
    fn query_test_results(
        &self,
        request: &QueryTestResultsRequest,
    ) -> Result<QueryTestResultsResponse, LuciError>;
}
