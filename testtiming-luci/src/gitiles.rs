//! Commit listing.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use testtiming_core::{ClientConfig, Commit, Page, Paginator};

use crate::error::LuciError;
use crate::services::SourceLog;
use crate::wire::{GitCommit, LogRequest};

/// Lists commits on a branch, newest first, back to a time threshold.
pub struct SourceLogClient<S> {
    log: Arc<S>,
    config: Arc<ClientConfig>,
}

impl<S> Clone for SourceLogClient<S> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: SourceLog> SourceLogClient<S> {
    pub fn new(log: Arc<S>, config: Arc<ClientConfig>) -> Self {
        Self { log, config }
    }

    /// Only the companion repo follows the requested go branch; every other
    /// repo is read from master.
    pub fn committish(&self, repo: &str, go_branch: &str) -> String {
        let branch = if repo == self.config.companion_repo {
            go_branch
        } else {
            "master"
        };
        format!("refs/heads/{branch}")
    }

    /// List commits of `repo` at or after `since`.
    ///
    /// The listing stops entirely at the first commit strictly older than
    /// `since`. This relies on the log being in strictly descending commit
    /// time order within and across pages; an out-of-order log truncates the
    /// result without any error.
    pub fn list_commits(
        &self,
        repo: &str,
        go_branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Commit>, LuciError> {
        crate::trace_step!(self.config, repo, go_branch, "ListCommits");
        let committish = self.committish(repo, go_branch);
        let pager = Paginator::with_stop(
            |token: &str| -> Result<Page<GitCommit>, LuciError> {
                let resp = self.log.log(&LogRequest {
                    project: repo.to_string(),
                    committish: committish.clone(),
                    page_size: self.config.page_size,
                    page_token: token.to_string(),
                })?;
                Ok(Page::new(resp.log, resp.next_page_token))
            },
            |c: &GitCommit| c.committer_time < since,
        );
        pager
            .map(|c| {
                c.map(|c| Commit {
                    hash: c.id,
                    time: c.committer_time,
                })
            })
            .collect()
    }
}
