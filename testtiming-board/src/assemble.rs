//! Dashboard assembly.
//!
//! Phase 1 lists commits and builders once. Phase 2 fans out one unit per
//! builder (fetch builds, then reconcile), at most `max_parallelism` at a time.
//! Each unit returns its own map; nothing is shared between units, so the
//! fan-in needs no lock. The first failing unit cancels its siblings and its
//! error is the result. Phase 3 lays the maps out as the builder × commit
//! matrix, stamping each cell with the commit log's time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use testtiming_core::{BuildResult, Builder, ClientConfig, Commit, Dashboard, Project};
use testtiming_luci::{
    trace_step, BuildFetcher, BuildService, BuilderRegistry, SourceLog, SourceLogClient,
};

use crate::error::BoardError;
use crate::reconcile::ResultReconciler;

/// One builder's reconciled results, keyed by commit hash.
pub type BuilderResults = HashMap<String, BuildResult>;

pub struct DashboardAssembler<S, B> {
    commits: SourceLogClient<S>,
    builders: BuilderRegistry<B>,
    builds: BuildFetcher<B>,
    config: Arc<ClientConfig>,
}

impl<S, B> DashboardAssembler<S, B>
where
    S: SourceLog + 'static,
    B: BuildService + 'static,
{
    pub fn new(source_log: Arc<S>, build_service: Arc<B>, config: Arc<ClientConfig>) -> Self {
        Self {
            commits: SourceLogClient::new(source_log, Arc::clone(&config)),
            builders: BuilderRegistry::new(Arc::clone(&build_service), Arc::clone(&config)),
            builds: BuildFetcher::new(build_service, Arc::clone(&config)),
            config,
        }
    }

    /// Build the dashboard of `project` over builds created since `since`.
    ///
    /// A non-empty `builder` restricts the dashboard to that one builder.
    /// On error nothing is returned; there is no partial dashboard.
    pub async fn read_board(
        &self,
        project: Project,
        builder: &str,
        since: DateTime<Utc>,
    ) -> Result<Dashboard, BoardError> {
        trace_step!(self.config, repo = %project.repo, branch = %project.branch, "ReadBoard");

        let commits = {
            let client = self.commits.clone();
            let (repo, branch) = (project.repo.clone(), project.branch.clone());
            tokio::task::spawn_blocking(move || client.list_commits(&repo, &branch, since))
                .await??
        };
        let builders = {
            let registry = self.builders.clone();
            let (repo, branch, name) = (
                project.repo.clone(),
                project.branch.clone(),
                builder.to_string(),
            );
            tokio::task::spawn_blocking(move || registry.list_builders(&repo, &branch, &name))
                .await??
        };
        tracing::debug!(
            commits = commits.len(),
            builders = builders.len(),
            "listed commits and builders"
        );

        let per_builder = self.fetch_results(&project.repo, &builders, since).await?;
        let results = layout(&commits, per_builder);

        let dash = Dashboard {
            project,
            builders,
            commits,
            results,
        };
        debug_assert!(dash.check_invariants().is_ok());
        Ok(dash)
    }

    /// Phase 2. The returned maps are in `builders` order.
    async fn fetch_results(
        &self,
        repo: &str,
        builders: &[Builder],
        since: DateTime<Utc>,
    ) -> Result<Vec<BuilderResults>, BoardError> {
        let reconciler = ResultReconciler::new(repo, &self.config);
        let limit = Arc::new(Semaphore::new(self.config.max_parallelism.max(1)));
        let cancel = CancellationToken::new();

        let mut units = JoinSet::new();
        for (index, builder) in builders.iter().enumerate() {
            let builder = builder.clone();
            let fetcher = self.builds.clone();
            let reconciler = reconciler.clone();
            let limit = Arc::clone(&limit);
            let cancel = cancel.clone();
            units.spawn(async move {
                let _permit = limit
                    .acquire_owned()
                    .await
                    .map_err(|_| BoardError::Cancelled)?;
                if cancel.is_cancelled() {
                    return Err(BoardError::Cancelled);
                }
                let results = tokio::task::spawn_blocking(move || {
                    let builds = fetcher.get_builds(&builder.name, since, &cancel)?;
                    reconciler.reconcile(&builder, builds)
                })
                .await??;
                Ok::<_, BoardError>((index, results))
            });
        }

        let mut slots: Vec<Option<BuilderResults>> = builders.iter().map(|_| None).collect();
        while let Some(joined) = units.join_next().await {
            match joined.map_err(BoardError::from).and_then(|unit| unit) {
                Ok((index, results)) => slots[index] = Some(results),
                Err(err) => {
                    cancel.cancel();
                    units.abort_all();
                    while units.join_next().await.is_some() {}
                    tracing::warn!(error = %err, "builder unit failed, cancelled the rest");
                    return Err(err);
                }
            }
        }
        Ok(slots.into_iter().map(Option::unwrap_or_default).collect())
    }
}

/// Phase 3: one row per builder map, one column per commit.
pub fn layout(commits: &[Commit], per_builder: Vec<BuilderResults>) -> Vec<Vec<Option<BuildResult>>> {
    per_builder
        .into_iter()
        .map(|mut by_commit| {
            commits
                .iter()
                .map(|commit| {
                    by_commit.remove(&commit.hash).map(|mut result| {
                        result.commit_time = commit.time;
                        result
                    })
                })
                .collect()
        })
        .collect()
}
