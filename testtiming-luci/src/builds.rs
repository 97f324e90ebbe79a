//! Build search for one builder.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use testtiming_core::{ClientConfig, Page, Paginator};

use crate::error::LuciError;
use crate::services::BuildService;
use crate::wire::{Build, BuildMask, BuildPredicate, BuilderId, SearchBuildsRequest, TimeRange};

/// The only build fields requested. Full build records are large; keep this
/// list minimal.
pub const BUILD_FIELDS: &[&str] = &[
    "id", "builder", "output", "status", "steps", "infra", "endTime",
];

pub struct BuildFetcher<B> {
    service: Arc<B>,
    config: Arc<ClientConfig>,
}

impl<B> Clone for BuildFetcher<B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: BuildService> BuildFetcher<B> {
    pub fn new(service: Arc<B>, config: Arc<ClientConfig>) -> Self {
        Self { service, config }
    }

    /// Fetch every build of `builder` created at or after `since`.
    ///
    /// `cancel` is checked before each page request; once it fires the
    /// listing ends with [`LuciError::Cancelled`].
    pub fn get_builds(
        &self,
        builder: &str,
        since: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Build>, LuciError> {
        crate::trace_step!(self.config, builder, "GetBuilds");
        let predicate = BuildPredicate {
            builder: BuilderId {
                project: self.config.project.clone(),
                bucket: self.config.bucket.clone(),
                builder: builder.to_string(),
            },
            create_time: TimeRange { start_time: since },
        };
        let mask = BuildMask {
            fields: BUILD_FIELDS.join(","),
        };
        Paginator::new(|token: &str| -> Result<Page<Build>, LuciError> {
            if cancel.is_cancelled() {
                return Err(LuciError::Cancelled);
            }
            let resp = self.service.search_builds(&SearchBuildsRequest {
                predicate: predicate.clone(),
                mask: mask.clone(),
                page_size: self.config.page_size,
                page_token: token.to_string(),
            })?;
            Ok(Page::new(resp.builds, resp.next_page_token))
        })
        .collect_all()
    }
}
