//! Builder discovery and filtering.

use std::sync::Arc;

use testtiming_core::{Builder, BuilderConfig, ClientConfig, Page, Paginator};

use crate::error::LuciError;
use crate::services::BuildService;
use crate::wire::{BuilderItem, ListBuildersRequest};

pub struct BuilderRegistry<B> {
    service: Arc<B>,
    config: Arc<ClientConfig>,
}

impl<B> Clone for BuilderRegistry<B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: BuildService> BuilderRegistry<B> {
    pub fn new(service: Arc<B>, config: Arc<ClientConfig>) -> Self {
        Self { service, config }
    }

    /// List the builders of the configured project/bucket, sorted by name.
    ///
    /// With `repo` and `go_branch` both empty every builder is returned;
    /// otherwise only those whose decoded config names exactly that pair. A
    /// non-empty `name` further keeps only the builder of that name.
    pub fn list_builders(
        &self,
        repo: &str,
        go_branch: &str,
        name: &str,
    ) -> Result<Vec<Builder>, LuciError> {
        crate::trace_step!(self.config, repo, go_branch, "ListBuilders");
        let all = repo.is_empty() && go_branch.is_empty();
        let items = Paginator::new(|token: &str| -> Result<Page<BuilderItem>, LuciError> {
            let resp = self.service.list_builders(&ListBuildersRequest {
                project: self.config.project.clone(),
                bucket: self.config.bucket.clone(),
                page_size: self.config.page_size,
                page_token: token.to_string(),
            })?;
            Ok(Page::new(resp.builders, resp.next_page_token))
        })
        .collect_all()?;

        let mut builders: Vec<Builder> = items
            .into_iter()
            .filter_map(|item| {
                let config = BuilderConfig::decode_or_default(&item.config.properties);
                if !all && !config.matches(repo, go_branch) {
                    return None;
                }
                let builder_name = item.id.builder;
                if !name.is_empty() && builder_name != name {
                    return None;
                }
                Some(Builder::new(builder_name, config))
            })
            .collect();
        builders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(builders)
    }
}
