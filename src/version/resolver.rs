//! Latest version lookup across the configured repositories
//!
//! Repositories are queried in priority order and the first one that yields a
//! usable version wins. A usable version is the `release` or `latest` tag of
//! the metadata when it passes the stability filter, otherwise the highest
//! listed version that does.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::tooling::types::{Dependency, ModuleId};
use crate::version::compare::compare_versions;
use crate::version::error::LookupError;
use crate::version::metadata::ModuleMetadata;
use crate::version::repository::{MavenRepository, Repository, build_client};
use crate::version::stability::StabilityFilter;

pub struct MetadataResolver {
    repositories: Vec<Arc<dyn Repository>>,
    filter: StabilityFilter,
}

impl MetadataResolver {
    pub fn new(repositories: Vec<Arc<dyn Repository>>, filter: StabilityFilter) -> Self {
        Self {
            repositories,
            filter,
        }
    }

    /// Builds a resolver over the active repositories of `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = build_client(settings.accept_invalid_certs)?;
        let repositories = settings
            .active_repositories()
            .map(|repo| {
                Arc::new(MavenRepository::new(&repo.name, &repo.url, client.clone()))
                    as Arc<dyn Repository>
            })
            .collect();
        let filter = StabilityFilter::new(settings.ignore_unstable, &settings.unstable_patterns);
        Ok(Self::new(repositories, filter))
    }

    /// Picks the candidate latest version out of a metadata document
    pub fn select_candidate(&self, metadata: &ModuleMetadata) -> Option<String> {
        let tagged = [metadata.release.as_deref(), metadata.latest.as_deref()]
            .into_iter()
            .flatten()
            .find(|version| !version.trim().is_empty() && self.filter.is_stable(version));

        if let Some(version) = tagged {
            return Some(version.to_string());
        }

        metadata
            .versions
            .iter()
            .filter(|version| !version.trim().is_empty() && self.filter.is_stable(version))
            .max_by(|a, b| compare_versions(a, b))
            .cloned()
    }

    /// Finds the latest usable version of `module`
    ///
    /// Returns the candidate without comparing it to any declared version;
    /// see [`Dependency::apply_latest`].
    pub async fn find_latest(&self, module: &ModuleId) -> Result<String, LookupError> {
        let mut last_error = None;

        for repository in &self.repositories {
            match repository.fetch_metadata(module).await {
                Ok(metadata) => match self.select_candidate(&metadata) {
                    Some(version) => {
                        debug!("{} resolved {} to {}", repository.name(), module, version);
                        return Ok(version);
                    }
                    None => {
                        debug!("{} has no usable version of {}", repository.name(), module);
                        last_error = Some(LookupError::NoStableVersion {
                            repository: repository.name(),
                        });
                    }
                },
                Err(e) => {
                    warn!("Lookup of {} in {} failed: {}", module, repository.name(), e);
                    last_error = Some(e);
                }
            }
        }

        match (last_error, self.repositories.len()) {
            (None, _) => Err(LookupError::NoRepositories),
            (Some(e), 1) => Err(e),
            (Some(e), tried) => Err(LookupError::Exhausted {
                tried,
                last: Box::new(e),
            }),
        }
    }

    /// Updates `dependency` in place with the lookup result
    ///
    /// `latest_version` is set only when a strictly newer version exists;
    /// `status` is cleared in every case.
    pub async fn check_for_update(&self, dependency: &mut Dependency) {
        if let Some(module) = dependency.module_id() {
            let result = self.find_latest(&module).await.map_err(|e| e.to_string());
            dependency.record_lookup(result.as_deref().map_err(String::as_str));
        } else {
            dependency.status = None;
        }
    }
}
