//! Collaborator traits for the build tool, and the walker/lister built on them

use std::path::Path;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::tooling::error::{DiscoveryError, ListingError};
use crate::tooling::report::DependencyReportParser;
use crate::tooling::types::{Dependency, ProjectNode};

/// Describes the project structure of a build
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ProjectInfoProvider: Send + Sync {
    /// Returns the project tree of the build rooted at `root_dir`
    async fn project_info(&self, root_dir: &Path) -> Result<ProjectNode, DiscoveryError>;
}

/// Produces the raw dependency report of a single project
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait DependencyReportProvider: Send + Sync {
    /// Returns the textual dependency report for `project`
    ///
    /// # Arguments
    /// * `root_dir` - Root directory of the build
    /// * `project` - The project whose dependencies are listed
    async fn dependency_report(
        &self,
        root_dir: &Path,
        project: &ProjectNode,
    ) -> Result<String, ListingError>;
}

/// Obtains the recursive project structure of a build
#[derive(Clone)]
pub struct ProjectTreeWalker {
    provider: Arc<dyn ProjectInfoProvider>,
}

impl ProjectTreeWalker {
    pub fn new(provider: Arc<dyn ProjectInfoProvider>) -> Self {
        Self { provider }
    }

    pub async fn walk(&self, root_dir: &Path) -> Result<ProjectNode, DiscoveryError> {
        let root = self.provider.project_info(root_dir).await?;
        debug!(
            "Discovered {} projects under {:?}",
            root.iter().count(),
            root_dir
        );
        Ok(root)
    }
}

/// Lists the first-level dependencies of a project
#[derive(Clone)]
pub struct ModuleDependencyLister {
    provider: Arc<dyn DependencyReportProvider>,
    parser: Arc<DependencyReportParser>,
}

impl ModuleDependencyLister {
    pub fn new(provider: Arc<dyn DependencyReportProvider>) -> Self {
        Self {
            provider,
            parser: Arc::new(DependencyReportParser::new()),
        }
    }

    pub async fn list(
        &self,
        root_dir: &Path,
        project: &ProjectNode,
    ) -> Result<Vec<Dependency>, ListingError> {
        let report = self.provider.dependency_report(root_dir, project).await?;
        let dependencies = self.parser.parse(&report);
        debug!(
            "Listed {} dependencies for {}",
            dependencies.len(),
            project.path
        );
        Ok(dependencies)
    }
}
