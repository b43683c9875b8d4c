//! In-memory build tool collaborator

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use dependency_updates::tooling::error::{DiscoveryError, ListingError};
use dependency_updates::tooling::provider::{DependencyReportProvider, ProjectInfoProvider};
use dependency_updates::tooling::types::ProjectNode;

/// Build with a fixed project tree and canned dependency reports
pub struct FakeBuild {
    root: Option<ProjectNode>,
    reports: HashMap<String, Result<String, String>>,
    listed: Mutex<Vec<String>>,
}

impl FakeBuild {
    /// Build whose root project `name` has a build file
    pub fn new(name: &str) -> Self {
        Self {
            root: Some(project(name, ":", true)),
            reports: HashMap::new(),
            listed: Mutex::new(Vec::new()),
        }
    }

    /// Build whose project discovery fails
    pub fn broken() -> Self {
        Self {
            root: None,
            reports: HashMap::new(),
            listed: Mutex::new(Vec::new()),
        }
    }

    /// Adds a project below the root; `path` is `:name`
    pub fn with_project(mut self, path: &str, with_build_file: bool) -> Self {
        if let Some(root) = &mut self.root {
            let name = path.trim_start_matches(':');
            root.children.push(project(name, path, with_build_file));
        }
        self
    }

    pub fn with_report(mut self, path: &str, report: String) -> Self {
        self.reports.insert(path.to_string(), Ok(report));
        self
    }

    pub fn with_failing_report(mut self, path: &str, stderr: &str) -> Self {
        self.reports.insert(path.to_string(), Err(stderr.to_string()));
        self
    }

    /// Project paths whose report was requested, in request order
    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }
}

fn project(name: &str, path: &str, with_build_file: bool) -> ProjectNode {
    let dir = PathBuf::from("/build").join(name);
    let mut node = ProjectNode::new(name, path, dir.clone());
    if with_build_file {
        node.build_file = Some(dir.join("build.gradle.kts"));
    }
    node
}

#[async_trait]
impl ProjectInfoProvider for FakeBuild {
    async fn project_info(&self, root_dir: &Path) -> Result<ProjectNode, DiscoveryError> {
        self.root.clone().ok_or_else(|| DiscoveryError::BuildFailed {
            status: "exit status: 1".to_string(),
            stderr: format!("Could not configure {}", root_dir.display()),
        })
    }
}

#[async_trait]
impl DependencyReportProvider for FakeBuild {
    async fn dependency_report(
        &self,
        _root_dir: &Path,
        project: &ProjectNode,
    ) -> Result<String, ListingError> {
        self.listed.lock().unwrap().push(project.path.clone());
        match self.reports.get(&project.path) {
            Some(Ok(report)) => Ok(report.clone()),
            Some(Err(stderr)) => Err(ListingError::BuildFailed {
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}
