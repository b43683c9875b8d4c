//! Common types shared by the report parsers, the resolver and the engine

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::version::compare::is_newer;

/// Group used by parsed entries that point at another project in the same build
pub const PROJECT_GROUP: &str = "project";

/// Identity of an external module, independent of its version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A first-level dependency declared by a project
///
/// Equality and hashing cover group, name and version only. Use
/// [`Dependency::module_id`] when two records must be matched regardless of
/// their declared versions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dependency {
    pub group: Option<String>,
    pub name: String,
    pub version: Option<String>,
    /// Set only when a newer version than `version` is known
    pub latest_version: Option<String>,
    /// Work-in-progress label, cleared as soon as the async work completes
    pub status: Option<String>,
    pub error: Option<String>,
}

impl Dependency {
    pub fn new(group: &str, name: &str, version: Option<&str>) -> Self {
        Self {
            group: Some(group.to_string()),
            name: name.to_string(),
            version: version.map(|v| v.to_string()),
            ..Default::default()
        }
    }

    /// A reference to another project of the same build (e.g. `project :core`)
    pub fn project_reference(path: &str) -> Self {
        Self {
            group: None,
            name: path.to_string(),
            ..Default::default()
        }
    }

    /// Returns true when this record points at a project of the same build
    /// instead of an external artifact
    pub fn is_project_reference(&self) -> bool {
        match self.group.as_deref() {
            None => true,
            Some(group) => group == PROJECT_GROUP,
        }
    }

    /// Module identity, or None for project references
    pub fn module_id(&self) -> Option<ModuleId> {
        if self.is_project_reference() {
            return None;
        }
        self.group
            .as_deref()
            .map(|group| ModuleId::new(group, self.name.as_str()))
    }

    /// Returns true when the record declares a version and names an external module
    pub fn is_checkable(&self) -> bool {
        !self.is_project_reference() && self.version.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Records `candidate` as the latest version when it is strictly newer
    /// than the declared one; otherwise clears `latest_version`
    pub fn apply_latest(&mut self, candidate: Option<&str>) {
        self.latest_version = match (self.version.as_deref(), candidate) {
            (Some(current), Some(candidate)) if is_newer(current, candidate) => {
                Some(candidate.to_string())
            }
            _ => None,
        };
    }

    /// Writes the outcome of a latest version lookup and clears `status`
    pub fn record_lookup(&mut self, result: Result<&str, &str>) {
        match result {
            Ok(candidate) => {
                self.apply_latest(Some(candidate));
                self.error = None;
            }
            Err(message) => {
                self.latest_version = None;
                self.error = Some(message.to_string());
            }
        }
        self.status = None;
    }

    pub fn has_update(&self) -> bool {
        self.latest_version.is_some()
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group && self.name == other.name && self.version == other.version
    }
}

impl Eq for Dependency {}

impl std::hash::Hash for Dependency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.group.hash(state);
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_project_reference() {
            return write!(f, "project {}", self.name);
        }
        let group = self.group.as_deref().unwrap_or_default();
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", group, self.name, version),
            None => write!(f, "{}:{}", group, self.name),
        }
    }
}

/// One project of a multi-project build, as reported by the build tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectNode {
    /// Display name (the root project name, or the last path segment)
    pub name: String,
    /// Build tool path, `:` for the root and `:app:core` style below it
    pub path: String,
    /// Directory containing the project
    pub dir: PathBuf,
    /// Build script location, None when the project has no build file
    pub build_file: Option<PathBuf>,
    pub children: Vec<ProjectNode>,
}

impl ProjectNode {
    pub fn new(name: &str, path: &str, dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            dir,
            build_file: None,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path == ":"
    }

    /// Copy of this node without its subprojects
    pub fn detached(&self) -> ProjectNode {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            dir: self.dir.clone(),
            build_file: self.build_file.clone(),
            children: Vec::new(),
        }
    }

    /// Pre-order iterator over this node and all of its descendants
    pub fn iter(&self) -> impl Iterator<Item = &ProjectNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}
