//! Projects report parser
//!
//! Builds the project tree from the output of the build tool's `projects` task.
//!
//! Format example:
//! ```text
//! Root project 'demo'
//! +--- Project ':app'
//! |    \--- Project ':app:core'
//! \--- Project ':lib' - Shared code
//! ```

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::tooling::types::ProjectNode;

/// Parser for projects reports
pub struct ProjectsReportParser {
    /// Regex for the root line: `Root project 'demo'`
    root_re: Regex,
    /// Regex for a sub-project line at any depth: `|    +--- Project ':app'`
    project_re: Regex,
}

impl ProjectsReportParser {
    pub fn new() -> Self {
        Self {
            root_re: Regex::new(r"^Root project '([^']*)'").unwrap(),
            project_re: Regex::new(r"^[|\s]*[+\\]--- Project '([^']+)'").unwrap(),
        }
    }

    /// Parses the report into a project tree rooted at `root_dir`
    ///
    /// Nesting follows the project paths (`:app:core` is a child of `:app`).
    /// Returns None when the report does not mention the root project.
    pub fn parse(&self, report: &str, root_dir: &Path) -> Option<ProjectNode> {
        let mut root_name: Option<String> = None;
        let mut paths: Vec<String> = Vec::new();

        for line in report.lines() {
            if let Some(caps) = self.root_re.captures(line) {
                root_name.get_or_insert_with(|| caps[1].to_string());
            } else if let Some(caps) = self.project_re.captures(line) {
                let path = normalize_path(&caps[1]);
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }

        let root_name = root_name?;

        let mut children_of: HashMap<String, Vec<String>> = HashMap::new();
        for path in &paths {
            let parent = parent_path(path, &paths);
            children_of.entry(parent).or_default().push(path.clone());
        }

        let mut root = ProjectNode::new(&root_name, ":", root_dir.to_path_buf());
        root.children = build_children(":", root_dir, &children_of);
        Some(root)
    }
}

impl Default for ProjectsReportParser {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with(':') {
        path.to_string()
    } else {
        format!(":{}", path)
    }
}

/// Closest listed ancestor of `path`, or the root
fn parent_path(path: &str, known: &[String]) -> String {
    let mut current = path;
    while let Some(index) = current.rfind(':') {
        current = &current[..index];
        if current.is_empty() {
            break;
        }
        if known.iter().any(|p| p == current) {
            return current.to_string();
        }
    }
    ":".to_string()
}

fn build_children(
    parent: &str,
    root_dir: &Path,
    children_of: &HashMap<String, Vec<String>>,
) -> Vec<ProjectNode> {
    let Some(children) = children_of.get(parent) else {
        return Vec::new();
    };

    children
        .iter()
        .map(|path| {
            let dir = path
                .split(':')
                .filter(|segment| !segment.is_empty())
                .fold(root_dir.to_path_buf(), |dir, segment| dir.join(segment));
            let name = path.rsplit(':').next().unwrap_or(path);
            let mut node = ProjectNode::new(name, path, dir);
            node.children = build_children(path, root_dir, children_of);
            node
        })
        .collect()
}
