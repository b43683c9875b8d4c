//! Arena of result tree nodes addressed by [`NodeId`]

use std::path::PathBuf;

use serde::Serialize;

use crate::tooling::types::{Dependency, ProjectNode};

/// Index of a node in a [`ProjectTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A project of the build, as shown in the result tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectEntry {
    pub name: String,
    pub path: String,
    pub build_file: Option<PathBuf>,
    pub status: Option<String>,
    pub error: Option<String>,
}

impl ProjectEntry {
    fn from_node(node: &ProjectNode) -> Self {
        Self {
            name: node.name.clone(),
            path: node.path.clone(),
            build_file: node.build_file.clone(),
            status: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Project(ProjectEntry),
    Dependency(Dependency),
    /// Dependency on another project of the same build
    ProjectReference { path: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

impl TreeNode {
    pub fn project(&self) -> Option<&ProjectEntry> {
        match &self.kind {
            NodeKind::Project(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn dependency(&self) -> Option<&Dependency> {
        match &self.kind {
            NodeKind::Dependency(dependency) => Some(dependency),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Project(entry) => entry.status.as_deref(),
            NodeKind::Dependency(dependency) => dependency.status.as_deref(),
            NodeKind::ProjectReference { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Project(entry) => entry.error.as_deref(),
            NodeKind::Dependency(dependency) => dependency.error.as_deref(),
            NodeKind::ProjectReference { .. } => None,
        }
    }
}

/// Result tree of a run: projects, their dependencies and project references
#[derive(Debug, Clone, Serialize)]
pub struct ProjectTree {
    nodes: Vec<TreeNode>,
}

impl ProjectTree {
    /// Tree holding only a root placeholder with the given status label
    pub fn placeholder(status: &str) -> Self {
        let root = ProjectEntry {
            path: ":".to_string(),
            status: Some(status.to_string()),
            ..Default::default()
        };
        Self {
            nodes: vec![TreeNode {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Project(root),
            }],
        }
    }

    /// Builds the project skeleton of a discovered build
    ///
    /// Returns the tree together with the node id assigned to every project,
    /// in pre-order.
    pub fn from_projects(root: &ProjectNode) -> (Self, Vec<(NodeId, &ProjectNode)>) {
        let mut tree = Self {
            nodes: vec![TreeNode {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Project(ProjectEntry::from_node(root)),
            }],
        };
        let mut ids = vec![(NodeId::ROOT, root)];
        tree.push_projects(NodeId::ROOT, root, &mut ids);
        (tree, ids)
    }

    fn push_projects<'a>(
        &mut self,
        parent: NodeId,
        node: &'a ProjectNode,
        ids: &mut Vec<(NodeId, &'a ProjectNode)>,
    ) {
        for child in &node.children {
            let id = self.push(parent, NodeKind::Project(ProjectEntry::from_node(child)));
            ids.push((id, child));
            self.push_projects(id, child, ids);
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.0)
    }

    pub(crate) fn project_mut(&mut self, id: NodeId) -> Option<&mut ProjectEntry> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Project(entry) => Some(entry),
            _ => None,
        }
    }

    pub(crate) fn dependency_mut(&mut self, id: NodeId) -> Option<&mut Dependency> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Dependency(dependency) => Some(dependency),
            _ => None,
        }
    }

    /// Appends a node under `parent` and returns its id
    pub(crate) fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&child| (child, &self.nodes[child.0]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Every dependency node of the tree
    pub fn dependencies(&self) -> impl Iterator<Item = (NodeId, &Dependency)> {
        self.iter()
            .filter_map(|(id, node)| node.dependency().map(|dependency| (id, dependency)))
    }

    /// Node of the project with the given build path
    pub fn find_project(&self, path: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.project().is_some_and(|entry| entry.path == path))
            .map(|(id, _)| id)
    }

    /// Returns true if no node carries a work-in-progress label
    pub fn is_settled(&self) -> bool {
        self.nodes.iter().all(|node| node.status().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> ProjectNode {
        let mut root = ProjectNode::new("demo", ":", PathBuf::from("/p"));
        let mut app = ProjectNode::new("app", ":app", PathBuf::from("/p/app"));
        app.children
            .push(ProjectNode::new("core", ":app:core", PathBuf::from("/p/app/core")));
        root.children.push(app);
        root.children
            .push(ProjectNode::new("lib", ":lib", PathBuf::from("/p/lib")));
        root
    }

    #[test]
    fn from_projects_assigns_ids_in_pre_order() {
        let root = build();

        let (tree, ids) = ProjectTree::from_projects(&root);

        let paths: Vec<_> = ids.iter().map(|(_, node)| node.path.as_str()).collect();
        assert_eq!(paths, vec![":", ":app", ":app:core", ":lib"]);
        assert_eq!(tree.len(), 4);
        assert_eq!(ids[0].0, NodeId::ROOT);

        let core = tree.find_project(":app:core").unwrap();
        assert_eq!(tree.get(core).unwrap().parent, tree.find_project(":app"));

        let root_children: Vec<_> = tree
            .children(NodeId::ROOT)
            .map(|(_, node)| node.project().unwrap().name.clone())
            .collect();
        assert_eq!(root_children, vec!["app", "lib"]);
    }

    #[test]
    fn push_links_child_to_parent() {
        let (mut tree, _) = ProjectTree::from_projects(&build());
        let lib = tree.find_project(":lib").unwrap();

        let id = tree.push(
            lib,
            NodeKind::Dependency(Dependency::new("org.x", "lib", Some("1.0"))),
        );

        assert_eq!(tree.get(lib).unwrap().children, vec![id]);
        assert_eq!(tree.dependencies().count(), 1);
        assert!(tree.dependency_mut(id).is_some());
        assert!(tree.project_mut(id).is_none());
    }

    #[test]
    fn placeholder_is_not_settled() {
        let tree = ProjectTree::placeholder("loading...");

        assert_eq!(tree.root().status(), Some("loading..."));
        assert!(!tree.is_settled());
    }
}
