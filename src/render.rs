//! Text and JSON renderings of a result tree

use serde_json::{Value, json};

use crate::engine::tree::{NodeId, NodeKind, ProjectTree, TreeNode};

/// Single line label of a node
pub fn node_label(node: &TreeNode) -> String {
    let mut label = match &node.kind {
        NodeKind::Project(entry) => {
            if entry.name.is_empty() {
                entry.path.clone()
            } else {
                format!("{} ({})", entry.name, entry.path)
            }
        }
        NodeKind::Dependency(dependency) => match &dependency.latest_version {
            Some(latest) => format!("{} -> {}", dependency, latest),
            None => dependency.to_string(),
        },
        NodeKind::ProjectReference { path } => format!("project {}", path),
    };

    if let Some(status) = node.status() {
        label.push_str(&format!(" [{}]", status));
    }
    if let Some(error) = node.error() {
        label.push_str(&format!(" (error: {})", error));
    }
    label
}

/// Box-drawing tree, one node per line
pub fn render_text(tree: &ProjectTree) -> String {
    let mut out = node_label(tree.root());
    out.push('\n');
    render_children(tree, NodeId::ROOT, "", &mut out);
    out
}

fn render_children(tree: &ProjectTree, id: NodeId, prefix: &str, out: &mut String) {
    let children: Vec<_> = tree.children(id).collect();
    let count = children.len();

    for (index, (child_id, child)) in children.into_iter().enumerate() {
        let last = index + 1 == count;
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&node_label(child));
        out.push('\n');
        render_children(tree, child_id, &format!("{}{}", prefix, indent), out);
    }
}

/// Nested JSON document of the tree
pub fn render_json(tree: &ProjectTree) -> Value {
    node_json(tree, NodeId::ROOT)
}

fn node_json(tree: &ProjectTree, id: NodeId) -> Value {
    let mut value = tree
        .get(id)
        .and_then(|node| serde_json::to_value(&node.kind).ok())
        .unwrap_or(Value::Null);

    let children: Vec<Value> = tree
        .children(id)
        .map(|(child, _)| node_json(tree, child))
        .collect();
    if !children.is_empty()
        && let Some(object) = value.as_object_mut()
    {
        object.insert("children".to_string(), json!(children));
    }
    value
}
