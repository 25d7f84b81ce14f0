//! The repository tree model supplied wholesale by the scan service.
//!
//! A node carrying `children` is a directory, a node without is a file. The
//! service emits children in its own order and that order is preserved all
//! the way to the UI; nothing here sorts.

use serde::{Deserialize, Serialize};

/// A single node of the scanned repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// A file is any node the service emitted without a `children` array.
    /// A directory keeps its `children` even when the array is empty.
    pub fn is_file(&self) -> bool {
        self.children.is_none()
    }

    /// Walks the subtree rooted at this node, visiting every node exactly
    /// once in source order. The visitor receives each node together with its
    /// full path; the root's path is its own name.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&TreeNode, &str),
    {
        fn go<F: FnMut(&TreeNode, &str)>(node: &TreeNode, path: &str, visit: &mut F) {
            visit(node, path);
            if let Some(children) = &node.children {
                for child in children {
                    let child_path = join_path(path, &child.name);
                    go(child, &child_path, visit);
                }
            }
        }
        go(self, &self.name, &mut visit);
    }

    /// Full paths of all file nodes below (and including) this node, in
    /// source order.
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.walk(|node, path| {
            if node.is_file() {
                paths.push(path.to_string());
            }
        });
        paths
    }
}

/// Joins a parent path and a child name with a single `/`.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// The extension of a file name: everything after the final `.`, or the
/// empty string when the name has no dot at all.
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => "",
    }
}
