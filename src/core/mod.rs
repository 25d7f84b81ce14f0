//! Domain model of a Gittxt scan: the pinned scan-result schema plus the
//! tree, selection, and filter types derived from it.

pub mod filter;
pub mod selection;
pub mod tree;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub use filter::{filter_categories, visible_leaves, Categories, DirectoryVisibility, FilterState};
pub use selection::SelectionSet;
pub use tree::{extension_of, join_path, TreeNode};

/// Per-file metadata, keyed by full path in [`ScanResult::manifest`].
/// Immutable for the lifetime of the displayed scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file_type: String,
    pub language: String,
    pub size_bytes: u64,
    pub size_readable: String,
    pub token_count: u64,
    pub tokens_readable: String,
}

/// Repository identity echoed back by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub repo_url: String,
    #[serde(default)]
    pub branch: Option<String>,
}

/// The complete result of a finished scan, fetched wholesale from the
/// service and treated as an immutable snapshot until the next scan.
///
/// One schema version is pinned here (the `manifest`/`treeObject`/
/// `categories`/`downloads` shape); responses from older service revisions
/// are not supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub repo_name: String,
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_size_bytes: u64,
    #[serde(default)]
    pub estimated_tokens: u64,
    #[serde(default)]
    pub file_type_breakdown: BTreeMap<String, u64>,
    #[serde(default)]
    pub tokens_by_type: BTreeMap<String, u64>,
    #[serde(default)]
    pub skipped_files: Vec<(String, String)>,
    #[serde(default)]
    pub manifest: HashMap<String, ManifestEntry>,
    /// Pre-rendered ASCII tree, used verbatim in the summary panel.
    #[serde(default)]
    pub tree: String,
    #[serde(rename = "treeObject")]
    pub tree_object: TreeNode,
    #[serde(default)]
    pub categories: Categories,
    pub summary: RepoSummary,
    /// Artifact format -> download URL, as produced by the service.
    #[serde(default)]
    pub downloads: BTreeMap<String, String>,
}

impl ScanResult {
    /// The distinct `file_type` labels present in the manifest, sorted for
    /// stable filter chips in the UI.
    pub fn available_file_types(&self) -> Vec<String> {
        self.manifest
            .values()
            .map(|entry| entry.file_type.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Lifecycle states the service reports for a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    #[default]
    Queued,
    Running,
    Done,
    Error,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Done | ScanState::Error)
    }
}

/// A progress snapshot, polled from the service while a scan runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    #[serde(default)]
    pub status: ScanState,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub current_file: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_result_parses_the_pinned_schema() {
        let json = r#"{
            "repo_name": "demo",
            "total_files": 2,
            "total_size_bytes": 512,
            "estimated_tokens": 120,
            "file_type_breakdown": {"py": 1, "txt": 1},
            "tokens_by_type": {"py": 100, "txt": 20},
            "skipped_files": [["big.bin", "size limit"]],
            "manifest": {
                "demo/a.py": {
                    "file_type": "py",
                    "language": "Python",
                    "size_bytes": 400,
                    "size_readable": "400 B",
                    "token_count": 100,
                    "tokens_readable": "100"
                }
            },
            "tree": "demo/\n|-- a.py\n",
            "treeObject": {"name": "demo", "children": [{"name": "a.py"}]},
            "categories": {"Python": {"core": ["demo/a.py"]}},
            "summary": {"repo_url": "https://github.com/acme/demo", "branch": "main"},
            "downloads": {"txt": "/artifacts/abc/txt"}
        }"#;

        let result: ScanResult = serde_json::from_str(json).expect("scan result json");
        assert_eq!(result.repo_name, "demo");
        assert_eq!(result.manifest["demo/a.py"].token_count, 100);
        assert_eq!(result.tree_object.name, "demo");
        assert_eq!(result.available_file_types(), vec!["py"]);
        assert_eq!(result.summary.branch.as_deref(), Some("main"));
    }

    #[test]
    fn scan_state_parses_lowercase_and_flags_terminals() {
        let state: ScanState = serde_json::from_str("\"running\"").expect("state");
        assert_eq!(state, ScanState::Running);
        assert!(!state.is_terminal());
        assert!(ScanState::Done.is_terminal());
        assert!(ScanState::Error.is_terminal());
    }
}
