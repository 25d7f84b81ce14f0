//! Responsible for transforming the `AppState` into a `UiState` view model.
//!
//! This module acts as a presentation layer, preparing data specifically for
//! consumption by the UI. It applies the filter predicate while building the
//! tree (a filtered-out file produces no node at all, not a hidden one),
//! derives the filtered category view, and computes display counts.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::state::{AppState, SessionPhase};
use crate::config::AppConfig;
use crate::core::{
    filter_categories, join_path, visible_leaves, Categories, DirectoryVisibility, FilterState,
    ManifestEntry, ScanProgress, SelectionSet, TreeNode,
};

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
pub struct UiState {
    pub config: AppConfig,
    /// `"idle"`, `"scanning"`, `"ready"`, or `"failed"`.
    pub phase: String,
    pub scan_id: Option<String>,
    pub repo_name: Option<String>,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub progress: ScanProgress,
    pub error: Option<String>,
    pub status_message: String,
    /// The filtered repository tree; empty until a result is loaded.
    pub tree: Vec<UiNode>,
    /// The unscanned exploration tree, when the user browsed before scanning.
    pub explored_tree: Vec<UiNode>,
    /// Language -> category -> paths, with the current filter applied.
    pub categories: Categories,
    /// Filter chips offered to the user.
    pub file_extensions: Vec<String>,
    pub filter: FilterState,
    pub total_files: u64,
    pub visible_files_count: usize,
    pub selected_files_count: usize,
    pub preview_path: Option<String>,
    pub summary: Option<SummaryView>,
    pub downloads: BTreeMap<String, String>,
}

/// Aggregates shown in the summary panel once a scan is ready.
#[derive(Serialize, Clone, Debug)]
pub struct SummaryView {
    pub total_size_bytes: u64,
    pub estimated_tokens: u64,
    pub file_type_breakdown: BTreeMap<String, u64>,
    pub tokens_by_type: BTreeMap<String, u64>,
    pub skipped_files: Vec<(String, String)>,
    pub ascii_tree: String,
}

/// A serializable representation of a single node in the file tree for the UI.
#[derive(Serialize, Clone, Debug)]
pub struct UiNode {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub is_selected: bool,
    pub is_expanded: bool,
    pub is_previewed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<NodeMeta>,
    pub children: Vec<UiNode>,
}

/// Manifest metadata attached to file nodes for tooltips.
#[derive(Serialize, Clone, Debug)]
pub struct NodeMeta {
    pub file_type: String,
    pub language: String,
    pub size_readable: String,
    pub tokens_readable: String,
}

impl From<&ManifestEntry> for NodeMeta {
    fn from(entry: &ManifestEntry) -> Self {
        Self {
            file_type: entry.file_type.clone(),
            language: entry.language.clone(),
            size_readable: entry.size_readable.clone(),
            tokens_readable: entry.tokens_readable.clone(),
        }
    }
}

/// Everything the tree builder needs besides the nodes themselves.
struct TreeContext<'a> {
    filter: &'a FilterState,
    selection: &'a SelectionSet,
    collapsed: &'a HashSet<String>,
    preview_path: Option<&'a str>,
    manifest: &'a HashMap<String, ManifestEntry>,
    visibility: DirectoryVisibility,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let empty_manifest = HashMap::new();
    let result = state.phase.result();

    let ctx = TreeContext {
        filter: &state.filter,
        selection: &state.selection,
        collapsed: &state.collapsed_dirs,
        preview_path: state.preview_path.as_deref(),
        manifest: result.map_or(&empty_manifest, |r| &r.manifest),
        visibility: state.config.directory_visibility,
    };

    let tree = result.map_or_else(Vec::new, |r| build_tree_view(&r.tree_object, &ctx));

    // The exploration tree predates any scan, so it renders without manifest
    // metadata but through the same filter and expansion state.
    let explored_ctx = TreeContext {
        filter: &state.filter,
        selection: &state.selection,
        collapsed: &state.collapsed_dirs,
        preview_path: None,
        manifest: &empty_manifest,
        visibility: state.config.directory_visibility,
    };
    let explored_tree = state
        .explored
        .as_ref()
        .map_or_else(Vec::new, |p| build_tree_view(&p.tree, &explored_ctx));

    let categories = result.map_or_else(Categories::new, |r| {
        filter_categories(&r.categories, &state.filter, &state.selection)
    });

    let visible_files_count = result.map_or(0, |r| {
        visible_leaves(&r.tree_object, &state.filter, &state.selection).len()
    });

    let mut file_extensions: Vec<String> = result
        .map(|r| r.available_file_types())
        .unwrap_or_default();
    if let Some(explored) = &state.explored {
        for ext in &explored.file_extensions {
            if !file_extensions.contains(ext) {
                file_extensions.push(ext.clone());
            }
        }
        file_extensions.sort();
    }

    let (phase, progress, error) = match &state.phase {
        SessionPhase::Idle => ("idle", ScanProgress::default(), None),
        SessionPhase::Scanning { progress, .. } => ("scanning", progress.clone(), None),
        SessionPhase::Ready { .. } => ("ready", ScanProgress::default(), None),
        SessionPhase::Failed { message } => {
            ("failed", ScanProgress::default(), Some(message.clone()))
        }
    };

    let status_message = match &state.phase {
        SessionPhase::Idle => "Ready.".to_string(),
        SessionPhase::Scanning { progress, .. } => {
            if progress.current_file.is_empty() {
                format!("Scanning... {:.0}%", progress.progress)
            } else {
                format!(
                    "Scanning... {:.0}% ({})",
                    progress.progress, progress.current_file
                )
            }
        }
        SessionPhase::Ready { result, .. } => format!(
            "Scan complete. {} files, {} visible.",
            result.total_files, visible_files_count
        ),
        SessionPhase::Failed { message } => format!("Scan failed: {message}"),
    };

    UiState {
        config: state.config.clone(),
        phase: phase.to_string(),
        scan_id: state.phase.scan_id().map(str::to_string),
        repo_name: result.map(|r| r.repo_name.clone()),
        repo_url: result.map(|r| r.summary.repo_url.clone()),
        branch: result.and_then(|r| r.summary.branch.clone()),
        progress,
        error,
        status_message,
        tree,
        explored_tree,
        categories,
        file_extensions,
        filter: state.filter.clone(),
        total_files: result.map_or(0, |r| r.total_files),
        visible_files_count,
        selected_files_count: state.selection.len(),
        preview_path: state.preview_path.clone(),
        summary: result.map(|r| SummaryView {
            total_size_bytes: r.total_size_bytes,
            estimated_tokens: r.estimated_tokens,
            file_type_breakdown: r.file_type_breakdown.clone(),
            tokens_by_type: r.tokens_by_type.clone(),
            skipped_files: r.skipped_files.clone(),
            ascii_tree: r.tree.clone(),
        }),
        downloads: result.map_or_else(BTreeMap::new, |r| r.downloads.clone()),
    }
}

/// Builds the renderable tree for a root node. The root's path is its own
/// name; children keep their source order throughout.
fn build_tree_view(root: &TreeNode, ctx: &TreeContext<'_>) -> Vec<UiNode> {
    build_node(root, root.name.clone(), ctx).map_or_else(Vec::new, |node| vec![node])
}

fn build_node(node: &TreeNode, path: String, ctx: &TreeContext<'_>) -> Option<UiNode> {
    match &node.children {
        None => {
            // A filtered-out file is skipped entirely; consumers counting
            // rendered nodes must not see it.
            if !ctx.filter.allows_file(&node.name, &path, ctx.selection) {
                return None;
            }
            Some(UiNode {
                name: node.name.clone(),
                is_selected: ctx.selection.contains(&path),
                is_expanded: false,
                is_previewed: ctx.preview_path == Some(path.as_str()),
                is_directory: false,
                meta: ctx.manifest.get(&path).map(NodeMeta::from),
                children: Vec::new(),
                path,
            })
        }
        Some(children) => {
            let built: Vec<UiNode> = children
                .iter()
                .filter_map(|child| {
                    let child_path = join_path(&path, &child.name);
                    build_node(child, child_path, ctx)
                })
                .collect();

            // Directories are never extension-filtered. Hiding one that lost
            // all descendants is an explicit configuration choice.
            if built.is_empty() && ctx.visibility == DirectoryVisibility::HideWhenEmpty {
                return None;
            }

            Some(UiNode {
                name: node.name.clone(),
                is_selected: false,
                is_expanded: !ctx.collapsed.contains(&path),
                is_previewed: false,
                is_directory: true,
                meta: None,
                children: built,
                path,
            })
        }
    }
}
