//! The filter predicate applied to tree and category views.
//!
//! A single predicate drives both views: a file survives when its extension
//! is on the (possibly empty) allow-list and, with "selected only" active,
//! when it is in the current selection. Filtering derives new views and
//! never mutates the scan result it reads from.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::selection::SelectionSet;
use super::tree::{extension_of, TreeNode};

/// The raw `language -> category -> [file paths]` grouping from the scan
/// result.
pub type Categories = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Whether a directory whose every descendant is filtered out is still
/// rendered. The scan service's own views always kept such directories
/// visible; hiding them is opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryVisibility {
    #[default]
    AlwaysShown,
    HideWhenEmpty,
}

/// The user-controlled filter state. An empty allow-list means "no
/// extension filter".
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub file_types: Vec<String>,
    pub show_selected_only: bool,
}

impl FilterState {
    /// Restores the defaults: no extension filter, all files shown.
    pub fn reset(&mut self) {
        self.file_types.clear();
        self.show_selected_only = false;
    }

    pub fn is_default(&self) -> bool {
        self.file_types.is_empty() && !self.show_selected_only
    }

    /// The leaf predicate shared by the tree and category views. `name` is
    /// the file's own name, `path` its full path.
    pub fn allows_file(&self, name: &str, path: &str, selection: &SelectionSet) -> bool {
        let extension_ok =
            self.file_types.is_empty() || self.file_types.iter().any(|ft| ft == extension_of(name));
        let selection_ok = !self.show_selected_only || selection.contains(path);
        extension_ok && selection_ok
    }
}

/// Applies the leaf predicate to every file list in `categories`, preserving
/// the full two-level key structure even where a filtered list becomes
/// empty. Pure: calling it twice with unchanged inputs yields equal output.
pub fn filter_categories(
    categories: &Categories,
    filter: &FilterState,
    selection: &SelectionSet,
) -> Categories {
    categories
        .iter()
        .map(|(language, groups)| {
            let groups = groups
                .iter()
                .map(|(category, paths)| {
                    let kept: Vec<String> = paths
                        .par_iter()
                        .filter(|path| {
                            let name = path.rsplit('/').next().unwrap_or(path);
                            filter.allows_file(name, path, selection)
                        })
                        .cloned()
                        .collect();
                    (category.clone(), kept)
                })
                .collect();
            (language.clone(), groups)
        })
        .collect()
}

/// Full paths of the leaves that survive the filter, in source order. This
/// is exactly the set of file nodes the tree view renders.
pub fn visible_leaves(
    root: &TreeNode,
    filter: &FilterState,
    selection: &SelectionSet,
) -> Vec<String> {
    let mut leaves = Vec::new();
    root.walk(|node, path| {
        if node.is_file() && filter.allows_file(&node.name, path, selection) {
            leaves.push(path.to_string());
        }
    });
    leaves
}
