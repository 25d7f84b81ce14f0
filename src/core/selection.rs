//! The set of file paths the user has toggled "selected".
//!
//! Selection is flat: toggling a file never cascades to siblings, parents,
//! or children. The set lives only for the current session and is emptied by
//! `reset_filters` or a new scan.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    paths: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `path` and returns whether it is now selected.
    /// Toggling twice always restores the prior state.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.paths.remove(path) {
            false
        } else {
            self.paths.insert(path.to_string());
            true
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
