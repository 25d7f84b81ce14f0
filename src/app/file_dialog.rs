//! An abstraction layer for native file dialogs to enable testing.

use crate::config::AppConfig;
use std::path::PathBuf;

/// Defines a common interface for file selection dialogs.
/// This allows for a mock implementation during tests, avoiding the need
/// to interact with actual OS dialog windows.
pub trait DialogService: Send + Sync {
    /// Opens a dialog to select a ZIP archive for upload scanning.
    fn pick_archive(&self) -> Option<PathBuf>;

    /// Opens a dialog to select a save location for a downloaded artifact.
    /// It uses the provided config to suggest a default directory.
    fn save_artifact_path(&self, config: &AppConfig, suggested_name: &str) -> Option<PathBuf>;
}

/// The production implementation that uses the `rfd` crate to show native OS dialogs.
pub struct NativeDialogService;

impl DialogService for NativeDialogService {
    fn pick_archive(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("ZIP archive", &["zip"])
            .pick_file()
    }

    fn save_artifact_path(&self, config: &AppConfig, suggested_name: &str) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_file_name(suggested_name);
        if let Some(dir) = &config.output_directory {
            dialog = dialog.set_directory(dir);
        }
        dialog.save_file()
    }
}
