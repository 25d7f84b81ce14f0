pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::DirectoryVisibility;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Base URL of the Gittxt scan service.
    pub backend_url: String,
    /// Where downloaded artifacts land.
    pub output_directory: Option<PathBuf>,
    /// Artifact formats requested with every scan.
    pub output_formats: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Per-file size limit forwarded to the service, in bytes.
    pub size_limit: Option<u64>,
    pub tree_depth: Option<u32>,
    pub lite_mode: bool,
    pub create_zip: bool,
    /// Interval between scan-status polls.
    pub poll_interval_ms: u64,
    pub directory_visibility: DirectoryVisibility,
    pub logging_level: String,
    pub window_size: (f64, f64),
    pub window_position: (f64, f64),
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            output_directory: dirs::download_dir().or_else(dirs::desktop_dir),
            output_formats: vec!["txt".to_string(), "json".to_string()],
            include_patterns: Vec::new(),
            exclude_patterns: vec![".git".to_string(), "node_modules".to_string()],
            size_limit: None,
            tree_depth: None,
            lite_mode: false,
            create_zip: true,
            poll_interval_ms: 2000,
            directory_visibility: DirectoryVisibility::AlwaysShown,
            logging_level: "info".to_string(),
            window_size: (1200.0, 800.0),
            window_position: (100.0, 100.0),
        }
    }
}
