//! Defines the central, mutable state of the application.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, RepoPreview};
use crate::config::AppConfig;
use crate::core::{FilterState, ScanProgress, ScanResult, SelectionSet};

/// Where the current scan session stands. Views never have to guess whether
/// data is "not yet loaded": anything result-shaped only exists in `Ready`.
#[derive(Debug)]
pub enum SessionPhase {
    /// No scan submitted (or the session was reset).
    Idle,
    /// A scan is queued or running on the service. `scan_id` is empty for
    /// the short window between submission and the service's acknowledgement.
    Scanning {
        scan_id: String,
        progress: ScanProgress,
    },
    /// The scan finished and its result snapshot is loaded.
    Ready {
        scan_id: String,
        result: Box<ScanResult>,
    },
    /// The scan (or the summary fetch) failed.
    Failed { message: String },
}

impl SessionPhase {
    pub fn scan_id(&self) -> Option<&str> {
        match self {
            SessionPhase::Scanning { scan_id, .. } | SessionPhase::Ready { scan_id, .. } => {
                Some(scan_id)
            }
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            SessionPhase::Ready { result, .. } => Some(result),
            _ => None,
        }
    }

    /// The scan id, but only once a result is loaded.
    pub fn ready_scan_id(&self) -> Option<&str> {
        match self {
            SessionPhase::Ready { scan_id, .. } => Some(scan_id),
            _ => None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, SessionPhase::Scanning { .. })
    }
}

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` to allow for safe, shared
/// access from the main event loop, IPC handlers, and async tasks.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Client for the scan service, rebuilt when the backend URL changes.
    pub api: Arc<ApiClient>,
    /// Lifecycle of the active scan session.
    pub phase: SessionPhase,
    /// The set of full file paths currently selected by the user.
    pub selection: SelectionSet,
    /// The extension allow-list and "selected only" flag.
    pub filter: FilterState,
    /// Directories the user collapsed. Everything else renders expanded,
    /// which is the default state of every directory.
    pub collapsed_dirs: HashSet<String>,
    /// The file currently shown in the preview pane.
    pub preview_path: Option<String>,
    /// Monotonic tag for preview requests; a response is applied only when
    /// its tag still matches.
    pub preview_epoch: u64,
    /// Pre-scan exploration result, shown before a full scan is submitted.
    pub explored: Option<RepoPreview>,
    /// A handle to the running scan-tracking task, allowing it to be aborted.
    pub scan_task: Option<JoinHandle<()>>,
    /// A flag used to signal cancellation to the scan-tracking task.
    pub scan_cancel_flag: Arc<AtomicBool>,
}

impl Default for AppState {
    /// Creates a default `AppState` instance, loading the configuration from disk.
    fn default() -> Self {
        let config = AppConfig::load().unwrap_or_default();
        let api = Arc::new(ApiClient::new(&config.backend_url));
        Self {
            config,
            api,
            phase: SessionPhase::Idle,
            selection: SelectionSet::new(),
            filter: FilterState::default(),
            collapsed_dirs: HashSet::new(),
            preview_path: None,
            preview_epoch: 0,
            explored: None,
            scan_task: None,
            scan_cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl AppState {
    /// Rebuilds the API client after a backend URL change.
    pub fn rebuild_api_client(&mut self) {
        if self.api.base_url() != self.config.backend_url.trim_end_matches('/') {
            self.api = Arc::new(ApiClient::new(&self.config.backend_url));
        }
    }

    /// Cancels the scan-tracking task, if any, and resets the scanning state.
    pub fn cancel_current_scan(&mut self) {
        self.scan_cancel_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.scan_task.take() {
            tracing::info!("Aborting active scan task.");
            handle.abort();
        }
        if self.phase.is_scanning() {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Clears everything tied to the current scan session and arms a fresh
    /// cancellation flag. Returns the previous scan id, if there was one, so
    /// the caller can release it on the service.
    pub fn reset_session(&mut self) -> Option<String> {
        let previous = self.phase.scan_id().map(str::to_string);
        self.cancel_current_scan();

        self.phase = SessionPhase::Idle;
        self.selection.clear();
        self.filter.reset();
        self.collapsed_dirs.clear();
        self.preview_path = None;
        self.preview_epoch += 1;
        self.explored = None;
        self.scan_cancel_flag = Arc::new(AtomicBool::new(false));

        previous.filter(|id| !id.is_empty())
    }

    /// Restores filter defaults and empties the selection, leaving the
    /// loaded scan result untouched.
    pub fn reset_filters(&mut self) {
        self.filter.reset();
        self.selection.clear();
    }

    /// Registers `path` as the active preview target and returns the tag
    /// its response must carry to be accepted.
    pub fn next_preview_tag(&mut self, path: &str) -> u64 {
        self.preview_epoch += 1;
        self.preview_path = Some(path.to_string());
        self.preview_epoch
    }

    /// Whether a preview response with this tag is still for the active
    /// preview target. Stale responses must be discarded by the caller.
    pub fn accept_preview(&self, tag: u64) -> bool {
        self.preview_epoch == tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_filters_restores_defaults_and_empties_selection() {
        let mut state = AppState::default();
        state.selection.toggle("root/a.py");
        state.filter.file_types = vec!["py".to_string()];
        state.filter.show_selected_only = true;

        state.reset_filters();

        assert!(state.filter.file_types.is_empty());
        assert!(!state.filter.show_selected_only);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn stale_preview_tags_are_rejected() {
        let mut state = AppState::default();
        let first = state.next_preview_tag("root/a.py");
        let second = state.next_preview_tag("root/b.txt");

        assert!(!state.accept_preview(first), "superseded tag must be rejected");
        assert!(state.accept_preview(second));
        assert_eq!(state.preview_path.as_deref(), Some("root/b.txt"));
    }

    #[test]
    fn reset_session_reports_previous_scan_id() {
        let mut state = AppState::default();
        state.phase = SessionPhase::Ready {
            scan_id: "abc123".to_string(),
            result: Box::new(sample_result()),
        };
        state.selection.toggle("demo/a.py");

        let previous = state.reset_session();

        assert_eq!(previous.as_deref(), Some("abc123"));
        assert!(matches!(state.phase, SessionPhase::Idle));
        assert!(state.selection.is_empty());
    }

    fn sample_result() -> ScanResult {
        serde_json::from_value(serde_json::json!({
            "repo_name": "demo",
            "treeObject": {"name": "demo", "children": [{"name": "a.py"}]},
            "summary": {"repo_url": "https://github.com/acme/demo"}
        }))
        .expect("sample result")
    }
}
