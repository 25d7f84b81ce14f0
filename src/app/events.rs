//! Defines the event and message structures for communication between the backend and frontend.

use serde::Deserialize;
use std::path::PathBuf;

use super::view_model::UiState;
use crate::api::ServiceConfig;
use crate::core::ScanProgress;

/// Events sent from the Rust backend to the WebView (UI thread).
///
/// Each variant corresponds to a specific JavaScript function (`window.__gittxt.*`)
/// that will be called in the frontend.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<UiState>),
    /// A progress update while a scan is queued or running.
    ScanProgress(ScanProgress),
    /// Content for the file preview panel.
    ShowFilePreview {
        content: String,
        language: String,
        path: String,
    },
    /// An error message to be displayed to the user.
    ShowError(String),
    /// A downloaded artifact landed on disk.
    DownloadComplete { format: String, path: PathBuf },
    /// The service-side configuration, after a fetch or update.
    ServiceConfigLoaded(ServiceConfig),
    /// Indicates that a file is being dragged over the window.
    DragStateChanged(bool),
}

/// A message received from the WebView via the IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
