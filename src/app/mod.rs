//! The application layer: shared state, IPC command dispatch, async tasks,
//! and the view model handed to the webview.

pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::{Arc, Mutex};

use events::{IpcMessage, UserEvent};
use file_dialog::DialogService;
use proxy::EventProxy;
use state::AppState;

/// Parses a raw IPC message from the webview and routes it to its command
/// handler. Unknown commands are logged and dropped; they never crash the
/// view.
pub fn handle_ipc_message<P: EventProxy>(
    message: String,
    dialog: Arc<dyn DialogService>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let ipc_message: IpcMessage = match serde_json::from_str(&message) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse IPC message: {e}");
            return;
        }
    };

    tracing::debug!("IPC command received: {}", ipc_message.command);
    let payload = ipc_message.payload;

    match ipc_message.command.as_str() {
        "initialize" => commands::initialize(proxy, state),
        "submitScan" => commands::submit_scan(payload, proxy, state),
        "uploadArchive" => commands::upload_archive(&*dialog, proxy, state),
        "exploreRepo" => commands::explore_repo(payload, proxy, state),
        "cancelScan" => commands::cancel_scan(proxy, state),
        "resetSession" => commands::reset_session(proxy, state),
        "toggleSelection" => commands::toggle_selection(payload, proxy, state),
        "toggleExpansion" => commands::toggle_expansion(payload, proxy, state),
        "setFileTypes" => commands::set_file_types(payload, proxy, state),
        "setShowSelectedOnly" => commands::set_show_selected_only(payload, proxy, state),
        "resetFilters" => commands::reset_filters(proxy, state),
        "loadFilePreview" => commands::load_file_preview(payload, proxy, state),
        "downloadArtifact" => commands::download_artifact(payload, &*dialog, proxy, state),
        "revealArtifact" => commands::reveal_artifact(payload),
        "updateConfig" => commands::update_config(payload, proxy, state),
        "loadServiceConfig" => commands::load_service_config(proxy, state),
        "updateServiceConfig" => commands::update_service_config(payload, proxy, state),
        other => tracing::warn!("Unknown IPC command: {other}"),
    }
}

/// Forwards a [`UserEvent`] into the webview by calling the matching
/// `window.__gittxt.*` function.
pub fn handle_user_event(event: UserEvent, webview: &wry::WebView) {
    let script = match event {
        UserEvent::StateUpdate(ui_state) => serde_json::to_string(&*ui_state)
            .map(|json| format!("window.__gittxt.stateUpdate({json})")),
        UserEvent::ScanProgress(progress) => serde_json::to_string(&progress)
            .map(|json| format!("window.__gittxt.scanProgress({json})")),
        UserEvent::ShowFilePreview {
            content,
            language,
            path,
        } => serde_json::to_string(&serde_json::json!({
            "content": content,
            "language": language,
            "path": path,
        }))
        .map(|json| format!("window.__gittxt.showFilePreview({json})")),
        UserEvent::ShowError(message) => serde_json::to_string(&message)
            .map(|json| format!("window.__gittxt.showError({json})")),
        UserEvent::DownloadComplete { format, path } => {
            serde_json::to_string(&serde_json::json!({
                "format": format,
                "path": path.to_string_lossy(),
            }))
            .map(|json| format!("window.__gittxt.downloadComplete({json})"))
        }
        UserEvent::ServiceConfigLoaded(config) => serde_json::to_string(&config)
            .map(|json| format!("window.__gittxt.serviceConfig({json})")),
        UserEvent::DragStateChanged(active) => {
            Ok(format!("window.__gittxt.dragState({active})"))
        }
    };

    match script {
        Ok(script) => {
            if let Err(e) = webview.evaluate_script(&script) {
                tracing::error!("Failed to evaluate script in webview: {e}");
            }
        }
        Err(e) => tracing::error!("Failed to serialize event payload: {e}"),
    }
}
