//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! These handlers are responsible for interacting with the `AppState` and the
//! `api` client, and for sending `UserEvent`s back to the UI. Handlers are
//! synchronous state transitions; anything that talks to the service hands
//! off to a task in [`super::tasks`].

use std::sync::{Arc, Mutex};

use serde::Deserialize;

use super::events::UserEvent;
use super::file_dialog::DialogService;
use super::helpers::with_state_and_notify;
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks;
use super::view_model::generate_ui_state;
use crate::api::{ScanRequest, ServiceConfig};
use crate::config::{self, AppConfig};
use crate::utils::repo_url;

/// A repository reference as entered in the scan form.
#[derive(Deserialize, Debug)]
struct RepoTarget {
    repo_url: String,
    #[serde(default)]
    branch: Option<String>,
}

/// Handles the initial request for state from the frontend when it loads.
pub fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");
    let event = UserEvent::StateUpdate(Box::new(generate_ui_state(&state_guard)));
    proxy.send_event(event);
}

/// Validates the entered repository URL and submits a scan.
///
/// A malformed URL is reported inline and no request leaves the client.
pub fn submit_scan<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Ok(target) = serde_json::from_value::<RepoTarget>(payload.clone()) else {
        tracing::warn!("Failed to deserialize scan target from payload: {:?}", payload);
        return;
    };

    let parsed = match repo_url::parse(&target.repo_url) {
        Ok(parsed) => parsed,
        Err(message) => {
            proxy.send_event(UserEvent::ShowError(message));
            return;
        }
    };

    let request = {
        let state_guard = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        let config = &state_guard.config;
        ScanRequest {
            repo_url: parsed.url,
            branch: target.branch.filter(|b| !b.is_empty()).or(parsed.branch),
            output_format: config.output_formats.clone(),
            include_patterns: config.include_patterns.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
            size_limit: config.size_limit,
            lite_mode: config.lite_mode,
            create_zip: config.create_zip,
            tree_depth: config.tree_depth,
        }
    };

    tasks::start_scan(request, proxy, state);
}

/// Opens a file dialog for the user to pick a ZIP archive and uploads it for
/// scanning.
pub fn upload_archive<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(path) = dialog.pick_archive() {
        tasks::start_upload(path, proxy, state);
    } else {
        tracing::info!("User cancelled archive selection.");
    }
}

/// Fetches a repository's tree and extension list without scanning it.
pub fn explore_repo<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Ok(target) = serde_json::from_value::<RepoTarget>(payload.clone()) else {
        tracing::warn!("Failed to deserialize explore target from payload: {:?}", payload);
        return;
    };

    match repo_url::parse(&target.repo_url) {
        Ok(parsed) => {
            let branch = target.branch.filter(|b| !b.is_empty()).or(parsed.branch);
            tasks::explore_repo(parsed.url, branch, proxy, state);
        }
        Err(message) => proxy.send_event(UserEvent::ShowError(message)),
    }
}

/// Cancels the ongoing scan.
pub fn cancel_scan<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.cancel_current_scan();
    });
}

/// Clears the scan session entirely and releases it on the service.
pub fn reset_session<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let mut previous = None;
    with_state_and_notify(&state, &proxy, |s| {
        previous = s.reset_session();
    });

    if let Some(scan_id) = previous {
        let api = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.")
            .api
            .clone();
        tokio::spawn(async move {
            if let Err(e) = api.close_scan(&scan_id).await {
                tracing::warn!("Failed to release scan {scan_id}: {e}");
            }
        });
    }
}

/// Toggles the selection state of a single file. Selection never cascades.
pub fn toggle_selection<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(path) = serde_json::from_value::<String>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            let selected = s.selection.toggle(&path);
            tracing::debug!("Selection toggled: {path} -> {selected}");
        });
    } else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
    }
}

/// Toggles the expanded/collapsed state of a directory in the UI tree.
/// Directories default to expanded, so only collapsed paths are tracked.
pub fn toggle_expansion<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(path) = serde_json::from_value::<String>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            if !s.collapsed_dirs.remove(&path) {
                s.collapsed_dirs.insert(path);
            }
        });
    } else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
    }
}

/// Replaces the extension allow-list. An empty list disables the filter.
pub fn set_file_types<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(file_types) = serde_json::from_value::<Vec<String>>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.filter.file_types = file_types;
        });
    } else {
        tracing::warn!(
            "Failed to deserialize file type list from payload: {:?}",
            payload
        );
    }
}

/// Switches the "show selected only" flag.
pub fn set_show_selected_only<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(enabled) = serde_json::from_value::<bool>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.filter.show_selected_only = enabled;
        });
    } else {
        tracing::warn!("Failed to deserialize boolean from payload: {:?}", payload);
    }
}

/// Restores filter defaults and empties the selection.
pub fn reset_filters<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.reset_filters();
    });
}

/// Marks a file as the active preview target and fetches its content.
pub fn load_file_preview<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(path) = serde_json::from_value::<String>(payload.clone()) {
        tasks::load_preview(path, proxy, state);
    } else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
    }
}

/// Asks for a save location, then downloads one artifact of the current scan.
pub fn download_artifact<P: EventProxy, D: DialogService + ?Sized>(
    payload: serde_json::Value,
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Ok(format) = serde_json::from_value::<String>(payload.clone()) else {
        tracing::warn!(
            "Failed to deserialize format string from payload: {:?}",
            payload
        );
        return;
    };

    let (config, suggested_name) = {
        let state_guard = state
            .lock()
            .expect("Mutex was poisoned. This should not happen.");
        let repo_name = state_guard
            .phase
            .result()
            .map(|r| r.repo_name.clone())
            .unwrap_or_else(|| "gittxt".to_string());
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        (
            state_guard.config.clone(),
            format!("{repo_name}_{stamp}.{format}"),
        )
    };

    if let Some(destination) = dialog.save_artifact_path(&config, &suggested_name) {
        tasks::download_artifact(format, destination, proxy, state);
    } else {
        tracing::info!("User cancelled artifact download.");
    }
}

/// Opens a downloaded artifact with the platform's default handler.
pub fn reveal_artifact(payload: serde_json::Value) {
    if let Ok(path) = serde_json::from_value::<String>(payload.clone()) {
        if let Err(e) = open::that(&path) {
            tracing::warn!("Failed to open {path}: {e}");
        }
    } else {
        tracing::warn!(
            "Failed to deserialize path string from payload: {:?}",
            payload
        );
    }
}

/// Updates the application configuration and persists it. A changed backend
/// URL takes effect immediately for subsequent requests.
pub fn update_config<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Ok(new_config) = serde_json::from_value::<AppConfig>(payload.clone()) {
        with_state_and_notify(&state, &proxy, |s| {
            s.config = new_config;
            s.rebuild_api_client();
            if let Err(e) = config::settings::save_config(&s.config) {
                tracing::warn!("Failed to save config on update: {}", e);
            }
        });
    } else {
        tracing::warn!(
            "Failed to deserialize AppConfig from payload: {:?}",
            payload
        );
    }
}

/// Fetches the service-side configuration.
pub fn load_service_config<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let api = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .api
        .clone();
    tokio::spawn(async move {
        match api.fetch_service_config().await {
            Ok(service_config) => {
                proxy.send_event(UserEvent::ServiceConfigLoaded(service_config));
            }
            Err(e) => proxy.send_event(UserEvent::ShowError(e.user_message())),
        }
    });
}

/// Pushes updated fields of the service-side configuration.
pub fn update_service_config<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Ok(service_config) = serde_json::from_value::<ServiceConfig>(payload.clone()) else {
        tracing::warn!(
            "Failed to deserialize service config from payload: {:?}",
            payload
        );
        return;
    };

    let api = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .api
        .clone();
    tokio::spawn(async move {
        match api.update_service_config(&service_config).await {
            Ok(updated) => proxy.send_event(UserEvent::ServiceConfigLoaded(updated)),
            Err(e) => proxy.send_event(UserEvent::ShowError(e.user_message())),
        }
    });
}
