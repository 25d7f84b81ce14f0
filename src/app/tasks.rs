//! Long-running async flows: submitting and tracking scans, fetching
//! previews, and downloading artifacts.
//!
//! Every flow re-checks the state it is about to mutate against the identity
//! it was started for (scan id, preview tag). There is no true cancellation
//! of an in-flight HTTP request; discarding results that no longer match
//! current state is the only defense against out-of-order resolution.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::{AppState, SessionPhase};
use super::view_model::generate_ui_state;
use crate::api::{ApiClient, ScanRequest};
use crate::core::{ScanProgress, ScanState};

fn lock(state: &Arc<Mutex<AppState>>) -> std::sync::MutexGuard<'_, AppState> {
    state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
}

fn notify<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>) {
    let guard = lock(state);
    proxy.send_event(UserEvent::StateUpdate(Box::new(generate_ui_state(&guard))));
}

/// Submits a repository scan and starts tracking it. Any previous session is
/// reset first and released on the service.
pub fn start_scan<P: EventProxy>(request: ScanRequest, proxy: P, state: Arc<Mutex<AppState>>) {
    let (api, cancel_flag) = prepare_session(&state);
    notify(&proxy, &state);

    let task_state = state.clone();
    let task_proxy = proxy.clone();
    let handle = tokio::spawn(async move {
        let accepted = match api.start_scan(&request).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!("Scan submission failed: {e}");
                fail_scan(&task_state, &task_proxy, None, e.user_message());
                return;
            }
        };
        tracing::info!("Scan {} queued.", accepted.scan_id);
        track_scan(api, accepted.scan_id, task_proxy, task_state, cancel_flag).await;
    });
    lock(&state).scan_task = Some(handle);
}

/// Uploads a ZIP archive for scanning and starts tracking the resulting scan.
pub fn start_upload<P: EventProxy>(archive: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    let (api, cancel_flag) = prepare_session(&state);
    notify(&proxy, &state);

    let task_state = state.clone();
    let task_proxy = proxy.clone();
    let handle = tokio::spawn(async move {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.zip".to_string());

        let bytes = match tokio::fs::read(&archive).await {
            Ok(bytes) => bytes,
            Err(e) => {
                fail_scan(
                    &task_state,
                    &task_proxy,
                    None,
                    format!("Could not read {}: {e}", archive.display()),
                );
                return;
            }
        };

        let accepted = match api.upload_archive(&file_name, bytes).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!("Archive upload failed: {e}");
                fail_scan(&task_state, &task_proxy, None, e.user_message());
                return;
            }
        };
        tracing::info!("Upload scan {} queued.", accepted.scan_id);
        track_scan(api, accepted.scan_id, task_proxy, task_state, cancel_flag).await;
    });
    lock(&state).scan_task = Some(handle);
}

/// Resets the session for a new scan and arms the cancellation flag the
/// tracking task will observe. The previous scan, if any, is released on the
/// service in the background.
fn prepare_session(state: &Arc<Mutex<AppState>>) -> (Arc<ApiClient>, Arc<AtomicBool>) {
    let mut guard = lock(state);
    let previous = guard.reset_session();
    guard.phase = SessionPhase::Scanning {
        scan_id: String::new(),
        progress: ScanProgress::default(),
    };
    let api = guard.api.clone();
    let cancel_flag = guard.scan_cancel_flag.clone();
    drop(guard);

    if let Some(old_id) = previous {
        let close_api = api.clone();
        tokio::spawn(async move {
            if let Err(e) = close_api.close_scan(&old_id).await {
                tracing::warn!("Failed to release previous scan {old_id}: {e}");
            }
        });
    }

    (api, cancel_flag)
}

/// Polls the scan's status on the configured interval until it reaches a
/// terminal state, then loads the summary. The loop ends on completion,
/// error, or cancellation, so no timer outlives the scan.
async fn track_scan<P: EventProxy>(
    api: Arc<ApiClient>,
    scan_id: String,
    proxy: P,
    state: Arc<Mutex<AppState>>,
    cancel_flag: Arc<AtomicBool>,
) {
    let poll_interval = {
        let mut guard = lock(&state);
        if cancel_flag.load(Ordering::SeqCst) {
            return;
        }
        guard.phase = SessionPhase::Scanning {
            scan_id: scan_id.clone(),
            progress: ScanProgress::default(),
        };
        guard.config.poll_interval_ms.max(50)
    };
    notify(&proxy, &state);

    let mut ticker = tokio::time::interval(Duration::from_millis(poll_interval));
    loop {
        ticker.tick().await;
        if cancel_flag.load(Ordering::SeqCst) {
            tracing::info!("Scan {scan_id} tracking cancelled.");
            return;
        }

        let progress = match api.scan_status(&scan_id).await {
            Ok(progress) => progress,
            Err(e) => {
                tracing::error!("Status poll for {scan_id} failed: {e}");
                fail_scan(&state, &proxy, Some(&scan_id), e.user_message());
                return;
            }
        };

        {
            let mut guard = lock(&state);
            if guard.phase.scan_id() != Some(scan_id.as_str()) {
                tracing::warn!("Scan {scan_id} was superseded. Discarding progress.");
                return;
            }
            if let SessionPhase::Scanning { progress: p, .. } = &mut guard.phase {
                *p = progress.clone();
            }
        }
        proxy.send_event(UserEvent::ScanProgress(progress.clone()));

        match progress.status {
            ScanState::Error => {
                let message = progress
                    .error
                    .unwrap_or_else(|| "Scan failed on the service.".to_string());
                fail_scan(&state, &proxy, Some(&scan_id), message);
                return;
            }
            ScanState::Done => break,
            _ => {}
        }
    }

    match api.fetch_summary(&scan_id).await {
        Ok(result) => {
            let mut guard = lock(&state);
            if guard.phase.scan_id() != Some(scan_id.as_str())
                || cancel_flag.load(Ordering::SeqCst)
            {
                tracing::warn!("Scan {scan_id} was superseded. Discarding result.");
                return;
            }
            tracing::info!(
                "Scan {scan_id} ready: {} files in manifest.",
                result.manifest.len()
            );
            guard.phase = SessionPhase::Ready {
                scan_id: scan_id.clone(),
                result: Box::new(result),
            };
            guard.scan_task = None;
            let ui_state = generate_ui_state(&guard);
            drop(guard);
            proxy.send_event(UserEvent::StateUpdate(Box::new(ui_state)));
        }
        Err(e) => {
            tracing::error!("Summary fetch for {scan_id} failed: {e}");
            fail_scan(&state, &proxy, Some(&scan_id), e.user_message());
        }
    }
}

/// Moves the session into `Failed`, unless the failing scan was already
/// superseded by a newer one.
fn fail_scan<P: EventProxy>(
    state: &Arc<Mutex<AppState>>,
    proxy: &P,
    scan_id: Option<&str>,
    message: String,
) {
    let mut guard = lock(state);
    let current = match &guard.phase {
        SessionPhase::Scanning { scan_id, .. } => scan_id.clone(),
        _ => return,
    };
    if let Some(id) = scan_id {
        if !current.is_empty() && current != id {
            return;
        }
    }
    guard.phase = SessionPhase::Failed {
        message: message.clone(),
    };
    guard.scan_task = None;
    let ui_state = generate_ui_state(&guard);
    drop(guard);
    proxy.send_event(UserEvent::ShowError(message));
    proxy.send_event(UserEvent::StateUpdate(Box::new(ui_state)));
}

/// Fetches a file's content for the preview pane. The response is applied
/// only while its tag matches the active preview target; a stale response
/// for a superseded path never overwrites newer state.
pub fn load_preview<P: EventProxy>(path: String, proxy: P, state: Arc<Mutex<AppState>>) {
    let (api, scan_id, tag) = {
        let mut guard = lock(&state);
        let Some(scan_id) = guard.phase.ready_scan_id().map(str::to_string) else {
            proxy.send_event(UserEvent::ShowError(
                "No scan result loaded to preview from.".to_string(),
            ));
            return;
        };
        let tag = guard.next_preview_tag(&path);
        (guard.api.clone(), scan_id, tag)
    };
    // Reflect the new active preview target (highlighting) right away.
    notify(&proxy, &state);

    tokio::spawn(async move {
        let response = api.inspect_file(&scan_id, &path).await;

        {
            let guard = lock(&state);
            if !guard.accept_preview(tag) {
                tracing::debug!("Discarding stale preview response for {path}");
                return;
            }
        }

        match response {
            Ok(inspection) => proxy.send_event(UserEvent::ShowFilePreview {
                content: inspection.content,
                language: inspection.language,
                path,
            }),
            Err(e) => {
                tracing::warn!("Preview fetch for {path} failed: {e}");
                proxy.send_event(UserEvent::ShowError(e.user_message()));
            }
        }
    });
}

/// Fetches the exploration tree for a repository without scanning it.
pub fn explore_repo<P: EventProxy>(
    repo_url: String,
    branch: Option<String>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let api = lock(&state).api.clone();
    tokio::spawn(async move {
        match api.fetch_repo_tree(&repo_url, branch.as_deref()).await {
            Ok(preview) => {
                let mut guard = lock(&state);
                guard.explored = Some(preview);
                let ui_state = generate_ui_state(&guard);
                drop(guard);
                proxy.send_event(UserEvent::StateUpdate(Box::new(ui_state)));
            }
            Err(e) => {
                tracing::warn!("Repository exploration failed: {e}");
                proxy.send_event(UserEvent::ShowError(e.user_message()));
            }
        }
    });
}

/// Downloads one artifact of the current scan to `destination`, staging the
/// bytes in a temporary file so a failed download never leaves a partial
/// artifact behind.
pub fn download_artifact<P: EventProxy>(
    format: String,
    destination: PathBuf,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let (api, scan_id) = {
        let guard = lock(&state);
        let Some(scan_id) = guard.phase.ready_scan_id().map(str::to_string) else {
            proxy.send_event(UserEvent::ShowError(
                "No scan result loaded to download from.".to_string(),
            ));
            return;
        };
        (guard.api.clone(), scan_id)
    };

    tokio::spawn(async move {
        let bytes = match api.download_artifact(&scan_id, &format).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Artifact download ({format}) failed: {e}");
                proxy.send_event(UserEvent::ShowError(e.user_message()));
                return;
            }
        };

        let write_result = tokio::task::spawn_blocking(move || -> anyhow::Result<PathBuf> {
            let dir = destination
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let mut staged = tempfile::NamedTempFile::new_in(&dir)?;
            staged.write_all(&bytes)?;
            staged.persist(&destination)?;
            Ok(destination)
        })
        .await;

        match write_result {
            Ok(Ok(path)) => {
                tracing::info!("Artifact saved to {}", path.display());
                proxy.send_event(UserEvent::DownloadComplete { format, path });
            }
            Ok(Err(e)) => {
                proxy.send_event(UserEvent::ShowError(format!(
                    "Could not save artifact: {e}"
                )));
            }
            Err(e) => {
                proxy.send_event(UserEvent::ShowError(format!(
                    "Artifact save task failed: {e}"
                )));
            }
        }
    });
}
