//! Integration tests for the Gittxt Desk application.
//!
//! A `tiny_http` mock stands in for the scan service so the full flow --
//! submit, poll, summary, preview, filtering -- runs against real HTTP
//! without a real backend. Events are observed through an async-aware MPSC
//! channel from `tokio::sync` to avoid deadlocks between the test thread and
//! the application's async tasks.

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gittxt_desk::app::{self, events::UserEvent, proxy::EventProxy, state::AppState};
use gittxt_desk::config::AppConfig;
use tokio::sync::mpsc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use tiny_http::{Header, Method, Response, Server};

    /// A test double for the `EventLoopProxy` using a tokio MPSC channel.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            if let Err(e) = self.sender.send(event) {
                // Panic in a test if the receiver is dropped, as it indicates a test setup error.
                panic!("Test receiver dropped: {}", e);
            }
        }
    }

    const SCAN_RESULT_JSON: &str = r#"{
        "repo_name": "demo",
        "total_files": 2,
        "total_size_bytes": 640,
        "estimated_tokens": 150,
        "file_type_breakdown": {"py": 1, "txt": 1},
        "tokens_by_type": {"py": 120, "txt": 30},
        "skipped_files": [],
        "manifest": {
            "demo/a.py": {
                "file_type": "py", "language": "Python",
                "size_bytes": 400, "size_readable": "400 B",
                "token_count": 120, "tokens_readable": "120"
            },
            "demo/b.txt": {
                "file_type": "txt", "language": "Text",
                "size_bytes": 240, "size_readable": "240 B",
                "token_count": 30, "tokens_readable": "30"
            }
        },
        "tree": "demo/\n|-- a.py\n|-- b.txt\n",
        "treeObject": {"name": "demo", "children": [{"name": "a.py"}, {"name": "b.txt"}]},
        "categories": {"Python": {"core": ["demo/a.py"]}, "Text": {"misc": ["demo/b.txt"]}},
        "summary": {"repo_url": "https://github.com/acme/demo", "branch": "main"},
        "downloads": {"txt": "/artifacts/scan-1/txt", "zip": "/artifacts/scan-1/zip"}
    }"#;

    /// A scripted stand-in for the scan service.
    pub struct MockService {
        pub base_url: String,
        pub status_polls: Arc<AtomicUsize>,
    }

    impl MockService {
        /// Spawns the mock on an ephemeral port. With `fail_scan`, the scan
        /// reaches the `error` state on the second status poll.
        pub fn spawn(fail_scan: bool) -> Self {
            let server = Server::http("127.0.0.1:0").expect("bind mock service");
            let addr = server
                .server_addr()
                .to_ip()
                .expect("mock service listens on TCP");
            let base_url = format!("http://{addr}");
            let status_polls = Arc::new(AtomicUsize::new(0));

            let polls = status_polls.clone();
            std::thread::spawn(move || {
                let server = Arc::new(server);
                for request in server.incoming_requests() {
                    let polls = polls.clone();
                    // Requests are handled on their own threads so a slow
                    // preview response does not block later requests.
                    std::thread::spawn(move || handle(request, polls, fail_scan));
                }
            });

            Self {
                base_url,
                status_polls,
            }
        }
    }

    fn json_response(body: String, status: u32) -> Response<std::io::Cursor<Vec<u8>>> {
        Response::from_string(body)
            .with_status_code(status)
            .with_header(
                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .expect("static header"),
            )
    }

    fn handle(mut request: tiny_http::Request, polls: Arc<AtomicUsize>, fail_scan: bool) {
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("request body");

        let url = request.url().to_string();
        let method = request.method().clone();

        let response = match (method, url.as_str()) {
            (Method::Post, "/scans") => json_response(
                r#"{"scan_id": "scan-1", "status": "queued", "message": "Scan scheduled."}"#
                    .to_string(),
                200,
            ),
            (Method::Get, "/scans/scan-1") => {
                let poll = polls.fetch_add(1, Ordering::SeqCst);
                let body = if fail_scan && poll >= 1 {
                    r#"{"status": "error", "progress": 40.0, "current_file": "", "error": "git clone failed"}"#.to_string()
                } else if poll == 0 {
                    r#"{"status": "running", "progress": 50.0, "current_file": "a.py"}"#.to_string()
                } else {
                    r#"{"status": "done", "progress": 100.0, "current_file": ""}"#.to_string()
                };
                json_response(body, 200)
            }
            (Method::Get, "/summary/scan-1") => json_response(SCAN_RESULT_JSON.to_string(), 200),
            (Method::Delete, "/scans/scan-1/close") => {
                json_response(r#"{"success": true}"#.to_string(), 200)
            }
            (Method::Post, "/inspect") => {
                let inspect: serde_json::Value = serde_json::from_str(&body).expect("inspect body");
                let path = inspect["file_path"].as_str().unwrap_or_default().to_string();
                // The first file answers slowly so a newer request can
                // overtake it.
                let (content, language) = if path.ends_with("a.py") {
                    std::thread::sleep(Duration::from_millis(400));
                    ("print('a')", "python")
                } else {
                    ("plain text b", "plaintext")
                };
                json_response(
                    serde_json::json!({
                        "content": content,
                        "file_path": path,
                        "language": language,
                        "size_bytes": content.len(),
                    })
                    .to_string(),
                    200,
                )
            }
            _ => json_response(r#"{"detail": "not found"}"#.to_string(), 404),
        };

        request.respond(response).ok();
    }

    /// `TestHarness` sets up a complete, isolated environment for each test case.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub proxy: TestEventProxy,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub service: MockService,
    }

    impl TestHarness {
        /// Creates a new test harness wired to a fresh mock service.
        pub fn new(fail_scan: bool) -> Self {
            let service = MockService::spawn(fail_scan);
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            let mut state = AppState::default_for_tests();
            state.config.backend_url = service.base_url.clone();
            state.config.poll_interval_ms = 50;
            state.rebuild_api_client();

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: TestEventProxy { sender: event_tx },
                event_rx,
                service,
            }
        }

        /// Waits for a state update whose phase matches `phase`.
        pub async fn wait_for_phase(&mut self, phase: &str) -> app::view_model::UiState {
            loop {
                match tokio::time::timeout(Duration::from_secs(5), self.event_rx.recv()).await {
                    Ok(Some(UserEvent::StateUpdate(ui_state))) => {
                        if ui_state.phase == phase {
                            return *ui_state;
                        }
                    }
                    Ok(Some(_)) => { /* Ignore other events like ScanProgress */ }
                    _ => panic!("No '{phase}' state update within timeout or channel closed"),
                }
            }
        }

        /// Waits for the next preview event and returns its path and content.
        pub async fn wait_for_preview(&mut self) -> (String, String) {
            loop {
                match tokio::time::timeout(Duration::from_secs(5), self.event_rx.recv()).await {
                    Ok(Some(UserEvent::ShowFilePreview { path, content, .. })) => {
                        return (path, content);
                    }
                    Ok(Some(_)) => {}
                    _ => panic!("No preview event within timeout or channel closed"),
                }
            }
        }

        /// Asserts that no preview event arrives within `window`.
        pub async fn assert_no_preview_within(&mut self, window: Duration) {
            let deadline = tokio::time::Instant::now() + window;
            loop {
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining.is_zero() {
                    return;
                }
                match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                    Ok(Some(UserEvent::ShowFilePreview { path, .. })) => {
                        panic!("Unexpected preview event for {path}");
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => panic!("Event channel closed"),
                    Err(_) => return, // window elapsed quietly
                }
            }
        }
    }
}

/// Builds an `AppState` without touching the on-disk configuration.
trait DefaultForTests {
    fn default_for_tests() -> AppState;
}

impl DefaultForTests for AppState {
    fn default_for_tests() -> AppState {
        use gittxt_desk::api::ApiClient;
        use gittxt_desk::app::state::SessionPhase;
        use gittxt_desk::core::{FilterState, SelectionSet};
        use std::sync::atomic::AtomicBool;

        let config = AppConfig::default();
        let api = Arc::new(ApiClient::new(&config.backend_url));
        AppState {
            config,
            api,
            phase: SessionPhase::Idle,
            selection: SelectionSet::new(),
            filter: FilterState::default(),
            collapsed_dirs: Default::default(),
            preview_path: None,
            preview_epoch: 0,
            explored: None,
            scan_task: None,
            scan_cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[tokio::test]
async fn scan_flow_reaches_ready_with_the_full_result() {
    let mut harness = helpers::TestHarness::new(false);

    app::commands::submit_scan(
        serde_json::json!({"repo_url": "https://github.com/acme/demo"}),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    let ui = harness.wait_for_phase("ready").await;

    assert_eq!(ui.scan_id.as_deref(), Some("scan-1"));
    assert_eq!(ui.repo_name.as_deref(), Some("demo"));
    assert_eq!(ui.branch.as_deref(), Some("main"));
    assert_eq!(ui.total_files, 2);
    assert_eq!(ui.visible_files_count, 2);
    assert_eq!(ui.file_extensions, vec!["py", "txt"]);
    assert_eq!(ui.downloads.len(), 2);

    // The tree arrives rooted at the repository with both files, in source order.
    assert_eq!(ui.tree.len(), 1);
    let root = &ui.tree[0];
    assert_eq!(root.path, "demo");
    let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a.py", "b.txt"]);

    // The status endpoint was polled until the scan finished.
    assert!(
        harness.service.status_polls.load(Ordering::SeqCst) >= 2,
        "scan status should be polled repeatedly"
    );
}

#[tokio::test]
async fn failed_scan_surfaces_the_service_error() {
    let mut harness = helpers::TestHarness::new(true);

    app::commands::submit_scan(
        serde_json::json!({"repo_url": "https://github.com/acme/demo"}),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    let ui = harness.wait_for_phase("failed").await;
    assert_eq!(ui.error.as_deref(), Some("git clone failed"));
    assert!(ui.tree.is_empty());
}

#[tokio::test]
async fn unreachable_service_fails_the_scan_gracefully() {
    let mut harness = helpers::TestHarness::new(false);
    {
        // Point at a port nobody listens on.
        let mut guard = harness.state.lock().unwrap();
        guard.config.backend_url = "http://127.0.0.1:9".to_string();
        guard.rebuild_api_client();
    }

    app::commands::submit_scan(
        serde_json::json!({"repo_url": "https://github.com/acme/demo"}),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    let ui = harness.wait_for_phase("failed").await;
    let error = ui.error.expect("error message");
    assert!(
        error.contains("unreachable"),
        "expected a generic unreachable message, got: {error}"
    );
}

#[tokio::test]
async fn filters_and_selection_drive_the_rendered_views() {
    let mut harness = helpers::TestHarness::new(false);

    app::commands::submit_scan(
        serde_json::json!({"repo_url": "https://github.com/acme/demo"}),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    harness.wait_for_phase("ready").await;

    // Restrict to Python files.
    app::commands::set_file_types(
        serde_json::json!(["py"]),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    let ui = harness.wait_for_phase("ready").await;
    assert_eq!(ui.visible_files_count, 1);
    // Both category keys survive; the text group is emptied, not removed.
    assert_eq!(ui.categories["Python"]["core"], vec!["demo/a.py"]);
    assert!(ui.categories["Text"]["misc"].is_empty());

    // Select the filtered-out file, then show only selected files.
    app::commands::toggle_selection(
        serde_json::json!("demo/b.txt"),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    harness.wait_for_phase("ready").await;
    app::commands::set_file_types(
        serde_json::json!([]),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    harness.wait_for_phase("ready").await;
    app::commands::set_show_selected_only(
        serde_json::json!(true),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    let ui = harness.wait_for_phase("ready").await;
    assert_eq!(ui.visible_files_count, 1);
    assert_eq!(ui.selected_files_count, 1);
    let root = &ui.tree[0];
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].path, "demo/b.txt");

    // Reset restores everything.
    app::commands::reset_filters(harness.proxy.clone(), harness.state.clone());
    let ui = harness.wait_for_phase("ready").await;
    assert_eq!(ui.visible_files_count, 2);
    assert_eq!(ui.selected_files_count, 0);
    assert!(ui.filter.file_types.is_empty());
    assert!(!ui.filter.show_selected_only);
}

#[tokio::test]
async fn stale_preview_response_is_discarded() {
    let mut harness = helpers::TestHarness::new(false);

    app::commands::submit_scan(
        serde_json::json!({"repo_url": "https://github.com/acme/demo"}),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    harness.wait_for_phase("ready").await;

    // Request the slow file first, then immediately supersede it.
    app::commands::load_file_preview(
        serde_json::json!("demo/a.py"),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    app::commands::load_file_preview(
        serde_json::json!("demo/b.txt"),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    let (path, content) = harness.wait_for_preview().await;
    assert_eq!(path, "demo/b.txt");
    assert_eq!(content, "plain text b");

    // The slow response for a.py arrives afterwards and must be dropped.
    harness
        .assert_no_preview_within(Duration::from_millis(700))
        .await;

    let guard = harness.state.lock().unwrap();
    assert_eq!(guard.preview_path.as_deref(), Some("demo/b.txt"));
}
