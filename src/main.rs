#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use gittxt_desk::app;
use gittxt_desk::app::file_dialog::NativeDialogService;
use gittxt_desk::config;
use gittxt_desk::web_assets;
use std::sync::{Arc, Mutex};
use tao::{
    event::{Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    window::WindowBuilder,
};
use tracing_subscriber::EnvFilter;
use wry::WebViewBuilder;

#[tokio::main]
async fn main() {
    let state = Arc::new(Mutex::new(app::state::AppState::default()));

    // Initialize logging, honoring RUST_LOG over the configured level.
    let configured_level = state
        .lock()
        .expect("state lock")
        .config
        .logging_level
        .clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured_level)),
        )
        .init();

    // Create the event loop and window
    let event_loop = EventLoopBuilder::<app::events::UserEvent>::with_user_event().build();

    let (width, height, pos_x, pos_y) = {
        let state_guard = state.lock().expect("state lock");
        let (width, height) = state_guard.config.window_size;
        let (pos_x, pos_y) = state_guard.config.window_position;
        (width, height, pos_x, pos_y)
    };

    let window = WindowBuilder::new()
        .with_title("Gittxt Desk")
        .with_inner_size(tao::dpi::LogicalSize::new(width, height))
        .with_position(tao::dpi::LogicalPosition::new(pos_x, pos_y))
        .with_min_inner_size(tao::dpi::LogicalSize::new(900, 600))
        .build(&event_loop)
        .expect("Failed to build Window");

    let window = Arc::new(window);

    // Create the event loop proxy and the dialog service
    let proxy = event_loop.create_proxy();
    let dialog_service: Arc<dyn app::file_dialog::DialogService> = Arc::new(NativeDialogService {});

    let ipc_handler_state = state.clone();
    let ipc_handler_proxy = proxy.clone();
    let ipc_handler_dialog = dialog_service.clone();
    let ipc_handler = move |message: String| {
        app::handle_ipc_message(
            message,
            ipc_handler_dialog.clone(),
            ipc_handler_proxy.clone(),
            ipc_handler_state.clone(),
        );
    };

    // Dropping a ZIP archive anywhere on the window uploads it for scanning.
    let drop_handler_state = state.clone();
    let drop_handler_proxy = proxy.clone();
    let file_drop_handler = move |event| {
        use wry::FileDropEvent;
        match event {
            FileDropEvent::Hovered { .. } => {
                let _ =
                    drop_handler_proxy.send_event(app::events::UserEvent::DragStateChanged(true));
            }
            FileDropEvent::Dropped { paths, .. } => {
                let _ =
                    drop_handler_proxy.send_event(app::events::UserEvent::DragStateChanged(false));
                if let Some(path) = paths.first() {
                    let is_zip = path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
                    if is_zip {
                        app::tasks::start_upload(
                            path.clone(),
                            drop_handler_proxy.clone(),
                            drop_handler_state.clone(),
                        );
                    } else {
                        let _ = drop_handler_proxy.send_event(
                            app::events::UserEvent::ShowError(
                                "Only ZIP archives can be scanned via drag and drop.".to_string(),
                            ),
                        );
                    }
                }
            }
            FileDropEvent::Cancelled => {
                let _ =
                    drop_handler_proxy.send_event(app::events::UserEvent::DragStateChanged(false));
            }
            _ => (),
        }
        true
    };

    let (html_bytes, _) = web_assets::load("index.html").expect("UI assets must be embedded");
    let html_content = String::from_utf8_lossy(&html_bytes).into_owned();

    let webview = WebViewBuilder::new(&*window)
        .with_html(html_content)
        .with_devtools(cfg!(debug_assertions))
        .with_ipc_handler(ipc_handler)
        .with_file_drop_handler(file_drop_handler)
        .build()
        .expect("Failed to build WebView");

    let state_for_events = state.clone();
    let window_for_events = window.clone();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                tracing::info!("Application initialized.");
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    tracing::info!("Close requested. Saving final window state...");
                    let mut state_guard = state_for_events.lock().expect("state lock");
                    state_guard.cancel_current_scan();

                    let size = window_for_events.inner_size();
                    let position = window_for_events.outer_position().unwrap_or_default();
                    state_guard.config.window_size = (size.width.into(), size.height.into());
                    state_guard.config.window_position = (position.x.into(), position.y.into());

                    if let Err(e) = config::settings::save_config(&state_guard.config) {
                        tracing::error!("Failed to save config on exit: {}", e);
                    }
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    let mut state_guard = state_for_events.lock().expect("state lock");
                    state_guard.config.window_size = (size.width.into(), size.height.into());
                }
                WindowEvent::Moved(position) => {
                    let mut state_guard = state_for_events.lock().expect("state lock");
                    state_guard.config.window_position = (position.x.into(), position.y.into());
                }
                _ => (),
            },
            Event::UserEvent(user_event) => {
                app::handle_user_event(user_event, &webview);
            }
            _ => (),
        }
    });
}
