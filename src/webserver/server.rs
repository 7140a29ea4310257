/// Axum webserver lifecycle: bind, serve, graceful shutdown.
use axum::Router;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::compression::CompressionLayer;

use crate::logger::{log, LogTag};
use crate::webserver::{routes, state::AppState};

pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: Lazy<Arc<Notify>> = Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver and block until shutdown. A bind failure is the one
/// fatal init error this process has.
pub async fn start_server(state: Arc<AppState>, port: u16) -> Result<(), String> {
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", DEFAULT_HOST, port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => {
            format!(
                "Failed to bind to {}: address already in use. \
                 Another instance is likely running - stop it or pick a different PORT.",
                addr
            )
        }
        std::io::ErrorKind::PermissionDenied => {
            format!(
                "Failed to bind to {}: permission denied. \
                 Ports below 1024 need elevated privileges; pick a higher PORT.",
                addr
            )
        }
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    log(
        LogTag::Server,
        "INFO",
        &format!("Listening on http://{} (stream at /stream)", addr),
    );

    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        log(LogTag::Server, "INFO", "Shutting down webserver");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    log(LogTag::Server, "INFO", "Webserver stopped");
    Ok(())
}

/// Trigger webserver shutdown from anywhere.
pub fn shutdown() {
    SHUTDOWN_NOTIFY.notify_waiters();
}

fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state).layer(CompressionLayer::new())
}
