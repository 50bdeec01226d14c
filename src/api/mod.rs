//! HTTP server module
//!
//! Serves the upload page, turns uploaded NZBs into a download listing and
//! streams files straight from the news server.

use crate::{Config, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod error_response;
pub mod routes;
pub mod state;
pub mod views;

pub use state::AppState;

/// Create the router with all route definitions
///
/// # Routes
///
/// - `GET /` - Landing page with the NZB upload form
/// - `GET /static/*` - Files from the static directory
/// - `POST /nzb` - Upload an NZB (multipart field `nzb`), returns the file listing
/// - `POST /msgids` - Stream the file made of the posted message identifiers
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.http.static_dir.clone();
    let max_manifest_bytes = state.config.http.max_manifest_bytes;

    Router::new()
        .route("/", get(routes::index))
        .route(
            "/nzb",
            post(routes::upload_nzb).layer(DefaultBodyLimit::max(max_manifest_bytes)),
        )
        .route("/msgids", post(routes::download))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until `shutdown` is cancelled, then stops accepting connections and
/// lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use usenet_stream::{Config, api};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let state = api::AppState::from_config(config.clone());
///
/// // Blocks until the token is cancelled
/// api::start_server(state, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(state: AppState, shutdown: CancellationToken) -> Result<()> {
    let bind_address = state.config.http.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting HTTP server"
    );

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> Result<()> {
    if let Ok(address) = listener.local_addr() {
        tracing::info!(address = %address, "HTTP server listening");
    }

    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| crate::error::Error::Server(e.to_string()))?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Convenience for binaries: config in, server running until a signal arrives.
pub async fn run(config: Arc<Config>) -> Result<()> {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        crate::wait_for_signal().await;
        signal_token.cancel();
    });

    start_server(AppState::from_config(config), shutdown).await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
