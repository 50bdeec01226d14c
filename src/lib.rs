//! # usenet-stream
//!
//! Streams multi-part Usenet binaries straight to an HTTP client.
//!
//! Upload an NZB and every file in it is listed with a download button. A
//! download posts the file's message identifiers back; each article is
//! fetched over NNTP, yEnc-decoded and written to the response in order,
//! without touching the local disk. Lost articles are replaced with zeros
//! of the nominal part size so the file keeps its declared length.
//!
//! ## Quick Start
//!
//! ```no_run
//! use usenet_stream::{Config, api};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("usenet-stream.json")?;
//!
//!     // Serves until SIGTERM/SIGINT
//!     api::run(Arc::new(config)).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP server
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// NZB manifest projection
pub mod manifest;
/// Segment streaming pipeline
pub mod stream;
/// Core request and segment types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, HttpConfig, ServerConfig, StreamConfig};
pub use error::{DecodeError, Error, Result, SegmentFailure, ToHttpStatus};
pub use manifest::{Manifest, ManifestFile};
pub use stream::{StreamOptions, StreamService};
pub use types::{DecodedSegment, DownloadRequest, SegmentOutcome, StreamState, StreamSummary};

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

/// Wait for a termination signal (Ctrl+C).
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
