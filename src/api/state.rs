//! Application state for the HTTP server

use crate::config::Config;
use crate::stream::StreamService;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones).
#[derive(Clone)]
pub struct AppState {
    /// Configuration (templates and static directories, upload limit)
    pub config: Arc<Config>,

    /// Streams `/msgids` downloads
    pub service: Arc<StreamService>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<Config>, service: Arc<StreamService>) -> Self {
        Self { config, service }
    }

    /// State with the production NNTP-backed service
    pub fn from_config(config: Arc<Config>) -> Self {
        let service = Arc::new(StreamService::from_config(&config));
        Self::new(config, service)
    }
}
