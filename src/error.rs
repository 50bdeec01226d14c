//! Error types for usenet-stream
//!
//! Request-terminating errors (bad input, unreachable news server, missing
//! first segment) are variants of [`Error`] and map to an HTTP status through
//! [`ToHttpStatus`]. Per-segment failures are not errors at this level: they
//! are [`SegmentFailure`] values that the orchestrator absorbs with zero-fill.

use thiserror::Error;

/// Result type alias for usenet-stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for usenet-stream
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed multipart body, NZB manifest or message-id list
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The NNTP session could not be opened or authenticated
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The first segment could not be obtained or is not part 1
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "http.bind_address")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP server error
    #[error("HTTP server error: {0}")]
    Server(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The error returned when the first requested segment is unusable
    pub fn part_one_missing() -> Self {
        Error::NotFound("Part 1 missing".to_string())
    }
}

/// Why a single segment produced no payload.
///
/// Every variant is handled the same way by the orchestrator; the distinction
/// only matters for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentFailure {
    /// The server does not have the article (expired, never propagated)
    #[error("article missing: {0}")]
    Missing(String),

    /// Connection or protocol failure while fetching the body
    #[error("transport error: {0}")]
    Transport(String),

    /// The fetch did not finish within the configured segment timeout
    #[error("fetch timed out after {0:?}")]
    TimedOut(std::time::Duration),

    /// The body was fetched but could not be decoded
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// yEnc decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload decoder rejected the body
    #[error("yEnc payload: {0}")]
    Payload(String),

    /// The decode task panicked or was cancelled
    #[error("decode task failed: {0}")]
    Task(String),
}

/// Convert errors to HTTP status codes for HTTP responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) => 400,
            Error::NotFound(_) => 404,
            Error::UpstreamUnavailable(_) => 500,
            Error::Config { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::Server(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::BadRequest(_) => "bad_request",
            Error::NotFound(_) => "not_found",
            Error::UpstreamUnavailable(_) => "upstream_unavailable",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Server(_) => "server_error",
            Error::Other(_) => "internal_error",
        }
    }
}
