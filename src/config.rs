//! Configuration types for usenet-stream

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use tracing_subscriber::EnvFilter;

/// Main configuration
///
/// Every field has a default, so an empty JSON object (or no file at all)
/// yields a runnable configuration pointing at `localhost:119`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// News server used for every download
    #[serde(default)]
    pub nntp: ServerConfig,

    /// HTTP listener and page assets
    #[serde(default)]
    pub http: HttpConfig,

    /// Streaming behaviour
    #[serde(default)]
    pub stream: StreamConfig,

    /// Default tracing filter when `RUST_LOG` is not set (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields [`Config::default`]; any other read or parse
    /// failure is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.nntp.host.trim().is_empty() {
            return Err(Error::Config {
                message: "NNTP host must not be empty".to_string(),
                key: Some("nntp.host".to_string()),
            });
        }
        if self.nntp.connect_timeout_secs == 0 {
            return Err(Error::Config {
                message: "connect timeout must be at least 1 second".to_string(),
                key: Some("nntp.connect_timeout_secs".to_string()),
            });
        }
        if self.stream.channel_depth == 0 {
            return Err(Error::Config {
                message: "channel depth must be at least 1".to_string(),
                key: Some("stream.channel_depth".to_string()),
            });
        }
        if self.stream.zero_chunk_size == 0 {
            return Err(Error::Config {
                message: "zero chunk size must be at least 1".to_string(),
                key: Some("stream.zero_chunk_size".to_string()),
            });
        }
        Ok(())
    }
}

/// NNTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server hostname
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port (typically 119 for unencrypted, 563 for TLS)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use TLS (implicit TLS, not STARTTLS)
    #[serde(default)]
    pub tls: bool,

    /// Username for authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for authentication
    #[serde(default)]
    pub password: Option<String>,

    /// Give up connecting and authenticating after this many seconds (default: 30)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl ServerConfig {
    /// Connect plus authentication deadline
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: false,
            username: None,
            password: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// HTTP listener configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Directory holding header.html, index.html and footer.html
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Upper bound for uploaded NZB bodies (default: 32 MiB)
    #[serde(default = "default_max_manifest_bytes")]
    pub max_manifest_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            templates_dir: default_templates_dir(),
            static_dir: default_static_dir(),
            max_manifest_bytes: default_max_manifest_bytes(),
        }
    }
}

/// Streaming configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Give up on a single segment after this long (None = wait forever)
    ///
    /// A timed-out segment is zero-filled like any other lost segment.
    #[serde(default, with = "optional_duration_serde", rename = "segment_timeout_secs")]
    pub segment_timeout: Option<Duration>,

    /// Chunks buffered between the download task and the HTTP body (default: 16)
    #[serde(default = "default_channel_depth")]
    pub channel_depth: usize,

    /// Largest zero-filled chunk sent at once (default: 64 KiB)
    #[serde(default = "default_zero_chunk_size")]
    pub zero_chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            segment_timeout: None,
            channel_depth: default_channel_depth(),
            zero_chunk_size: default_zero_chunk_size(),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured `log_level` is used,
/// and an unparseable filter falls back to `info`.
pub fn init_tracing(config: &Config) {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();
}

// Default value functions
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    119
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_max_manifest_bytes() -> usize {
    32 << 20
}

fn default_channel_depth() -> usize {
    16
}

fn default_zero_chunk_size() -> usize {
    64 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// Conversion from our ServerConfig to nntp-rs's ServerConfig
impl From<ServerConfig> for nntp_rs::ServerConfig {
    fn from(config: ServerConfig) -> Self {
        nntp_rs::ServerConfig {
            host: config.host,
            port: config.port,
            tls: config.tls,
            allow_insecure_tls: false,
            username: config.username.unwrap_or_default(),
            password: config.password.unwrap_or_default(),
        }
    }
}
