use std::sync::Arc;
use usenet_stream::{Config, api, config::init_tracing};

const DEFAULT_CONFIG_PATH: &str = "usenet-stream.json";

#[tokio::main]
async fn main() -> usenet_stream::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    init_tracing(&config);
    tracing::info!(
        config = %config_path,
        nntp_host = %config.nntp.host,
        nntp_port = config.nntp.port,
        "usenet-stream starting"
    );

    api::run(Arc::new(config)).await
}
