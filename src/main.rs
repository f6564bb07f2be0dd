use record_sink::{api::Server, config::Config, RecordSink};
use std::sync::Arc;
use tracing::info;

/// Default configuration file, overridable with `RECORD_SINK_CONFIG`
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// The main entry point for the record sink service.
///
/// Initializes logging, loads configuration, starts the batch pipeline and
/// serves HTTP until Ctrl-C. On shutdown the last open window is flushed
/// before the process exits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path =
        std::env::var("RECORD_SINK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!("Record sink starting with config: {:?}", config);

    let sink = Arc::new(RecordSink::new(&config));

    let server = Server::new(config.api.clone(), sink.clone());
    server.start(shutdown_signal()).await?;

    sink.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {:?}", e);
        // Without a signal handler there is no way to stop gracefully; keep serving
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
