//! Analytics Dashboard API - Main Entry Point

use api::{init_logging, load_config, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_logging(&config.log_level, config.log_json)?;

    info!("=== Insight Dashboard v{} ===", env!("CARGO_PKG_VERSION"));
    run_server(config).await
}
