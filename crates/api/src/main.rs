//! Voice Scam Shield - Main Entry Point

use api::{init_logging, run_server, ShieldSettings};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let settings = ShieldSettings::load(config_path.as_deref())?;
    init_logging(&settings.logging)?;

    info!("=== Voice Scam Shield v{} ===", env!("CARGO_PKG_VERSION"));
    settings.validate()?;

    let metrics = PrometheusBuilder::new().install_recorder()?;
    run_server(settings, Some(metrics)).await
}
