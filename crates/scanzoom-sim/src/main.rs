//! Auto-zoom simulator binary.

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scanzoom_core::ScanConfig;
use scanzoom_sim::{SimConfig, Simulation};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("scanzoom=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting scanzoom-sim");

    let sim_config = SimConfig::from_env();
    let scan_config = ScanConfig::from_env();
    info!("Simulation config: {:?}", sim_config);
    info!("Scan config: {:?}", scan_config);

    let simulation =
        Simulation::new(sim_config, scan_config).context("Invalid scan configuration")?;
    let report = simulation.run().await.context("Simulation failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("{}", metrics.render());

    info!("Simulation complete");
    Ok(())
}
