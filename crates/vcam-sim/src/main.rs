//! Scripted virtual camera simulation binary.

mod components;
mod config;
mod error;
mod scene;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::scene::Scene;

fn init_tracing() {
    // Colored output for dev, JSON for log collectors
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vcam_core=info,vcam_sim=info"));

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
}

fn init_metrics() -> SimResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| SimError::Metrics(e.to_string()))
}

fn run() -> SimResult<()> {
    let metrics = init_metrics()?;

    let mut config = SimConfig::from_env();
    config.load_camera_config()?;
    info!("Simulation config: {:?}", config);

    let blend_table = config
        .load_blend_table()?
        .unwrap_or_else(Scene::demo_blend_table);
    blend_table.validate()?;

    let mut scene = Scene::demo();
    let report = scene::run(&config, &mut scene, blend_table)?;
    info!(
        frames = report.frames,
        live_order = ?report.live_order,
        events = ?report.events,
        final_live = ?report.final_live,
        final_position = %report.final_position,
        "Simulation report"
    );

    if config.print_metrics {
        println!("{}", metrics.render());
    }
    Ok(())
}

fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting vcam-sim");

    if let Err(e) = run() {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}
