/*!
 * Overlay Simulator - Headless Driver
 *
 * Runs a catalog through the simulator with log output only, until every
 * process is finalized or Ctrl+C stops it, then prints the final snapshot
 * as JSON.
 *
 * Environment:
 * - OVERLAY_SIM_CATALOG: `standard` (default), `demo`, or a path to a JSON
 *   process catalog
 * - OVERLAY_SIM_PRESET: `default` or `fast` timings
 * - OVERLAY_SIM_*: configuration overrides, see `SimulationConfig::from_env`
 */

use anyhow::Context;
use overlay_sim::monitoring::span_simulation;
use overlay_sim::{init_tracing, ProcessCatalog, Simulation, SimulationConfig, TracingRenderer};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

const CATALOG_ENV: &str = "OVERLAY_SIM_CATALOG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SimulationConfig::from_env().context("Invalid simulator configuration")?;
    let catalog = load_catalog()?;
    let span = span_simulation(config.slots, catalog.len());

    let simulation = Simulation::builder()
        .with_catalog(catalog)
        .with_config(config)
        .with_renderer(Arc::new(TracingRenderer))
        .build()
        .context("Failed to build simulation")?;

    run(&simulation).instrument(span).await;

    let snapshot = simulation.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn run(simulation: &Simulation) {
    info!(
        slots = simulation.config().slots,
        processes = simulation.catalog().len(),
        "Overlay simulator starting"
    );
    simulation.start();

    tokio::select! {
        _ = simulation.drained() => {
            let stats = simulation.snapshot().stats;
            info!(idle_ticks = stats.idle_ticks(), stats = ?stats, "All processes finalized");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Signal handler failed, stopping");
            }
            let drained = simulation.stop();
            // Let the paced drain notifications reach the renderer
            tokio::time::sleep(simulation.config().stop_stagger * drained as u32).await;
            info!(drained, "Stopped by user");
        }
    }
}

fn load_catalog() -> anyhow::Result<ProcessCatalog> {
    let Ok(path) = std::env::var(CATALOG_ENV) else {
        return Ok(ProcessCatalog::standard());
    };
    if let Some(catalog) = ProcessCatalog::builtin(&path) {
        info!(catalog = %path.trim(), processes = catalog.len(), "Built-in catalog selected");
        return Ok(catalog);
    }
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read catalog {path}"))?;
    let catalog = ProcessCatalog::from_json_str(&json)
        .with_context(|| format!("Invalid catalog {path}"))?;
    info!(path = %path, processes = catalog.len(), "Catalog loaded");
    Ok(catalog)
}
