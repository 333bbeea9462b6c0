/*!
 * Shared fixtures for simulation tests
 */

use overlay_sim::{
    ProcessCatalog, ProcessDescriptor, RecordingRenderer, Simulation, SimulationConfig,
};
use std::sync::Arc;
use std::time::Duration;

pub fn catalog(entries: Vec<ProcessDescriptor>) -> ProcessCatalog {
    ProcessCatalog::new(entries).unwrap()
}

/// Simulation with a recording renderer and a fixed seed
pub fn simulation(
    entries: Vec<ProcessDescriptor>,
    config: SimulationConfig,
    queue: &[&str],
) -> (Simulation, Arc<RecordingRenderer>) {
    let renderer = Arc::new(RecordingRenderer::new());
    let sim = Simulation::builder()
        .with_catalog(catalog(entries))
        .with_config(config)
        .with_renderer(renderer.clone())
        .with_initial_queue(queue.iter().copied())
        .with_seed(42)
        .build()
        .unwrap();
    (sim, renderer)
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Wait for the simulation to drain, failing after `limit_ms` of virtual time
pub async fn drain_within(sim: &Simulation, limit_ms: u64) {
    tokio::time::timeout(Duration::from_millis(limit_ms), sim.drained())
        .await
        .expect("simulation did not drain in time");
}

pub fn names(entries: &[overlay_sim::FinalizedEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}
