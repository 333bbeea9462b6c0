/*!
 * Simulation Builder
 * Validates catalog, configuration and initial queue before anything runs
 */

use super::controller::{Core, Simulation};
use crate::core::config::SimulationConfig;
use crate::core::errors::{ConfigError, Result};
use crate::core::types::ProcessId;
use crate::process::catalog::ProcessCatalog;
use crate::render::{Notifier, Renderer};
use crate::scheduler::SchedulerState;
use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::info;

/// Builder for [`Simulation`]
///
/// Defaults: the standard catalog, `SimulationConfig::new()`, no renderer,
/// every catalog entry queued in catalog order, entropy-seeded durations.
#[derive(Default)]
pub struct SimulationBuilder {
    catalog: Option<ProcessCatalog>,
    config: SimulationConfig,
    renderer: Option<Arc<dyn Renderer>>,
    initial_queue: Option<Vec<String>>,
    seed: Option<u64>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, catalog: ProcessCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Queue these processes, by name, instead of the whole catalog
    #[must_use]
    pub fn with_initial_queue<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_queue = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Fixed seed for sampled durations
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate everything and build the simulation in the idle state
    ///
    /// With a renderer attached this spawns the render dispatcher, so it must
    /// run inside a Tokio runtime.
    pub fn build(self) -> Result<Simulation> {
        self.config.validate()?;
        let catalog = Arc::new(self.catalog.unwrap_or_default());
        let initial_queue = match &self.initial_queue {
            Some(names) => resolve_queue(&catalog, names)?,
            None => catalog.ids().collect(),
        };
        check_main_hold(&catalog, &self.config, &initial_queue)?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let notifier = self
            .renderer
            .map_or_else(Notifier::disabled, Notifier::spawn);

        info!(
            processes = catalog.len(),
            queued = initial_queue.len(),
            slots = self.config.slots,
            main = ?catalog.main().map(|id| catalog.name(id)),
            "Simulation built"
        );

        let state = SchedulerState::new(
            Arc::clone(&catalog),
            self.config.clone(),
            initial_queue,
            rng,
            notifier,
        );
        Ok(Simulation::from_core(Core::new(state, catalog, self.config)))
    }
}

fn resolve_queue(catalog: &ProcessCatalog, names: &[String]) -> Result<Vec<ProcessId>> {
    let mut seen = AHashSet::with_capacity(names.len());
    let mut queue = Vec::with_capacity(names.len());
    for name in names {
        let id = catalog.resolve(name)?;
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateProcess(name.clone()).into());
        }
        queue.push(id);
    }
    Ok(queue)
}

/// A main process held in the only slot would keep its siblings queued forever
fn check_main_hold(
    catalog: &ProcessCatalog,
    config: &SimulationConfig,
    queue: &[ProcessId],
) -> Result<()> {
    if !config.policy.main_process.hold_until_siblings_done || config.slots > 1 {
        return Ok(());
    }
    let Some(main) = catalog.main().filter(|main| queue.contains(main)) else {
        return Ok(());
    };
    if queue.iter().all(|&id| id == main) {
        return Ok(());
    }
    Err(ConfigError::MainHoldWithoutSpareSlot(catalog.name(main).to_owned()).into())
}
