/*!
 * Overlay Simulator Library
 *
 * Schedules a catalog of simulated processes onto a fixed pool of overlay
 * slots: timed runs, bounded repetitions, allocation cooldown, a main
 * process that outlives its siblings, manual cancellation and start/stop.
 */

pub mod core;
pub mod lifecycle;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod render;
pub mod scheduler;
pub mod timers;

// Re-exports
pub use crate::core::{
    ConfigError, CooldownScope, MainProcessPolicy, ProcessId, Result, SimulationConfig,
    SimulationError, SimulationPolicy, SlotId,
};
pub use lifecycle::{Simulation, SimulationBuilder};
pub use monitoring::init_tracing;
pub use process::{DurationSpec, ProcessCatalog, ProcessDescriptor, ProcessRole};
pub use render::{RecordingRenderer, RenderEvent, Renderer, TracingRenderer};
pub use scheduler::{
    CancelReason, FinalizedEntry, LifecycleState, Outcome, SimulationSnapshot, SimulationStats,
};
pub use timers::{TimerKind, TimerRegistry, TimerToken};
