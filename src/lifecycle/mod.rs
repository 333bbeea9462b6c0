/*!
 * Lifecycle Module
 * Simulation handle: start, stop, reset and manual cancellation
 */

pub mod builder;
pub mod controller;

pub use builder::SimulationBuilder;
pub use controller::Simulation;
