/*!
 * Process Module
 * Process catalog and execution tracking
 */

pub mod catalog;
pub mod tracker;

// Re-export for convenience
pub use catalog::{DurationSpec, ProcessCatalog, ProcessDescriptor, ProcessRole};
pub use tracker::{ExecutionTracker, ProcessRuntimeState};
