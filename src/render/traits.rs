/*!
 * Renderer Traits
 * Interface of the presentation layer the scheduler reports to
 */

use crate::core::types::SlotId;
use crate::scheduler::finalized::FinalizedEntry;

/// Receives every visible state transition, in order
///
/// Calls arrive from a single dispatcher task, never while the scheduler
/// state is locked, so implementations may call back into the simulation.
pub trait Renderer: Send + Sync {
    /// Slot occupancy or progress changed
    fn render_slot(&self, slot: SlotId, occupant: Option<&str>, progress: f64);

    /// A process was finalized (append-only, completion order)
    fn render_finalized(&self, entry: &FinalizedEntry);

    /// The pending queue changed
    fn render_queue(&self, pending: &[String]);
}
