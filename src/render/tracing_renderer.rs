/*!
 * Tracing Renderer
 * Headless presentation: every transition becomes a structured log line
 */

use super::traits::Renderer;
use crate::core::types::SlotId;
use crate::scheduler::finalized::{FinalizedEntry, Outcome};
use tracing::{debug, info, trace};

/// Renders slots, queue and finalized entries through `tracing`
///
/// Progress updates are logged at trace level only; occupancy changes at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn render_slot(&self, slot: SlotId, occupant: Option<&str>, progress: f64) {
        let percent = (progress * 100.0).round() as u32;
        match occupant {
            Some(name) if progress == 0.0 => debug!(slot, process = name, "[slot] loaded"),
            Some(name) => trace!(slot, process = name, percent, "[slot] progress"),
            None => debug!(slot, "[slot] free"),
        }
    }

    fn render_finalized(&self, entry: &FinalizedEntry) {
        let mark = match entry.outcome {
            Outcome::Completed => "done",
            Outcome::Cancelled => "cancelled",
        };
        info!(
            process = %entry.name,
            outcome = mark,
            reason = ?entry.cancel_reason,
            "[finalized]"
        );
    }

    fn render_queue(&self, pending: &[String]) {
        debug!(len = pending.len(), queue = ?pending, "[queue]");
    }
}
