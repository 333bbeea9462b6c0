/*!
 * Scheduler Statistics
 * Counters describing what the allocator and completion handler did
 */

use serde::{Deserialize, Serialize};

/// Simulation counters
///
/// Plain integers: every update happens under the scheduler state lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Allocator ticks while running
    pub ticks: u64,
    pub allocations: u64,
    pub completions: u64,
    pub requeues: u64,
    /// Times the main process finished but had to stay resident
    pub holds: u64,
    pub manual_cancellations: u64,
    pub stop_cancellations: u64,
    /// Ticks skipped because the global cooldown was active
    pub cooldown_skips: u64,
    /// Ticks where the queue head was not eligible
    pub blocked_ineligible: u64,
    /// Ticks where no slot was free
    pub blocked_no_slot: u64,
}

impl SimulationStats {
    /// Ticks that allocated nothing
    pub fn idle_ticks(&self) -> u64 {
        self.ticks.saturating_sub(self.allocations)
    }
}
