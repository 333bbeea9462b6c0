/*!
 * Simulation Snapshot
 * Serializable point-in-time view of the scheduler state
 */

use super::finalized::{FinalizedEntry, Outcome};
use super::state::LifecycleState;
use super::stats::SimulationStats;
use crate::core::serde::is_false;
use crate::core::types::{Epoch, ProcessId, SlotId};
use crate::process::tracker::ProcessRuntimeState;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub slot: SlotId,
    pub occupant: Option<ProcessId>,
    pub name: Option<String>,
    pub progress: f64,
    #[serde(skip_serializing_if = "is_false")]
    pub held: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub cooling_down: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    pub lifecycle: LifecycleState,
    pub epoch: Epoch,
    pub slots: Vec<SlotView>,
    pub queue: Vec<ProcessId>,
    pub awaiting_requeue: Vec<ProcessId>,
    pub finalized: Vec<FinalizedEntry>,
    pub processes: Vec<ProcessRuntimeState>,
    pub cooling_down: bool,
    pub stats: SimulationStats,
}

impl SimulationSnapshot {
    /// Slot holding a process
    pub fn slot_of(&self, process: ProcessId) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|view| view.occupant == Some(process))
            .map(|view| view.slot)
    }

    pub fn runtime(&self, process: ProcessId) -> Option<&ProcessRuntimeState> {
        self.processes.iter().find(|state| state.id == process)
    }

    pub fn completed_runs(&self, process: ProcessId) -> u32 {
        self.runtime(process).map_or(0, |state| state.completed_runs)
    }

    pub fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|view| view.occupant.is_some()).count()
    }

    /// Times a process appears in the finalized record with `outcome`
    pub fn finalized_count(&self, process: ProcessId, outcome: Outcome) -> usize {
        self.finalized
            .iter()
            .filter(|entry| entry.process == process && entry.outcome == outcome)
            .count()
    }

    /// Nothing queued, running or waiting to be re-queued
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.awaiting_requeue.is_empty() && self.occupied_slots() == 0
    }
}
