/*!
 * Completion Handling
 *
 * What happens when a run's timer fires, when a completed process comes back
 * from its re-queue delay, and when a slot is cancelled by hand. The main
 * process stays resident at full progress until every sibling is done, then
 * leaves as completed.
 */

use super::finalized::{CancelReason, FinalizedEntry};
use super::state::SchedulerState;
use crate::core::errors::{Result, SimulationError};
use crate::core::types::{ProcessId, RunId, SlotId};
use crate::memory::pool::ActiveRun;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Run no longer in its slot, already held, or cancelled
    Stale,
    /// Main process finished but waits for its siblings
    Held,
    /// Process has runs left and comes back after the re-queue delay
    Requeue(ProcessId),
    /// Process reached its final state
    Finalized(ProcessId),
}

/// Effect of one completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub outcome: CompletionOutcome,
    /// Main process released because this completion finished its last
    /// sibling. Its timers must be cancelled by the caller.
    pub released_main: Option<ActiveRun>,
}

impl Completion {
    fn stale() -> Self {
        Self {
            outcome: CompletionOutcome::Stale,
            released_main: None,
        }
    }
}

/// Effect of a manual slot cancellation
#[derive(Debug, Clone, PartialEq)]
pub struct ManualCancel {
    pub cancelled: ActiveRun,
    pub released_main: Option<ActiveRun>,
}

impl SchedulerState {
    /// Finish run `run` in `slot`
    pub fn complete(&mut self, slot: SlotId, run: RunId, now: Instant) -> Completion {
        let Some(active) = self.pool.get(slot).and_then(|s| s.occupant()) else {
            return Completion::stale();
        };
        if active.run != run || active.held {
            return Completion::stale();
        }
        let process = active.process;
        if self.tracker.is_cancelled(process) {
            debug!(process = %self.catalog.name(process), "Completion after cancellation ignored");
            return Completion::stale();
        }

        self.apply_cooldown(slot, now);

        if self.must_hold(process) {
            if let Some(active) = self.pool.occupant_mut(slot) {
                active.held = true;
            }
            self.stats.holds += 1;
            info!(
                process = %self.catalog.name(process),
                slot,
                "Main process finished, waiting for sub-processes"
            );
            self.emit_slot(slot, now);
            return Completion {
                outcome: CompletionOutcome::Held,
                released_main: None,
            };
        }

        self.pool.release(slot);
        self.emit_slot(slot, now);
        self.tracker.record_completion(process);
        self.stats.completions += 1;

        let name = self.catalog.name(process).to_owned();
        let completed = self.tracker.completed_runs(process);
        let outcome = if self.tracker.is_eligible(process) {
            self.awaiting_requeue.push(process);
            info!(process = %name, completed, "Process completed, next execution pending");
            CompletionOutcome::Requeue(process)
        } else {
            info!(process = %name, completed, "Process completed all executions");
            self.finalize(FinalizedEntry::completed(process, name));
            CompletionOutcome::Finalized(process)
        };

        Completion {
            outcome,
            released_main: self.release_main_if_ready(now),
        }
    }

    /// Put a process back in the queue after its re-queue delay
    pub fn requeue(&mut self, process: ProcessId) -> bool {
        let Some(pos) = self.awaiting_requeue.iter().position(|&id| id == process) else {
            return false;
        };
        self.awaiting_requeue.remove(pos);

        if !self.tracker.is_eligible(process) || !self.queue.push_back(process) {
            return false;
        }
        self.stats.requeues += 1;
        debug!(process = %self.catalog.name(process), "Process re-queued");
        self.emit_queue();
        true
    }

    /// Cancel whatever runs in `slot`. Cancelling a free slot does nothing.
    pub fn cancel_slot(&mut self, slot: SlotId, now: Instant) -> Result<Option<ManualCancel>> {
        if slot >= self.pool.len() {
            return Err(SimulationError::SlotOutOfRange {
                slot,
                slots: self.pool.len(),
            });
        }
        let Some(active) = self.pool.release(slot) else {
            debug!(slot, "Cancel on free slot ignored");
            return Ok(None);
        };

        let process = active.process;
        self.tracker.cancel(process);
        self.stats.manual_cancellations += 1;

        let name = self.catalog.name(process).to_owned();
        info!(
            process = %name,
            slot,
            remaining = self.tracker.remaining(process),
            "Process removed by user action"
        );
        self.finalize(FinalizedEntry::cancelled(process, name, CancelReason::Manual));
        self.emit_slot(slot, now);

        Ok(Some(ManualCancel {
            cancelled: active,
            released_main: self.release_main_if_ready(now),
        }))
    }

    /// Every sibling of the main process is out of the queue, out of the
    /// slots, not about to be re-queued and has no runs left
    pub fn siblings_done(&self) -> bool {
        self.siblings.iter().all(|&id| {
            !self.queue.contains(id)
                && !self.awaiting_requeue.contains(&id)
                && self.pool.slot_of(id).is_none()
                && !self.tracker.is_eligible(id)
        })
    }

    fn must_hold(&self, process: ProcessId) -> bool {
        self.config.policy.main_process.hold_until_siblings_done
            && Some(process) == self.catalog.main()
            && !self.siblings_done()
    }

    /// Finalize the resident main process once its siblings are done,
    /// whether or not its own run has finished
    fn release_main_if_ready(&mut self, now: Instant) -> Option<ActiveRun> {
        if !self.config.policy.main_process.hold_until_siblings_done {
            return None;
        }
        let main = self.catalog.main()?;
        let slot = self.pool.slot_of(main)?;
        if !self.siblings_done() {
            return None;
        }

        let active = self.pool.release(slot)?;
        self.emit_slot(slot, now);
        self.tracker.record_completion(main);
        self.stats.completions += 1;

        let name = self.catalog.name(main).to_owned();
        info!(process = %name, slot, held = active.held, "Sub-processes finished, main process completed");
        self.finalize(FinalizedEntry::completed(main, name));
        Some(active)
    }
}
