/*!
 * Allocator
 *
 * One allocation attempt per tick: take the queue head, check eligibility,
 * find the first free slot, start the run. A head that cannot be placed
 * blocks the queue until the next tick.
 */

use super::progress::RunTimer;
use super::state::{LifecycleState, SchedulerState};
use crate::core::config::CooldownScope;
use crate::core::types::{ProcessId, RunId, SlotId};
use crate::memory::pool::ActiveRun;
use crate::timers::TimerToken;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// A run placed in a slot by the allocator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub slot: SlotId,
    pub process: ProcessId,
    pub run: RunId,
    pub timer: RunTimer,
}

/// Result of a single allocator tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Simulation not running
    Inactive,
    CoolingDown,
    QueueEmpty,
    /// Head of the queue may not run; it stays queued
    Ineligible(ProcessId),
    /// Head of the queue is waiting for a slot
    NoFreeSlot(ProcessId),
    Allocated(Allocation),
}

impl TickOutcome {
    #[inline]
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            TickOutcome::Allocated(allocation) => Some(allocation),
            _ => None,
        }
    }
}

impl SchedulerState {
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.lifecycle != LifecycleState::Running {
            return TickOutcome::Inactive;
        }
        self.stats.ticks += 1;

        if self.cooldown_active(now) {
            self.stats.cooldown_skips += 1;
            debug!("Allocation cooldown active, retrying next tick");
            return TickOutcome::CoolingDown;
        }

        let Some(head) = self.queue.front() else {
            return TickOutcome::QueueEmpty;
        };

        self.tracker.register(head);
        if !self.tracker.is_eligible(head) {
            self.stats.blocked_ineligible += 1;
            debug!(process = %self.catalog.name(head), "Queue head not eligible");
            return TickOutcome::Ineligible(head);
        }

        let skip_cooling = self.config.policy.cooldown_scope == CooldownScope::PerSlot;
        let Some(slot) = self.pool.find_free(now, skip_cooling) else {
            self.stats.blocked_no_slot += 1;
            debug!(process = %self.catalog.name(head), "No free slot");
            return TickOutcome::NoFreeSlot(head);
        };

        self.queue.pop_front();
        let duration = self.run_duration(head);
        let run = self.next_run;
        self.next_run += 1;

        let timer = RunTimer::start(now, duration, self.config.visual_cap);
        self.pool.occupy(slot, ActiveRun::new(head, run, timer));
        self.tracker.record_allocation(head);
        self.stats.allocations += 1;

        info!(
            process = %self.catalog.name(head),
            slot,
            run,
            execution = self.tracker.started_runs(head),
            duration_ms = duration.as_millis() as u64,
            visual_ms = timer.visual_duration().as_millis() as u64,
            "Process allocated"
        );

        self.emit_queue();
        self.emit_slot(slot, now);

        TickOutcome::Allocated(Allocation {
            slot,
            process: head,
            run,
            timer,
        })
    }

    /// Remember the timers armed for a run. False if the run already left
    /// its slot.
    pub fn attach_timers(
        &mut self,
        slot: SlotId,
        run: RunId,
        frame: TimerToken,
        completion: TimerToken,
    ) -> bool {
        match self.pool.occupant_mut(slot) {
            Some(active) if active.run == run => {
                active.frame_token = Some(frame);
                active.completion_token = Some(completion);
                true
            }
            _ => false,
        }
    }

    /// Sample the run length; the main process also carries the time of
    /// every sub-process run allocated before it
    fn run_duration(&mut self, id: ProcessId) -> Duration {
        let base = self.catalog.descriptor(id).duration.sample(&mut self.rng);
        if Some(id) != self.catalog.main() {
            self.sibling_time += base;
            base
        } else if self.config.policy.main_process.accumulate_sibling_time {
            base + self.sibling_time
        } else {
            base
        }
    }

    /// Apply the post-completion allocation cooldown
    pub(super) fn apply_cooldown(&mut self, slot: SlotId, now: Instant) {
        if self.config.cooldown.is_zero() {
            return;
        }
        let until = now + self.config.cooldown;
        match self.config.policy.cooldown_scope {
            CooldownScope::Global => self.cooldown_until = Some(until),
            CooldownScope::PerSlot => self.pool.set_cooldown(slot, until),
        }
    }
}
