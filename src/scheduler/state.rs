/*!
 * Scheduler State
 *
 * All mutable simulation state in one struct, owned by the simulation core
 * behind a single lock. Methods are synchronous and take `now` explicitly;
 * arming and cancelling timers is left to the caller.
 */

use super::finalized::{CancelReason, FinalizedEntry, FinalizedRecord};
use super::queue::PendingQueue;
use super::snapshot::{SimulationSnapshot, SlotView};
use super::stats::SimulationStats;
use crate::core::config::SimulationConfig;
use crate::core::types::{Epoch, ProcessId, RunId, SlotId};
use crate::memory::pool::SlotPool;
use crate::process::catalog::ProcessCatalog;
use crate::process::tracker::ExecutionTracker;
use crate::render::{Notifier, RenderEvent};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Lifecycle of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Built or reset, never started
    Idle,
    Running,
    Stopped,
}

pub struct SchedulerState {
    pub(super) catalog: Arc<ProcessCatalog>,
    pub(super) config: SimulationConfig,
    pub(super) lifecycle: LifecycleState,
    pub(super) epoch: Epoch,
    pub(super) next_run: RunId,
    pub(super) tracker: ExecutionTracker,
    pub(super) pool: SlotPool,
    pub(super) queue: PendingQueue,
    /// Completed processes waiting out the re-queue delay
    pub(super) awaiting_requeue: Vec<ProcessId>,
    pub(super) finalized: FinalizedRecord,
    pub(super) cooldown_until: Option<Instant>,
    /// Total duration of sub-process runs allocated so far
    pub(super) sibling_time: Duration,
    /// Initial-queue processes other than the main one
    pub(super) siblings: Vec<ProcessId>,
    initial_queue: Vec<ProcessId>,
    stop_cancelled: Vec<ProcessId>,
    pub(super) stats: SimulationStats,
    pub(super) rng: StdRng,
    pub(super) notifier: Notifier,
}

impl SchedulerState {
    pub fn new(
        catalog: Arc<ProcessCatalog>,
        config: SimulationConfig,
        initial_queue: Vec<ProcessId>,
        rng: StdRng,
        notifier: Notifier,
    ) -> Self {
        let siblings = initial_queue
            .iter()
            .copied()
            .filter(|&id| Some(id) != catalog.main())
            .collect();

        let mut state = Self {
            tracker: ExecutionTracker::new(&catalog),
            pool: SlotPool::new(config.slots),
            catalog,
            config,
            lifecycle: LifecycleState::Idle,
            epoch: 0,
            next_run: 1,
            queue: PendingQueue::new(),
            awaiting_requeue: Vec::new(),
            finalized: FinalizedRecord::new(),
            cooldown_until: None,
            sibling_time: Duration::ZERO,
            siblings,
            initial_queue,
            stop_cancelled: Vec::new(),
            stats: SimulationStats::default(),
            rng,
            notifier,
        };
        state.seed_queue();
        state
    }

    fn seed_queue(&mut self) {
        for &id in &self.initial_queue {
            self.queue.push_back(id);
        }
        self.emit_queue();
    }

    #[inline]
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    #[inline]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn catalog(&self) -> &ProcessCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ExecutionTracker {
        &self.tracker
    }

    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn finalized(&self) -> &FinalizedRecord {
        &self.finalized
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    /// Whether the global cooldown suppresses allocation at `now`
    pub fn cooldown_active(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Nothing queued, running or waiting to be re-queued
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.awaiting_requeue.is_empty() && self.pool.occupied() == 0
    }

    /// Enter `Running`. Returns false if already running.
    pub fn begin(&mut self) -> bool {
        if self.lifecycle == LifecycleState::Running {
            return false;
        }

        let restarting = self.lifecycle == LifecycleState::Stopped;
        self.lifecycle = LifecycleState::Running;
        self.epoch += 1;

        let retry = std::mem::take(&mut self.stop_cancelled);
        if restarting && self.config.policy.retry_cancelled {
            let mut requeued = 0;
            for id in retry {
                if self.tracker.is_eligible(id) && self.queue.push_back(id) {
                    requeued += 1;
                }
            }
            if requeued > 0 {
                info!(requeued, "Re-queued processes cancelled by the last stop");
                self.emit_queue();
            }
        }

        info!(
            epoch = self.epoch,
            restarting,
            queued = self.queue.len(),
            "Simulation started"
        );
        true
    }

    /// Enter `Stopped` and drain every slot, queued entry and pending
    /// re-queue into the finalized record as cancelled.
    ///
    /// State changes immediately; renderer notifications are paced by
    /// `stop_stagger`. Returns the number of drained processes.
    pub fn halt(&mut self) -> usize {
        if self.lifecycle != LifecycleState::Running {
            return 0;
        }

        self.lifecycle = LifecycleState::Stopped;
        self.epoch += 1;
        self.cooldown_until = None;
        self.pool.clear_cooldowns();

        let stagger = self.config.stop_stagger;
        let mut pace = Duration::ZERO;
        let mut drained = 0;

        for slot in 0..self.pool.len() {
            if let Some(active) = self.pool.release(slot) {
                self.cancel_on_stop(active.process, "slot", pace);
                self.notifier.emit(RenderEvent::Slot {
                    slot,
                    occupant: None,
                    progress: 0.0,
                });
                pace = stagger;
                drained += 1;
            }
        }

        let queued = self.queue.drain();
        for (i, &id) in queued.iter().enumerate() {
            self.cancel_on_stop(id, "queue", pace);
            self.notifier.emit(RenderEvent::Queue {
                pending: self.names(&queued[i + 1..]),
            });
            pace = stagger;
            drained += 1;
        }

        for id in std::mem::take(&mut self.awaiting_requeue) {
            self.cancel_on_stop(id, "requeue", pace);
            pace = stagger;
            drained += 1;
        }

        info!(epoch = self.epoch, drained, "Simulation stopped");
        drained
    }

    fn cancel_on_stop(&mut self, id: ProcessId, location: &'static str, pace: Duration) {
        let name = self.catalog.name(id).to_owned();
        info!(
            process = %name,
            location,
            remaining = self.tracker.remaining(id),
            "Process cancelled: simulation stopped"
        );
        self.stats.stop_cancellations += 1;
        self.stop_cancelled.push(id);
        self.finalize_after(pace, FinalizedEntry::cancelled(id, name, CancelReason::Stopped));
    }

    /// Back to `Idle` with fresh counters and the initial queue
    pub fn reset(&mut self) {
        self.lifecycle = LifecycleState::Idle;
        self.epoch += 1;

        for slot in 0..self.pool.len() {
            if self.pool.release(slot).is_some() {
                self.notifier.emit(RenderEvent::Slot {
                    slot,
                    occupant: None,
                    progress: 0.0,
                });
            }
        }
        self.pool.clear_cooldowns();
        self.cooldown_until = None;
        self.queue.drain();
        self.awaiting_requeue.clear();
        self.stop_cancelled.clear();
        self.tracker.reset();
        self.finalized.clear();
        self.stats = SimulationStats::default();
        self.sibling_time = Duration::ZERO;
        self.seed_queue();

        info!(epoch = self.epoch, "Simulation reset");
    }

    /// Report the progress of a run; None once the run left its slot
    pub fn sample_progress(&self, slot: SlotId, run: RunId, now: Instant) -> Option<f64> {
        let active = self.pool.get(slot)?.occupant()?;
        if active.run != run {
            return None;
        }
        let progress = active.progress(now);
        self.notifier.emit(RenderEvent::Slot {
            slot,
            occupant: Some(self.catalog.name(active.process).to_owned()),
            progress,
        });
        Some(progress)
    }

    pub fn snapshot(&self, now: Instant) -> SimulationSnapshot {
        let slots = self
            .pool
            .iter()
            .map(|slot| {
                let occupant = slot.occupant();
                SlotView {
                    slot: slot.id(),
                    occupant: occupant.map(|run| run.process),
                    name: occupant.map(|run| self.catalog.name(run.process).to_owned()),
                    progress: slot.progress(now),
                    held: occupant.is_some_and(|run| run.held),
                    cooling_down: slot.is_cooling(now),
                }
            })
            .collect();

        SimulationSnapshot {
            lifecycle: self.lifecycle,
            epoch: self.epoch,
            slots,
            queue: self.queue.to_vec(),
            awaiting_requeue: self.awaiting_requeue.clone(),
            finalized: self.finalized.entries().to_vec(),
            processes: self.tracker.states(),
            cooling_down: self.cooldown_active(now),
            stats: self.stats,
        }
    }

    pub(super) fn finalize(&mut self, entry: FinalizedEntry) {
        self.finalize_after(Duration::ZERO, entry);
    }

    fn finalize_after(&mut self, pace: Duration, entry: FinalizedEntry) {
        self.notifier
            .emit_after(pace, RenderEvent::Finalized(entry.clone()));
        self.finalized.append(entry);
    }

    pub(super) fn emit_queue(&self) {
        self.notifier.emit(RenderEvent::Queue {
            pending: self.names(&self.queue.to_vec()),
        });
    }

    pub(super) fn emit_slot(&self, slot: SlotId, now: Instant) {
        let Some(view) = self.pool.get(slot) else {
            return;
        };
        self.notifier.emit(RenderEvent::Slot {
            slot,
            occupant: view
                .occupant()
                .map(|run| self.catalog.name(run.process).to_owned()),
            progress: view.progress(now),
        });
        debug!(slot, free = view.is_free(), "Slot state changed");
    }

    fn names(&self, ids: &[ProcessId]) -> Vec<String> {
        ids.iter()
            .map(|&id| self.catalog.name(id).to_owned())
            .collect()
    }
}

impl std::fmt::Debug for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerState")
            .field("lifecycle", &self.lifecycle)
            .field("epoch", &self.epoch)
            .field("queue", &self.queue)
            .field("occupied", &self.pool.occupied())
            .field("finalized", &self.finalized.len())
            .finish_non_exhaustive()
    }
}
