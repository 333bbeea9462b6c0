/*!
 * Simulation Controller
 *
 * Owns the scheduler state and the timer registry, and turns timer firings
 * into state transitions. Every callback carries the epoch it was armed in
 * and does nothing once start, stop or reset has moved the epoch on.
 */

use super::builder::SimulationBuilder;
use crate::core::config::SimulationConfig;
use crate::core::errors::Result;
use crate::core::limits::DRAIN_POLL;
use crate::core::types::{Epoch, ProcessId, RunId, SlotId};
use crate::memory::pool::ActiveRun;
use crate::process::catalog::ProcessCatalog;
use crate::scheduler::{
    Allocation, CompletionOutcome, LifecycleState, SchedulerState, SimulationSnapshot,
    TickOutcome,
};
use crate::timers::{TimerKind, TimerRegistry};
use parking_lot::{Mutex, MutexGuard};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, trace};

pub(super) struct Core {
    state: Mutex<SchedulerState>,
    timers: TimerRegistry,
    catalog: Arc<ProcessCatalog>,
    config: SimulationConfig,
}

impl Core {
    pub(super) fn new(
        state: SchedulerState,
        catalog: Arc<ProcessCatalog>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            state: Mutex::new(state),
            timers: TimerRegistry::new(),
            catalog,
            config,
        }
    }

    /// Lock the state if it is still in `epoch`
    fn lock_in(&self, epoch: Epoch) -> Option<MutexGuard<'_, SchedulerState>> {
        let state = self.state.lock();
        if state.epoch() == epoch {
            Some(state)
        } else {
            trace!(epoch, current = state.epoch(), "Stale timer ignored");
            None
        }
    }

    fn on_tick(self: &Arc<Self>, epoch: Epoch) -> ControlFlow<()> {
        let Some(mut state) = self.lock_in(epoch) else {
            return ControlFlow::Break(());
        };
        if let TickOutcome::Allocated(allocation) = state.tick(Instant::now()) {
            self.arm_run(&mut state, epoch, allocation);
        }
        ControlFlow::Continue(())
    }

    /// Start the frame and completion timers of a fresh run
    fn arm_run(self: &Arc<Self>, state: &mut SchedulerState, epoch: Epoch, allocation: Allocation) {
        let Allocation {
            slot, run, timer, ..
        } = allocation;

        let weak = Arc::downgrade(self);
        let frame = self
            .timers
            .schedule_repeating(TimerKind::Frame, self.config.frame_period, move || {
                weak.upgrade().map_or(ControlFlow::Break(()), |core| core.on_frame(epoch, slot, run))
            });

        let weak = Arc::downgrade(self);
        let completion =
            self.timers
                .schedule(TimerKind::Completion, timer.duration(), move || {
                    if let Some(core) = weak.upgrade() {
                        core.on_complete(epoch, slot, run);
                    }
                });

        state.attach_timers(slot, run, frame, completion);
    }

    fn on_frame(&self, epoch: Epoch, slot: SlotId, run: RunId) -> ControlFlow<()> {
        let Some(state) = self.lock_in(epoch) else {
            return ControlFlow::Break(());
        };
        match state.sample_progress(slot, run, Instant::now()) {
            Some(progress) if progress < 1.0 => ControlFlow::Continue(()),
            _ => ControlFlow::Break(()),
        }
    }

    fn on_complete(self: &Arc<Self>, epoch: Epoch, slot: SlotId, run: RunId) {
        let Some(mut state) = self.lock_in(epoch) else {
            return;
        };
        let completion = state.complete(slot, run, Instant::now());
        if let Some(main) = &completion.released_main {
            self.cancel_run(main);
        }
        if let CompletionOutcome::Requeue(process) = completion.outcome {
            self.schedule_requeue(epoch, process);
        }
    }

    fn schedule_requeue(self: &Arc<Self>, epoch: Epoch, process: ProcessId) {
        let weak = Arc::downgrade(self);
        self.timers
            .schedule(TimerKind::Requeue, self.config.requeue_delay, move || {
                if let Some(core) = weak.upgrade() {
                    core.on_requeue(epoch, process);
                }
            });
    }

    fn on_requeue(&self, epoch: Epoch, process: ProcessId) {
        if let Some(mut state) = self.lock_in(epoch) {
            state.requeue(process);
        }
    }

    fn cancel_run(&self, run: &ActiveRun) {
        let cancelled = run.tokens().filter(|&token| self.timers.cancel(token)).count();
        debug!(process = %run.process, run = run.run, cancelled, "Run timers cancelled");
    }
}

/// Handle to a running overlay simulation
///
/// Must be created and used inside a Tokio runtime. Dropping the handle
/// cancels every pending timer.
pub struct Simulation {
    core: Arc<Core>,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    pub(super) fn from_core(core: Core) -> Self {
        Self {
            core: Arc::new(core),
        }
    }

    /// Start or resume allocation. Returns false if already running.
    pub fn start(&self) -> bool {
        let mut state = self.core.state.lock();
        if !state.begin() {
            return false;
        }

        let epoch = state.epoch();
        let weak = Arc::downgrade(&self.core);
        self.core
            .timers
            .schedule_repeating(TimerKind::AllocatorTick, self.core.config.tick, move || {
                weak.upgrade().map_or(ControlFlow::Break(()), |core| core.on_tick(epoch))
            });
        true
    }

    /// Stop the simulation, cancelling every timer and draining slots and
    /// queue into the finalized record. Returns the number of drained
    /// processes.
    pub fn stop(&self) -> usize {
        let mut state = self.core.state.lock();
        if state.lifecycle() != LifecycleState::Running {
            return 0;
        }
        let cancelled = self.core.timers.cancel_all();
        debug!(cancelled, "Pending timers cancelled");
        state.halt()
    }

    /// Start if not running, stop otherwise. Returns the new lifecycle state.
    pub fn toggle(&self) -> LifecycleState {
        if self.lifecycle() == LifecycleState::Running {
            self.stop();
        } else {
            self.start();
        }
        self.lifecycle()
    }

    /// Cancel the process in `slot`. Returns false if the slot was free.
    pub fn cancel_slot(&self, slot: SlotId) -> Result<bool> {
        let mut state = self.core.state.lock();
        let Some(cancel) = state.cancel_slot(slot, Instant::now())? else {
            return Ok(false);
        };
        self.core.cancel_run(&cancel.cancelled);
        if let Some(main) = &cancel.released_main {
            self.core.cancel_run(main);
        }
        Ok(true)
    }

    /// Discard all progress and return to the initial queue
    pub fn reset(&self) {
        let mut state = self.core.state.lock();
        let cancelled = self.core.timers.cancel_all();
        debug!(cancelled, "Pending timers cancelled");
        state.reset();
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        self.core.state.lock().snapshot(Instant::now())
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.core.state.lock().lifecycle()
    }

    pub fn is_drained(&self) -> bool {
        self.core.state.lock().is_drained()
    }

    /// Timers currently registered
    pub fn pending_timers(&self) -> usize {
        self.core.timers.len()
    }

    pub fn pending_timers_of(&self, kind: TimerKind) -> usize {
        self.core.timers.count(kind)
    }

    pub fn catalog(&self) -> &ProcessCatalog {
        &self.core.catalog
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.core.config
    }

    /// Wait until nothing is left to run or the simulation is not running
    pub async fn drained(&self) {
        loop {
            {
                let state = self.core.state.lock();
                if state.lifecycle() != LifecycleState::Running || state.is_drained() {
                    break;
                }
            }
            tokio::time::sleep(DRAIN_POLL).await;
        }
        info!("Simulation drained");
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("state", &*self.core.state.lock())
            .field("timers", &self.core.timers)
            .finish()
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        let cancelled = self.core.timers.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "Simulation dropped, timers cancelled");
        }
    }
}
