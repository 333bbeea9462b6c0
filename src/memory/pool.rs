/*!
 * Slot Pool
 *
 * Fixed set of overlay slots. A slot is either free or holds exactly one
 * active run; slot selection is first-free in fixed order.
 */

use crate::core::types::{ProcessId, RunId, SlotId};
use crate::scheduler::progress::RunTimer;
use crate::timers::TimerToken;
use tokio::time::Instant;

/// A process occupying a slot
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRun {
    pub process: ProcessId,
    pub run: RunId,
    pub timer: RunTimer,
    /// Run finished but the process may not leave its slot yet
    pub held: bool,
    pub frame_token: Option<TimerToken>,
    pub completion_token: Option<TimerToken>,
}

impl ActiveRun {
    pub fn new(process: ProcessId, run: RunId, timer: RunTimer) -> Self {
        Self {
            process,
            run,
            timer,
            held: false,
            frame_token: None,
            completion_token: None,
        }
    }

    /// Registered timers of this run
    pub fn tokens(&self) -> impl Iterator<Item = TimerToken> {
        self.frame_token.into_iter().chain(self.completion_token)
    }

    pub fn progress(&self, now: Instant) -> f64 {
        if self.held {
            1.0
        } else {
            self.timer.progress(now)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    id: SlotId,
    occupant: Option<ActiveRun>,
    cooldown_until: Option<Instant>,
}

impl Slot {
    fn new(id: SlotId) -> Self {
        Self {
            id,
            occupant: None,
            cooldown_until: None,
        }
    }

    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    #[inline]
    pub fn occupant(&self) -> Option<&ActiveRun> {
        self.occupant.as_ref()
    }

    pub fn is_cooling(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    pub fn progress(&self, now: Instant) -> f64 {
        self.occupant.as_ref().map_or(0.0, |run| run.progress(now))
    }
}

#[derive(Debug, Clone)]
pub struct SlotPool {
    slots: Vec<Slot>,
}

impl SlotPool {
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(Slot::new).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: SlotId) -> Option<&Slot> {
        self.slots.get(slot)
    }

    /// First free slot in fixed order, optionally skipping slots in cooldown
    pub fn find_free(&self, now: Instant, skip_cooling: bool) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|slot| slot.is_free() && !(skip_cooling && slot.is_cooling(now)))
            .map(Slot::id)
    }

    /// Place a run in a free slot
    pub fn occupy(&mut self, slot: SlotId, run: ActiveRun) {
        let target = &mut self.slots[slot];
        debug_assert!(target.is_free(), "slot {slot} already occupied");
        target.occupant = Some(run);
    }

    /// Free a slot, returning its run
    pub fn release(&mut self, slot: SlotId) -> Option<ActiveRun> {
        self.slots.get_mut(slot).and_then(|s| s.occupant.take())
    }

    pub fn occupant_mut(&mut self, slot: SlotId) -> Option<&mut ActiveRun> {
        self.slots.get_mut(slot).and_then(|s| s.occupant.as_mut())
    }

    /// Slot currently holding a process
    pub fn slot_of(&self, process: ProcessId) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|slot| slot.occupant().is_some_and(|run| run.process == process))
            .map(Slot::id)
    }

    pub fn set_cooldown(&mut self, slot: SlotId, until: Instant) {
        if let Some(target) = self.slots.get_mut(slot) {
            target.cooldown_until = Some(until);
        }
    }

    pub fn clear_cooldowns(&mut self) {
        for slot in &mut self.slots {
            slot.cooldown_until = None;
        }
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_free()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }
}
