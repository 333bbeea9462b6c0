/*!
 * Recording Renderer
 * Keeps every notification in memory for inspection
 */

use super::dispatch::RenderEvent;
use super::traits::Renderer;
use crate::core::types::SlotId;
use crate::scheduler::finalized::FinalizedEntry;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().clone()
    }

    /// Finalized entries in delivery order
    pub fn finalized(&self) -> Vec<FinalizedEntry> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Finalized(entry) => Some(entry.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every queue rendering, oldest first
    pub fn queues(&self) -> Vec<Vec<String>> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Queue { pending } => Some(pending.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent queue contents, if the queue was ever rendered
    pub fn last_queue(&self) -> Option<Vec<String>> {
        self.events.lock().iter().rev().find_map(|event| match event {
            RenderEvent::Queue { pending } => Some(pending.clone()),
            _ => None,
        })
    }

    /// Progress values reported for one slot, in order
    pub fn progress_of(&self, slot: SlotId) -> Vec<f64> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Slot {
                    slot: s, progress, ..
                } if *s == slot => Some(*progress),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render_slot(&self, slot: SlotId, occupant: Option<&str>, progress: f64) {
        self.events.lock().push(RenderEvent::Slot {
            slot,
            occupant: occupant.map(str::to_owned),
            progress,
        });
    }

    fn render_finalized(&self, entry: &FinalizedEntry) {
        self.events.lock().push(RenderEvent::Finalized(entry.clone()));
    }

    fn render_queue(&self, pending: &[String]) {
        self.events.lock().push(RenderEvent::Queue {
            pending: pending.to_vec(),
        });
    }
}
