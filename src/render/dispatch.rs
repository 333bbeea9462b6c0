/*!
 * Render Dispatch
 *
 * Scheduler code emits render events into an unbounded channel while it
 * holds the state lock; one dispatcher task drains the channel and calls the
 * renderer in emission order. Events may carry a pacing delay, used to
 * stagger the drain animation on stop.
 */

use super::traits::Renderer;
use crate::core::types::SlotId;
use crate::scheduler::finalized::FinalizedEntry;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// One renderer notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    Slot {
        slot: SlotId,
        occupant: Option<String>,
        progress: f64,
    },
    Finalized(FinalizedEntry),
    Queue {
        pending: Vec<String>,
    },
}

impl RenderEvent {
    /// Invoke the matching renderer method
    pub fn deliver(&self, renderer: &dyn Renderer) {
        match self {
            RenderEvent::Slot {
                slot,
                occupant,
                progress,
            } => renderer.render_slot(*slot, occupant.as_deref(), *progress),
            RenderEvent::Finalized(entry) => renderer.render_finalized(entry),
            RenderEvent::Queue { pending } => renderer.render_queue(pending),
        }
    }
}

#[derive(Debug)]
struct Notice {
    delay: Duration,
    event: RenderEvent,
}

/// Sending half of the render channel
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    /// Spawn the dispatcher task for `renderer`
    ///
    /// The task ends once every `Notifier` clone is dropped.
    pub fn spawn(renderer: Arc<dyn Renderer>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(rx, renderer));
        Self { tx: Some(tx) }
    }

    /// Notifier that drops every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Deliver as soon as the dispatcher gets to it
    pub fn emit(&self, event: RenderEvent) {
        self.emit_after(Duration::ZERO, event);
    }

    /// Deliver `delay` after the previous event was delivered
    pub fn emit_after(&self, delay: Duration, event: RenderEvent) {
        if let Some(tx) = &self.tx {
            // A closed channel means the dispatcher is gone with the simulation
            let _ = tx.send(Notice { delay, event });
        }
    }
}

async fn dispatch(mut rx: mpsc::UnboundedReceiver<Notice>, renderer: Arc<dyn Renderer>) {
    while let Some(notice) = rx.recv().await {
        if !notice.delay.is_zero() {
            tokio::time::sleep(notice.delay).await;
        }
        notice.event.deliver(renderer.as_ref());
    }
    debug!("Render dispatcher finished");
}
