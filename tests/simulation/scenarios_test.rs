/*!
 * End-to-end scenarios under a paused clock
 */

use super::support::{advance, drain_within, names, simulation};
use overlay_sim::{
    CancelReason, LifecycleState, Outcome, ProcessDescriptor, ProcessId, RenderEvent,
    SimulationConfig, TimerKind,
};
use pretty_assertions::assert_eq;

fn pending(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_repeated_process_on_single_slot() {
    let (sim, renderer) = simulation(
        vec![ProcessDescriptor::new("A", 1000, 2)],
        SimulationConfig::new().with_slots(1),
        &["A"],
    );
    let a = ProcessId(0);

    assert!(sim.start());
    advance(100).await;
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.slot_of(a), Some(0));
    assert_eq!(snapshot.runtime(a).unwrap().started_runs, 1);

    // First run done at 1000ms: slot free, cooldown on, waiting out the re-queue delay
    advance(1000).await;
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.completed_runs(a), 1);
    assert_eq!(snapshot.slot_of(a), None);
    assert_eq!(snapshot.awaiting_requeue, vec![a]);
    assert!(snapshot.queue.is_empty());
    assert!(snapshot.cooling_down);
    assert!(snapshot.finalized.is_empty());

    // Cooldown is over but A is not back before 2000ms
    advance(800).await;
    let snapshot = sim.snapshot();
    assert!(!snapshot.cooling_down);
    assert_eq!(snapshot.awaiting_requeue, vec![a]);
    assert_eq!(snapshot.runtime(a).unwrap().started_runs, 1);
    assert_eq!(snapshot.stats.allocations, 1);

    // Re-queued at 2000ms, placed by the next tick
    advance(700).await;
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.slot_of(a), Some(0));
    assert_eq!(snapshot.runtime(a).unwrap().started_runs, 2);
    assert!(snapshot.awaiting_requeue.is_empty());

    drain_within(&sim, 10_000).await;
    advance(50).await;

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.completed_runs(a), 2);
    assert_eq!(snapshot.stats.allocations, 2);
    assert_eq!(snapshot.stats.requeues, 1);
    assert_eq!(snapshot.finalized_count(a, Outcome::Completed), 1);
    assert_eq!(snapshot.finalized.len(), 1);
    assert!(snapshot.is_drained());

    let progress = renderer.progress_of(0);
    assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!(progress.iter().any(|&p| p > 0.9));
    assert_eq!(renderer.finalized().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_cancel_while_other_queued() {
    let (sim, renderer) = simulation(
        vec![
            ProcessDescriptor::new("A", 1000, 1),
            ProcessDescriptor::new("B", 3000, 2),
        ],
        SimulationConfig::new().with_slots(1),
        &["B", "A"],
    );
    let (a, b) = (ProcessId(0), ProcessId(1));

    sim.start();
    advance(100).await;
    assert_eq!(sim.snapshot().slot_of(b), Some(0));
    assert_eq!(sim.snapshot().queue, vec![a]);

    assert!(sim.cancel_slot(0).unwrap());
    assert_eq!(sim.pending_timers_of(TimerKind::Completion), 0);
    assert!(!sim.cancel_slot(0).unwrap());

    drain_within(&sim, 5_000).await;
    advance(50).await;

    let snapshot = sim.snapshot();
    assert_eq!(names(&snapshot.finalized), vec!["B", "A"]);
    assert_eq!(snapshot.finalized[0].outcome, Outcome::Cancelled);
    assert_eq!(snapshot.finalized[0].cancel_reason, Some(CancelReason::Manual));
    assert_eq!(snapshot.finalized[1].outcome, Outcome::Completed);

    let b_state = snapshot.runtime(b).unwrap();
    assert!(b_state.manually_cancelled);
    assert_eq!(b_state.completed_runs, 0);
    assert_eq!(snapshot.stats.manual_cancellations, 1);

    assert_eq!(names(&renderer.finalized()), vec!["B", "A"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_run_freezes_state() {
    let (sim, renderer) = simulation(
        vec![
            ProcessDescriptor::new("P0", 4000, 1),
            ProcessDescriptor::new("P1", 4000, 1),
            ProcessDescriptor::new("P2", 4000, 1),
        ],
        SimulationConfig::new().with_slots(2),
        &["P0", "P1", "P2"],
    );

    sim.start();
    advance(700).await;
    assert_eq!(sim.snapshot().occupied_slots(), 2);

    let drained = sim.stop();
    assert_eq!(drained, 3);
    assert_eq!(sim.lifecycle(), LifecycleState::Stopped);
    assert_eq!(sim.pending_timers(), 0);

    let stopped = sim.snapshot();
    assert_eq!(names(&stopped.finalized), vec!["P0", "P1", "P2"]);
    assert!(stopped
        .finalized
        .iter()
        .all(|entry| entry.cancel_reason == Some(CancelReason::Stopped)));
    assert!(stopped.is_drained());

    // Renderer sees the drain paced out
    advance(150).await;
    assert_eq!(renderer.finalized().len(), 1);
    advance(1000).await;
    assert_eq!(names(&renderer.finalized()), vec!["P0", "P1", "P2"]);

    // Nothing moves afterwards
    let events = renderer.events().len();
    advance(10_000).await;
    assert_eq!(sim.snapshot(), stopped);
    assert_eq!(renderer.events().len(), events);
    assert!(!renderer.events().iter().skip(events).any(|event| matches!(
        event,
        RenderEvent::Slot {
            occupant: Some(_),
            ..
        }
    )));
    assert_eq!(sim.stop(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_one_allocation_per_tick() {
    let (sim, _renderer) = simulation(
        vec![
            ProcessDescriptor::new("A", 5000, 1),
            ProcessDescriptor::new("B", 5000, 1),
            ProcessDescriptor::new("C", 5000, 1),
        ],
        SimulationConfig::new().with_slots(3),
        &["A", "B", "C"],
    );

    sim.start();
    advance(10).await;
    assert_eq!(sim.snapshot().occupied_slots(), 1);
    advance(500).await;
    assert_eq!(sim.snapshot().occupied_slots(), 2);
    advance(500).await;

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.occupied_slots(), 3);
    let order: Vec<_> = snapshot.slots.iter().map(|view| view.name.clone()).collect();
    assert_eq!(
        order,
        vec![Some("A".to_string()), Some("B".to_string()), Some("C".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_visual_progress_capped() {
    let mut config = SimulationConfig::new().with_slots(1);
    config.visual_cap = std::time::Duration::from_millis(2000);
    let (sim, _renderer) = simulation(vec![ProcessDescriptor::new("Long", 6000, 1)], config, &["Long"]);

    sim.start();
    advance(2500).await;

    // Bar is full, run still in progress
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.slots[0].progress, 1.0);
    assert_eq!(snapshot.completed_runs(ProcessId(0)), 0);

    drain_within(&sim, 10_000).await;
    assert_eq!(sim.snapshot().completed_runs(ProcessId(0)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_queue_rendered_on_every_change() {
    let mut config = SimulationConfig::new().with_slots(1);
    config.requeue_delay = std::time::Duration::from_millis(2000);
    let (sim, renderer) = simulation(
        vec![
            ProcessDescriptor::new("A", 1000, 2),
            ProcessDescriptor::new("B", 5000, 1),
            ProcessDescriptor::new("C", 5000, 1),
        ],
        config,
        &["A", "B", "C"],
    );
    sim.start();
    advance(10).await;
    assert_eq!(renderer.queues(), [pending(&["A", "B", "C"]), pending(&["B", "C"])]);

    // A completes at 1000ms, B takes the slot once the cooldown ends
    advance(1600).await;
    assert_eq!(sim.snapshot().slot_of(ProcessId(1)), Some(0));
    assert_eq!(renderer.last_queue(), Some(pending(&["C"])));

    // A is back at 3000ms, behind C
    advance(1500).await;
    assert_eq!(sim.snapshot().queue, vec![ProcessId(2), ProcessId(0)]);
    assert_eq!(
        renderer.queues(),
        [
            pending(&["A", "B", "C"]),
            pending(&["B", "C"]),
            pending(&["C"]),
            pending(&["C", "A"]),
        ]
    );

    // Manual cancel of the running process leaves the queue alone
    let before = renderer.queues().len();
    assert!(sim.cancel_slot(0).unwrap());
    advance(10).await;
    assert_eq!(renderer.queues().len(), before);

    // Next tick at 3500ms places C
    advance(400).await;
    assert_eq!(renderer.last_queue(), Some(pending(&["A"])));
}

#[tokio::test(start_paused = true)]
async fn test_stop_renders_shrinking_queue() {
    let (sim, renderer) = simulation(
        vec![
            ProcessDescriptor::new("P0", 4000, 1),
            ProcessDescriptor::new("P1", 4000, 1),
            ProcessDescriptor::new("P2", 4000, 1),
            ProcessDescriptor::new("P3", 4000, 1),
        ],
        SimulationConfig::new().with_slots(1),
        &["P0", "P1", "P2", "P3"],
    );
    sim.start();
    advance(100).await;
    assert_eq!(renderer.last_queue(), Some(pending(&["P1", "P2", "P3"])));

    assert_eq!(sim.stop(), 4);
    assert!(sim.snapshot().queue.is_empty());

    // One queued entry leaves per stagger step
    advance(150).await;
    assert_eq!(renderer.last_queue(), Some(pending(&["P1", "P2", "P3"])));
    advance(300).await;
    assert_eq!(renderer.last_queue(), Some(pending(&["P2", "P3"])));
    advance(300).await;
    assert_eq!(renderer.last_queue(), Some(pending(&["P3"])));
    advance(300).await;
    assert_eq!(renderer.last_queue(), Some(pending(&[])));

    let shrinking: Vec<usize> = renderer.queues().iter().map(Vec::len).collect();
    assert_eq!(shrinking, vec![4, 3, 2, 1, 0]);
}
