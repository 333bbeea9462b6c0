/*!
 * Start / stop / restart / reset behavior
 */

use super::support::{advance, drain_within, names, simulation};
use overlay_sim::{
    CancelReason, LifecycleState, Outcome, ProcessDescriptor, ProcessId, SimulationConfig,
    SimulationError, SimulationPolicy,
};
use pretty_assertions::assert_eq;

fn pair() -> Vec<ProcessDescriptor> {
    vec![
        ProcessDescriptor::new("A", 2000, 1),
        ProcessDescriptor::new("B", 2000, 1),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_restart_without_retry_leaves_queue_empty() {
    let (sim, _renderer) = simulation(pair(), SimulationConfig::new().with_slots(1), &["A", "B"]);

    sim.start();
    advance(100).await;
    assert_eq!(sim.stop(), 2);

    assert!(sim.start());
    assert!(!sim.start());
    advance(2000).await;

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Running);
    assert!(snapshot.is_drained());
    assert_eq!(snapshot.stats.allocations, 1);
    assert_eq!(snapshot.finalized.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_restart_with_retry_requeues_stopped() {
    let config = SimulationConfig::new()
        .with_slots(1)
        .with_policy(SimulationPolicy {
            retry_cancelled: true,
            ..SimulationPolicy::default()
        });
    let (sim, _renderer) = simulation(pair(), config, &["A", "B"]);

    sim.start();
    advance(100).await;
    sim.stop();
    assert_eq!(sim.snapshot().queue, Vec::<ProcessId>::new());

    sim.start();
    assert_eq!(sim.snapshot().queue.len() + sim.snapshot().occupied_slots(), 2);
    drain_within(&sim, 10_000).await;

    let snapshot = sim.snapshot();
    assert_eq!(names(&snapshot.finalized), vec!["A", "B", "A", "B"]);
    assert_eq!(snapshot.finalized_count(ProcessId(0), Outcome::Completed), 1);
    assert_eq!(snapshot.finalized_count(ProcessId(1), Outcome::Completed), 1);
    assert_eq!(snapshot.finalized[0].cancel_reason, Some(CancelReason::Stopped));
}

#[tokio::test(start_paused = true)]
async fn test_manual_cancel_not_retried() {
    let config = SimulationConfig::new()
        .with_slots(1)
        .with_policy(SimulationPolicy {
            retry_cancelled: true,
            ..SimulationPolicy::default()
        });
    let (sim, _renderer) = simulation(pair(), config, &["A", "B"]);

    sim.start();
    advance(100).await;
    sim.cancel_slot(0).unwrap();
    sim.stop();
    sim.start();
    drain_within(&sim, 10_000).await;

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.finalized_count(ProcessId(0), Outcome::Completed), 0);
    assert_eq!(snapshot.finalized_count(ProcessId(1), Outcome::Completed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_restores_initial_queue() {
    let (sim, _renderer) = simulation(pair(), SimulationConfig::new().with_slots(1), &["B", "A"]);

    sim.start();
    advance(2600).await;
    assert!(!sim.snapshot().finalized.is_empty());

    sim.reset();
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Idle);
    assert_eq!(snapshot.queue, vec![ProcessId(1), ProcessId(0)]);
    assert!(snapshot.finalized.is_empty());
    assert!(snapshot.processes.is_empty());
    assert_eq!(snapshot.occupied_slots(), 0);
    assert_eq!(sim.pending_timers(), 0);

    advance(5000).await;
    assert_eq!(sim.snapshot().occupied_slots(), 0);

    sim.start();
    drain_within(&sim, 10_000).await;
    assert_eq!(names(&sim.snapshot().finalized), vec!["B", "A"]);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_and_cancel_out_of_range() {
    let (sim, _renderer) = simulation(pair(), SimulationConfig::new().with_slots(2), &["A", "B"]);

    assert_eq!(sim.toggle(), LifecycleState::Running);
    assert_eq!(
        sim.cancel_slot(5),
        Err(SimulationError::SlotOutOfRange { slot: 5, slots: 2 })
    );
    assert_eq!(sim.toggle(), LifecycleState::Stopped);
    assert_eq!(sim.pending_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_timers() {
    let (sim, renderer) = simulation(pair(), SimulationConfig::new().with_slots(2), &["A", "B"]);
    sim.start();
    advance(600).await;
    drop(sim);

    advance(50).await;
    let events = renderer.events().len();
    advance(5000).await;
    assert_eq!(renderer.events().len(), events);
}
