/*!
 * Main process: held at full progress until every sibling is done
 */

use super::support::{advance, catalog, drain_within, names, simulation};
use overlay_sim::{
    ConfigError, MainProcessPolicy, Outcome, ProcessDescriptor, ProcessId, Simulation,
    SimulationConfig, SimulationError, SimulationPolicy, TimerKind,
};
use pretty_assertions::assert_eq;

fn family() -> Vec<ProcessDescriptor> {
    vec![
        ProcessDescriptor::main("Main", 500, 1),
        ProcessDescriptor::new("S1", 1000, 1),
        ProcessDescriptor::new("S2", 1500, 1),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_main_held_until_siblings_finish() {
    let (sim, renderer) = simulation(
        family(),
        SimulationConfig::new().with_slots(3),
        &["Main", "S1", "S2"],
    );
    let main = ProcessId(0);

    sim.start();
    advance(700).await;

    let snapshot = sim.snapshot();
    let slot = snapshot.slot_of(main).unwrap();
    assert!(snapshot.slots[slot].held);
    assert_eq!(snapshot.slots[slot].progress, 1.0);
    assert_eq!(snapshot.completed_runs(main), 0);
    assert_eq!(snapshot.stats.holds, 1);

    drain_within(&sim, 10_000).await;
    advance(50).await;

    let snapshot = sim.snapshot();
    let finalized = names(&snapshot.finalized);
    assert_eq!(finalized.len(), 3);
    assert_eq!(finalized[2], "Main");
    assert_eq!(snapshot.finalized_count(main, Outcome::Completed), 1);
    assert_eq!(snapshot.completed_runs(main), 1);
    assert_eq!(names(&renderer.finalized()), finalized);
    assert_eq!(sim.pending_timers_of(TimerKind::Completion), 0);
}

#[tokio::test(start_paused = true)]
async fn test_main_duration_includes_sibling_time() {
    let config = SimulationConfig::new()
        .with_slots(3)
        .with_policy(SimulationPolicy {
            main_process: MainProcessPolicy {
                hold_until_siblings_done: false,
                accumulate_sibling_time: true,
            },
            ..SimulationPolicy::default()
        });
    let (sim, _renderer) = simulation(family(), config, &["S1", "S2", "Main"]);
    let main = ProcessId(0);

    sim.start();
    // Main starts by 1500ms and runs 500 + 1000 + 1500
    advance(1600).await;
    assert!(sim.snapshot().slot_of(main).is_some());

    advance(2200).await;
    let snapshot = sim.snapshot();
    assert!(snapshot.slot_of(main).is_some());
    assert_eq!(snapshot.finalized_count(main, Outcome::Completed), 0);
    assert_eq!(names(&snapshot.finalized), vec!["S1", "S2"]);

    drain_within(&sim, 10_000).await;
    assert_eq!(sim.snapshot().finalized_count(main, Outcome::Completed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_plain_policy_finishes_main_first() {
    let config = SimulationConfig::new()
        .with_slots(3)
        .with_policy(SimulationPolicy {
            main_process: MainProcessPolicy::plain(),
            ..SimulationPolicy::default()
        });
    let (sim, _renderer) = simulation(family(), config, &["Main", "S1", "S2"]);

    sim.start();
    drain_within(&sim, 10_000).await;

    let snapshot = sim.snapshot();
    assert_eq!(names(&snapshot.finalized)[0], "Main");
    assert_eq!(snapshot.stats.holds, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_last_sibling_releases_main() {
    let (sim, _renderer) = simulation(
        vec![
            ProcessDescriptor::main("Main", 200, 1),
            ProcessDescriptor::new("S", 8000, 1),
        ],
        SimulationConfig::new().with_slots(2),
        &["Main", "S"],
    );

    sim.start();
    advance(1100).await;
    let snapshot = sim.snapshot();
    let s_slot = snapshot.slot_of(ProcessId(1)).unwrap();
    assert!(snapshot.slots[snapshot.slot_of(ProcessId(0)).unwrap()].held);

    assert!(sim.cancel_slot(s_slot).unwrap());

    let snapshot = sim.snapshot();
    assert!(snapshot.is_drained());
    assert_eq!(names(&snapshot.finalized), vec!["S", "Main"]);
    assert_eq!(snapshot.finalized[1].outcome, Outcome::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_single_slot_with_held_main_rejected() {
    let pair = || {
        catalog(vec![
            ProcessDescriptor::main("Main", 500, 1),
            ProcessDescriptor::new("S", 500, 1),
        ])
    };

    let err = Simulation::builder()
        .with_catalog(pair())
        .with_config(SimulationConfig::new().with_slots(1))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SimulationError::Config(ConfigError::MainHoldWithoutSpareSlot("Main".into()))
    );

    // Without the hold the same setup runs to completion
    let sim = Simulation::builder()
        .with_catalog(pair())
        .with_config(
            SimulationConfig::new()
                .with_slots(1)
                .with_policy(SimulationPolicy {
                    main_process: MainProcessPolicy::plain(),
                    ..SimulationPolicy::default()
                }),
        )
        .build()
        .unwrap();
    sim.start();
    drain_within(&sim, 10_000).await;
    assert_eq!(names(&sim.snapshot().finalized), vec!["Main", "S"]);
}
