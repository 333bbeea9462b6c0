/*!
 * Simulation Limits and Constants
 *
 * Centralized location for the default timings and sizes of the simulator.
 * Every value here can be overridden through `SimulationConfig`.
 */

use std::time::Duration;

// =============================================================================
// SLOT POOL
// =============================================================================

/// Number of overlay slots when none is configured
pub const DEFAULT_SLOT_COUNT: usize = 4;

/// Upper bound on configured slots
pub const MAX_SLOT_COUNT: usize = 64;

/// Upper bound on catalog entries (ids are u16)
pub const MAX_CATALOG_ENTRIES: usize = u16::MAX as usize;

// =============================================================================
// ALLOCATOR TIMING
// =============================================================================

/// Allocator poll period
/// The allocator re-checks the queue head at this rate while running
pub const ALLOCATOR_TICK: Duration = Duration::from_millis(500);

/// Allocation cooldown applied after every completion
pub const ALLOCATION_COOLDOWN: Duration = Duration::from_millis(500);

/// Delay before a completed process re-enters the pending queue
pub const REQUEUE_DELAY: Duration = Duration::from_millis(1000);

// =============================================================================
// RUN TIMER
// =============================================================================

/// Cap on the displayed progress duration
/// Runs longer than this fill their bar early, then wait out the remainder
pub const VISUAL_CAP: Duration = Duration::from_millis(10_000);

/// Progress sampling period (~60 frames per second)
pub const FRAME_PERIOD: Duration = Duration::from_millis(16);

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Presentation pacing between drained entries on stop
pub const STOP_STAGGER: Duration = Duration::from_millis(300);

/// Poll period used while waiting for a simulation to drain
pub const DRAIN_POLL: Duration = Duration::from_millis(100);
