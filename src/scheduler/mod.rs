/*!
 * Scheduler Module
 * Queue, allocation, completion and the finalized record
 */

pub mod allocator;
pub mod completion;
pub mod finalized;
pub mod progress;
pub mod queue;
pub mod snapshot;
pub mod state;
pub mod stats;

// Re-export public API
pub use allocator::{Allocation, TickOutcome};
pub use completion::{Completion, CompletionOutcome, ManualCancel};
pub use finalized::{CancelReason, FinalizedEntry, FinalizedRecord, Outcome};
pub use progress::RunTimer;
pub use queue::PendingQueue;
pub use snapshot::{SimulationSnapshot, SlotView};
pub use state::{LifecycleState, SchedulerState};
pub use stats::SimulationStats;
