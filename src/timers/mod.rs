/*!
 * Timers
 * Cancellation registry for every scheduled callback
 */

pub mod registry;

pub use registry::{TimerKind, TimerRegistry, TimerToken};
