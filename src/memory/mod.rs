/*!
 * Overlay Memory
 * The fixed pool of overlay slots processes are loaded into
 */

pub mod pool;

pub use pool::{ActiveRun, Slot, SlotPool};
