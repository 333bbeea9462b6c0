/*!
 * Core Types
 * Identifiers shared across the simulator
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process identifier: index of the process in its catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u16);

impl ProcessId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Slot index in fixed pool order
pub type SlotId = usize;

/// Run identifier, unique per allocation within a simulation
pub type RunId = u64;

/// Lifecycle generation, bumped on every start, stop and reset
pub type Epoch = u64;
