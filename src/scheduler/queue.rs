/*!
 * Pending Queue
 * FIFO of processes waiting for a free slot
 */

use crate::core::types::ProcessId;
use std::collections::VecDeque;

/// FIFO queue in which a process appears at most once
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    entries: VecDeque<ProcessId>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a process. Returns false if it is already queued.
    pub fn push_back(&mut self, id: ProcessId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.entries.push_back(id);
        true
    }

    #[inline]
    pub fn front(&self) -> Option<ProcessId> {
        self.entries.front().copied()
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<ProcessId> {
        self.entries.pop_front()
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.entries.contains(&id)
    }

    /// Take every entry in FIFO order
    pub fn drain(&mut self) -> Vec<ProcessId> {
        self.entries.drain(..).collect()
    }

    pub fn to_vec(&self) -> Vec<ProcessId> {
        self.entries.iter().copied().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
