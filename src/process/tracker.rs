/*!
 * Execution Tracker
 * Per-process run counters and the manual-cancellation set
 */

use super::catalog::ProcessCatalog;
use crate::core::types::ProcessId;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Runtime counters for one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRuntimeState {
    pub id: ProcessId,
    /// Runs allocated to a slot so far
    pub started_runs: u32,
    /// Runs that ran to completion
    pub completed_runs: u32,
    pub manually_cancelled: bool,
}

impl ProcessRuntimeState {
    fn new(id: ProcessId) -> Self {
        Self {
            id,
            started_runs: 0,
            completed_runs: 0,
            manually_cancelled: false,
        }
    }
}

/// Tracks how often each process ran and which were cancelled by hand
///
/// Entries are created lazily on the first scheduling attempt and live until
/// `reset`. Cancellation is permanent: there is no un-cancel.
#[derive(Debug, Clone)]
pub struct ExecutionTracker {
    limits: Vec<u32>,
    states: AHashMap<ProcessId, ProcessRuntimeState>,
}

impl ExecutionTracker {
    pub fn new(catalog: &ProcessCatalog) -> Self {
        Self {
            limits: catalog.iter().map(|(_, e)| e.max_repetitions).collect(),
            states: AHashMap::new(),
        }
    }

    /// Create the runtime entry for a process if it has none yet
    pub fn register(&mut self, id: ProcessId) -> &ProcessRuntimeState {
        self.states
            .entry(id)
            .or_insert_with(|| ProcessRuntimeState::new(id))
    }

    /// Whether the process may run again
    pub fn is_eligible(&self, id: ProcessId) -> bool {
        match self.states.get(&id) {
            Some(state) if state.manually_cancelled => false,
            Some(state) => state.completed_runs < self.limit(id),
            None => self.limit(id) > 0,
        }
    }

    pub fn record_allocation(&mut self, id: ProcessId) {
        let state = self
            .states
            .entry(id)
            .or_insert_with(|| ProcessRuntimeState::new(id));
        state.started_runs = state.started_runs.saturating_add(1);
    }

    /// Count a finished run; never exceeds the repetition ceiling
    pub fn record_completion(&mut self, id: ProcessId) {
        let limit = self.limit(id);
        let state = self
            .states
            .entry(id)
            .or_insert_with(|| ProcessRuntimeState::new(id));
        debug_assert!(
            state.completed_runs < limit,
            "completion recorded past the repetition ceiling"
        );
        state.completed_runs = (state.completed_runs + 1).min(limit);
    }

    /// Mark a process as manually cancelled. Returns false if it already was.
    pub fn cancel(&mut self, id: ProcessId) -> bool {
        let state = self
            .states
            .entry(id)
            .or_insert_with(|| ProcessRuntimeState::new(id));
        !std::mem::replace(&mut state.manually_cancelled, true)
    }

    pub fn is_cancelled(&self, id: ProcessId) -> bool {
        self.states
            .get(&id)
            .is_some_and(|state| state.manually_cancelled)
    }

    pub fn completed_runs(&self, id: ProcessId) -> u32 {
        self.states.get(&id).map_or(0, |state| state.completed_runs)
    }

    pub fn started_runs(&self, id: ProcessId) -> u32 {
        self.states.get(&id).map_or(0, |state| state.started_runs)
    }

    /// Runs not yet started
    pub fn remaining(&self, id: ProcessId) -> u32 {
        self.limit(id).saturating_sub(self.started_runs(id))
    }

    pub fn state(&self, id: ProcessId) -> Option<&ProcessRuntimeState> {
        self.states.get(&id)
    }

    /// All tracked processes, ordered by id
    pub fn states(&self) -> Vec<ProcessRuntimeState> {
        let mut states: Vec<_> = self.states.values().copied().collect();
        states.sort_by_key(|state| state.id);
        states
    }

    pub fn reset(&mut self) {
        self.states.clear();
    }

    #[inline]
    fn limit(&self, id: ProcessId) -> u32 {
        self.limits.get(id.index()).copied().unwrap_or(0)
    }
}
