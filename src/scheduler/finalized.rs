/*!
 * Finalized Record
 * Append-only log of processes that left the simulation
 */

use crate::core::types::ProcessId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// Why a process was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// User action on its slot
    Manual,
    /// Drained by a simulation stop
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedEntry {
    pub process: ProcessId,
    pub name: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<CancelReason>,
}

impl FinalizedEntry {
    pub fn completed(process: ProcessId, name: impl Into<String>) -> Self {
        Self {
            process,
            name: name.into(),
            outcome: Outcome::Completed,
            cancel_reason: None,
        }
    }

    pub fn cancelled(process: ProcessId, name: impl Into<String>, reason: CancelReason) -> Self {
        Self {
            process,
            name: name.into(),
            outcome: Outcome::Cancelled,
            cancel_reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FinalizedRecord {
    entries: Vec<FinalizedEntry>,
}

impl FinalizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: FinalizedEntry) -> &FinalizedEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[FinalizedEntry] {
        &self.entries
    }

    pub fn count(&self, process: ProcessId, outcome: Outcome) -> usize {
        self.entries
            .iter()
            .filter(|e| e.process == process && e.outcome == outcome)
            .count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut record = FinalizedRecord::new();
        record.append(FinalizedEntry::completed(ProcessId(1), "B"));
        record.append(FinalizedEntry::cancelled(
            ProcessId(0),
            "A",
            CancelReason::Manual,
        ));

        let names: Vec<_> = record.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(record.count(ProcessId(0), Outcome::Cancelled), 1);
        assert_eq!(record.count(ProcessId(0), Outcome::Completed), 0);
    }

    #[test]
    fn test_entry_json() {
        let json = serde_json::to_value(FinalizedEntry::completed(ProcessId(2), "C")).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert!(json.get("cancel_reason").is_none());

        let json = serde_json::to_value(FinalizedEntry::cancelled(
            ProcessId(2),
            "C",
            CancelReason::Stopped,
        ))
        .unwrap();
        assert_eq!(json["cancel_reason"], "stopped");
    }
}
