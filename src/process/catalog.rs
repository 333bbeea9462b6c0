/*!
 * Process Catalog
 *
 * Static table of the demo processes: name, run duration and how many times
 * each may run. Everything downstream refers to processes by `ProcessId`,
 * the entry's index in this table.
 */

use crate::core::errors::ConfigError;
use crate::core::limits::MAX_CATALOG_ENTRIES;
use crate::core::serde::is_default;
use crate::core::types::ProcessId;
use ahash::{AHashMap, AHashSet};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long one run of a process lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurationSpec {
    /// Every run lasts exactly `ms`
    Fixed { ms: u64 },
    /// Each run draws a duration uniformly from `min_ms..=max_ms`
    Uniform { min_ms: u64, max_ms: u64 },
}

impl DurationSpec {
    #[inline]
    pub fn fixed(ms: u64) -> Self {
        DurationSpec::Fixed { ms }
    }

    /// Duration of the next run
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            DurationSpec::Fixed { ms } => Duration::from_millis(ms),
            DurationSpec::Uniform { min_ms, max_ms } => {
                Duration::from_millis(rng.gen_range(min_ms..=max_ms))
            }
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let reason = match *self {
            DurationSpec::Fixed { ms: 0 } => "duration must be positive",
            DurationSpec::Uniform { min_ms: 0, .. } => "minimum duration must be positive",
            DurationSpec::Uniform { min_ms, max_ms } if min_ms > max_ms => {
                "minimum exceeds maximum"
            }
            _ => return Ok(()),
        };
        Err(ConfigError::InvalidDuration {
            name: name.into(),
            reason: reason.into(),
        })
    }
}

/// Role of a process in the demo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessRole {
    #[default]
    Sub,
    /// Parent process that outlives its siblings
    Main,
}

/// Immutable description of one catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub name: String,
    pub duration: DurationSpec,
    pub max_repetitions: u32,
    #[serde(default, skip_serializing_if = "is_default")]
    pub role: ProcessRole,
}

impl ProcessDescriptor {
    /// Sub-process with a fixed duration
    pub fn new(name: impl Into<String>, duration_ms: u64, max_repetitions: u32) -> Self {
        Self {
            name: name.into(),
            duration: DurationSpec::fixed(duration_ms),
            max_repetitions,
            role: ProcessRole::Sub,
        }
    }

    /// Main process with a fixed duration
    pub fn main(name: impl Into<String>, duration_ms: u64, max_repetitions: u32) -> Self {
        Self {
            role: ProcessRole::Main,
            ..Self::new(name, duration_ms, max_repetitions)
        }
    }

    /// Sub-process with a uniformly drawn duration
    pub fn uniform(
        name: impl Into<String>,
        min_ms: u64,
        max_ms: u64,
        max_repetitions: u32,
    ) -> Self {
        Self {
            name: name.into(),
            duration: DurationSpec::Uniform { min_ms, max_ms },
            max_repetitions,
            role: ProcessRole::Sub,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: ProcessRole) -> Self {
        self.role = role;
        self
    }

    #[inline]
    pub fn is_main(&self) -> bool {
        self.role == ProcessRole::Main
    }
}

/// Process catalog keyed by `ProcessId`
#[derive(Debug, Clone)]
pub struct ProcessCatalog {
    entries: Vec<ProcessDescriptor>,
    by_name: AHashMap<String, ProcessId>,
    main: Option<ProcessId>,
}

impl ProcessCatalog {
    /// Build a catalog, rejecting entries the scheduler cannot run
    pub fn new(entries: Vec<ProcessDescriptor>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        if entries.len() > MAX_CATALOG_ENTRIES {
            return Err(ConfigError::CatalogTooLarge(entries.len()));
        }

        let mut main: Option<&str> = None;
        let mut seen = AHashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateProcess(entry.name.clone()));
            }
            if entry.max_repetitions == 0 {
                return Err(ConfigError::ZeroRepetitions(entry.name.clone()));
            }
            entry.duration.validate(&entry.name)?;
            if entry.is_main() {
                if let Some(first) = main {
                    return Err(ConfigError::MultipleMainProcesses {
                        first: first.into(),
                        second: entry.name.clone(),
                    });
                }
                main = Some(entry.name.as_str());
            }
        }

        Ok(Self::index(entries))
    }

    /// Parse a JSON array of descriptors
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<ProcessDescriptor> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// The overlay demo: one main process plus ten sub-processes
    pub fn standard() -> Self {
        Self::index(standard_entries())
    }

    /// The short demo variant: ten single-shot processes with random durations,
    /// the first of which stays resident until the rest finish
    pub fn demo() -> Self {
        let entries = (1..=10)
            .map(|n| {
                let role = if n == 1 {
                    ProcessRole::Main
                } else {
                    ProcessRole::Sub
                };
                ProcessDescriptor::uniform(format!("Process {n}"), 1000, 4000, 1).with_role(role)
            })
            .collect();
        Self::index(entries)
    }

    /// Built-in catalog by name: `standard` or `demo`
    pub fn builtin(name: &str) -> Option<Self> {
        match name.trim() {
            "standard" => Some(Self::standard()),
            "demo" => Some(Self::demo()),
            _ => None,
        }
    }

    fn index(entries: Vec<ProcessDescriptor>) -> Self {
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), ProcessId(i as u16)))
            .collect();
        let main = entries
            .iter()
            .position(ProcessDescriptor::is_main)
            .map(|i| ProcessId(i as u16));
        Self {
            entries,
            by_name,
            main,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor for an id issued by this catalog
    ///
    /// # Panics
    /// If `id` did not come from this catalog
    pub fn descriptor(&self, id: ProcessId) -> &ProcessDescriptor {
        &self.entries[id.index()]
    }

    pub fn name(&self, id: ProcessId) -> &str {
        &self.descriptor(id).name
    }

    pub fn lookup(&self, name: &str) -> Option<ProcessId> {
        self.by_name.get(name).copied()
    }

    /// Resolve a name, treating an unknown one as a configuration error
    pub fn resolve(&self, name: &str) -> Result<ProcessId, ConfigError> {
        self.lookup(name)
            .ok_or_else(|| ConfigError::UnknownProcess(name.into()))
    }

    /// The designated main process, if any
    #[inline]
    pub fn main(&self) -> Option<ProcessId> {
        self.main
    }

    pub fn ids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        (0..self.entries.len()).map(|i| ProcessId(i as u16))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, &ProcessDescriptor)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (ProcessId(i as u16), e))
    }
}

impl Default for ProcessCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_entries() -> Vec<ProcessDescriptor> {
    const SUB_PROCESSES: [(u64, u32); 10] = [
        (5000, 3),
        (4000, 5),
        (6000, 3),
        (8000, 4),
        (3000, 5),
        (5000, 4),
        (7000, 3),
        (3000, 3),
        (9000, 4),
        (4000, 4),
    ];

    std::iter::once(ProcessDescriptor::main("Main Process", 5000, 1))
        .chain(
            SUB_PROCESSES
                .iter()
                .enumerate()
                .map(|(i, &(ms, reps))| {
                    ProcessDescriptor::new(format!("Sub Process {}", i + 1), ms, reps)
                }),
        )
        .collect()
}
