/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::SlotId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors, reported at startup and never at runtime
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Unknown process: {0}")]
    #[diagnostic(
        code(config::unknown_process),
        help("Every queued process name must have an entry in the process catalog.")
    )]
    UnknownProcess(String),

    #[error("Duplicate process: {0}")]
    #[diagnostic(
        code(config::duplicate_process),
        help("Process names must be unique in the catalog and in the initial queue.")
    )]
    DuplicateProcess(String),

    #[error("More than one main process: {first} and {second}")]
    #[diagnostic(
        code(config::multiple_main_processes),
        help("Mark at most one catalog entry with the main role.")
    )]
    MultipleMainProcesses { first: String, second: String },

    #[error("Process catalog is empty")]
    #[diagnostic(
        code(config::empty_catalog),
        help("Add at least one process descriptor.")
    )]
    EmptyCatalog,

    #[error("Too many catalog entries: {0}")]
    #[diagnostic(code(config::catalog_too_large))]
    CatalogTooLarge(usize),

    #[error("Process {0} allows zero repetitions")]
    #[diagnostic(
        code(config::zero_repetitions),
        help("A process that may never run cannot be scheduled. Use at least one repetition.")
    )]
    ZeroRepetitions(String),

    #[error("Invalid duration for {name}: {reason}")]
    #[diagnostic(code(config::invalid_duration))]
    InvalidDuration { name: String, reason: String },

    #[error("Slot pool size {0} is out of range")]
    #[diagnostic(
        code(config::invalid_slot_count),
        help("Configure between 1 and 64 slots.")
    )]
    InvalidSlotCount(usize),

    #[error("Main process {0} would hold the only slot")]
    #[diagnostic(
        code(config::main_hold_without_spare_slot),
        help("A main process held until its sub-processes finish needs a second slot for them. Add a slot or disable hold_until_siblings_done.")
    )]
    MainHoldWithoutSpareSlot(String),

    #[error("Invalid setting {key}={value}")]
    #[diagnostic(
        code(config::invalid_setting),
        help("Timings are whole milliseconds; flags are true/false.")
    )]
    InvalidSetting { key: String, value: String },

    #[error("Failed to parse configuration: {0}")]
    #[diagnostic(code(config::parse_error))]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Unified simulator error type with miette diagnostics
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Slot {slot} out of range (pool has {slots} slots)")]
    #[diagnostic(
        code(simulation::slot_out_of_range),
        help("Slot ids run from 0 to the configured pool size minus one.")
    )]
    SlotOutOfRange { slot: SlotId, slots: usize },
}

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimulationError>;
