/*!
 * Simulation Configuration
 *
 * Timings, pool size and the behavioral policy that reconciles the
 * variants of the overlay demo (main-process hold, cooldown scope,
 * retrying stop-cancelled processes).
 */

use super::errors::ConfigError;
use super::limits::*;
use super::serde::duration_millis;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Where the post-completion allocation cooldown applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// One flag suppresses every allocation
    #[default]
    Global,
    /// Only the slot that was just freed is suppressed
    PerSlot,
}

impl FromStr for CooldownScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(CooldownScope::Global),
            "per_slot" | "per-slot" | "slot" => Ok(CooldownScope::PerSlot),
            other => Err(ConfigError::InvalidSetting {
                key: "cooldown_scope".into(),
                value: other.into(),
            }),
        }
    }
}

/// Behavior of the designated main process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainProcessPolicy {
    /// Keep the main process in its slot until every sibling is done,
    /// then force-complete it
    pub hold_until_siblings_done: bool,
    /// Extend the main run by the total time of sibling runs allocated before it
    pub accumulate_sibling_time: bool,
}

impl Default for MainProcessPolicy {
    fn default() -> Self {
        Self {
            hold_until_siblings_done: true,
            accumulate_sibling_time: true,
        }
    }
}

impl MainProcessPolicy {
    /// Treat the main process like any other
    pub fn plain() -> Self {
        Self {
            hold_until_siblings_done: false,
            accumulate_sibling_time: false,
        }
    }
}

/// Scheduling policy knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationPolicy {
    #[serde(default)]
    pub cooldown_scope: CooldownScope,
    #[serde(default)]
    pub main_process: MainProcessPolicy,
    /// On restart, re-queue processes that the last stop cancelled
    #[serde(default)]
    pub retry_cancelled: bool,
}

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of overlay slots
    pub slots: usize,

    /// Allocator poll period (default: 500ms)
    #[serde(with = "duration_millis")]
    pub tick: Duration,

    /// Allocation cooldown after each completion (default: 500ms)
    #[serde(with = "duration_millis")]
    pub cooldown: Duration,

    /// Delay before a completed process is re-queued (default: 1000ms)
    #[serde(with = "duration_millis")]
    pub requeue_delay: Duration,

    /// Cap on the displayed progress duration (default: 10s)
    #[serde(with = "duration_millis")]
    pub visual_cap: Duration,

    /// Progress sampling period (default: 16ms)
    #[serde(with = "duration_millis")]
    pub frame_period: Duration,

    /// Presentation pacing between drained entries on stop (default: 300ms)
    #[serde(with = "duration_millis")]
    pub stop_stagger: Duration,

    #[serde(default)]
    pub policy: SimulationPolicy,
}

impl SimulationConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            slots: DEFAULT_SLOT_COUNT,
            tick: ALLOCATOR_TICK,
            cooldown: ALLOCATION_COOLDOWN,
            requeue_delay: REQUEUE_DELAY,
            visual_cap: VISUAL_CAP,
            frame_period: FRAME_PERIOD,
            stop_stagger: STOP_STAGGER,
            policy: SimulationPolicy::default(),
        }
    }

    /// Short delays for quick demos
    pub fn fast() -> Self {
        Self {
            tick: Duration::from_millis(100),
            cooldown: Duration::from_millis(100),
            requeue_delay: Duration::from_millis(200),
            visual_cap: Duration::from_millis(1000),
            frame_period: Duration::from_millis(50),
            stop_stagger: Duration::from_millis(50),
            ..Self::new()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: SimulationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Named preset: `default` or `fast`
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::new()),
            "fast" => Ok(Self::fast()),
            other => Err(ConfigError::InvalidSetting {
                key: "OVERLAY_SIM_PRESET".into(),
                value: other.into(),
            }),
        }
    }

    /// `OVERLAY_SIM_PRESET` (default: `default`) overridden by the other
    /// `OVERLAY_SIM_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let base = match lookup("OVERLAY_SIM_PRESET") {
            Some(name) => Self::preset(&name)?,
            None => Self::new(),
        };
        base.apply_env(lookup)
    }

    /// Apply overrides from a variable lookup
    ///
    /// Recognized keys: `OVERLAY_SIM_SLOTS`, `OVERLAY_SIM_TICK_MS`,
    /// `OVERLAY_SIM_COOLDOWN_MS`, `OVERLAY_SIM_REQUEUE_MS`,
    /// `OVERLAY_SIM_VISUAL_CAP_MS`, `OVERLAY_SIM_FRAME_MS`,
    /// `OVERLAY_SIM_STAGGER_MS`, `OVERLAY_SIM_COOLDOWN_SCOPE`,
    /// `OVERLAY_SIM_RETRY_CANCELLED`, `OVERLAY_SIM_HOLD_MAIN`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("OVERLAY_SIM_SLOTS") {
            self.slots = parse_setting("OVERLAY_SIM_SLOTS", &value)?;
        }

        let timings: [(&str, &mut Duration); 6] = [
            ("OVERLAY_SIM_TICK_MS", &mut self.tick),
            ("OVERLAY_SIM_COOLDOWN_MS", &mut self.cooldown),
            ("OVERLAY_SIM_REQUEUE_MS", &mut self.requeue_delay),
            ("OVERLAY_SIM_VISUAL_CAP_MS", &mut self.visual_cap),
            ("OVERLAY_SIM_FRAME_MS", &mut self.frame_period),
            ("OVERLAY_SIM_STAGGER_MS", &mut self.stop_stagger),
        ];
        for (key, target) in timings {
            if let Some(value) = lookup(key) {
                *target = Duration::from_millis(parse_setting(key, &value)?);
            }
        }

        if let Some(value) = lookup("OVERLAY_SIM_COOLDOWN_SCOPE") {
            self.policy.cooldown_scope = value.parse()?;
        }
        if let Some(value) = lookup("OVERLAY_SIM_RETRY_CANCELLED") {
            self.policy.retry_cancelled = parse_setting("OVERLAY_SIM_RETRY_CANCELLED", &value)?;
        }
        if let Some(value) = lookup("OVERLAY_SIM_HOLD_MAIN") {
            self.policy.main_process.hold_until_siblings_done =
                parse_setting("OVERLAY_SIM_HOLD_MAIN", &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject configurations the scheduler cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots == 0 || self.slots > MAX_SLOT_COUNT {
            return Err(ConfigError::InvalidSlotCount(self.slots));
        }
        let periodic = [
            ("tick", self.tick),
            ("frame_period", self.frame_period),
        ];
        for (key, period) in periodic {
            // tokio intervals panic on a zero period
            if period.is_zero() {
                return Err(ConfigError::InvalidSetting {
                    key: key.into(),
                    value: "0".into(),
                });
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSetting {
            key: key.into(),
            value: value.into(),
        })
}
