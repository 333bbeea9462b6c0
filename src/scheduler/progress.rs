/*!
 * Run Timer
 *
 * Progress of a run as a pure function of elapsed time. The displayed bar
 * fills over `min(duration, visual_cap)`; the run itself completes after the
 * full duration.
 */

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTimer {
    started_at: Instant,
    duration: Duration,
    visual: Duration,
}

impl RunTimer {
    pub fn start(now: Instant, duration: Duration, visual_cap: Duration) -> Self {
        Self {
            started_at: now,
            duration,
            visual: duration.min(visual_cap),
        }
    }

    #[inline]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Real run duration
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time the progress bar takes to fill
    #[inline]
    pub fn visual_duration(&self) -> Duration {
        self.visual
    }

    /// Fraction of the bar filled at `now`, clamped to [0, 1]
    pub fn progress(&self, now: Instant) -> f64 {
        if self.visual.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.visual.as_secs_f64()).clamp(0.0, 1.0)
    }
}
