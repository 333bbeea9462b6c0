/*!
 * Timer Registry
 *
 * Token-based registry of every pending timer and frame task. A timer only
 * runs its callback if it can still claim its own token, so cancelling a
 * token (or the whole registry) guarantees the callback never starts.
 * Callbacks already running are not interrupted.
 */

use dashmap::DashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// Handle to one registered timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// What a registered timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    AllocatorTick,
    Frame,
    Completion,
    Requeue,
}

struct Registered {
    kind: TimerKind,
    handle: AbortHandle,
}

#[derive(Default)]
struct RegistryInner {
    next: AtomicU64,
    timers: DashMap<TimerToken, Registered>,
}

/// Cancellable registry of timers
///
/// Must be used from within a Tokio runtime.
#[derive(Clone, Default)]
pub struct TimerRegistry {
    inner: Arc<RegistryInner>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once after `delay`
    pub fn schedule<F>(&self, kind: TimerKind, delay: Duration, callback: F) -> TimerToken
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.next_token();
        let weak = Arc::downgrade(&self.inner);

        // The shard stays locked until the handle is stored, so a task that
        // fires immediately still finds its own token.
        let slot = self.inner.timers.entry(token);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if claim(&weak, token) {
                callback();
            }
        });
        slot.insert(Registered {
            kind,
            handle: handle.abort_handle(),
        });

        trace!(?token, ?kind, ?delay, "Timer scheduled");
        token
    }

    /// Run `callback` every `period`, starting immediately, until it returns
    /// `Break` or the token is cancelled
    pub fn schedule_repeating<F>(&self, kind: TimerKind, period: Duration, mut callback: F) -> TimerToken
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let token = self.next_token();
        let weak = Arc::downgrade(&self.inner);

        let slot = self.inner.timers.entry(token);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !is_registered(&weak, token) {
                    break;
                }
                if callback().is_break() {
                    claim(&weak, token);
                    break;
                }
            }
        });
        slot.insert(Registered {
            kind,
            handle: handle.abort_handle(),
        });

        trace!(?token, ?kind, ?period, "Repeating timer scheduled");
        token
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&self, token: TimerToken) -> bool {
        match self.inner.timers.remove(&token) {
            Some((_, registered)) => {
                registered.handle.abort();
                trace!(?token, kind = ?registered.kind, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer, returning how many were cancelled
    pub fn cancel_all(&self) -> usize {
        let tokens: Vec<TimerToken> = self.inner.timers.iter().map(|t| *t.key()).collect();
        tokens.into_iter().filter(|&token| self.cancel(token)).count()
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.inner.timers.contains_key(&token)
    }

    /// Number of pending timers of one kind
    pub fn count(&self, kind: TimerKind) -> usize {
        self.inner
            .timers
            .iter()
            .filter(|t| t.value().kind == kind)
            .count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.timers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.timers.is_empty()
    }

    fn next_token(&self) -> TimerToken {
        TimerToken(self.inner.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

/// Remove a token on behalf of its own task
fn claim(weak: &Weak<RegistryInner>, token: TimerToken) -> bool {
    weak.upgrade()
        .is_some_and(|inner| inner.timers.remove(&token).is_some())
}

fn is_registered(weak: &Weak<RegistryInner>, token: TimerToken) -> bool {
    weak.upgrade()
        .is_some_and(|inner| inner.timers.contains_key(&token))
}
