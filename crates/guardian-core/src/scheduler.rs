//! Timer port for the connection state machine.
//!
//! The connection manager never sleeps on its own; it asks a [`Scheduler`] to
//! run a callback after a delay and keeps the returned [`TimerHandle`] so the
//! timer can be cancelled before a new one is scheduled.
//!
//! - [`TokioScheduler`] spawns a sleeping task on a tokio runtime.
//! - [`ManualScheduler`] keeps a virtual clock that tests advance explicitly,
//!   so backoff sequences can be checked without wall-clock waits.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identifier of a scheduled timer, unique per scheduler.
pub type TimerId = u64;

/// Work run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancellable handle to a scheduled timer.
///
/// Dropping the handle does not cancel the timer; call [`TimerHandle::cancel`].
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    delay: Duration,
    cancelled: Arc<AtomicBool>,
    abort: Option<tokio::task::AbortHandle>,
}

impl TimerHandle {
    /// Timer identifier.
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Delay the timer was scheduled with.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Prevent the callback from running. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Whether [`TimerHandle::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Source of time and delayed callbacks.
pub trait Scheduler: Send + Sync {
    /// Current instant according to this scheduler's clock.
    fn now(&self) -> Instant;

    /// Run `callback` once after `delay`, unless cancelled first.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

// =============================================================================
// TokioScheduler
// =============================================================================

/// Scheduler backed by `tokio::time::sleep` tasks.
#[derive(Debug)]
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
    next_id: AtomicU64,
}

impl TokioScheduler {
    /// Scheduler spawning onto the given runtime.
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
        }
    }

    /// Scheduler spawning onto the runtime of the calling task.
    pub fn try_current() -> Result<Self, tokio::runtime::TryCurrentError> {
        Ok(Self::new(tokio::runtime::Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                callback();
            }
        });

        TimerHandle {
            id,
            delay,
            cancelled,
            abort: Some(task.abort_handle()),
        }
    }
}

// =============================================================================
// ManualScheduler
// =============================================================================

struct PendingTimer {
    id: TimerId,
    due: Duration,
    cancelled: Arc<AtomicBool>,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualState {
    elapsed: Duration,
    next_id: TimerId,
    pending: Vec<PendingTimer>,
    history: Vec<Duration>,
}

impl ManualState {
    fn prune_cancelled(&mut self) {
        self.pending
            .retain(|timer| !timer.cancelled.load(Ordering::SeqCst));
    }

    /// Remove and return the earliest live timer due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<PendingTimer> {
        self.prune_cancelled();
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= limit)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)?;
        Some(self.pending.remove(index))
    }
}

/// Deterministic scheduler with a virtual clock.
///
/// Nothing fires until [`ManualScheduler::advance`] or
/// [`ManualScheduler::fire_next`] is called. Callbacks run on the caller's
/// thread, outside the internal lock.
pub struct ManualScheduler {
    origin: Instant,
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// Scheduler with its clock at zero and no timers.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// Move the clock forward, firing every live timer that comes due, in
    /// due order. Returns how many callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().elapsed + by;
        let mut fired = 0;
        loop {
            let timer = {
                let mut state = self.state.lock();
                match state.pop_due(target) {
                    Some(timer) => {
                        state.elapsed = state.elapsed.max(timer.due);
                        timer
                    }
                    None => {
                        state.elapsed = target;
                        break;
                    }
                }
            };
            (timer.callback)();
            fired += 1;
        }
        fired
    }

    /// Jump the clock to the earliest live timer and fire it.
    ///
    /// Returns `false` if no timer is pending.
    pub fn fire_next(&self) -> bool {
        let timer = {
            let mut state = self.state.lock();
            match state.pop_due(Duration::MAX) {
                Some(timer) => {
                    state.elapsed = state.elapsed.max(timer.due);
                    timer
                }
                None => return false,
            }
        };
        (timer.callback)();
        true
    }

    /// Number of live (not cancelled, not fired) timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let mut state = self.state.lock();
        state.prune_cancelled();
        state.pending.len()
    }

    /// Time remaining until each live timer fires, soonest first.
    #[must_use]
    pub fn pending_delays(&self) -> Vec<Duration> {
        let mut state = self.state.lock();
        state.prune_cancelled();
        let now = state.elapsed;
        let mut delays: Vec<Duration> = state
            .pending
            .iter()
            .map(|timer| timer.due.saturating_sub(now))
            .collect();
        delays.sort();
        delays
    }

    /// Every delay ever passed to `schedule`, in call order.
    #[must_use]
    pub fn scheduled_delays(&self) -> Vec<Duration> {
        self.state.lock().history.clone()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("elapsed", &state.elapsed)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        self.origin + self.state.lock().elapsed
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let cancelled = Arc::new(AtomicBool::new(false));
        let due = state.elapsed + delay;
        state.history.push(delay);
        state.pending.push(PendingTimer {
            id,
            due,
            cancelled: cancelled.clone(),
            callback,
        });

        TimerHandle {
            id,
            delay,
            cancelled,
            abort: None,
        }
    }
}
