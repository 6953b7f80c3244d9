#![forbid(unsafe_code)]

//! Call-shaping primitives: debounce and throttle.
//!
//! Both are deterministic state machines driven by the caller's notion of
//! "now" (a monotonic [`Duration`]), so they behave identically under the
//! simulator and the threaded runtime.
//!
//! - [`Debouncer`]: latest-wins; a burst of calls yields a single value once
//!   the input has been quiet for `wait`.
//! - [`Throttler`]: leading-edge; the first call passes and opens a window of
//!   `limit` during which further calls are rejected.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `wait = 0` | Value is released on the next `poll` at or after the call |
//! | `limit = 0` | Every call passes |
//! | `now` moves backwards | Treated as "not yet due"; no panic |

use std::time::Duration;

/// Latest-wins debouncer.
///
/// # Example
///
/// ```
/// use pagekit_core::rate_limit::Debouncer;
/// use std::time::Duration;
///
/// let mut resize = Debouncer::new(Duration::from_millis(250));
/// resize.call(800, Duration::from_millis(0));
/// resize.call(1024, Duration::from_millis(100));
/// assert_eq!(resize.poll(Duration::from_millis(300)), None);
/// assert_eq!(resize.poll(Duration::from_millis(350)), Some(1024));
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    wait: Duration,
    pending: Option<(T, Duration)>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// The configured quiet period.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Record a call; the latest value wins and the deadline restarts.
    pub fn call(&mut self, value: T, now: Duration) {
        self.pending = Some((value, now.saturating_add(self.wait)));
    }

    /// Release the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Deadline of the pending call, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Whether a call is waiting to be released.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending call without releasing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

/// Leading-edge throttler.
///
/// # Example
///
/// ```
/// use pagekit_core::rate_limit::Throttler;
/// use std::time::Duration;
///
/// let mut scroll = Throttler::new(Duration::from_millis(100));
/// assert!(scroll.try_acquire(Duration::from_millis(0)));
/// assert!(!scroll.try_acquire(Duration::from_millis(50)));
/// assert!(scroll.try_acquire(Duration::from_millis(100)));
/// ```
#[derive(Debug, Clone)]
pub struct Throttler {
    limit: Duration,
    open_until: Option<Duration>,
    rejected: u64,
}

impl Throttler {
    /// Create a throttler with the given window.
    #[must_use]
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            open_until: None,
            rejected: 0,
        }
    }

    /// The configured window.
    #[must_use]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Try to pass a call at `now`.
    ///
    /// Returns `true` if the call may run. A passing call opens a new window.
    pub fn try_acquire(&mut self, now: Duration) -> bool {
        if let Some(until) = self.open_until
            && now < until
        {
            self.rejected += 1;
            return false;
        }
        self.open_until = Some(now.saturating_add(self.limit));
        true
    }

    /// Run `f` if the call passes the throttle.
    pub fn run<R>(&mut self, now: Duration, f: impl FnOnce() -> R) -> Option<R> {
        self.try_acquire(now).then(f)
    }

    /// Number of calls rejected so far.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Close the current window.
    pub fn reset(&mut self) {
        self.open_until = None;
    }
}
