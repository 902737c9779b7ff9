//! Generation sources.
//!
//! Every new object generation comes from a [`GenerationSource`]. The store
//! asks for a generation while holding the destination bucket's write lock,
//! so values handed out by one source are strictly increasing in commit
//! order.
//!
//! ```
//! use gcstack_storage_core::clock::{GenerationSource, MonotonicClock};
//!
//! let clock = MonotonicClock::new();
//! let g1 = clock.next_generation();
//! let g2 = clock.next_generation();
//! assert!(g2 > g1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// A source of strictly increasing object generations.
pub trait GenerationSource: Send + Sync + fmt::Debug {
    /// Return a generation greater than every value returned before.
    fn next_generation(&self) -> i64;
}

/// Wall-clock seeded monotonic counter.
///
/// Generations look like microsecond timestamps, but two calls within the
/// same microsecond (or a wall clock that steps backwards) still yield
/// strictly increasing values.
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    /// Create a clock seeded from nothing; the first value is the current
    /// time in microseconds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MonotonicClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonotonicClock")
            .field("last", &self.last.load(Ordering::Relaxed))
            .finish()
    }
}

impl GenerationSource for MonotonicClock {
    fn next_generation(&self) -> i64 {
        let now = Utc::now().timestamp_micros();
        let mut current = self.last.load(Ordering::Acquire);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }
}

/// Deterministic counter: `start`, `start + 1`, ...
pub struct SequentialGenerations {
    next: AtomicI64,
}

impl SequentialGenerations {
    /// Create a counter whose first value is `start`.
    #[must_use]
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl Default for SequentialGenerations {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl fmt::Debug for SequentialGenerations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialGenerations")
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish()
    }
}

impl GenerationSource for SequentialGenerations {
    fn next_generation(&self) -> i64 {
        self.next.fetch_add(1, Ordering::AcqRel)
    }
}
