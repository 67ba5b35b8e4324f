//! Nonce source with monotonic guarantees.
//!
//! Every signed action carries a millisecond timestamp nonce. The exchange
//! rejects reused or stale values per signer, so the wall clock alone is
//! not enough: two actions in the same millisecond, or a clock step
//! backwards, would collide. [`NonceManager`] layers an atomic counter on
//! top of the clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // Pre-epoch clocks clamp to zero; the counter still advances.
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Anything that can hand out nonces.
///
/// The dispatcher holds one of these behind an `Arc` so tests can inject a
/// deterministic sequence.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Issues strictly increasing nonces that track wall-clock milliseconds.
///
/// # Guarantees
/// - Never returns a value less than or equal to a previous one
/// - Tracks the clock whenever the clock is ahead of the counter
/// - Thread-safe for concurrent access
pub struct NonceManager<C: Clock> {
    /// Last issued nonce.
    counter: AtomicU64,
    clock: C,
}

static SHARED: Lazy<Arc<NonceManager<SystemClock>>> =
    Lazy::new(|| Arc::new(NonceManager::with_system_clock()));

impl<C: Clock> NonceManager<C> {
    /// Creates a new `NonceManager` with the given clock.
    ///
    /// The counter is initialized to the current Unix timestamp in
    /// milliseconds, so the first nonce is at least `now + 1`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            counter: AtomicU64::new(now),
            clock,
        }
    }

    /// Generates the next nonce value.
    ///
    /// Returns `max(last_nonce + 1, now_ms)`. Thread-safe via CAS loop.
    pub fn next(&self) -> u64 {
        let target = self.clock.now_ms();

        loop {
            let current = self.counter.load(Ordering::Acquire);
            let next_val = current.saturating_add(1).max(target);

            match self.counter.compare_exchange_weak(
                current,
                next_val,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next_val,
                Err(_) => continue,
            }
        }
    }
}

impl NonceManager<SystemClock> {
    /// Creates a new `NonceManager` with the system clock.
    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock)
    }

    /// Process-wide instance.
    ///
    /// Dispatchers that sign for the same wallet should share this so that
    /// nonces never collide across instances.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }
}

impl<C: Clock> NonceSource for NonceManager<C> {
    fn next_nonce(&self) -> u64 {
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    /// Mock clock for testing with controllable time.
    struct MockClock {
        time_ms: AtomicU64,
    }

    impl MockClock {
        fn new(initial_ms: u64) -> Self {
            Self {
                time_ms: AtomicU64::new(initial_ms),
            }
        }

        fn set(&self, time_ms: u64) {
            self.time_ms.store(time_ms, Ordering::Release);
        }

        fn advance(&self, delta_ms: u64) {
            self.time_ms.fetch_add(delta_ms, Ordering::AcqRel);
        }
    }

    impl Clock for MockClock {
        fn now_ms(&self) -> u64 {
            self.time_ms.load(Ordering::Acquire)
        }
    }

    impl Clock for Arc<MockClock> {
        fn now_ms(&self) -> u64 {
            self.time_ms.load(Ordering::Acquire)
        }
    }

    const BASE_TIME: u64 = 1_700_000_000_000; // ~2023-11-14

    #[test]
    fn test_monotonic_increase() {
        let clock = MockClock::new(BASE_TIME);
        let manager = NonceManager::new(clock);

        let mut prev = 0u64;
        for _ in 0..1000 {
            let nonce = manager.next();
            assert!(nonce > prev, "nonce must be strictly increasing");
            prev = nonce;
        }
    }

    #[test]
    fn test_same_millisecond_back_to_back() {
        // Frozen clock: every call lands in the same millisecond.
        let manager = NonceManager::new(MockClock::new(BASE_TIME));

        let n1 = manager.next_nonce();
        let n2 = manager.next_nonce();

        assert_eq!(n1, BASE_TIME + 1);
        assert_eq!(n2, BASE_TIME + 2);
        assert_ne!(n1, n2);
    }

    #[test]
    fn test_concurrent_no_duplicates() {
        let clock = Arc::new(MockClock::new(BASE_TIME));
        let manager = Arc::new(NonceManager::new(Arc::clone(&clock)));

        let num_threads = 8;
        let iterations_per_thread = 1000;

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    let mut nonces = Vec::with_capacity(iterations_per_thread);
                    for _ in 0..iterations_per_thread {
                        nonces.push(manager.next());
                    }
                    nonces
                })
            })
            .collect();

        let mut all_nonces: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        all_nonces.sort_unstable();
        let original_len = all_nonces.len();
        all_nonces.dedup();

        assert_eq!(
            all_nonces.len(),
            original_len,
            "all nonces must be unique across threads"
        );
    }

    #[test]
    fn test_clock_regression_no_decrease() {
        let clock = MockClock::new(BASE_TIME);
        let manager = NonceManager::new(clock);

        let n1 = manager.next();
        let n2 = manager.next();

        // Regress the clock by 10 seconds
        manager.clock.set(BASE_TIME - 10_000);

        let n3 = manager.next();
        let n4 = manager.next();

        assert!(n2 > n1);
        assert!(n3 > n2, "nonce must not decrease when clock regresses");
        assert!(n4 > n3);
    }

    #[test]
    fn test_nonce_tracks_clock() {
        let clock = MockClock::new(BASE_TIME);
        let manager = NonceManager::new(clock);

        let n1 = manager.next();
        assert!(n1 >= BASE_TIME && n1 < BASE_TIME + 100);

        manager.clock.advance(5000);

        let n2 = manager.next();
        assert_eq!(n2, BASE_TIME + 5000);
        assert_eq!(manager.next(), n2 + 1);
    }

    #[test]
    fn test_shared_instance_is_shared() {
        let a = NonceManager::shared();
        let b = NonceManager::shared();
        assert!(Arc::ptr_eq(&a, &b));

        let n1 = a.next_nonce();
        let n2 = b.next_nonce();
        assert!(n2 > n1);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01 in ms
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
