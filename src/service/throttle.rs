use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stale usernames are swept from the limiter once per this many attempts.
const SWEEP_EVERY: u64 = 1024;

type KeyedLimiter<C> =
    RateLimiter<String, DefaultKeyedStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Per-username cap on login attempts.
#[derive(Clone)]
pub struct LoginThrottle<C: Clock = DefaultClock> {
    limiter: Arc<KeyedLimiter<C>>,
    attempts: Arc<AtomicU64>,
}

impl LoginThrottle {
    pub fn per_minute(attempts: u32) -> Self {
        Self::with_clock(attempts, DefaultClock::default())
    }
}

impl<C: Clock> LoginThrottle<C> {
    pub fn with_clock(attempts: u32, clock: C) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Arc::new(RateLimiter::new(
                quota,
                DefaultKeyedStateStore::default(),
                clock,
            )),
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Consume one attempt for `username`; false once the quota is spent.
    pub fn allow(&self, username: &str) -> bool {
        let seen = self.attempts.fetch_add(1, Ordering::Relaxed);
        if seen % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep();
        }
        self.limiter.check_key(&username.to_string()).is_ok()
    }

    /// Forget usernames whose quota has fully refilled.
    pub fn sweep(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Usernames currently held by the limiter.
    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }
}
