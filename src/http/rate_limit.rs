//! Client-side request pacing
//!
//! Instances with strict API quotas can be configured with
//! `requests_per_second`; every GET then waits for a governor permit.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Requests allowed per second. The burst equals the rate, so an idle
/// client may issue one second's worth of requests at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
}

impl RateLimiterConfig {
    /// Allow `rps` requests per second
    pub fn per_second(rps: u32) -> Self {
        Self {
            requests_per_second: rps,
        }
    }
}

/// Shared token bucket; clones pace the same client
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Bucket for `config`. A zero rate is treated as one request per second.
    pub fn new(config: &RateLimiterConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(Governor::direct(Quota::per_second(rate))),
        }
    }

    /// Wait for the next permit
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
