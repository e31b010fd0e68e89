//! Per-provider-role rate limiting.
//!
//! One monotonic "last call" timestamp per key, guarded by a mutex. `acquire`
//! sleeps just long enough to respect the configured minimum interval before
//! returning, then stamps the new call time. Keys are provider-role pairs
//! (e.g. "openai:text", "gemini:image") so a slow image generation role
//! doesn't throttle a fast text role on the same provider.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::model::Provider;

/// Minimum seconds between calls, per provider text-completion role.
pub fn min_interval_for(provider: Provider) -> Duration {
    match provider {
        Provider::Openai => Duration::from_secs(2),
        Provider::Anthropic => Duration::from_secs(5),
        Provider::Gemini => Duration::from_secs(1),
    }
}

pub struct RateLimiter {
    last_call: Mutex<HashMap<String, Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self { last_call: Mutex::new(HashMap::new()) }
    }

    /// Blocks until `min_interval` has elapsed since the last call tagged
    /// with `key`, then records the new call time.
    pub async fn acquire(&self, key: &str, min_interval: Duration) {
        let wait = {
            let mut guard = self.last_call.lock().expect("rate limiter mutex poisoned");
            let now = Instant::now();
            let wait = guard
                .get(key)
                .map(|last| min_interval.saturating_sub(now.duration_since(*last)))
                .unwrap_or(Duration::ZERO);
            guard.insert(key.to_string(), now + wait);
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_match_configured_values() {
        assert_eq!(min_interval_for(Provider::Openai), Duration::from_secs(2));
        assert_eq!(min_interval_for(Provider::Anthropic), Duration::from_secs(5));
        assert_eq!(min_interval_for(Provider::Gemini), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn first_acquire_does_not_wait() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        limiter.acquire("openai:text", Duration::from_millis(200)).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn second_acquire_waits_out_the_interval() {
        let limiter = RateLimiter::new();
        limiter.acquire("openai:text", Duration::from_millis(150)).await;
        let start = Instant::now();
        limiter.acquire("openai:text", Duration::from_millis(150)).await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block_each_other() {
        let limiter = RateLimiter::new();
        limiter.acquire("openai:text", Duration::from_secs(10)).await;
        let start = Instant::now();
        limiter.acquire("gemini:text", Duration::from_secs(10)).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
