//! Token bucket rate limiter for provider requests.
//!
//! Keeps a long batch scan under the upstream API's request budget by
//! waiting for a token before each request instead of tripping 429s.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket rate limiter.
///
/// Holds up to `capacity` tokens, refilled continuously at
/// `requests_per_minute / 60` tokens per second.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// Burst capacity is one second's worth of requests (at least one).
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1) as f64;
        let capacity = (rpm / 60.0).ceil().max(1.0);

        Self {
            name: name.into(),
            capacity,
            refill_per_sec: rpm / 60.0,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Acquire a token, waiting if necessary.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                self.refill(&mut bucket);

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }

                let missing = 1.0 - bucket.tokens;
                Duration::from_secs_f64(missing / self.refill_per_sec)
            };

            debug!(
                limiter = %self.name,
                wait_ms = wait.as_millis() as u64,
                "Rate limited, waiting for token"
            );
            tokio::time::sleep(wait.max(Duration::from_millis(10))).await;
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_is_served_immediately() {
        // 300 rpm = 5 rps burst
        let limiter = RateLimiter::new("test", 300);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_waits_once_bucket_is_drained() {
        let limiter = RateLimiter::new("test", 300);
        for _ in 0..5 {
            limiter.acquire().await;
        }

        // Refill is one token per 200ms
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_minimum_capacity_is_one() {
        let limiter = RateLimiter::new("slow", 1);
        limiter.acquire().await;

        let second = tokio::time::timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(second.is_err());
    }
}
