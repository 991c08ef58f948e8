//! @ai:module:intent Request pacing for judge API calls
//! @ai:module:layer infrastructure
//! @ai:module:public_api RateLimiter
//! @ai:module:stateless false

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// @ai:intent Token bucket shared by every concurrent judge call
///
/// The bucket starts full, holds at most `requests_per_minute` permits, and refills
/// continuously at `requests_per_minute / 60` permits per second.
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    per_second: f64,
    capacity: f64,
}

struct Bucket {
    permits: f64,
    refilled_at: Instant,
}

impl Bucket {
    fn refill(&mut self, per_second: f64, capacity: f64) {
        let now = Instant::now();
        let gained = now.duration_since(self.refilled_at).as_secs_f64() * per_second;
        self.permits = (self.permits + gained).min(capacity);
        self.refilled_at = now;
    }
}

impl RateLimiter {
    /// @ai:intent Create a limiter allowing `requests_per_minute` calls per minute
    /// @ai:post a zero rate is treated as one request per minute
    /// @ai:effects pure
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute.max(1) as f64;

        Self {
            bucket: Mutex::new(Bucket {
                permits: capacity,
                refilled_at: Instant::now(),
            }),
            per_second: capacity / 60.0,
            capacity,
        }
    }

    /// @ai:intent Take a permit if one is available, else report how long until one is
    /// @ai:effects state:write
    async fn take(&self) -> Option<Duration> {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(self.per_second, self.capacity);

        if bucket.permits >= 1.0 {
            bucket.permits -= 1.0;
            None
        } else {
            Some(Duration::from_secs_f64((1.0 - bucket.permits) / self.per_second))
        }
    }

    #[cfg(test)]
    async fn try_acquire(&self) -> bool {
        self.take().await.is_none()
    }

    /// @ai:intent Wait until a permit is available, then take it
    /// @ai:effects state:write, time
    pub async fn acquire(&self) {
        while let Some(wait) = self.take().await {
            tracing::trace!(wait_ms = wait.as_millis() as u64, "rate limited");
            tokio::time::sleep(wait).await;
        }
    }
}
