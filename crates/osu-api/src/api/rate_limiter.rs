//! Rate limiter implementation using a windowed bucket.
//!
//! Admits up to `limit` requests per `interval`. Requests beyond the limit
//! wait in FIFO order and are released in later windows; nothing is ever
//! rejected, only delayed.

use crate::error::{Error, Result};
use crate::lock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{debug, trace};

/// Admission control shared by every request of a dispatcher
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Maximum admissions per window
    limit: usize,
    /// Window length
    interval: Duration,
    /// Mutable bucket state, shared with the release timer
    bucket: Arc<Mutex<Bucket>>,
}

#[derive(Debug, Default)]
struct Bucket {
    /// Admissions counted against the current window
    count: usize,
    /// Set once a caller had to queue; cleared when the queue drains
    locked: bool,
    /// Pending admissions, oldest first
    waiters: VecDeque<oneshot::Sender<()>>,
    /// Whether a release timer task is alive
    timer_running: bool,
}

/// Snapshot of the bucket for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStats {
    pub count: usize,
    pub queued: usize,
    pub locked: bool,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// A zero limit or zero interval would never admit anything, so both are
    /// rejected as configuration errors.
    pub fn new(limit: usize, interval: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(Error::Config(
                "rate limit must admit at least one request per interval".to_string(),
            ));
        }
        if interval.is_zero() {
            return Err(Error::Config(
                "rate limit interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            limit,
            interval,
            bucket: Arc::new(Mutex::new(Bucket::default())),
        })
    }

    /// Wait until one request may be issued
    pub async fn acquire(&self) {
        let waiter = {
            let mut bucket = lock(&self.bucket);
            bucket.count += 1;

            if !bucket.timer_running {
                bucket.timer_running = true;
                self.spawn_release_timer();
            }

            if bucket.locked || bucket.count > self.limit {
                bucket.locked = true;
                let (tx, rx) = oneshot::channel();
                bucket.waiters.push_back(tx);
                debug!(
                    count = bucket.count,
                    queued = bucket.waiters.len(),
                    "Rate limit: queueing request for next window"
                );
                Some(rx)
            } else {
                None
            }
        };

        if let Some(rx) = waiter {
            // The sender lives in the bucket, which outlives every waiter.
            let _ = rx.await;
        }
    }

    /// Get a snapshot of the bucket
    pub fn stats(&self) -> RateLimitStats {
        let bucket = lock(&self.bucket);
        RateLimitStats {
            count: bucket.count,
            queued: bucket.waiters.len(),
            locked: bucket.locked,
        }
    }

    /// Maximum admissions per window
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Window length
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn spawn_release_timer(&self) {
        let bucket = Arc::clone(&self.bucket);
        let limit = self.limit;
        let interval = self.interval;

        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                if !release(&bucket, limit) {
                    break;
                }
            }
        });
    }
}

/// Start a new window: admit queued callers up to the limit.
///
/// Returns whether the timer must keep running.
fn release(bucket: &Mutex<Bucket>, limit: usize) -> bool {
    let mut bucket = lock(bucket);
    bucket.count = 0;

    while bucket.count < limit {
        let Some(waiter) = bucket.waiters.pop_front() else {
            break;
        };
        // Abandoned acquires do not use up a slot.
        if waiter.send(()).is_ok() {
            bucket.count += 1;
        }
    }

    if bucket.waiters.is_empty() {
        bucket.locked = false;
    }

    let keep_running = !bucket.waiters.is_empty() || bucket.count > 0;
    bucket.timer_running = keep_running;

    trace!(
        admitted = bucket.count,
        queued = bucket.waiters.len(),
        keep_running,
        "Rate limit window released"
    );

    keep_running
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use tokio::time::{timeout, Instant};

    #[test]
    fn test_rejects_degenerate_configuration() {
        assert!(matches!(
            RateLimiter::new(0, Duration::from_secs(1)),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            RateLimiter::new(5, Duration::ZERO),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_spread_across_windows() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1)).unwrap();
        let start = Instant::now();

        let elapsed = join_all((0..5).map(|_| {
            let limiter = limiter.clone();
            async move {
                limiter.acquire().await;
                start.elapsed()
            }
        }))
        .await;

        let windows: Vec<u64> = elapsed.iter().map(|d| d.as_secs()).collect();
        assert_eq!(windows, vec![0, 0, 1, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_released_in_fifo_order() {
        let limiter = RateLimiter::new(1, Duration::from_millis(100)).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        join_all((0..4).map(|i| {
            let limiter = limiter.clone();
            let order = Arc::clone(&order);
            async move {
                limiter.acquire().await;
                order.lock().unwrap().push(i);
            }
        }))
        .await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_admitted_and_next_queued() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1)).unwrap();

        for _ in 0..3 {
            timeout(Duration::from_millis(1), limiter.acquire())
                .await
                .expect("admissions up to the limit are immediate");
        }

        assert!(timeout(Duration::from_millis(1), limiter.acquire())
            .await
            .is_err());

        let stats = limiter.stats();
        assert!(stats.locked);
        assert_eq!(stats.queued, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlocks_after_queue_drains() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1)).unwrap();

        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.stats().queued, 0);
        assert!(!limiter.stats().locked);

        // Two idle windows let the timer reset the count and stop.
        sleep(Duration::from_millis(2500)).await;
        let stats = limiter.stats();
        assert_eq!(stats.count, 0);

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
