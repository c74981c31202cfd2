use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Minimum spacing between upstream requests (~3 requests/second).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(350);

/// Spaces requests at least `min_interval` apart.
///
/// Every request a client issues passes through its gate; share one gate
/// (via `Arc`) between clients to keep them under a single budget. Waiters
/// are served in arrival order. A waiter dropped while sleeping does not
/// consume a slot.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may start, then record it as started.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "rate gate wait"
                );
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_does_not_wait() {
        let gate = RateGate::default();
        let start = Instant::now();
        gate.acquire().await;
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_requests_are_spaced() {
        let gate = RateGate::default();
        let mut starts = Vec::new();
        for _ in 0..5 {
            gate.acquire().await;
            starts.push(Instant::now());
        }
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_MIN_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_the_gate() {
        let gate = Arc::new(RateGate::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    gate.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.unwrap());
        }
        starts.sort();
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_MIN_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_counts_towards_interval() {
        let gate = RateGate::default();
        gate.acquire().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        let before = Instant::now();
        gate.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_does_not_take_a_slot() {
        let gate = RateGate::default();
        gate.acquire().await;
        let first = Instant::now();

        // Abandon a waiter halfway through its wait.
        let _ = tokio::time::timeout(Duration::from_millis(100), gate.acquire()).await;

        gate.acquire().await;
        assert_eq!(Instant::now() - first, DEFAULT_MIN_INTERVAL);
    }
}
