use std::collections::VecDeque;

use tokio::{
    sync::Mutex,
    time::{sleep, Duration, Instant},
};

/// Sliding-window admission gate for outbound API calls.
///
/// Mercado Libre allows 1500 requests per minute per application. `acquire` returns immediately while the window has
/// capacity, and otherwise sleeps until the oldest call in the window expires.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self { max_requests, window, timestamps: Mutex::new(VecDeque::new()) }
    }

    /// The Mercado Libre contract: 1500 requests per minute.
    pub fn mercado_libre() -> Self {
        Self::new(1500, Duration::from_secs(60))
    }

    pub async fn acquire(&self) {
        let mut stamps = self.timestamps.lock().await;
        let now = Instant::now();
        while let Some(front) = stamps.front() {
            if now.duration_since(*front) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }
        if stamps.len() >= self.max_requests {
            let oldest = *stamps.front().expect("non-empty window");
            let wait = self.window.saturating_sub(now.duration_since(oldest)) + Duration::from_millis(10);
            sleep(wait).await;
            stamps.pop_front();
        }
        stamps.push_back(Instant::now());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn within_limit_admits_immediately() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn over_limit_waits_for_the_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
