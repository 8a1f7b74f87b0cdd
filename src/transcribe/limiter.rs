use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rolling-window rate limiter with strict spacing.
///
/// At most `max_per_window` admissions within any window of the configured
/// length. A caller that would exceed the quota waits until the oldest
/// admission ages out of the window, so admissions never burst at window
/// boundaries.
///
/// Built on `tokio::time`, so tests drive it deterministically with the
/// paused clock instead of wall time.
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            max_per_window: max_per_window.max(1),
            window,
            admitted: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until a submission may proceed without exceeding the quota.
    ///
    /// Admission is recorded at return time; the caller should issue its
    /// request immediately after.
    pub async fn acquire(&self) {
        loop {
            let wait_until = {
                let mut admitted = self.admitted.lock().await;
                let now = Instant::now();

                while admitted
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= self.window)
                {
                    admitted.pop_front();
                }

                if admitted.len() < self.max_per_window {
                    admitted.push_back(now);
                    return;
                }

                match admitted.front() {
                    Some(&oldest) => oldest + self.window,
                    None => continue,
                }
            };

            // Several waiters can target the same wakeup; the loop re-checks
            // the window so only freed slots are handed out.
            tokio::time::sleep_until(wait_until).await;
        }
    }
}
