use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};

/// Bounds concurrent outbound requests and spaces them out, so a burst of
/// cache misses cannot trip the free-tier limits of the upstream APIs.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_delay: Duration,
    last_request: Arc<tokio::sync::Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_delay_ms: u64) -> Self {
        RateLimiter {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_delay: Duration::from_millis(min_delay_ms),
            last_request: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Returns a guard that releases the permit when dropped.
    pub async fn acquire(&self) -> RateLimitGuard {
        // The semaphore is never closed; a failed acquire degrades to unlimited.
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        if !self.min_delay.is_zero() {
            let mut last_request = self.last_request.lock().await;
            if let Some(last) = *last_request {
                let elapsed = last.elapsed();
                if elapsed < self.min_delay {
                    let wait_time = self.min_delay - elapsed;
                    tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
            *last_request = Some(Instant::now());
        }

        RateLimitGuard { _permit: permit }
    }

    #[cfg(test)]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

pub struct RateLimitGuard {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}

impl Drop for RateLimitGuard {
    fn drop(&mut self) {
        tracing::trace!("Rate limit permit released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_releases_permit_on_drop() {
        let limiter = RateLimiter::new(2, 0);
        let first = limiter.acquire().await;
        let _second = limiter.acquire().await;
        assert_eq!(limiter.available_permits(), 0);

        drop(first);
        assert_eq!(limiter.available_permits(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn enforces_minimum_spacing() {
        let limiter = RateLimiter::new(4, 250);
        let start = Instant::now();
        drop(limiter.acquire().await);
        drop(limiter.acquire().await);
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
