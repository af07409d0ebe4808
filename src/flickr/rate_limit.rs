// Rate limiting for Flickr API calls with exponential backoff.
//
// A Flickr API key is allowed 3600 queries per hour. The sliding-window
// limiter keeps us under that, and `with_retry` handles throttling responses
// that slip through anyway: a bounded number of attempts with doubling
// delays, after which the rate limit is escalated to a hard failure.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use tokio::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::FetchError;

/// Flickr's per-key quota.
pub const FLICKR_REQUESTS_PER_HOUR: u32 = 3600;

/// A sliding-window rate limiter for API calls.
///
/// Tracks request timestamps in a sliding window and pauses when the
/// window is full. Uses interior mutability so callers only need `&self`.
pub struct RateLimiter {
    /// Timestamps of recent requests within the current window.
    requests: Mutex<VecDeque<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests_per_window: u32, window: Duration) -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            max_requests: max_requests_per_window,
            window,
        }
    }

    /// Limiter sized for a single Flickr API key.
    pub fn flickr_default() -> Self {
        Self::new(FLICKR_REQUESTS_PER_HOUR, Duration::from_secs(3600))
    }

    /// Wait until the window has room, then record the request.
    pub async fn acquire(&self) {
        loop {
            // Decide while holding the lock, sleep after dropping it.
            let wait = {
                let now = Instant::now();
                let mut requests = self.requests.lock().unwrap();

                while let Some(&oldest) = requests.front() {
                    if now.duration_since(oldest) >= self.window {
                        requests.pop_front();
                    } else {
                        break;
                    }
                }

                if (requests.len() as u32) < self.max_requests {
                    requests.push_back(now);
                    None
                } else {
                    requests
                        .front()
                        .map(|&oldest| (oldest + self.window).duration_since(now))
                }
            };

            match wait {
                None => return,
                Some(wait) => {
                    info!(
                        delay_ms = wait.as_millis() as u64,
                        "Rate limit: waiting {}ms before next request",
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Total attempts (first try included) before a rate limit becomes fatal.
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles for each retry after that.
const BASE_BACKOFF: Duration = Duration::from_secs(1);

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Backoff before retry number `retry` (1-based).
fn backoff_for(retry: u32) -> Duration {
    BASE_BACKOFF
        .saturating_mul(1u32 << (retry - 1).min(16))
        .min(MAX_BACKOFF)
}

/// Retry an async operation on `FetchError::RateLimited`.
///
/// Any other error is returned immediately. After `MAX_ATTEMPTS` rate
/// limited attempts the error is escalated to `RequestFailed`, so a
/// `RateLimited` never escapes this function.
pub async fn with_retry<F, Fut, T>(
    rate_limiter: &RateLimiter,
    operation: F,
) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1u32;

    loop {
        rate_limiter.acquire().await;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(FetchError::RateLimited) if attempt < MAX_ATTEMPTS => {
                let backoff = backoff_for(attempt);
                warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(FetchError::RateLimited) => {
                return Err(FetchError::RequestFailed(format!(
                    "rate limited after {MAX_ATTEMPTS} attempts"
                )));
            }
            Err(err) => return Err(err),
        }
    }
}
