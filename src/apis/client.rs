/// Base HTTP client plumbing shared by the provider clients: rate limiting,
/// request timeouts, credential rotation and lightweight stats.
use reqwest::Client;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Rate limiter for API clients
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
    max_per_minute: usize,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        let min_interval = if max_per_minute > 0 {
            Duration::from_secs_f64(60.0 / max_per_minute as f64)
        } else {
            Duration::ZERO
        };

        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            last_request: Arc::new(Mutex::new(None)),
            min_interval,
            max_per_minute,
        }
    }

    /// Wait until we can make a request (respects rate limits)
    pub async fn acquire(&self) -> Result<RateLimitGuard, String> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| format!("Failed to acquire rate limiter permit: {}", e))?;

        if !self.min_interval.is_zero() {
            let mut last = self.last_request.lock().await;
            let now = Instant::now();

            if let Some(last_time) = *last {
                let elapsed = last_time.elapsed();
                if elapsed < self.min_interval {
                    let sleep_duration = self.min_interval - elapsed;
                    drop(last);
                    tokio::time::sleep(sleep_duration).await;
                    let mut last_relocked = self.last_request.lock().await;
                    *last_relocked = Some(Instant::now());
                } else {
                    *last = Some(now);
                }
            } else {
                *last = Some(now);
            }
        }

        Ok(RateLimitGuard { _permit: permit })
    }

    pub fn max_per_minute(&self) -> usize {
        self.max_per_minute
    }
}

/// RAII guard returned by [`RateLimiter::acquire`]
pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}

/// HTTP client wrapper with a per-request timeout baked in
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Ordered credential list with atomic rotation.
///
/// A 401/429 response advances the active index; the caller retries with the
/// next credential until one succeeds or all are exhausted. Rotation is
/// sticky: once a key is burned the whole process moves past it.
pub struct KeyRing {
    keys: Vec<String>,
    active: AtomicUsize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            active: AtomicUsize::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Current credential, if any remain.
    pub fn current(&self) -> Option<&str> {
        let index = self.active.load(Ordering::SeqCst);
        self.keys.get(index % self.keys.len().max(1)).map(|s| s.as_str())
    }

    /// Credentials from the active index onward, in rotation order.
    pub fn candidates(&self) -> Vec<&str> {
        if self.keys.is_empty() {
            return Vec::new();
        }
        let start = self.active.load(Ordering::SeqCst) % self.keys.len();
        (0..self.keys.len())
            .map(|offset| self.keys[(start + offset) % self.keys.len()].as_str())
            .collect()
    }

    /// Advance past the current credential (called on 401/429).
    pub fn advance(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }
}

/// Request counters exposed under /stats.
#[derive(Default)]
pub struct ApiStats {
    requests: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatsSnapshot {
    pub requests: u64,
    pub failures: u64,
}

impl ApiStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, success: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ApiStatsSnapshot {
        ApiStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ring_rotation() {
        let ring = KeyRing::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(ring.current(), Some("a"));
        assert_eq!(ring.candidates(), vec!["a", "b", "c"]);

        ring.advance();
        assert_eq!(ring.current(), Some("b"));
        assert_eq!(ring.candidates(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_key_ring_empty() {
        let ring = KeyRing::new(vec![]);
        assert!(ring.is_empty());
        assert_eq!(ring.current(), None);
        assert!(ring.candidates().is_empty());
    }

    #[test]
    fn test_api_stats() {
        let stats = ApiStats::new();
        stats.record(true);
        stats.record(false);
        let snap = stats.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.failures, 1);
    }

    #[tokio::test]
    async fn test_rate_limiter_single_acquire() {
        let limiter = RateLimiter::new(600);
        let guard = limiter.acquire().await;
        assert!(guard.is_ok());
    }
}
