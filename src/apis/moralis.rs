/// Shared transport for the Moralis Solana gateway.
///
/// All four market-data roles (graduated index, pairs, holders, swaps) ride
/// the same gateway, so auth, rate limiting, key rotation and stats live
/// here once. Role clients own the endpoint paths and payload shapes.
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::apis::client::{ApiStats, HttpClient, KeyRing, RateLimiter};
use crate::arguments::is_debug_api_enabled;
use crate::logger::{log, LogTag};

const MORALIS_BASE_URL: &str = "https://solana-gateway.moralis.io";

/// Request timeout - the gateway can have latency spikes, 8s is safe
const TIMEOUT_SECS: u64 = 8;

/// Rate limit per minute across all Moralis role clients
const RATE_LIMIT_PER_MINUTE: usize = 120;

pub struct MoralisTransport {
    http: HttpClient,
    ring: KeyRing,
    rate_limiter: RateLimiter,
    stats: Arc<ApiStats>,
}

/// Outcome of one gateway request, after rotation.
pub enum GatewayResponse {
    /// 2xx with a parsed body
    Ok(Value),
    /// 404 - a normal "unknown token" answer, not an error
    NotFound,
    /// Anything else (timeout, 5xx, exhausted credentials, parse failure)
    Unavailable,
}

impl MoralisTransport {
    pub fn new(keys: Vec<String>) -> Result<Self, String> {
        Ok(Self {
            http: HttpClient::new(TIMEOUT_SECS)?,
            ring: KeyRing::new(keys),
            rate_limiter: RateLimiter::new(RATE_LIMIT_PER_MINUTE),
            stats: Arc::new(ApiStats::new()),
        })
    }

    pub fn stats(&self) -> Arc<ApiStats> {
        self.stats.clone()
    }

    /// GET a gateway path, rotating credentials on 401/429.
    ///
    /// Never returns Err to callers in the enrichment path - the role
    /// clients translate `Unavailable` into their sentinel values.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> GatewayResponse {
        if self.ring.is_empty() {
            if is_debug_api_enabled() {
                log(LogTag::Api, "DEBUG", "Moralis request skipped - no credentials configured");
            }
            return GatewayResponse::Unavailable;
        }

        let guard = match self.rate_limiter.acquire().await {
            Ok(guard) => guard,
            Err(e) => {
                log(LogTag::Api, "WARN", &format!("Rate limiter error: {}", e));
                self.stats.record(false);
                return GatewayResponse::Unavailable;
            }
        };

        let url = format!("{}{}", MORALIS_BASE_URL, path);
        let candidates = self.ring.candidates();
        let total = candidates.len();

        for (attempt, key) in candidates.into_iter().enumerate() {
            let mut builder = self.http.client().get(&url).header("X-API-Key", key);
            if !query.is_empty() {
                builder = builder.query(query);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    log(
                        LogTag::Api,
                        "WARN",
                        &format!("Moralis request failed: path={} error={}", path, e),
                    );
                    self.stats.record(false);
                    drop(guard);
                    return GatewayResponse::Unavailable;
                }
            };

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::TOO_MANY_REQUESTS {
                self.ring.advance();
                if is_debug_api_enabled() {
                    log(
                        LogTag::Api,
                        "DEBUG",
                        &format!(
                            "Moralis key rotated: path={} status={} attempt={}/{}",
                            path,
                            status.as_u16(),
                            attempt + 1,
                            total
                        ),
                    );
                }
                // Brief cool-down before retrying with the next credential
                if status == StatusCode::TOO_MANY_REQUESTS {
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                self.stats.record(true);
                return GatewayResponse::NotFound;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                log(
                    LogTag::Api,
                    "WARN",
                    &format!(
                        "Moralis API error: path={} status={} body={}",
                        path,
                        status,
                        crate::helpers::safe_truncate(&body, 120)
                    ),
                );
                self.stats.record(false);
                return GatewayResponse::Unavailable;
            }

            match response.json::<Value>().await {
                Ok(value) => {
                    self.stats.record(true);
                    return GatewayResponse::Ok(value);
                }
                Err(e) => {
                    log(
                        LogTag::Api,
                        "WARN",
                        &format!("Moralis parse error: path={} error={}", path, e),
                    );
                    self.stats.record(false);
                    return GatewayResponse::Unavailable;
                }
            }
        }

        log(
            LogTag::Api,
            "WARN",
            &format!("Moralis credentials exhausted: path={}", path),
        );
        self.stats.record(false);
        GatewayResponse::Unavailable
    }
}
