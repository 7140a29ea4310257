/// SOL/USD price oracle.
///
/// Process-wide singleton with a 30 second TTL. Sources are tried in order
/// and the first positive finite number wins. When every source fails the
/// oracle returns `None` - it never fabricates a price and never serves a
/// value past the TTL.
use once_cell::sync::Lazy;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::logger::{log, LogTag};

const PRICE_TTL: Duration = Duration::from_secs(30);
const SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

struct PriceCache {
    cached_price: Option<f64>,
    cached_at: Option<Instant>,
}

static PRICE_CACHE: Lazy<Mutex<PriceCache>> = Lazy::new(|| {
    Mutex::new(PriceCache {
        cached_price: None,
        cached_at: None,
    })
});

static HTTP: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(SOURCE_TIMEOUT)
        .build()
        .unwrap_or_default()
});

/// Current SOL price in USD, or `None` if every source is down.
pub async fn get_price_usd() -> Option<f64> {
    {
        let cache = PRICE_CACHE.lock().await;
        if let (Some(price), Some(at)) = (cache.cached_price, cache.cached_at) {
            if at.elapsed() < PRICE_TTL {
                return Some(price);
            }
        }
    }

    let fetched = fetch_from_sources().await;

    let mut cache = PRICE_CACHE.lock().await;
    match fetched {
        Some(price) => {
            cache.cached_price = Some(price);
            cache.cached_at = Some(Instant::now());
            Some(price)
        }
        None => {
            // Stale values are not served past the TTL
            cache.cached_price = None;
            cache.cached_at = None;
            None
        }
    }
}

/// Convert a SOL amount to USD; `None` while the price is unavailable.
pub async fn sol_to_usd(amount_sol: f64) -> Option<f64> {
    get_price_usd().await.map(|price| amount_sol * price)
}

/// Convert a USD amount to SOL; `None` while the price is unavailable.
pub async fn usd_to_sol(amount_usd: f64) -> Option<f64> {
    get_price_usd().await.and_then(|price| {
        if price > 0.0 {
            Some(amount_usd / price)
        } else {
            None
        }
    })
}

async fn fetch_from_sources() -> Option<f64> {
    let sources: [(&str, fn(&Value) -> Option<f64>, String); 3] = [
        (
            "jupiter",
            extract_jupiter,
            format!("https://lite-api.jup.ag/price/v3?ids={}", WSOL_MINT),
        ),
        (
            "coingecko",
            extract_coingecko,
            "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd"
                .to_string(),
        ),
        (
            "binance",
            extract_binance,
            "https://api.binance.com/api/v3/ticker/price?symbol=SOLUSDT".to_string(),
        ),
    ];

    for (name, extract, url) in sources {
        match fetch_json(&url).await {
            Some(body) => {
                if let Some(price) = extract(&body).filter(|p| p.is_finite() && *p > 0.0) {
                    return Some(price);
                }
                log(
                    LogTag::Price,
                    "WARN",
                    &format!("SOL price source returned no usable value: source={}", name),
                );
            }
            None => {
                log(
                    LogTag::Price,
                    "WARN",
                    &format!("SOL price source unreachable: source={}", name),
                );
            }
        }
    }

    None
}

async fn fetch_json(url: &str) -> Option<Value> {
    let response = HTTP.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.json::<Value>().await.ok()
}

fn extract_jupiter(body: &Value) -> Option<f64> {
    body.get(WSOL_MINT)?.get("usdPrice").and_then(|v| v.as_f64())
}

fn extract_coingecko(body: &Value) -> Option<f64> {
    body.pointer("/solana/usd").and_then(|v| v.as_f64())
}

fn extract_binance(body: &Value) -> Option<f64> {
    body.get("price")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_jupiter() {
        let mut body = serde_json::Map::new();
        body.insert(
            WSOL_MINT.to_string(),
            json!({"usdPrice": 178.42, "priceChange24h": -1.2}),
        );
        assert_eq!(extract_jupiter(&Value::Object(body)), Some(178.42));
    }

    #[test]
    fn test_extract_coingecko() {
        let body = json!({"solana": {"usd": 177.9}});
        assert_eq!(extract_coingecko(&body), Some(177.9));
    }

    #[test]
    fn test_extract_binance() {
        let body = json!({"symbol": "SOLUSDT", "price": "178.10000000"});
        assert_eq!(extract_binance(&body), Some(178.1));
    }

    #[test]
    fn test_extract_missing_fields() {
        assert_eq!(extract_jupiter(&json!({})), None);
        assert_eq!(extract_coingecko(&json!({"solana": {}})), None);
        assert_eq!(extract_binance(&json!({"price": "abc"})), None);
    }
}
