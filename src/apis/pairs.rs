/// Pair index - trading pairs for a mint with per-pair market data.
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::apis::graduated::parse_f64_field;
use crate::apis::moralis::{GatewayResponse, MoralisTransport};
use crate::cache::TtlCache;

/// One AMM pair for a token.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub pair_address: String,
    pub exchange: String,
    pub liquidity_usd: f64,
    pub usd_price: f64,
    pub volume24hr_usd: f64,
    pub usd_price_24hr_percent_change: f64,
}

pub struct PairsClient {
    transport: Arc<MoralisTransport>,
    cache: TtlCache<Vec<TokenPair>>,
}

impl PairsClient {
    pub fn new(transport: Arc<MoralisTransport>) -> Self {
        Self {
            transport,
            cache: TtlCache::new(Duration::from_secs(30)),
        }
    }

    /// All known pairs for a mint, highest liquidity first. Fails soft to
    /// an empty list; 404 is a normal "no pairs yet" answer.
    pub async fn get_pairs(&self, mint: &str) -> Vec<TokenPair> {
        if let Some(cached) = self.cache.get(mint) {
            return cached;
        }

        let path = format!("/token/mainnet/{}/pairs", mint);
        let body = match self.transport.get(&path, &[]).await {
            GatewayResponse::Ok(body) => body,
            GatewayResponse::NotFound | GatewayResponse::Unavailable => return Vec::new(),
        };

        let mut pairs: Vec<TokenPair> = body
            .get("pairs")
            .and_then(|p| p.as_array())
            .map(|items| items.iter().filter_map(parse_pair).collect())
            .unwrap_or_default();

        pairs.sort_by(|a, b| {
            b.liquidity_usd
                .partial_cmp(&a.liquidity_usd)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.cache.insert(mint, pairs.clone());
        pairs
    }
}

fn parse_pair(item: &Value) -> Option<TokenPair> {
    let pair_address = item.get("pairAddress").and_then(|v| v.as_str())?.to_string();

    Some(TokenPair {
        pair_address,
        exchange: item
            .get("exchangeName")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        liquidity_usd: parse_f64_field(item, "liquidityUsd").unwrap_or(0.0),
        usd_price: parse_f64_field(item, "usdPrice").unwrap_or(0.0),
        volume24hr_usd: parse_f64_field(item, "volume24hrUsd").unwrap_or(0.0),
        usd_price_24hr_percent_change: parse_f64_field(item, "usdPrice24hrPercentChange")
            .unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pair_defensive() {
        let item = json!({
            "pairAddress": "8f1A...",
            "exchangeName": "Raydium AMM",
            "liquidityUsd": "12345.6",
            "usdPrice": 0.00021,
            "volume24hrUsd": null
        });
        let pair = parse_pair(&item).unwrap();
        assert_eq!(pair.exchange, "Raydium AMM");
        assert_eq!(pair.liquidity_usd, 12345.6);
        assert_eq!(pair.usd_price, 0.00021);
        assert_eq!(pair.volume24hr_usd, 0.0);
    }

    #[test]
    fn test_parse_pair_requires_address() {
        assert!(parse_pair(&json!({"exchangeName": "x"})).is_none());
    }
}
