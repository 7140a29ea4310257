/// Graduated token index - ordered list of recently graduated pump.fun
/// tokens from the Moralis gateway.
use chrono::DateTime;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::apis::moralis::{GatewayResponse, MoralisTransport};
use crate::arguments::is_debug_api_enabled;
use crate::cache::TtlCache;
use crate::logger::{log, LogTag};

/// One graduated token as reported by the index.
#[derive(Debug, Clone)]
pub struct GraduatedToken {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub logo: Option<String>,
    pub price_usd: Option<f64>,
    pub liquidity: Option<f64>,
    pub fully_diluted_valuation: Option<f64>,
    /// Milliseconds since epoch
    pub graduated_at: Option<i64>,
    pub pair_address: Option<String>,
}

pub struct GraduatedClient {
    transport: Arc<MoralisTransport>,
    cache: TtlCache<Vec<GraduatedToken>>,
}

impl GraduatedClient {
    pub fn new(transport: Arc<MoralisTransport>) -> Self {
        Self {
            transport,
            cache: TtlCache::new(Duration::from_secs(30)),
        }
    }

    /// Recent graduated tokens, newest first. Fails soft to an empty list.
    pub async fn list(&self, limit: usize) -> Vec<GraduatedToken> {
        let cache_key = format!("graduated:{}", limit);
        if let Some(cached) = self.cache.get(&cache_key) {
            return cached;
        }

        let path = "/token/mainnet/exchange/pumpfun/graduated".to_string();
        let query = [("limit", limit.to_string())];

        let body = match self.transport.get(&path, &query).await {
            GatewayResponse::Ok(body) => body,
            GatewayResponse::NotFound | GatewayResponse::Unavailable => return Vec::new(),
        };

        let tokens: Vec<GraduatedToken> = body
            .get("result")
            .and_then(|r| r.as_array())
            .map(|items| items.iter().filter_map(parse_graduated_token).collect())
            .unwrap_or_default();

        if is_debug_api_enabled() {
            log(
                LogTag::Api,
                "DEBUG",
                &format!("Graduated index returned {} tokens (limit={})", tokens.len(), limit),
            );
        }

        self.cache.insert(&cache_key, tokens.clone());
        tokens
    }
}

fn parse_graduated_token(item: &Value) -> Option<GraduatedToken> {
    let mint = item.get("tokenAddress").and_then(|v| v.as_str())?.to_string();

    Some(GraduatedToken {
        mint,
        name: item
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        symbol: item
            .get("symbol")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        logo: item
            .get("logo")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        price_usd: parse_f64_field(item, "priceUsd"),
        liquidity: parse_f64_field(item, "liquidity"),
        fully_diluted_valuation: parse_f64_field(item, "fullyDilutedValuation"),
        graduated_at: item
            .get("graduatedAt")
            .and_then(|v| v.as_str())
            .and_then(parse_iso_millis),
        pair_address: item
            .get("pairAddress")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
    })
}

/// Numbers arrive either as JSON numbers or decimal strings.
pub(crate) fn parse_f64_field(item: &Value, key: &str) -> Option<f64> {
    match item.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn parse_iso_millis(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_graduated_token() {
        let item = json!({
            "tokenAddress": "GvM8BvCkz3CCNUkBpYBhqLgSN3ANyN52NDBBSAEFpump",
            "name": "Example",
            "symbol": "EXM",
            "logo": "https://cdn.example/logo.png",
            "priceUsd": "0.000135",
            "liquidity": 48211.5,
            "fullyDilutedValuaton": null,
            "fullyDilutedValuation": "135000",
            "graduatedAt": "2025-02-11T08:30:00.000Z",
            "pairAddress": "7xKX..."
        });
        let token = parse_graduated_token(&item).unwrap();
        assert_eq!(token.symbol, "EXM");
        assert_eq!(token.price_usd, Some(0.000135));
        assert_eq!(token.liquidity, Some(48211.5));
        assert_eq!(token.fully_diluted_valuation, Some(135000.0));
        assert!(token.graduated_at.unwrap() > 1_700_000_000_000);
    }

    #[test]
    fn test_parse_skips_missing_mint() {
        let item = json!({"name": "no address"});
        assert!(parse_graduated_token(&item).is_none());
    }

    #[test]
    fn test_parse_iso_millis_invalid() {
        assert_eq!(parse_iso_millis("not-a-date"), None);
    }
}
