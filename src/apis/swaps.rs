/// Swaps feed - recent buy/sell activity for a mint, cursor-paged.
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::apis::graduated::{parse_f64_field, parse_iso_millis};
use crate::apis::moralis::{GatewayResponse, MoralisTransport};
use crate::cache::TtlCache;
use crate::types::SwapSide;

/// One swap as reported by the provider.
#[derive(Debug, Clone)]
pub struct ProviderSwap {
    pub side: SwapSide,
    pub value_usd: f64,
    pub wallet: String,
    /// Milliseconds since epoch
    pub timestamp_ms: i64,
    /// SOL leg of the swap when the quote side is (W)SOL
    pub amount_sol: Option<f64>,
}

pub struct SwapsClient {
    transport: Arc<MoralisTransport>,
    cache: TtlCache<Vec<ProviderSwap>>,
}

impl SwapsClient {
    pub fn new(transport: Arc<MoralisTransport>) -> Self {
        Self {
            transport,
            cache: TtlCache::new(Duration::from_secs(30)),
        }
    }

    /// Swaps since `since_ms`, newest first, walking the cursor up to
    /// `max_pages` pages of `page_limit` each. Fails soft to an empty list.
    pub async fn get_recent_swaps(
        &self,
        mint: &str,
        since_ms: i64,
        page_limit: usize,
        max_pages: usize,
    ) -> Vec<ProviderSwap> {
        let cache_key = format!("{}:{}", mint, since_ms / 60_000);
        if let Some(cached) = self.cache.get(&cache_key) {
            return cached;
        }

        let path = format!("/token/mainnet/{}/swaps", mint);
        let from_date = Utc
            .timestamp_millis_opt(since_ms.max(0))
            .single()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        let mut swaps: Vec<ProviderSwap> = Vec::new();
        let mut cursor: Option<String> = None;

        for _page in 0..max_pages.max(1) {
            let mut query: Vec<(&str, String)> = vec![
                ("order", "DESC".to_string()),
                ("limit", page_limit.to_string()),
            ];
            if !from_date.is_empty() {
                query.push(("fromDate", from_date.clone()));
            }
            if let Some(ref c) = cursor {
                query.push(("cursor", c.clone()));
            }

            let body = match self.transport.get(&path, &query).await {
                GatewayResponse::Ok(body) => body,
                GatewayResponse::NotFound | GatewayResponse::Unavailable => break,
            };

            let page_swaps: Vec<ProviderSwap> = body
                .get("result")
                .and_then(|r| r.as_array())
                .map(|items| items.iter().filter_map(parse_swap).collect())
                .unwrap_or_default();

            if page_swaps.is_empty() {
                break;
            }
            swaps.extend(page_swaps);

            cursor = body
                .get("cursor")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            if cursor.is_none() {
                break;
            }
        }

        self.cache.insert(&cache_key, swaps.clone());
        swaps
    }
}

fn parse_swap(item: &Value) -> Option<ProviderSwap> {
    let side = match item.get("transactionType").and_then(|v| v.as_str()) {
        Some("buy") => SwapSide::Buy,
        Some("sell") => SwapSide::Sell,
        _ => return None,
    };
    let wallet = item
        .get("walletAddress")
        .and_then(|v| v.as_str())?
        .to_string();
    let timestamp_ms = item
        .get("blockTimestamp")
        .and_then(|v| v.as_str())
        .and_then(parse_iso_millis)?;

    let quote_is_sol = item
        .get("quoteToken")
        .and_then(|q| q.get("symbol"))
        .and_then(|v| v.as_str())
        .map(|s| s.eq_ignore_ascii_case("SOL") || s.eq_ignore_ascii_case("WSOL"))
        .unwrap_or(false);

    Some(ProviderSwap {
        side,
        value_usd: parse_f64_field(item, "totalValueUsd").unwrap_or(0.0),
        wallet,
        timestamp_ms,
        amount_sol: if quote_is_sol {
            item.get("quoteToken")
                .and_then(|q| parse_f64_field(q, "amount"))
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_swap() {
        let item = json!({
            "transactionType": "buy",
            "walletAddress": "9xQe...",
            "totalValueUsd": "41.2",
            "blockTimestamp": "2025-02-11T08:30:05.000Z",
            "quoteToken": {"symbol": "WSOL", "amount": "0.21"}
        });
        let swap = parse_swap(&item).unwrap();
        assert_eq!(swap.side, SwapSide::Buy);
        assert_eq!(swap.value_usd, 41.2);
        assert_eq!(swap.amount_sol, Some(0.21));
    }

    #[test]
    fn test_parse_swap_rejects_unknown_type() {
        let item = json!({
            "transactionType": "addLiquidity",
            "walletAddress": "9xQe...",
            "blockTimestamp": "2025-02-11T08:30:05.000Z"
        });
        assert!(parse_swap(&item).is_none());
    }

    #[test]
    fn test_parse_swap_non_sol_quote() {
        let item = json!({
            "transactionType": "sell",
            "walletAddress": "9xQe...",
            "totalValueUsd": 10.0,
            "blockTimestamp": "2025-02-11T08:30:05.000Z",
            "quoteToken": {"symbol": "USDC", "amount": "10.0"}
        });
        let swap = parse_swap(&item).unwrap();
        assert_eq!(swap.amount_sol, None);
    }
}
