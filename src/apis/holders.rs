/// Holder registry - holder totals and top-holder distribution.
///
/// A 404 from either endpoint is the normal "unknown token" answer and maps
/// to `None` / empty rather than an error.
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::apis::graduated::parse_f64_field;
use crate::apis::moralis::{GatewayResponse, MoralisTransport};
use crate::cache::TtlCache;

/// Aggregate holder statistics.
#[derive(Debug, Clone)]
pub struct HolderStats {
    pub total_holders: i64,
}

/// One entry of the top-holder list. `percentage_of_supply` is a decimal
/// in [0,1].
#[derive(Debug, Clone)]
pub struct TopHolder {
    pub owner: String,
    pub percentage_of_supply: f64,
    pub label: Option<String>,
    pub is_contract: bool,
}

pub struct HoldersClient {
    transport: Arc<MoralisTransport>,
    stats_cache: TtlCache<Option<HolderStats>>,
    top_cache: TtlCache<Vec<TopHolder>>,
}

impl HoldersClient {
    pub fn new(transport: Arc<MoralisTransport>) -> Self {
        Self {
            transport,
            stats_cache: TtlCache::new(Duration::from_secs(60)),
            top_cache: TtlCache::new(Duration::from_secs(60)),
        }
    }

    /// Holder totals; `None` means unknown (404, unavailable, malformed).
    pub async fn get_holder_stats(&self, mint: &str) -> Option<HolderStats> {
        if let Some(cached) = self.stats_cache.get(mint) {
            return cached;
        }

        let path = format!("/token/mainnet/holders/{}", mint);
        let stats = match self.transport.get(&path, &[]).await {
            GatewayResponse::Ok(body) => body
                .get("totalHolders")
                .and_then(|v| v.as_i64())
                .map(|total_holders| HolderStats { total_holders }),
            GatewayResponse::NotFound | GatewayResponse::Unavailable => None,
        };

        self.stats_cache.insert(mint, stats.clone());
        stats
    }

    /// Largest holders, biggest first. Fails soft to an empty list.
    pub async fn get_top_holders(&self, mint: &str, limit: usize) -> Vec<TopHolder> {
        let cache_key = format!("{}:{}", mint, limit);
        if let Some(cached) = self.top_cache.get(&cache_key) {
            return cached;
        }

        let path = format!("/token/mainnet/{}/top-holders", mint);
        let query = [("limit", limit.to_string())];

        let holders: Vec<TopHolder> = match self.transport.get(&path, &query).await {
            GatewayResponse::Ok(body) => body
                .get("result")
                .and_then(|r| r.as_array())
                .map(|items| items.iter().filter_map(parse_top_holder).collect())
                .unwrap_or_default(),
            GatewayResponse::NotFound | GatewayResponse::Unavailable => Vec::new(),
        };

        self.top_cache.insert(&cache_key, holders.clone());
        holders
    }
}

fn parse_top_holder(item: &Value) -> Option<TopHolder> {
    let owner = item.get("ownerAddress").and_then(|v| v.as_str())?.to_string();
    // Gateway reports percent in 0..100; internal convention is 0..1
    let percentage_of_supply =
        parse_f64_field(item, "percentageRelativeToTotalSupply").unwrap_or(0.0) / 100.0;

    Some(TopHolder {
        owner,
        percentage_of_supply,
        label: item
            .get("ownerAddressLabel")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        is_contract: item
            .get("isContract")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_top_holder_percent_to_decimal() {
        let item = json!({
            "ownerAddress": "5Q54...",
            "percentageRelativeToTotalSupply": 12.5,
            "isContract": true
        });
        let holder = parse_top_holder(&item).unwrap();
        assert!((holder.percentage_of_supply - 0.125).abs() < 1e-9);
        assert!(holder.is_contract);
        assert!(holder.label.is_none());
    }

    #[test]
    fn test_parse_top_holder_requires_owner() {
        assert!(parse_top_holder(&json!({"percentageRelativeToTotalSupply": 1.0})).is_none());
    }
}
