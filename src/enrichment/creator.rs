/// Creator history from the asset index.
///
/// Filters the creator's assets to fungible tokens (interface hint or a
/// supply too large for an NFT) and counts launches inside the last 30
/// days. Three or more recent launches marks a serial creator.
use crate::rpc::{ChainRpcClient, CreatorAsset};
use crate::types::CreatorHistory;

const ASSET_LIMIT: usize = 100;
const RECENT_WINDOW_MS: i64 = 30 * 24 * 3_600_000;
const NFT_SUPPLY_CEILING: f64 = 1e6;

pub async fn history(rpc: &ChainRpcClient, creator: &str, now_ms: i64) -> Option<CreatorHistory> {
    let assets = rpc.get_assets_by_creator(creator, ASSET_LIMIT).await;
    if assets.is_empty() {
        return None;
    }
    Some(build_history(&assets, now_ms))
}

/// Pure aggregation over the asset list.
pub fn build_history(assets: &[CreatorAsset], now_ms: i64) -> CreatorHistory {
    let fungible: Vec<&CreatorAsset> = assets.iter().filter(|asset| is_fungible(asset)).collect();

    let recent_tokens: Vec<String> = fungible
        .iter()
        .filter(|asset| {
            asset
                .created_at
                .map_or(false, |created| created > now_ms - RECENT_WINDOW_MS)
        })
        .map(|asset| asset.id.clone())
        .collect();

    CreatorHistory {
        token_count: fungible.len() as u32,
        is_serial_creator: recent_tokens.len() >= 3,
        recent_tokens,
        rugged_tokens: 0,
        successful_tokens: 0,
    }
}

fn is_fungible(asset: &CreatorAsset) -> bool {
    asset.interface.to_lowercase().contains("fungible")
        || asset.supply.map_or(false, |supply| supply > NFT_SUPPLY_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, interface: &str, created_days_ago: i64, now_ms: i64) -> CreatorAsset {
        CreatorAsset {
            id: id.to_string(),
            created_at: Some(now_ms - created_days_ago * 24 * 3_600_000),
            interface: interface.to_string(),
            name: id.to_string(),
            supply: None,
        }
    }

    #[test]
    fn test_serial_creator() {
        let now = 1_739_300_000_000i64;
        let assets = vec![
            asset("t1", "FungibleToken", 1, now),
            asset("t2", "FungibleToken", 5, now),
            asset("t3", "FungibleToken", 10, now),
            asset("t4", "FungibleToken", 60, now), // outside the window
            asset("n1", "V1_NFT", 2, now),         // not fungible
        ];
        let history = build_history(&assets, now);
        assert_eq!(history.token_count, 4);
        assert_eq!(history.recent_tokens.len(), 3);
        assert!(history.is_serial_creator);
    }

    #[test]
    fn test_supply_hint_marks_fungible() {
        let now = 1_739_300_000_000i64;
        let mut nft_like = asset("x", "Custom", 1, now);
        nft_like.supply = Some(1e15);
        let history = build_history(&[nft_like], now);
        assert_eq!(history.token_count, 1);
        assert!(!history.is_serial_creator);
    }
}
