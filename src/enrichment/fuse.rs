/// The fuse step: pure application of the per-field precedence rules that
/// turn one migration event plus whatever the providers returned into a
/// `TokenRecord`. First present source wins; absent fields take sentinels.
use std::collections::HashSet;

use crate::enrichment::{metadata, EnrichmentParts};
use crate::types::{
    AnalysisResult, CompositeRisks, DangerCategory, DangerConfidence, DangerScore,
    MarketCapConfidence, MigrationEvent, PriceData, SwapRecord, TokenMetadata, TokenRecord,
    TokenStatistics, MAX_SWAPS_RETAINED,
};

/// Estimated pump.fun supply used for the market-cap fallback.
const ASSUMED_SUPPLY: f64 = 1e9;

pub fn fuse(
    event: &MigrationEvent,
    parts: EnrichmentParts,
    full_mode: bool,
    now_ms: i64,
) -> TokenRecord {
    let price = parts.pairs.first().map(|pair| pair.usd_price).unwrap_or(0.0);

    let (market_cap, market_cap_confidence) = match event.market_cap {
        Some(mc) if mc > 0.0 => (mc, MarketCapConfidence::High),
        _ if price > 0.0 => (price * ASSUMED_SUPPLY, MarketCapConfidence::Low),
        _ => (0.0, MarketCapConfidence::Low),
    };

    let pair_liquidity: f64 = parts.pairs.iter().map(|pair| pair.liquidity_usd).sum();
    let liquidity = match event.liquidity {
        Some(liq) if liq > 0.0 => liq,
        _ => pair_liquidity,
    };

    let pair_volume: f64 = parts.pairs.iter().map(|pair| pair.volume24hr_usd).sum();
    let swaps_volume: f64 = parts
        .swaps
        .iter()
        .filter(|swap| swap.timestamp_ms > now_ms - 24 * 3_600_000)
        .map(|swap| swap.value_usd)
        .sum();
    let volume24h = if pair_volume > 0.0 { pair_volume } else { swaps_volume };

    // Trade counts come from the swaps feed, bucketed against now
    let mut buys24h = 0i64;
    let mut sells24h = 0i64;
    let mut buys1h = 0i64;
    let mut sells1h = 0i64;
    let mut buys5m = 0i64;
    let mut sells5m = 0i64;
    let mut traders: HashSet<&str> = HashSet::new();
    for swap in &parts.swaps {
        let age = now_ms - swap.timestamp_ms;
        let is_buy = swap.side == crate::types::SwapSide::Buy;
        if age <= 24 * 3_600_000 {
            if is_buy {
                buys24h += 1;
            } else {
                sells24h += 1;
            }
            traders.insert(swap.wallet.as_str());
        }
        if age <= 3_600_000 {
            if is_buy {
                buys1h += 1;
            } else {
                sells1h += 1;
            }
        }
        if age <= 300_000 {
            if is_buy {
                buys5m += 1;
            } else {
                sells5m += 1;
            }
        }
    }

    let holder_count = parts
        .holder_stats
        .as_ref()
        .map(|stats| stats.total_holders)
        .unwrap_or(-1);

    // Registry-derived distribution wins when it carries a signal;
    // on-chain shares back it up
    let registry_top10: f64 = {
        let mut shares: Vec<f64> = parts
            .top_holders
            .iter()
            .map(|holder| holder.percentage_of_supply)
            .collect();
        shares.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        shares.iter().take(10).sum()
    };
    let top10_concentration = if registry_top10 > 0.0 {
        registry_top10.min(1.0)
    } else {
        parts.onchain.top10_share
    };

    let registry_largest = parts
        .top_holders
        .iter()
        .map(|holder| holder.percentage_of_supply)
        .fold(0.0f64, f64::max);
    let largest_holder = if registry_largest > 0.0 {
        registry_largest.min(1.0)
    } else {
        parts.onchain.largest_share
    };

    let registry_dev = parts
        .resolved_creator
        .as_deref()
        .and_then(|creator| {
            parts
                .top_holders
                .iter()
                .find(|holder| holder.owner == creator)
                .map(|holder| holder.percentage_of_supply)
        })
        .unwrap_or(0.0);
    let dev_holdings = if registry_dev > 0.0 {
        registry_dev.min(1.0)
    } else {
        parts.onchain.dev_share
    };

    let liquidity_ratio = if market_cap > 0.0 { liquidity / market_cap } else { 0.0 };
    let volume_to_liquidity_ratio = if liquidity > 0.0 { volume24h / liquidity } else { 0.0 };

    // Image precedence: direct-image uri -> fetched metadata -> empty
    let image = match event.uri.as_deref() {
        Some(uri) if metadata::is_direct_image(uri) => uri.to_string(),
        _ => parts.token_meta.image.clone().unwrap_or_default(),
    };

    let launch_analysis = parts.launch.map(|(mut analysis, first_buyer)| {
        if let Some(first_buyer) = first_buyer {
            analysis.first_buyer_holdings = parts
                .top_holders
                .iter()
                .find(|holder| holder.owner == first_buyer)
                .map(|holder| holder.percentage_of_supply)
                .unwrap_or(0.0);
        }
        analysis
    });

    let mut swaps: Vec<SwapRecord> = parts
        .swaps
        .iter()
        .map(|swap| SwapRecord {
            wallet: swap.wallet.clone(),
            side: swap.side,
            value_usd: swap.value_usd,
            amount_sol: swap.amount_sol,
            timestamp_ms: swap.timestamp_ms,
        })
        .collect();
    swaps.sort_by_key(|swap| std::cmp::Reverse(swap.timestamp_ms));
    swaps.truncate(MAX_SWAPS_RETAINED);

    TokenRecord {
        address: event.mint.clone(),
        metadata: TokenMetadata {
            name: event.name.clone(),
            symbol: event.symbol.clone(),
            image,
            creator: parts.resolved_creator.clone(),
            decimals: parts.onchain.decimals,
            supply: parts.onchain.supply_raw.clone(),
            twitter: parts.token_meta.twitter.clone(),
            telegram: parts.token_meta.telegram.clone(),
            website: parts.token_meta.website.clone(),
            description: parts.token_meta.description.clone(),
        },
        price_data: PriceData {
            price,
            market_cap,
            market_cap_confidence,
            liquidity,
            volume24h,
            trades24h: buys24h + sells24h,
            buys24h,
            sells24h,
            buys1h,
            sells1h,
            buys5m,
            sells5m,
            price_change24h: parts
                .pairs
                .first()
                .map(|pair| pair.usd_price_24hr_percent_change)
                .unwrap_or(0.0),
            price_change1h: 0.0,
            price_change5m: 0.0,
            pair_created_at: 0,
        },
        statistics: TokenStatistics {
            holder_count,
            unique_traders: traders.len() as i64,
            top10_concentration,
            dev_holdings,
            largest_holder,
            liquidity_ratio,
            volume_to_liquidity_ratio,
        },
        security: parts.security,
        launch_analysis,
        wallet_funding: parts.funding,
        creator_history: parts.creator_history,
        trade_activity: crate::types::TradeActivity {
            swaps,
            airdrop_transfers_sold: if full_mode { parts.airdrop_transfers_sold } else { 0 },
        },
        analysis: placeholder_analysis(),
        migration_timestamp: event.timestamp,
        analyzed_at: now_ms,
    }
}

/// Filled in by the scoring pass right after fuse.
fn placeholder_analysis() -> AnalysisResult {
    AnalysisResult {
        passed: false,
        score: 0,
        flags: Vec::new(),
        breakdown: std::collections::BTreeMap::new(),
        danger_score: DangerScore {
            overall: 0,
            confidence: DangerConfidence::Low,
            category: DangerCategory::Safe,
            primary_risks: Vec::new(),
            positive_signals: Vec::new(),
        },
        composite_risks: CompositeRisks::default(),
        positive_signals: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::holders::TopHolder;
    use crate::apis::pairs::TokenPair;
    use crate::apis::swaps::ProviderSwap;
    use crate::types::SwapSide;

    fn event() -> MigrationEvent {
        MigrationEvent {
            mint: "Mint1111111111111111111111111111111111111111".to_string(),
            signature: "sig".to_string(),
            name: "Example".to_string(),
            symbol: "EXM".to_string(),
            uri: None,
            pool: "pool".to_string(),
            timestamp: 1_739_300_000_000 - 3_600_000,
            market_cap: None,
            liquidity: None,
            creator: None,
        }
    }

    #[test]
    fn test_all_sentinels_produce_zeroed_record() {
        let now = 1_739_300_000_000i64;
        let record = fuse(&event(), EnrichmentParts::default(), true, now);
        assert_eq!(record.price_data.price, 0.0);
        assert_eq!(record.price_data.market_cap, 0.0);
        assert_eq!(record.price_data.liquidity, 0.0);
        assert_eq!(record.price_data.volume24h, 0.0);
        assert_eq!(record.price_data.trades24h, 0);
        assert_eq!(record.statistics.holder_count, -1);
        assert_eq!(record.statistics.top10_concentration, 0.0);
        assert_eq!(record.statistics.dev_holdings, 0.0);
        assert!(record.security.is_none());
        assert_eq!(record.analyzed_at, now);
    }

    #[test]
    fn test_market_cap_precedence() {
        let now = 1_739_300_000_000i64;

        // Event-supplied market cap wins with high confidence
        let mut with_event = event();
        with_event.market_cap = Some(250_000.0);
        let record = fuse(&with_event, EnrichmentParts::default(), true, now);
        assert_eq!(record.price_data.market_cap, 250_000.0);
        assert_eq!(
            record.price_data.market_cap_confidence,
            MarketCapConfidence::High
        );

        // Without it, the price estimate takes over at low confidence
        let mut parts = EnrichmentParts::default();
        parts.pairs = vec![TokenPair {
            pair_address: "p".to_string(),
            exchange: "Raydium".to_string(),
            liquidity_usd: 10_000.0,
            usd_price: 0.0002,
            volume24hr_usd: 0.0,
            usd_price_24hr_percent_change: 0.0,
        }];
        let record = fuse(&event(), parts, true, now);
        assert!((record.price_data.market_cap - 200_000.0).abs() < 1e-6);
        assert_eq!(
            record.price_data.market_cap_confidence,
            MarketCapConfidence::Low
        );
    }

    #[test]
    fn test_volume_pair_sum_wins_over_swaps() {
        let now = 1_739_300_000_000i64;
        let mut parts = EnrichmentParts::default();
        parts.pairs = vec![TokenPair {
            pair_address: "p".to_string(),
            exchange: "Raydium".to_string(),
            liquidity_usd: 10_000.0,
            usd_price: 0.0002,
            volume24hr_usd: 55_000.0,
            usd_price_24hr_percent_change: 0.0,
        }];
        parts.swaps = vec![ProviderSwap {
            side: SwapSide::Buy,
            value_usd: 100.0,
            wallet: "w".to_string(),
            timestamp_ms: now - 1000,
            amount_sol: None,
        }];
        let record = fuse(&event(), parts, true, now);
        assert_eq!(record.price_data.volume24h, 55_000.0);
        // trade counts still come from the swaps feed
        assert_eq!(record.price_data.buys24h, 1);
        assert_eq!(record.statistics.unique_traders, 1);
    }

    #[test]
    fn test_registry_distribution_beats_onchain() {
        let now = 1_739_300_000_000i64;
        let mut parts = EnrichmentParts::default();
        parts.resolved_creator = Some("dev".to_string());
        parts.top_holders = vec![
            TopHolder {
                owner: "whale".to_string(),
                percentage_of_supply: 0.31,
                label: None,
                is_contract: false,
            },
            TopHolder {
                owner: "dev".to_string(),
                percentage_of_supply: 0.08,
                label: None,
                is_contract: false,
            },
        ];
        parts.onchain.top10_share = 0.9;
        parts.onchain.largest_share = 0.9;
        parts.onchain.dev_share = 0.9;

        let record = fuse(&event(), parts, true, now);
        assert!((record.statistics.top10_concentration - 0.39).abs() < 1e-9);
        assert!((record.statistics.largest_holder - 0.31).abs() < 1e-9);
        assert!((record.statistics.dev_holdings - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_fast_mode_drops_airdrop_count() {
        let now = 1_739_300_000_000i64;
        let mut parts = EnrichmentParts::default();
        parts.airdrop_transfers_sold = 7;
        let record = fuse(&event(), parts, false, now);
        assert_eq!(record.trade_activity.airdrop_transfers_sold, 0);
    }
}
