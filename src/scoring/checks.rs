/// The check catalog. Each check inspects one aspect of the record and
/// returns a `CheckBreakdown` whose penalty is already clamped to the
/// check's cap. Checks are independent: no check reads another's output.
use std::collections::HashMap;

use crate::config::ScoringConfig;
use crate::scoring::Signals;
use crate::types::{CheckBreakdown, SwapSide, TokenRecord};

fn capped(cap: i32, accumulated: i32, flags: Vec<String>) -> CheckBreakdown {
    CheckBreakdown {
        penalty: accumulated.min(cap),
        max_score: cap,
        flags,
    }
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

// ============================================================================
// WASH TRADING (cap 20)
// ============================================================================

pub fn check_wash_trading(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 20;
    let mut penalty = 0;
    let mut flags = Vec::new();

    struct WalletActivity {
        buys: u32,
        sells: u32,
        timestamps: Vec<i64>,
    }

    let mut wallets: HashMap<&str, WalletActivity> = HashMap::new();
    for swap in &record.trade_activity.swaps {
        let entry = wallets.entry(swap.wallet.as_str()).or_insert(WalletActivity {
            buys: 0,
            sells: 0,
            timestamps: Vec::new(),
        });
        match swap.side {
            SwapSide::Buy => entry.buys += 1,
            SwapSide::Sell => entry.sells += 1,
        }
        entry.timestamps.push(swap.timestamp_ms);
    }

    let mut cycler_flagged = false;
    let mut rapid_flagged = false;

    for (wallet, activity) in &wallets {
        if !cycler_flagged && activity.buys > 5 && activity.sells > 5 {
            penalty += 12;
            flags.push(format!(
                "Wash trading pattern: wallet {} made {} buys and {} sells",
                short(wallet),
                activity.buys,
                activity.sells
            ));
            cycler_flagged = true;
        }

        let total = activity.buys + activity.sells;
        if !rapid_flagged && total > 10 {
            let mut timestamps = activity.timestamps.clone();
            timestamps.sort_unstable();
            let span = (timestamps[timestamps.len() - 1] - timestamps[0]) as f64;
            let mean_interval_secs = span / 1000.0 / (timestamps.len() - 1).max(1) as f64;
            if mean_interval_secs < 30.0 {
                penalty += 10;
                flags.push(format!(
                    "Rapid-fire wallet: {} trades averaging {:.0}s apart",
                    total, mean_interval_secs
                ));
                rapid_flagged = true;
            }
        }

        if cycler_flagged && rapid_flagged {
            break;
        }
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// HOLDER DISTRIBUTION (cap 25)
// ============================================================================

pub fn check_holder_distribution(record: &TokenRecord, config: &ScoringConfig) -> CheckBreakdown {
    const CAP: i32 = 25;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let holders = record.statistics.holder_count;
    // -1 means unknown and never triggers the count thresholds
    if holders >= 0 {
        if holders < config.min_holders {
            penalty += 15;
            flags.push(format!("Low holders: {}", holders));
        } else if holders < config.min_holders * 2 {
            penalty += 8;
            flags.push(format!("Moderate holder count: {}", holders));
        }
    }

    let top10 = record.statistics.top10_concentration;
    if top10 > 0.50 {
        penalty += 15;
        flags.push(format!("Very high concentration: top 10 hold {}", pct(top10)));
    } else if top10 > config.max_top10 {
        penalty += 10;
        flags.push(format!("High concentration: top 10 hold {}", pct(top10)));
    }

    let largest = record.statistics.largest_holder;
    if largest > 0.30 {
        penalty += 10;
        flags.push(format!("Mega whale: largest holder owns {}", pct(largest)));
    } else if largest > 0.20 {
        penalty += 6;
        flags.push(format!("Whale: largest holder owns {}", pct(largest)));
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// DEVELOPER HOLDINGS (cap 15)
// ============================================================================

pub fn check_developer_holdings(record: &TokenRecord, config: &ScoringConfig) -> CheckBreakdown {
    const CAP: i32 = 15;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let dev = record.statistics.dev_holdings;
    if dev > 0.25 {
        penalty += 15;
        flags.push(format!("Developer holds {} of supply", pct(dev)));
    } else if dev > config.max_dev_holdings {
        penalty += 10;
        flags.push(format!("Developer holds {} of supply", pct(dev)));
    } else if dev > 0.05 {
        penalty += 5;
        flags.push(format!("Developer holds {} of supply", pct(dev)));
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// VOLUME MANIPULATION (cap 20)
// ============================================================================

pub fn check_volume_manipulation(record: &TokenRecord, config: &ScoringConfig) -> CheckBreakdown {
    const CAP: i32 = 20;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let total = record.price_data.trades24h;
    let unique = record.statistics.unique_traders;
    if total > 0 && unique > 0 {
        let ratio = unique as f64 / total as f64;
        if ratio < 0.30 {
            penalty += 15;
            flags.push(format!(
                "Very low unique trader ratio: {} traders over {} trades",
                unique, total
            ));
        } else if ratio < config.min_unique_ratio {
            penalty += 8;
            flags.push(format!(
                "Low unique trader ratio: {} traders over {} trades",
                unique, total
            ));
        }
    }

    let mut buys = 0u32;
    let mut micro_buys = 0u32;
    for swap in &record.trade_activity.swaps {
        if swap.side != SwapSide::Buy {
            continue;
        }
        buys += 1;
        let is_micro = match swap.amount_sol {
            Some(sol) => sol < 0.01,
            None => swap.value_usd < 1.0,
        };
        if is_micro {
            micro_buys += 1;
        }
    }
    if buys > 0 && (micro_buys as f64) / (buys as f64) > 0.40 {
        penalty += 10;
        flags.push(format!(
            "Micro-buy padding: {} of {} buys are dust-sized",
            micro_buys, buys
        ));
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// AIRDROP SCHEME (cap 15)
// ============================================================================

pub fn check_airdrop_scheme(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 15;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let sold = record.trade_activity.airdrop_transfers_sold;
    if sold > 5 {
        penalty += 15;
        flags.push(format!("Airdrop scheme: {} pre-trade recipients dumped", sold));
    } else if sold > 2 {
        penalty += 8;
        flags.push(format!("Possible airdrop scheme: {} recipients sold", sold));
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// SOCIAL SIGNALS (cap 10)
// ============================================================================

const GENERIC_WORDS: &[&str] = &[
    "the", "best", "token", "coin", "moon", "to", "on", "solana", "community", "meme", "100x",
    "gem", "next", "big", "pump", "a", "is", "of", "and", "new",
];

const IMPERSONATION_HINTS: &[&str] = &["elon", "musk", "trump", "official", "doge", "pepe", "inu"];

pub fn check_social_signals(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 10;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let meta = &record.metadata;
    let has_twitter = meta.twitter.as_deref().map_or(false, |s| !s.trim().is_empty());
    let has_telegram = meta.telegram.as_deref().map_or(false, |s| !s.trim().is_empty());
    let has_website = meta.website.as_deref().map_or(false, |s| !s.trim().is_empty());

    if !has_twitter && !has_telegram {
        penalty += 6;
        flags.push("No social links".to_string());
    } else if !has_twitter {
        penalty += 3;
        flags.push("No twitter presence".to_string());
    }

    if !has_website {
        penalty += 2;
        flags.push("No website".to_string());
    }

    if let Some(description) = meta.description.as_deref() {
        let trimmed = description.trim();
        if !trimmed.is_empty() && trimmed.len() < 50 && is_generic_text(trimmed) {
            penalty += 3;
            flags.push("Generic description".to_string());
        }
    }

    let name_lower = format!("{} {}", meta.name, meta.symbol).to_lowercase();
    let impersonates = IMPERSONATION_HINTS.iter().any(|hint| name_lower.contains(hint));
    if impersonates && !has_twitter {
        penalty += 4;
        flags.push("Impersonation-style name with no twitter".to_string());
    }

    capped(CAP, penalty, flags)
}

fn is_generic_text(text: &str) -> bool {
    let mut saw_word = false;
    for word in text.split_whitespace() {
        let cleaned: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if cleaned.is_empty() {
            continue;
        }
        saw_word = true;
        if !GENERIC_WORDS.contains(&cleaned.as_str()) {
            return false;
        }
    }
    saw_word
}

// ============================================================================
// TOKEN AGE (cap 15)
// ============================================================================

pub fn check_token_age(signals: &Signals) -> CheckBreakdown {
    const CAP: i32 = 15;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let age = signals.age_hours;
    if age < 0.5 {
        penalty += 15;
        flags.push(format!("Very new token: {:.0} minutes old", age * 60.0));
    } else if age < 1.0 {
        penalty += 10;
        flags.push("New token: under an hour old".to_string());
    } else if age < 6.0 {
        penalty += 5;
        flags.push(format!("Young token: {:.1} hours old", age));
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// BUY PRESSURE (cap 15)
// ============================================================================

pub fn check_buy_pressure(record: &TokenRecord, signals: &Signals) -> CheckBreakdown {
    const CAP: i32 = 15;
    let mut penalty = 0;
    let mut flags = Vec::new();

    if record.price_data.buys24h + record.price_data.sells24h > 0 {
        if signals.buy_ratio > 0.90 {
            penalty += 10;
            flags.push(format!("Extreme buy pressure: {} buys", pct(signals.buy_ratio)));
        } else if signals.buy_ratio > 0.80 {
            penalty += 5;
            flags.push(format!("High buy pressure: {} buys", pct(signals.buy_ratio)));
        } else if signals.buy_ratio < 0.20 {
            penalty += 15;
            flags.push(format!("Dump in progress: {} sells", pct(signals.sell_ratio)));
        }
    }

    let trades_5m = record.price_data.buys5m + record.price_data.sells5m;
    let trades_1h = record.price_data.buys1h + record.price_data.sells1h;
    if trades_1h > 0 && trades_5m as f64 > 5.0 * (trades_1h as f64 / 12.0) {
        penalty += 8;
        flags.push(format!(
            "5m volume spike: {} trades against a {}-trade hour",
            trades_5m, trades_1h
        ));
    }

    if record.price_data.price_change5m.abs() > 30.0 {
        penalty += 10;
        flags.push(format!(
            "Extreme 5m volatility: {:+.1}%",
            record.price_data.price_change5m
        ));
    } else if record.price_data.price_change1h.abs() > 50.0 {
        penalty += 8;
        flags.push(format!(
            "Extreme 1h volatility: {:+.1}%",
            record.price_data.price_change1h
        ));
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// LIQUIDITY HEALTH (cap 20)
// ============================================================================

pub fn check_liquidity_health(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 20;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let liquidity = record.price_data.liquidity;
    let market_cap = record.price_data.market_cap;
    let volume = record.price_data.volume24h;

    if market_cap > 0.0 {
        let ratio = liquidity / market_cap;
        if ratio < 0.02 {
            penalty += 20;
            flags.push(format!("Dangerously low liquidity ratio: {}", pct(ratio)));
        } else if ratio < 0.05 {
            penalty += 12;
            flags.push(format!("Low liquidity ratio: {}", pct(ratio)));
        } else if ratio < 0.10 {
            penalty += 5;
            flags.push(format!("Thin liquidity ratio: {}", pct(ratio)));
        }

        if liquidity > 0.0 {
            let turnover = volume / liquidity;
            if turnover > 20.0 {
                penalty += 10;
                flags.push(format!("Volume {:.0}x liquidity", turnover));
            } else if turnover > 10.0 {
                penalty += 5;
                flags.push(format!("Volume {:.0}x liquidity", turnover));
            }
        }
    }

    if liquidity < 5_000.0 {
        penalty += 10;
        flags.push(format!("Very low liquidity: ${:.0}", liquidity));
    } else if liquidity < 10_000.0 {
        penalty += 5;
        flags.push(format!("Low liquidity: ${:.0}", liquidity));
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// SECURITY (cap 25)
// ============================================================================

pub fn check_security(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 25;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let security = match &record.security {
        Some(security) => security,
        None => {
            return capped(CAP, 5, vec!["Security data unavailable".to_string()]);
        }
    };

    if !security.mint_authority_revoked {
        penalty += 15;
        flags.push("Mint authority not revoked".to_string());
    }
    if !security.freeze_authority_revoked {
        penalty += 10;
        flags.push("Freeze authority not revoked".to_string());
    }

    if !security.lp_locked {
        if security.lp_lock_percentage < 80.0 {
            penalty += 15;
            flags.push(format!(
                "LP not locked: {:.0}% secured",
                security.lp_lock_percentage
            ));
        }
        if security.lp_lock_percentage < 50.0 {
            penalty += 8;
            flags.push("LP lock below half of supply".to_string());
        }
    }

    if security.top_holders_are_contracts {
        penalty += 10;
        flags.push("Top holders are contract accounts".to_string());
    }
    if security.is_rugpull_risk {
        penalty += 5;
        flags.push("Rugpull risk flagged".to_string());
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// SNIPERS (cap 20)
// ============================================================================

pub fn check_snipers(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 20;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let launch = match &record.launch_analysis {
        Some(launch) => launch,
        None => return capped(CAP, 0, flags),
    };

    if launch.bundled_buys > 3 {
        penalty += 15;
        flags.push(format!(
            "Bundled launch: {} buys in the creation slot",
            launch.bundled_buys
        ));
    } else if launch.bundled_buys > 1 {
        penalty += 8;
        flags.push(format!("Bundled buys detected: {}", launch.bundled_buys));
    }

    if launch.sniper_count > 20 {
        penalty += 12;
        flags.push(format!("Heavy sniper activity: {} snipers", launch.sniper_count));
    } else if launch.sniper_count > 10 {
        penalty += 6;
        flags.push(format!("Sniper activity: {} snipers", launch.sniper_count));
    }

    if launch.avg_first_buy_size > 5.0 {
        penalty += 10;
        flags.push(format!(
            "Large early buys: avg {:.1} SOL",
            launch.avg_first_buy_size
        ));
    } else if launch.avg_first_buy_size > 2.0 {
        penalty += 5;
        flags.push(format!(
            "Sizable early buys: avg {:.1} SOL",
            launch.avg_first_buy_size
        ));
    }

    if launch.creator_bought_back {
        penalty += 8;
        flags.push("Creator bought back in at launch".to_string());
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// WALLET FUNDING (cap 25)
// ============================================================================

pub fn check_wallet_funding(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 25;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let funding = &record.wallet_funding;
    if funding.clustered_wallets >= 5 {
        penalty += 20;
        flags.push(format!(
            "Wallet cluster: {} holders share a funding source",
            funding.clustered_wallets
        ));
    } else if funding.clustered_wallets >= 3 {
        penalty += 12;
        flags.push(format!(
            "Wallet cluster: {} holders share a funding source",
            funding.clustered_wallets
        ));
    } else if funding.clustered_wallets >= 2 {
        penalty += 5;
        flags.push(format!(
            "{} holders share a funding source",
            funding.clustered_wallets
        ));
    }

    if funding.fresh_wallet_buyers >= 5 {
        penalty += 15;
        flags.push(format!("Fresh wallet buyers: {}", funding.fresh_wallet_buyers));
    } else if funding.fresh_wallet_buyers >= 3 {
        penalty += 8;
        flags.push(format!("Fresh wallet buyers: {}", funding.fresh_wallet_buyers));
    }

    if funding.suspicious_funding_pattern {
        penalty += 5;
        flags.push("Suspicious funding pattern".to_string());
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// TRADE VELOCITY (cap 15)
// ============================================================================

pub fn check_trade_velocity(signals: &Signals) -> CheckBreakdown {
    const CAP: i32 = 15;
    let mut penalty = 0;
    let mut flags = Vec::new();

    // Skipped entirely when holder count is unknown or nothing traded
    if signals.trades_per_holder >= 0.0 && signals.total_trades24h > 0 {
        let velocity = signals.trades_per_holder;
        if velocity > 20.0 {
            penalty += 15;
            flags.push(format!("Extreme trade velocity: {:.1} trades per holder", velocity));
        } else if velocity > 10.0 {
            penalty += 10;
            flags.push(format!("High trade velocity: {:.1} trades per holder", velocity));
        } else if velocity > 5.0 {
            penalty += 5;
            flags.push(format!("Elevated trade velocity: {:.1} trades per holder", velocity));
        }
    }

    capped(CAP, penalty, flags)
}

// ============================================================================
// CREATOR HISTORY (cap 35)
// ============================================================================

pub fn check_creator_history(record: &TokenRecord) -> CheckBreakdown {
    const CAP: i32 = 35;
    let mut penalty = 0;
    let mut flags = Vec::new();

    let history = match &record.creator_history {
        Some(history) => history,
        None => return capped(CAP, 0, flags),
    };

    let recent = history.recent_tokens.len();
    if history.is_serial_creator {
        if recent >= 10 {
            penalty += 30;
            flags.push(format!(
                "🚨 SERIAL SCAMMER: {} tokens launched in 30 days",
                recent
            ));
        } else if recent >= 5 {
            penalty += 20;
            flags.push(format!("Serial creator: {} tokens in 30 days", recent));
        } else if recent >= 3 {
            penalty += 12;
            flags.push(format!("Serial creator: {} tokens in 30 days", recent));
        }
    }

    if history.token_count >= 20 {
        penalty += 15;
        flags.push(format!("Prolific creator: {} tokens total", history.token_count));
    } else if history.token_count >= 10 {
        penalty += 8;
        flags.push(format!("Prolific creator: {} tokens total", history.token_count));
    } else if history.token_count >= 5 {
        penalty += 4;
        flags.push(format!("Creator has {} prior tokens", history.token_count));
    }

    if history.rugged_tokens >= 3 {
        penalty += 15;
        flags.push(format!("Creator rugged {} tokens before", history.rugged_tokens));
    }

    capped(CAP, penalty, flags)
}

fn short(address: &str) -> String {
    if address.len() > 8 {
        format!("{}…", &address[..8])
    } else {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn record_with(statistics: TokenStatistics, price_data: PriceData) -> TokenRecord {
        let analyzed_at = 1_739_300_000_000i64;
        TokenRecord {
            address: "m".to_string(),
            metadata: TokenMetadata::default(),
            price_data,
            statistics,
            security: Some(SecurityInfo::default()),
            launch_analysis: None,
            wallet_funding: WalletFunding::default(),
            creator_history: None,
            trade_activity: TradeActivity::default(),
            analysis: crate::scoring::tests::empty_analysis(),
            migration_timestamp: analyzed_at - 48 * 3_600_000,
            analyzed_at,
        }
    }

    #[test]
    fn test_unknown_holders_no_penalty() {
        let record = record_with(TokenStatistics::default(), PriceData::default());
        let result = check_holder_distribution(&record, &ScoringConfig::default());
        assert_eq!(result.penalty, 0);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_low_holders_flag() {
        let statistics = TokenStatistics {
            holder_count: 12,
            ..TokenStatistics::default()
        };
        let record = record_with(statistics, PriceData::default());
        let result = check_holder_distribution(&record, &ScoringConfig::default());
        assert_eq!(result.penalty, 15);
        assert!(result.flags[0].contains("Low holders"));
    }

    #[test]
    fn test_concentration_caps_at_25() {
        let statistics = TokenStatistics {
            holder_count: 10,
            top10_concentration: 0.80,
            largest_holder: 0.45,
            ..TokenStatistics::default()
        };
        let record = record_with(statistics, PriceData::default());
        let result = check_holder_distribution(&record, &ScoringConfig::default());
        // 15 + 15 + 10 accumulated, clamped to the cap
        assert_eq!(result.penalty, 25);
        assert_eq!(result.max_score, 25);
    }

    #[test]
    fn test_dev_holdings_bands() {
        let config = ScoringConfig::default();
        for (dev, expected) in [(0.30, 15), (0.20, 10), (0.08, 5), (0.01, 0)] {
            let statistics = TokenStatistics {
                dev_holdings: dev,
                ..TokenStatistics::default()
            };
            let record = record_with(statistics, PriceData::default());
            assert_eq!(
                check_developer_holdings(&record, &config).penalty,
                expected,
                "dev={}",
                dev
            );
        }
    }

    #[test]
    fn test_liquidity_zero_with_market_cap() {
        let price_data = PriceData {
            liquidity: 0.0,
            market_cap: 100_000.0,
            ..PriceData::default()
        };
        let record = record_with(TokenStatistics::default(), price_data);
        let result = check_liquidity_health(&record);
        // Lowest band fires once; cap holds, no division errors
        assert_eq!(result.penalty, 20);
        assert!(result.flags.iter().any(|f| f.contains("Dangerously low")));
    }

    #[test]
    fn test_liquidity_checks_skipped_without_market_cap() {
        let price_data = PriceData {
            liquidity: 50_000.0,
            market_cap: 0.0,
            volume24h: 10_000_000.0,
            ..PriceData::default()
        };
        let record = record_with(TokenStatistics::default(), price_data);
        let result = check_liquidity_health(&record);
        assert_eq!(result.penalty, 0);
    }

    #[test]
    fn test_security_absent() {
        let mut record = record_with(TokenStatistics::default(), PriceData::default());
        record.security = None;
        let result = check_security(&record);
        assert_eq!(result.penalty, 5);
        assert_eq!(result.flags, vec!["Security data unavailable".to_string()]);
    }

    #[test]
    fn test_security_mint_not_revoked() {
        let mut record = record_with(TokenStatistics::default(), PriceData::default());
        record.security = Some(SecurityInfo {
            mint_authority_revoked: false,
            ..SecurityInfo::default()
        });
        let result = check_security(&record);
        assert_eq!(result.penalty, 15);
        assert!(result.flags[0].contains("Mint authority not revoked"));
    }

    #[test]
    fn test_dump_in_progress() {
        let price_data = PriceData {
            buys24h: 10,
            sells24h: 90,
            trades24h: 100,
            ..PriceData::default()
        };
        let record = record_with(TokenStatistics::default(), price_data);
        let signals = Signals::derive(&record);
        let result = check_buy_pressure(&record, &signals);
        assert_eq!(result.penalty, 15);
        assert!(result.flags[0].contains("Dump in progress"));
    }

    #[test]
    fn test_trade_velocity_skipped_when_unknown() {
        let price_data = PriceData {
            trades24h: 5_000,
            ..PriceData::default()
        };
        let record = record_with(TokenStatistics::default(), price_data);
        let signals = Signals::derive(&record);
        assert_eq!(check_trade_velocity(&signals).penalty, 0);
    }

    #[test]
    fn test_creator_history_capped() {
        let mut record = record_with(TokenStatistics::default(), PriceData::default());
        record.creator_history = Some(CreatorHistory {
            token_count: 35,
            recent_tokens: (0..12).map(|i| format!("mint{}", i)).collect(),
            is_serial_creator: true,
            rugged_tokens: 10,
            successful_tokens: 0,
        });
        let result = check_creator_history(&record);
        // 30 + 15 + 15 accumulated, clamped to 35
        assert_eq!(result.penalty, 35);
        assert!(result.flags.iter().any(|f| f.contains("SERIAL SCAMMER")));
    }

    #[test]
    fn test_wash_trading_cycler() {
        let mut record = record_with(TokenStatistics::default(), PriceData::default());
        let mut swaps = Vec::new();
        for i in 0..6 {
            swaps.push(SwapRecord {
                wallet: "cycler".to_string(),
                side: SwapSide::Buy,
                value_usd: 50.0,
                amount_sol: Some(0.3),
                timestamp_ms: 1_739_000_000_000 + i * 3_600_000,
            });
            swaps.push(SwapRecord {
                wallet: "cycler".to_string(),
                side: SwapSide::Sell,
                value_usd: 50.0,
                amount_sol: Some(0.3),
                timestamp_ms: 1_739_000_000_000 + i * 3_600_000 + 1_800_000,
            });
        }
        record.trade_activity.swaps = swaps;
        let result = check_wash_trading(&record);
        assert!(result.penalty >= 12);
        assert!(result.flags.iter().any(|f| f.contains("Wash trading pattern")));
    }

    #[test]
    fn test_micro_buy_padding() {
        let mut record = record_with(TokenStatistics::default(), PriceData::default());
        record.trade_activity.swaps = (0..10)
            .map(|i| SwapRecord {
                wallet: format!("w{}", i),
                side: SwapSide::Buy,
                value_usd: 0.10,
                amount_sol: Some(0.001),
                timestamp_ms: 1_739_000_000_000 + i * 60_000,
            })
            .collect();
        let result = check_volume_manipulation(&record, &ScoringConfig::default());
        assert_eq!(result.penalty, 10);
        assert!(result.flags[0].contains("Micro-buy"));
    }

    #[test]
    fn test_social_signals_none() {
        let record = record_with(TokenStatistics::default(), PriceData::default());
        let result = check_social_signals(&record);
        // no twitter+telegram (6) and no website (2)
        assert_eq!(result.penalty, 8);
        assert!(result.flags.iter().any(|f| f == "No social links"));
    }

    #[test]
    fn test_generic_description() {
        let mut record = record_with(TokenStatistics::default(), PriceData::default());
        record.metadata.twitter = Some("https://x.com/example".to_string());
        record.metadata.telegram = Some("https://t.me/example".to_string());
        record.metadata.website = Some("https://example.com".to_string());
        record.metadata.description = Some("best meme coin on solana".to_string());
        let result = check_social_signals(&record);
        assert_eq!(result.penalty, 3);
        assert_eq!(result.flags, vec!["Generic description".to_string()]);
    }
}
