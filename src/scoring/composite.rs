/// Composite risks and positive bonuses.
///
/// Composite risks are booleans derived from already-computed signals; each
/// true value appends a flag and reduces the score further. Bonuses reward
/// maturity and balance, capped at +25 total.
use std::collections::BTreeMap;

use crate::scoring::Signals;
use crate::types::{CheckBreakdown, CompositeRisks, TokenRecord};

/// Score reductions per composite risk.
pub const RUG_IN_PROGRESS_PENALTY: i32 = 20;
pub const PUMP_SETUP_PENALTY: i32 = 10;
pub const WASH_TRADING_PENALTY: i32 = 10;
pub const COORDINATED_DUMP_PENALTY: i32 = 15;
pub const INSIDER_ACCUMULATION_PENALTY: i32 = 15;

/// Positive bonus ceiling.
pub const MAX_BONUS: i32 = 25;

pub struct CompositeOutcome {
    pub risks: CompositeRisks,
    pub penalty: i32,
    pub flags: Vec<String>,
}

pub fn evaluate(
    record: &TokenRecord,
    signals: &Signals,
    breakdown: &BTreeMap<String, CheckBreakdown>,
) -> CompositeOutcome {
    let holder_flags = breakdown
        .get("holderDistribution")
        .map(|check| check.flags.as_slice())
        .unwrap_or(&[]);
    let has_very_high_concentration = holder_flags
        .iter()
        .any(|f| f.contains("Very high concentration"));
    let has_mega_whale = holder_flags.iter().any(|f| f.contains("Mega whale"));
    let has_any_whale = has_mega_whale || holder_flags.iter().any(|f| f.contains("Whale"));

    let velocity_penalty = breakdown
        .get("tradeVelocity")
        .map(|check| check.penalty)
        .unwrap_or(0);

    let holders = record.statistics.holder_count;
    let trades = record.price_data.trades24h;
    let bundled = record
        .launch_analysis
        .as_ref()
        .map(|launch| launch.bundled_buys)
        .unwrap_or(0);
    let clustered = record.wallet_funding.clustered_wallets;

    let mut risks = CompositeRisks::default();
    let mut penalty = 0;
    let mut flags = Vec::new();

    if (has_very_high_concentration || has_mega_whale)
        && signals.sell_ratio > 0.70
        && signals.age_hours < 12.0
    {
        risks.rug_in_progress = true;
        penalty += RUG_IN_PROGRESS_PENALTY;
        flags.push("🚨 RUG IN PROGRESS".to_string());
    }

    if signals.buy_ratio > 0.85
        && (holders < 0 || holders < 100)
        && signals.age_hours < 6.0
        && trades > 100
    {
        risks.pump_setup = true;
        penalty += PUMP_SETUP_PENALTY;
        flags.push("⚠️ Pump setup detected".to_string());
    }

    if signals.trades_per_holder > 10.0 && velocity_penalty > 5 {
        risks.wash_trading = true;
        penalty += WASH_TRADING_PENALTY;
        flags.push("⚠️ Wash trading suspected".to_string());
    }

    if signals.sell_ratio > 0.80 && trades > 50 && signals.age_hours < 24.0 {
        risks.coordinated_dump = true;
        penalty += COORDINATED_DUMP_PENALTY;
        flags.push("🚨 Coordinated dump detected".to_string());
    }

    if bundled > 2 && clustered >= 2 && has_any_whale {
        risks.insider_accumulation = true;
        penalty += INSIDER_ACCUMULATION_PENALTY;
        flags.push("🚨 Insider accumulation".to_string());
    }

    CompositeOutcome {
        risks,
        penalty,
        flags,
    }
}

/// Positive bonuses, capped at +25. Returns (bonus, signal strings).
pub fn positive_bonuses(record: &TokenRecord, signals: &Signals) -> (i32, Vec<String>) {
    let mut bonus = 0;
    let mut positives = Vec::new();

    if signals.age_hours >= 24.0 {
        bonus += 5;
        positives.push("Token age > 24 hours".to_string());
    }
    if signals.age_hours >= 72.0 {
        bonus += 5;
        positives.push("Token age > 72 hours".to_string());
    }

    let holders = record.statistics.holder_count;
    if holders >= 500 {
        bonus += 5;
        positives.push("Strong holder base".to_string());
    } else if holders >= 200 {
        bonus += 3;
        positives.push("Growing holder base".to_string());
    }

    let total = record.price_data.buys24h + record.price_data.sells24h;
    if total > 10 && signals.buy_ratio >= 0.40 && signals.buy_ratio <= 0.60 {
        bonus += 5;
        positives.push("Balanced trading activity".to_string());
    }

    if record.price_data.market_cap > 0.0
        && record.price_data.liquidity / record.price_data.market_cap >= 0.10
    {
        bonus += 5;
        positives.push("Healthy liquidity ratio".to_string());
    }

    let has_twitter = record
        .metadata
        .twitter
        .as_deref()
        .map_or(false, |s| !s.trim().is_empty());
    let has_website = record
        .metadata
        .website
        .as_deref()
        .map_or(false, |s| !s.trim().is_empty());
    if has_twitter && has_website {
        bonus += 3;
        positives.push("Twitter and website present".to_string());
    }

    if let Some(security) = &record.security {
        if security.mint_authority_revoked
            && security.freeze_authority_revoked
            && security.lp_locked
        {
            bonus += 5;
            positives.push("Mint and freeze revoked, LP locked".to_string());
        }
    }

    (bonus.min(MAX_BONUS), positives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn base_record(analyzed_at: i64) -> TokenRecord {
        TokenRecord {
            address: "m".to_string(),
            metadata: TokenMetadata::default(),
            price_data: PriceData::default(),
            statistics: TokenStatistics::default(),
            security: Some(SecurityInfo::default()),
            launch_analysis: None,
            wallet_funding: WalletFunding::default(),
            creator_history: None,
            trade_activity: TradeActivity::default(),
            analysis: crate::scoring::tests::empty_analysis(),
            migration_timestamp: analyzed_at,
            analyzed_at,
        }
    }

    #[test]
    fn test_coordinated_dump_requires_all_conditions() {
        let analyzed_at = 1_739_300_000_000i64;
        let mut record = base_record(analyzed_at);
        record.migration_timestamp = analyzed_at - 4 * 3_600_000;
        record.price_data.buys24h = 10;
        record.price_data.sells24h = 90;
        record.price_data.trades24h = 100;

        let signals = Signals::derive(&record);
        let outcome = evaluate(&record, &signals, &BTreeMap::new());
        assert!(outcome.risks.coordinated_dump);
        assert!(!outcome.risks.rug_in_progress); // no concentration flags

        // Old token: the dump composite no longer fires
        record.migration_timestamp = analyzed_at - 48 * 3_600_000;
        let signals = Signals::derive(&record);
        let outcome = evaluate(&record, &signals, &BTreeMap::new());
        assert!(!outcome.risks.coordinated_dump);
    }

    #[test]
    fn test_bonus_cap() {
        let analyzed_at = 1_739_300_000_000i64;
        let mut record = base_record(analyzed_at);
        record.migration_timestamp = analyzed_at - 100 * 3_600_000;
        record.statistics.holder_count = 1_200;
        record.price_data.buys24h = 480;
        record.price_data.sells24h = 520;
        record.price_data.liquidity = 80_000.0;
        record.price_data.market_cap = 500_000.0;
        record.metadata.twitter = Some("https://x.com/x".to_string());
        record.metadata.website = Some("https://example.com".to_string());

        let signals = Signals::derive(&record);
        let (bonus, positives) = positive_bonuses(&record, &signals);
        assert_eq!(bonus, MAX_BONUS);
        assert!(positives.iter().any(|p| p == "Token age > 24 hours"));
        assert!(positives.iter().any(|p| p == "Strong holder base"));
        assert!(positives.iter().any(|p| p == "Balanced trading activity"));
        assert!(positives.iter().any(|p| p == "Healthy liquidity ratio"));
    }
}
