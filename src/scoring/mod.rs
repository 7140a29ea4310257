/// Scoring engine - pure, synchronous, deterministic.
///
/// `score()` turns a fused `TokenRecord` into an `AnalysisResult`: a suite
/// of independently-capped checks reduces a base score of 100, composite
/// risks and positive bonuses adjust it, and the result is clamped to
/// [0,100]. No I/O, no randomness, no wall clock - every age is measured
/// against the record's own `analyzed_at`.
pub mod checks;
pub mod composite;
pub mod danger;

use std::collections::BTreeMap;

use crate::config::ScoringConfig;
use crate::types::{AnalysisResult, CheckBreakdown, TokenRecord};

/// Cross-check signals derived once from the record.
#[derive(Debug, Clone, Copy)]
pub struct Signals {
    pub age_hours: f64,
    pub buy_ratio: f64,
    pub sell_ratio: f64,
    pub total_trades24h: i64,
    /// Negative when holder count is unknown
    pub trades_per_holder: f64,
}

impl Signals {
    pub fn derive(record: &TokenRecord) -> Self {
        let reference_ms = if record.price_data.pair_created_at > 0 {
            record.price_data.pair_created_at
        } else {
            record.migration_timestamp
        };
        let age_hours = if reference_ms > 0 {
            ((record.analyzed_at - reference_ms).max(0) as f64) / 3_600_000.0
        } else {
            0.0
        };

        let buys = record.price_data.buys24h.max(0) as f64;
        let sells = record.price_data.sells24h.max(0) as f64;
        let total = buys + sells;
        let (buy_ratio, sell_ratio) = if total > 0.0 {
            (buys / total, sells / total)
        } else {
            (0.0, 0.0)
        };

        let trades_per_holder = if record.statistics.holder_count > 0 {
            record.price_data.trades24h.max(0) as f64 / record.statistics.holder_count as f64
        } else {
            -1.0
        };

        Self {
            age_hours,
            buy_ratio,
            sell_ratio,
            total_trades24h: record.price_data.trades24h.max(0),
            trades_per_holder,
        }
    }
}

/// Score a fused record. Ignores any `analysis` already on the record, so
/// re-scoring a deserialized record reproduces the same result.
pub fn score(record: &TokenRecord, config: &ScoringConfig) -> AnalysisResult {
    let signals = Signals::derive(record);

    let mut breakdown: BTreeMap<String, CheckBreakdown> = BTreeMap::new();
    for (name, result) in [
        ("washTrading", checks::check_wash_trading(record)),
        ("holderDistribution", checks::check_holder_distribution(record, config)),
        ("developerHoldings", checks::check_developer_holdings(record, config)),
        ("volumeManipulation", checks::check_volume_manipulation(record, config)),
        ("airdropScheme", checks::check_airdrop_scheme(record)),
        ("socialSignals", checks::check_social_signals(record)),
        ("tokenAge", checks::check_token_age(&signals)),
        ("buyPressure", checks::check_buy_pressure(record, &signals)),
        ("liquidityHealth", checks::check_liquidity_health(record)),
        ("security", checks::check_security(record)),
        ("snipers", checks::check_snipers(record)),
        ("walletFunding", checks::check_wallet_funding(record)),
        ("tradeVelocity", checks::check_trade_velocity(&signals)),
        ("creatorHistory", checks::check_creator_history(record)),
    ] {
        breakdown.insert(name.to_string(), result);
    }

    let penalty_total: i32 = breakdown.values().map(|check| check.penalty).sum();

    let composite = composite::evaluate(record, &signals, &breakdown);
    let (bonus, positive_signals) = composite::positive_bonuses(record, &signals);

    let raw = 100 - penalty_total - composite.penalty + bonus;
    let score = raw.clamp(0, 100);

    let mut flags: Vec<String> = breakdown
        .values()
        .flat_map(|check| check.flags.iter().cloned())
        .collect();
    flags.extend(composite.flags.iter().cloned());

    let danger_score = danger::compute(score, record, &composite.risks, &flags, &positive_signals);

    AnalysisResult {
        passed: score >= config.min_score,
        score,
        flags,
        breakdown,
        danger_score,
        composite_risks: composite.risks,
        positive_signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn neutral_record() -> TokenRecord {
        let analyzed_at = 1_739_300_000_000i64;
        TokenRecord {
            address: "TestMint111111111111111111111111111111111111".to_string(),
            metadata: TokenMetadata::default(),
            price_data: PriceData {
                pair_created_at: analyzed_at - 48 * 3_600_000,
                ..PriceData::default()
            },
            statistics: TokenStatistics::default(),
            security: Some(SecurityInfo::default()),
            launch_analysis: None,
            wallet_funding: WalletFunding::default(),
            creator_history: None,
            trade_activity: TradeActivity::default(),
            analysis: empty_analysis(),
            migration_timestamp: analyzed_at - 48 * 3_600_000,
            analyzed_at,
        }
    }

    pub(crate) fn empty_analysis() -> AnalysisResult {
        AnalysisResult {
            passed: false,
            score: 0,
            flags: Vec::new(),
            breakdown: std::collections::BTreeMap::new(),
            danger_score: DangerScore {
                overall: 0,
                confidence: DangerConfidence::High,
                category: DangerCategory::Safe,
                primary_risks: Vec::new(),
                positive_signals: Vec::new(),
            },
            composite_risks: CompositeRisks::default(),
            positive_signals: Vec::new(),
        }
    }

    #[test]
    fn test_score_bounds() {
        let record = neutral_record();
        let result = score(&record, &ScoringConfig::default());
        assert!(result.score >= 0 && result.score <= 100);
        assert!(result.danger_score.overall >= 0 && result.danger_score.overall <= 100);
    }

    #[test]
    fn test_score_deterministic() {
        let record = neutral_record();
        let config = ScoringConfig::default();
        let first = score(&record, &config);
        let second = score(&record, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_passed_follows_min_score() {
        let record = neutral_record();
        let mut config = ScoringConfig::default();

        config.min_score = 0;
        assert!(score(&record, &config).passed);

        config.min_score = 101;
        assert!(!score(&record, &config).passed);
    }

    #[test]
    fn test_breakdown_penalties_within_caps() {
        let record = neutral_record();
        let result = score(&record, &ScoringConfig::default());
        for (name, check) in &result.breakdown {
            assert!(
                check.penalty >= 0 && check.penalty <= check.max_score,
                "check {} penalty {} outside cap {}",
                name,
                check.penalty,
                check.max_score
            );
        }
    }

    #[test]
    fn test_flags_subset_of_breakdown_and_composites() {
        let record = neutral_record();
        let result = score(&record, &ScoringConfig::default());
        let mut allowed: Vec<&String> = result
            .breakdown
            .values()
            .flat_map(|check| check.flags.iter())
            .collect();
        let composite_flags: Vec<String> = Vec::new();
        allowed.extend(composite_flags.iter());
        for flag in &result.flags {
            assert!(allowed.contains(&flag), "stray flag {}", flag);
        }
    }

    #[test]
    fn test_rescore_serialized_record_matches() {
        let mut record = neutral_record();
        let config = ScoringConfig::default();
        record.analysis = score(&record, &config);

        let json = serde_json::to_string(&record).unwrap();
        let restored: TokenRecord = serde_json::from_str(&json).unwrap();
        let rescored = score(&restored, &config);
        assert_eq!(rescored, record.analysis);
    }

    #[test]
    fn test_age_measured_against_analyzed_at() {
        let mut record = neutral_record();
        record.price_data.pair_created_at = record.analyzed_at - 3_600_000; // 1h
        let signals = Signals::derive(&record);
        assert!((signals.age_hours - 1.0).abs() < 1e-9);
    }
}
