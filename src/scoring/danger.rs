/// Danger score: the inverse of the safety score, boosted by composite
/// risks, with a confidence estimate and a fixed-priority risk summary.
use crate::types::{
    CompositeRisks, DangerCategory, DangerConfidence, DangerScore, TokenRecord,
};

/// Danger additions per composite risk, in catalog order.
const RUG_IN_PROGRESS_DANGER: i32 = 20;
const PUMP_SETUP_DANGER: i32 = 15;
const WASH_TRADING_DANGER: i32 = 10;
const COORDINATED_DUMP_DANGER: i32 = 10;
const INSIDER_ACCUMULATION_DANGER: i32 = 5;

/// Fixed priority order for the primary-risk summary; each entry is a
/// case-insensitive substring matched against the emitted flags.
const PRIMARY_RISK_PRIORITY: &[&str] = &[
    "rug in progress",
    "coordinated dump",
    "insider",
    "pump setup",
    "dump in progress",
    "mega whale",
    "mint authority not revoked",
    "lp not locked",
    "bundled",
    "very high concentration",
    "dangerously low liquidity",
    "sniper",
    "low holders",
    "no social links",
];

pub fn compute(
    score: i32,
    record: &TokenRecord,
    risks: &CompositeRisks,
    flags: &[String],
    positive_signals: &[String],
) -> DangerScore {
    let mut overall = 100 - score.clamp(0, 100);

    if risks.rug_in_progress {
        overall += RUG_IN_PROGRESS_DANGER;
    }
    if risks.pump_setup {
        overall += PUMP_SETUP_DANGER;
    }
    if risks.wash_trading {
        overall += WASH_TRADING_DANGER;
    }
    if risks.coordinated_dump {
        overall += COORDINATED_DUMP_DANGER;
    }
    if risks.insider_accumulation {
        overall += INSIDER_ACCUMULATION_DANGER;
    }
    let overall = overall.clamp(0, 100);

    let confidence = if record.security.is_none() || record.price_data.trades24h == 0 {
        DangerConfidence::Low
    } else if record.statistics.holder_count <= 0 {
        DangerConfidence::Medium
    } else {
        DangerConfidence::High
    };

    let category = if overall >= 80 {
        DangerCategory::Extreme
    } else if overall >= 60 {
        DangerCategory::HighRisk
    } else if overall >= 40 {
        DangerCategory::Moderate
    } else if overall >= 20 {
        DangerCategory::LowRisk
    } else {
        DangerCategory::Safe
    };

    let primary_risks = pick_primary_risks(flags);

    DangerScore {
        overall,
        confidence,
        category,
        primary_risks,
        positive_signals: positive_signals.to_vec(),
    }
}

fn pick_primary_risks(flags: &[String]) -> Vec<String> {
    let lowered: Vec<String> = flags.iter().map(|f| f.to_lowercase()).collect();
    let mut picked = Vec::new();

    for pattern in PRIMARY_RISK_PRIORITY {
        if picked.len() >= 3 {
            break;
        }
        if let Some(index) = lowered.iter().position(|f| f.contains(pattern)) {
            let flag = &flags[index];
            if !picked.contains(flag) {
                picked.push(flag.clone());
            }
        }
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn record_with_trades(holder_count: i64, trades24h: i64) -> TokenRecord {
        let analyzed_at = 1_739_300_000_000i64;
        TokenRecord {
            address: "m".to_string(),
            metadata: TokenMetadata::default(),
            price_data: PriceData {
                trades24h,
                ..PriceData::default()
            },
            statistics: TokenStatistics {
                holder_count,
                ..TokenStatistics::default()
            },
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
    fn test_danger_inverse_of_score() {
        let record = record_with_trades(500, 100);
        let danger = compute(80, &record, &CompositeRisks::default(), &[], &[]);
        assert_eq!(danger.overall, 20);
        assert_eq!(danger.category, DangerCategory::LowRisk);
        assert_eq!(danger.confidence, DangerConfidence::High);
    }

    #[test]
    fn test_composite_additions_clamped() {
        let record = record_with_trades(500, 100);
        let risks = CompositeRisks {
            rug_in_progress: true,
            pump_setup: true,
            wash_trading: true,
            coordinated_dump: true,
            insider_accumulation: true,
        };
        let danger = compute(0, &record, &risks, &[], &[]);
        assert_eq!(danger.overall, 100);
        assert_eq!(danger.category, DangerCategory::Extreme);
    }

    #[test]
    fn test_confidence_downgrades() {
        let unknown_holders = record_with_trades(-1, 100);
        let danger = compute(50, &unknown_holders, &CompositeRisks::default(), &[], &[]);
        assert_eq!(danger.confidence, DangerConfidence::Medium);

        let mut no_security = record_with_trades(500, 100);
        no_security.security = None;
        let danger = compute(50, &no_security, &CompositeRisks::default(), &[], &[]);
        assert_eq!(danger.confidence, DangerConfidence::Low);

        let no_trades = record_with_trades(500, 0);
        let danger = compute(50, &no_trades, &CompositeRisks::default(), &[], &[]);
        assert_eq!(danger.confidence, DangerConfidence::Low);
    }

    #[test]
    fn test_primary_risk_priority_order() {
        let flags = vec![
            "Low holders: 10".to_string(),
            "🚨 Coordinated dump detected".to_string(),
            "Mega whale: largest holder owns 42.0%".to_string(),
            "🚨 RUG IN PROGRESS".to_string(),
        ];
        let picked = pick_primary_risks(&flags);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0], "🚨 RUG IN PROGRESS");
        assert_eq!(picked[1], "🚨 Coordinated dump detected");
        assert_eq!(picked[2], "Mega whale: largest holder owns 42.0%");
    }
}
