/// Core types for the graduation pipeline
///
/// One "single source of truth" record type (`TokenRecord`) flows through
/// enrichment, scoring, history and the downstream feeds. All wire-facing
/// structs serialize camelCase; monetary values are USD unless a field name
/// says otherwise; percentages are decimals in [0,1] internally and only
/// formatted as percent strings inside flags.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// MIGRATION EVENT - pipeline input
// ============================================================================

/// A token graduating from the bonding curve to an AMM pool.
///
/// Ephemeral: processed once and discarded. `signature` is empty for
/// backfill-synthesized events and `"manual"` for API-triggered analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationEvent {
    pub mint: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub pool: String,
    /// Milliseconds since epoch
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl MigrationEvent {
    /// Minimal event for manual analysis triggers and tests.
    pub fn manual(mint: &str, creator: Option<String>) -> Self {
        Self {
            mint: mint.to_string(),
            signature: "manual".to_string(),
            name: String::new(),
            symbol: String::new(),
            uri: None,
            pool: String::new(),
            timestamp: Utc::now().timestamp_millis(),
            market_cap: None,
            liquidity: None,
            creator,
        }
    }
}

// ============================================================================
// TOKEN RECORD SECTIONS
// ============================================================================

/// Token identity and social metadata.
///
/// Social fields come from the off-chain metadata URI and are only resolved
/// in full enrichment mode; absent means "not found", which the social
/// signals check penalizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default)]
    pub decimals: u8,
    /// Raw supply as decimal string (u64 amounts overflow JSON readers)
    #[serde(default)]
    pub supply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How much the marketCap figure can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketCapConfidence {
    High,
    Medium,
    Low,
}

impl Default for MarketCapConfidence {
    fn default() -> Self {
        MarketCapConfidence::Low
    }
}

/// Market data fused from the pair index, swaps and the migration event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub price: f64,
    pub market_cap: f64,
    pub market_cap_confidence: MarketCapConfidence,
    pub liquidity: f64,
    pub volume24h: f64,
    pub trades24h: i64,
    pub buys24h: i64,
    pub sells24h: i64,
    pub buys1h: i64,
    pub sells1h: i64,
    pub buys5m: i64,
    pub sells5m: i64,
    pub price_change24h: f64,
    pub price_change1h: f64,
    pub price_change5m: f64,
    /// Milliseconds since epoch; 0 = unknown
    pub pair_created_at: i64,
}

impl Default for PriceData {
    fn default() -> Self {
        Self {
            price: 0.0,
            market_cap: 0.0,
            market_cap_confidence: MarketCapConfidence::Low,
            liquidity: 0.0,
            volume24h: 0.0,
            trades24h: 0,
            buys24h: 0,
            sells24h: 0,
            buys1h: 0,
            sells1h: 0,
            buys5m: 0,
            sells5m: 0,
            price_change24h: 0.0,
            price_change1h: 0.0,
            price_change5m: 0.0,
            pair_created_at: 0,
        }
    }
}

/// Holder and trading statistics.
///
/// `holder_count == -1` means unknown and MUST NOT trigger holder-count
/// thresholds. Concentration fields are decimals in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatistics {
    pub holder_count: i64,
    pub unique_traders: i64,
    pub top10_concentration: f64,
    pub dev_holdings: f64,
    pub largest_holder: f64,
    pub liquidity_ratio: f64,
    pub volume_to_liquidity_ratio: f64,
}

impl Default for TokenStatistics {
    fn default() -> Self {
        Self {
            holder_count: -1,
            unique_traders: 0,
            top10_concentration: 0.0,
            dev_holdings: 0.0,
            largest_holder: 0.0,
            liquidity_ratio: 0.0,
            volume_to_liquidity_ratio: 0.0,
        }
    }
}

/// LP lock duration sentinel meaning "burned forever" (always safe).
pub const LP_LOCK_BURNED: f64 = f64::MAX;

/// On-chain security posture.
///
/// Wrapped in `Option` on the record: `None` means the probe never ran,
/// which carries its own penalty and downgrades danger confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityInfo {
    pub mint_authority_revoked: bool,
    pub freeze_authority_revoked: bool,
    pub lp_locked: bool,
    pub lp_lock_percentage: f64,
    pub lp_lock_duration: f64,
    pub top_holders_are_contracts: bool,
    pub is_rugpull_risk: bool,
}

impl Default for SecurityInfo {
    fn default() -> Self {
        // Pump.fun graduation convention: authorities are revoked by the
        // bonding-curve program and the LP is burned at migration.
        Self {
            mint_authority_revoked: true,
            freeze_authority_revoked: true,
            lp_locked: true,
            lp_lock_percentage: 100.0,
            lp_lock_duration: LP_LOCK_BURNED,
            top_holders_are_contracts: false,
            is_rugpull_risk: false,
        }
    }
}

/// Launch-window analysis (full enrichment mode only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAnalysis {
    pub bundled_buys: u32,
    pub sniper_count: u32,
    pub first_buyer_holdings: f64,
    /// Mean SOL spent by early buyers
    pub avg_first_buy_size: f64,
    pub creator_bought_back: bool,
}

/// Funding-source clustering across top holders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletFunding {
    pub clustered_wallets: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_funding_source: Option<String>,
    pub fresh_wallet_buyers: u32,
    pub suspicious_funding_pattern: bool,
}

/// Creator track record from the asset index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorHistory {
    pub token_count: u32,
    pub recent_tokens: Vec<String>,
    pub is_serial_creator: bool,
    pub rugged_tokens: u32,
    pub successful_tokens: u32,
}

/// Buy or sell side of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapSide {
    Buy,
    Sell,
}

/// One recent swap, trimmed to the fields the scoring checks read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRecord {
    pub wallet: String,
    pub side: SwapSide,
    pub value_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sol: Option<f64>,
    pub timestamp_ms: i64,
}

/// Raw trading activity retained on the record so scoring stays pure.
///
/// Capped at 500 swaps, newest first. `airdrop_transfers_sold` counts
/// pre-first-trade TRANSFER recipients that later sold (full mode only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeActivity {
    pub swaps: Vec<SwapRecord>,
    pub airdrop_transfers_sold: u32,
}

/// Hard cap on swaps carried by a record.
pub const MAX_SWAPS_RETAINED: usize = 500;

// ============================================================================
// ANALYSIS RESULT
// ============================================================================

/// Per-check contribution to the final score.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckBreakdown {
    pub penalty: i32,
    pub max_score: i32,
    pub flags: Vec<String>,
}

/// Booleans derived from two or more signals; each true value adds a flag
/// and an extra penalty.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRisks {
    pub rug_in_progress: bool,
    pub pump_setup: bool,
    pub wash_trading: bool,
    pub coordinated_dump: bool,
    pub insider_accumulation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DangerCategory {
    Safe,
    LowRisk,
    Moderate,
    HighRisk,
    Extreme,
}

/// Inverse safety score, boosted by composite risks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DangerScore {
    pub overall: i32,
    pub confidence: DangerConfidence,
    pub category: DangerCategory,
    pub primary_risks: Vec<String>,
    pub positive_signals: Vec<String>,
}

/// Output of the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub passed: bool,
    pub score: i32,
    pub flags: Vec<String>,
    pub breakdown: BTreeMap<String, CheckBreakdown>,
    pub danger_score: DangerScore,
    pub composite_risks: CompositeRisks,
    pub positive_signals: Vec<String>,
}

// ============================================================================
// TOKEN RECORD - fused output of enrichment, input to scoring
// ============================================================================

/// The fused token record. Created by the enrichment orchestrator, scored
/// once, then immutable inside the bounded history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub address: String,
    pub metadata: TokenMetadata,
    pub price_data: PriceData,
    pub statistics: TokenStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_analysis: Option<LaunchAnalysis>,
    pub wallet_funding: WalletFunding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_history: Option<CreatorHistory>,
    pub trade_activity: TradeActivity,
    pub analysis: AnalysisResult,
    /// Milliseconds since epoch
    pub migration_timestamp: i64,
    /// Milliseconds since epoch; the scoring clock reference
    pub analyzed_at: i64,
}

/// Monitor statistics snapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStats {
    pub monitored: u64,
    pub passed: u64,
    pub filtered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_count_unknown_default() {
        let stats = TokenStatistics::default();
        assert_eq!(stats.holder_count, -1);
    }

    #[test]
    fn test_security_default_is_pump_fun_convention() {
        let security = SecurityInfo::default();
        assert!(security.mint_authority_revoked);
        assert!(security.freeze_authority_revoked);
        assert!(security.lp_locked);
        assert_eq!(security.lp_lock_duration, LP_LOCK_BURNED);
    }

    #[test]
    fn test_danger_category_wire_format() {
        let json = serde_json::to_string(&DangerCategory::HighRisk).unwrap();
        assert_eq!(json, "\"HIGH_RISK\"");
        let json = serde_json::to_string(&DangerCategory::Safe).unwrap();
        assert_eq!(json, "\"SAFE\"");
    }

    #[test]
    fn test_swap_side_wire_format() {
        assert_eq!(serde_json::to_string(&SwapSide::Buy).unwrap(), "\"buy\"");
        let side: SwapSide = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(side, SwapSide::Sell);
    }

    #[test]
    fn test_migration_event_roundtrip() {
        let event = MigrationEvent {
            mint: "So11111111111111111111111111111111111111112".to_string(),
            signature: "abc".to_string(),
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            uri: Some("https://example.com/meta.json".to_string()),
            pool: "pool".to_string(),
            timestamp: 1_700_000_000_000,
            market_cap: Some(69_420.0),
            liquidity: None,
            creator: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"marketCap\":69420.0"));
        let back: MigrationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mint, event.mint);
        assert_eq!(back.market_cap, event.market_cap);
    }
}
