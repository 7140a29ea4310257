/// Enrichment orchestrator.
///
/// `enrich(event, mode)` fans out provider calls in parallel under a
/// per-event deadline (fast 6s, full 10s), collects whatever arrived into
/// `EnrichmentParts`, and fuses them into a scored `TokenRecord`. Every
/// provider call runs under its own per-call timeout AND the outer
/// deadline - whichever fires first yields that call's absent sentinel.
/// The orchestrator never blocks past the deadline and never errors.
pub mod creator;
pub mod funding;
pub mod fuse;
pub mod launch;
pub mod metadata;
pub mod onchain;

use std::future::Future;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::apis::{GraduatedClient, HoldersClient, MoralisTransport, PairsClient, SwapsClient};
use crate::apis::holders::{HolderStats, TopHolder};
use crate::apis::pairs::TokenPair;
use crate::apis::swaps::ProviderSwap;
use crate::arguments::is_debug_enrich_enabled;
use crate::config::{ProviderConfig, ScoringConfig};
use crate::helpers::now_ms;
use crate::logger::{log, LogTag};
use crate::rpc::ChainRpcClient;
use crate::scoring;
use crate::types::{
    CreatorHistory, LaunchAnalysis, MigrationEvent, SecurityInfo, TokenRecord, WalletFunding,
};

/// Enrichment depth. Backfill runs fast, the live stream and manual
/// analyses run full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichMode {
    Fast,
    Full,
}

impl EnrichMode {
    pub fn deadline(&self) -> Duration {
        match self {
            EnrichMode::Fast => Duration::from_secs(6),
            EnrichMode::Full => Duration::from_secs(10),
        }
    }

    fn provider_timeout(&self) -> Duration {
        match self {
            EnrichMode::Fast => Duration::from_secs(4),
            EnrichMode::Full => Duration::from_secs(6),
        }
    }

    fn security_timeout(&self) -> Duration {
        match self {
            EnrichMode::Fast => Duration::from_secs(3),
            EnrichMode::Full => Duration::from_secs(6),
        }
    }
}

/// Raw provider outputs gathered for one event. Everything is optional or
/// defaulted; the fuse step applies the precedence rules.
#[derive(Default)]
pub struct EnrichmentParts {
    pub pairs: Vec<TokenPair>,
    pub holder_stats: Option<HolderStats>,
    pub top_holders: Vec<TopHolder>,
    pub swaps: Vec<ProviderSwap>,
    pub onchain: onchain::OnChainProbe,
    pub security: Option<SecurityInfo>,
    pub launch: Option<(LaunchAnalysis, Option<String>)>,
    pub airdrop_transfers_sold: u32,
    pub funding: WalletFunding,
    pub creator_history: Option<CreatorHistory>,
    pub resolved_creator: Option<String>,
    pub token_meta: metadata::TokenMetaFetch,
}

/// Owns the provider clients; one instance per process, fresh instances in
/// tests.
pub struct Enricher {
    pub graduated: GraduatedClient,
    pairs: PairsClient,
    holders: HoldersClient,
    swaps: SwapsClient,
    rpc: Arc<ChainRpcClient>,
    market_stats: Arc<crate::apis::ApiStats>,
    scoring_config: ScoringConfig,
}

impl Enricher {
    pub fn new(provider: &ProviderConfig, scoring_config: ScoringConfig) -> Result<Self, String> {
        let transport = Arc::new(MoralisTransport::new(provider.moralis_keys.clone())?);
        let market_stats = transport.stats();
        Ok(Self {
            graduated: GraduatedClient::new(transport.clone()),
            pairs: PairsClient::new(transport.clone()),
            holders: HoldersClient::new(transport.clone()),
            swaps: SwapsClient::new(transport),
            rpc: Arc::new(ChainRpcClient::new(provider.helius_keys.clone())?),
            market_stats,
            scoring_config,
        })
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        self.scoring_config
    }

    /// Request counters for the /stats endpoint.
    pub fn provider_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "market": self.market_stats.snapshot(),
            "chain": self.rpc.stats().snapshot(),
        })
    }

    /// Enrich one migration event into a scored record. Infallible: absent
    /// data degrades to sentinels, the deadline bounds the wall clock.
    pub async fn enrich(&self, event: &MigrationEvent, mode: EnrichMode) -> TokenRecord {
        let started = Instant::now();
        let deadline = started + mode.deadline();
        let now = now_ms();

        // Step 1: recover the creator when the event lacks one
        let resolved_creator = match &event.creator {
            Some(creator) if !creator.is_empty() => Some(creator.clone()),
            _ => {
                bounded(
                    deadline,
                    Duration::from_secs(3),
                    self.rpc.get_asset_creator(&event.mint),
                    None,
                )
                .await
            }
        };

        // Step 2: independent provider calls, all in parallel
        let provider_timeout = mode.provider_timeout();
        let since_24h = now - 24 * 3_600_000;
        let (max_pages, full_mode) = match mode {
            EnrichMode::Fast => (1, false),
            EnrichMode::Full => (3, true),
        };

        let (pairs, holder_bundle, swaps, probe, mint_security, launch_bundle, token_meta) = tokio::join!(
            bounded(
                deadline,
                provider_timeout,
                self.pairs.get_pairs(&event.mint),
                Vec::new(),
            ),
            bounded(
                deadline,
                provider_timeout,
                async {
                    tokio::join!(
                        self.holders.get_holder_stats(&event.mint),
                        self.holders.get_top_holders(&event.mint, 20),
                    )
                },
                (None, Vec::new()),
            ),
            bounded(
                deadline,
                provider_timeout,
                self.swaps.get_recent_swaps(&event.mint, since_24h, 100, max_pages),
                Vec::new(),
            ),
            bounded(
                deadline,
                provider_timeout,
                onchain::probe(&self.rpc, &event.mint, resolved_creator.as_deref()),
                onchain::OnChainProbe::default(),
            ),
            bounded(
                deadline,
                mode.security_timeout(),
                onchain::mint_security(&self.rpc, &event.mint),
                None,
            ),
            async {
                if full_mode {
                    bounded(
                        deadline,
                        Duration::from_secs(8),
                        launch::analyze(
                            &self.rpc,
                            &event.mint,
                            event.timestamp,
                            resolved_creator.as_deref(),
                        ),
                        launch::LaunchOutcome::default(),
                    )
                    .await
                } else {
                    launch::LaunchOutcome::default()
                }
            },
            async {
                if full_mode {
                    bounded(
                        deadline,
                        Duration::from_secs(3),
                        metadata::fetch(event.uri.as_deref()),
                        metadata::TokenMetaFetch::default(),
                    )
                    .await
                } else {
                    metadata::TokenMetaFetch::default()
                }
            },
        );
        let (holder_stats, top_holders) = holder_bundle;

        // Step 3: dependent passes - funding clusters need the holder set,
        // the honeypot check needs the top-5 owner wallets
        let (funding, contract_check, creator_history) = tokio::join!(
            bounded(
                deadline,
                Duration::from_secs(5),
                funding::analyze(&self.rpc, &top_holders, &probe, now),
                WalletFunding::default(),
            ),
            bounded(
                deadline,
                Duration::from_secs(3),
                onchain::top_holders_are_contracts(&self.rpc, &probe, &top_holders),
                false,
            ),
            async {
                match resolved_creator.as_deref() {
                    Some(creator) => {
                        bounded(
                            deadline,
                            provider_timeout,
                            creator::history(&self.rpc, creator, now),
                            None,
                        )
                        .await
                    }
                    None => None,
                }
            },
        );

        let security = mint_security.map(|mut security: SecurityInfo| {
            security.top_holders_are_contracts = contract_check;
            security
        });

        let parts = EnrichmentParts {
            pairs,
            holder_stats,
            top_holders,
            swaps,
            onchain: probe,
            security,
            launch: launch_bundle.analysis,
            airdrop_transfers_sold: launch_bundle.airdrop_transfers_sold,
            funding,
            creator_history,
            resolved_creator,
            token_meta,
        };

        let mut record = fuse::fuse(event, parts, full_mode, now);
        record.analysis = scoring::score(&record, &self.scoring_config);

        if is_debug_enrich_enabled() {
            log(
                LogTag::Enrich,
                "DEBUG",
                &format!(
                    "Enriched mint={} mode={:?} score={} danger={} elapsed_ms={}",
                    event.mint,
                    mode,
                    record.analysis.score,
                    record.analysis.danger_score.overall,
                    started.elapsed().as_millis()
                ),
            );
        }

        record
    }
}

/// Run `fut` under `min(per_call, time-to-deadline)`; produce `fallback` if
/// either bound fires first. The outer deadline therefore always wins.
async fn bounded<T>(
    deadline: Instant,
    per_call: Duration,
    fut: impl Future<Output = T>,
    fallback: T,
) -> T {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return fallback;
    }
    match tokio::time::timeout(per_call.min(remaining), fut).await {
        Ok(value) => value,
        Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_returns_value_in_time() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let value = bounded(deadline, Duration::from_secs(1), async { 42 }, 0).await;
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_bounded_falls_back_on_slow_future() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let value = bounded(
            deadline,
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                42
            },
            -1,
        )
        .await;
        assert_eq!(value, -1);
    }

    #[tokio::test]
    async fn test_bounded_respects_expired_deadline() {
        let deadline = Instant::now();
        let value = bounded(deadline, Duration::from_secs(10), async { 42 }, -1).await;
        assert_eq!(value, -1);
    }
}
