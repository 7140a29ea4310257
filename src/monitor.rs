/// Token monitor - pipeline lifecycle and bounded history.
///
/// One instance owns the enricher, the migration source and the event bus.
/// `start()` primes the SOL price cache, backfills recent graduations in
/// fast mode (batches of 5, 500ms pause, 8s hard cap per token), then
/// switches to the live stream in full mode. History is a bounded FIFO of
/// 100 records with at most one entry per mint; insertion is serialized by
/// a single lock while bus emission fans out concurrently.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{timeout, Duration};

use crate::bus::{EventBus, MonitorEvent, SUBSCRIBER_BUFFER};
use crate::enrichment::{EnrichMode, Enricher};
use crate::helpers::now_ms;
use crate::logger::{log, LogTag};
use crate::migration::{MigrationSource, SourceEvent};
use crate::sol_price;
use crate::types::{MigrationEvent, MonitorStats, TokenRecord};

pub const MAX_HISTORY: usize = 100;
const BACKFILL_LIMIT: usize = 40;
const BACKFILL_BATCH: usize = 5;
const BACKFILL_BATCH_DELAY: Duration = Duration::from_millis(500);
const BACKFILL_TOKEN_TIMEOUT: Duration = Duration::from_secs(8);

pub struct TokenMonitor {
    enricher: Arc<Enricher>,
    source: Arc<MigrationSource>,
    bus: Arc<EventBus>,
    history: Mutex<VecDeque<Arc<TokenRecord>>>,
    stats: Mutex<MonitorStats>,
    running: AtomicBool,
    initial_load_complete: AtomicBool,
    upstream_connected: AtomicBool,
}

impl TokenMonitor {
    pub fn new(enricher: Arc<Enricher>, source: Arc<MigrationSource>) -> Arc<Self> {
        Arc::new(Self {
            enricher,
            source,
            bus: EventBus::new(SUBSCRIBER_BUFFER),
            history: Mutex::new(VecDeque::with_capacity(MAX_HISTORY)),
            stats: Mutex::new(MonitorStats::default()),
            running: AtomicBool::new(false),
            initial_load_complete: AtomicBool::new(false),
            upstream_connected: AtomicBool::new(false),
        })
    }

    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_initial_load_complete(&self) -> bool {
        self.initial_load_complete.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.upstream_connected.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats.lock().map(|stats| *stats).unwrap_or_default()
    }

    /// Most recent records, newest first, shallow copies.
    pub fn snapshot(&self, limit: usize) -> Vec<Arc<TokenRecord>> {
        self.history
            .lock()
            .map(|history| history.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, address: &str) -> Option<Arc<TokenRecord>> {
        self.history
            .lock()
            .ok()?
            .iter()
            .find(|record| record.address == address)
            .cloned()
    }

    /// Start backfill and live ingestion. Idempotent.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            log(LogTag::Monitor, "INFO", "Token monitor starting");

            // Prime the SOL price cache so backfill conversions hit memory
            let _ = sol_price::get_price_usd().await;

            monitor.backfill().await;
            monitor.run_live().await;
        });
    }

    /// Disconnect upstream and idle.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.source.stop();
        self.bus.publish(MonitorEvent::Stopped).await;
        log(LogTag::Monitor, "INFO", "Token monitor stopped");
    }

    /// One-shot backfill of recently graduated tokens, fast mode.
    async fn backfill(self: &Arc<Self>) {
        let tokens = self.enricher.graduated.list(BACKFILL_LIMIT).await;
        self.bus
            .publish(MonitorEvent::LoadingHistory { count: tokens.len() })
            .await;
        log(
            LogTag::Monitor,
            "INFO",
            &format!("Backfilling {} graduated tokens", tokens.len()),
        );

        let mut loaded = 0usize;

        for batch in tokens.chunks(BACKFILL_BATCH) {
            if !self.is_running() {
                break;
            }

            let events: Vec<MigrationEvent> = batch.iter().map(synthesize_event).collect();

            let futures = events.iter().map(|event| {
                let monitor = Arc::clone(self);
                async move {
                    match timeout(
                        BACKFILL_TOKEN_TIMEOUT,
                        monitor.enricher.enrich(event, EnrichMode::Fast),
                    )
                    .await
                    {
                        Ok(record) => {
                            monitor.ingest(record).await;
                            true
                        }
                        Err(_) => {
                            log(
                                LogTag::Monitor,
                                "WARN",
                                &format!("Backfill timeout for {}", event.mint),
                            );
                            false
                        }
                    }
                }
            });
            let results = futures::future::join_all(futures).await;
            loaded += results.into_iter().filter(|ok| *ok).count();

            tokio::time::sleep(BACKFILL_BATCH_DELAY).await;
        }

        self.initial_load_complete.store(true, Ordering::SeqCst);
        self.bus
            .publish(MonitorEvent::HistoryLoaded { count: loaded })
            .await;
        log(
            LogTag::Monitor,
            "SUCCESS",
            &format!("Backfill complete: {} tokens loaded", loaded),
        );
    }

    /// Live subscription loop. Each event enriches in its own task so a
    /// panic or stall in one enrichment never takes the loop down.
    async fn run_live(self: &Arc<Self>) {
        let mut events = self.source.subscribe();
        self.source.start();

        loop {
            if !self.is_running() {
                break;
            }

            match events.recv().await {
                Ok(SourceEvent::Migration(event)) => {
                    let monitor = Arc::clone(self);
                    tokio::spawn(async move {
                        let mint = event.mint.clone();
                        let worker = {
                            let monitor = Arc::clone(&monitor);
                            tokio::spawn(async move {
                                let record =
                                    monitor.enricher.enrich(&event, EnrichMode::Full).await;
                                monitor.ingest(record).await;
                            })
                        };
                        // A panicking enrichment is contained here; the
                        // live loop and other enrichments keep going
                        if let Err(e) = worker.await {
                            log(
                                LogTag::Monitor,
                                "ERROR",
                                &format!("Enrichment task failed for {}: {}", mint, e),
                            );
                            monitor
                                .bus
                                .publish(MonitorEvent::Error(format!(
                                    "enrichment failed for {}",
                                    mint
                                )))
                                .await;
                        }
                    });
                }
                Ok(SourceEvent::Connected) => {
                    self.upstream_connected.store(true, Ordering::SeqCst);
                    self.bus.publish(MonitorEvent::Connected).await;
                }
                Ok(SourceEvent::Disconnected) => {
                    self.upstream_connected.store(false, Ordering::SeqCst);
                    self.bus.publish(MonitorEvent::Disconnected).await;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    log(
                        LogTag::Monitor,
                        "WARN",
                        &format!("Live listener lagged, skipped {} events", skipped),
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Manual analysis path for the HTTP API: full enrichment, stored and
    /// emitted exactly like a live event.
    pub async fn analyze_once(&self, event: &MigrationEvent) -> Arc<TokenRecord> {
        let record = self.enricher.enrich(event, EnrichMode::Full).await;
        self.ingest(record).await
    }

    /// Store a record and announce it. Single writer over history/stats.
    async fn ingest(&self, record: TokenRecord) -> Arc<TokenRecord> {
        // A malformed score means an internal invariant was violated
        // upstream; drop the record rather than emit garbage
        if record.analysis.score < 0 || record.analysis.score > 100 {
            log(
                LogTag::Monitor,
                "ERROR",
                &format!(
                    "Dropping record with out-of-range score: mint={} score={}",
                    record.address, record.analysis.score
                ),
            );
            return Arc::new(record);
        }

        let passed = record.analysis.passed;
        let record = Arc::new(record);

        if let Ok(mut history) = self.history.lock() {
            // At most one entry per mint: re-processing replaces the old one
            history.retain(|existing| existing.address != record.address);
            history.push_front(Arc::clone(&record));
            while history.len() > MAX_HISTORY {
                history.pop_back();
            }
        }

        if let Ok(mut stats) = self.stats.lock() {
            stats.monitored += 1;
            if passed {
                stats.passed += 1;
            } else {
                stats.filtered += 1;
            }
        }

        log(
            LogTag::Score,
            if passed { "PASSED" } else { "FILTERED" },
            &format!(
                "{} score={} danger={} ({:?})",
                record.address,
                record.analysis.score,
                record.analysis.danger_score.overall,
                record.analysis.danger_score.category
            ),
        );

        self.bus
            .publish(MonitorEvent::TokenAnalyzed(Arc::clone(&record)))
            .await;
        if passed {
            self.bus
                .publish(MonitorEvent::TokenPassed(Arc::clone(&record)))
                .await;
        } else {
            self.bus
                .publish(MonitorEvent::TokenFiltered(Arc::clone(&record)))
                .await;
        }

        record
    }
}

/// Turn one graduated-index row into a synthetic migration event.
/// Backfill rows have no transaction signature.
fn synthesize_event(token: &crate::apis::graduated::GraduatedToken) -> MigrationEvent {
    MigrationEvent {
        mint: token.mint.clone(),
        signature: String::new(),
        name: token.name.clone(),
        symbol: token.symbol.clone(),
        uri: token.logo.clone(),
        pool: token.pair_address.clone().unwrap_or_default(),
        timestamp: token.graduated_at.unwrap_or_else(now_ms),
        market_cap: token.fully_diluted_valuation.filter(|fdv| *fdv > 0.0),
        liquidity: token.liquidity.filter(|liq| *liq > 0.0),
        creator: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::graduated::GraduatedToken;

    #[test]
    fn test_synthesize_event_market_cap_from_fdv() {
        let token = GraduatedToken {
            mint: "m".to_string(),
            name: "Example".to_string(),
            symbol: "EXM".to_string(),
            logo: Some("https://cdn.example/logo.png".to_string()),
            price_usd: Some(0.0001),
            liquidity: Some(20_000.0),
            fully_diluted_valuation: Some(100_000.0),
            graduated_at: Some(1_739_000_000_000),
            pair_address: Some("pair".to_string()),
        };
        let event = synthesize_event(&token);
        assert_eq!(event.market_cap, Some(100_000.0));
        assert_eq!(event.liquidity, Some(20_000.0));
        assert_eq!(event.timestamp, 1_739_000_000_000);
        assert!(event.signature.is_empty());
    }

    #[test]
    fn test_synthesize_event_without_fdv() {
        let token = GraduatedToken {
            mint: "m".to_string(),
            name: String::new(),
            symbol: String::new(),
            logo: None,
            price_usd: None,
            liquidity: None,
            fully_diluted_valuation: Some(0.0),
            graduated_at: None,
            pair_address: None,
        };
        let event = synthesize_event(&token);
        assert_eq!(event.market_cap, None);
        assert!(event.timestamp > 0);
    }

    fn test_monitor() -> Arc<TokenMonitor> {
        let provider = crate::config::ProviderConfig {
            moralis_keys: Vec::new(),
            helius_keys: Vec::new(),
            pumpportal_ws_url: "wss://example.invalid/ws".to_string(),
            port: 0,
        };
        let enricher = Arc::new(
            Enricher::new(&provider, crate::config::ScoringConfig::default()).unwrap(),
        );
        let source = MigrationSource::new(provider.pumpportal_ws_url.clone());
        TokenMonitor::new(enricher, source)
    }

    fn record_for(mint: &str, score: i32) -> TokenRecord {
        use crate::types::*;
        let analyzed_at = now_ms();
        TokenRecord {
            address: mint.to_string(),
            metadata: TokenMetadata::default(),
            price_data: PriceData::default(),
            statistics: TokenStatistics::default(),
            security: Some(SecurityInfo::default()),
            launch_analysis: None,
            wallet_funding: WalletFunding::default(),
            creator_history: None,
            trade_activity: TradeActivity::default(),
            analysis: AnalysisResult {
                passed: score >= 60,
                score,
                flags: Vec::new(),
                breakdown: std::collections::BTreeMap::new(),
                danger_score: DangerScore {
                    overall: 100 - score.clamp(0, 100),
                    confidence: DangerConfidence::High,
                    category: DangerCategory::Safe,
                    primary_risks: Vec::new(),
                    positive_signals: Vec::new(),
                },
                composite_risks: CompositeRisks::default(),
                positive_signals: Vec::new(),
            },
            migration_timestamp: analyzed_at,
            analyzed_at,
        }
    }

    #[tokio::test]
    async fn test_history_bounded_and_deduped() {
        let monitor = test_monitor();

        // Same mint twice: only the newer entry survives
        monitor.ingest(record_for("dup", 70)).await;
        monitor.ingest(record_for("dup", 40)).await;
        assert_eq!(monitor.snapshot(200).len(), 1);
        assert_eq!(monitor.get("dup").unwrap().analysis.score, 40);

        // Overflow evicts the oldest
        for i in 0..(MAX_HISTORY + 10) {
            monitor.ingest(record_for(&format!("mint{}", i), 70)).await;
        }
        assert_eq!(monitor.snapshot(200).len(), MAX_HISTORY);
    }

    #[tokio::test]
    async fn test_stats_track_passed_and_filtered() {
        let monitor = test_monitor();
        monitor.ingest(record_for("a", 80)).await;
        monitor.ingest(record_for("b", 20)).await;
        let stats = monitor.stats();
        assert_eq!(stats.monitored, 2);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.filtered, 1);
        assert_eq!(stats.monitored, stats.passed + stats.filtered);
    }

    #[tokio::test]
    async fn test_malformed_score_dropped() {
        let monitor = test_monitor();
        monitor.ingest(record_for("bad", 120)).await;
        assert!(monitor.get("bad").is_none());
        assert_eq!(monitor.stats().monitored, 0);
    }
}
