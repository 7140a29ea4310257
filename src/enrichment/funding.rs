/// Wallet-funding analysis.
///
/// For up to 10 non-infrastructure top holders, walks their recent
/// transactions for incoming SOL above 0.01 and maps funding source to the
/// holders it fed. A single source feeding several holders, or a crowd of
/// wallets younger than a day, marks the distribution as manufactured.
use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use crate::apis::holders::TopHolder;
use crate::enrichment::onchain::OnChainProbe;
use crate::rpc::{ChainRpcClient, ChainTransaction};
use crate::types::WalletFunding;

const MAX_HOLDERS_PROBED: usize = 10;
const TX_LOOKBACK: usize = 20;
const BATCH_SIZE: usize = 5;
const MIN_FUNDING_LAMPORTS: u64 = 10_000_000; // 0.01 SOL
const FRESH_WINDOW_MS: i64 = 24 * 3_600_000;

/// Program-owned and exchange wallets that would poison the clustering.
const INFRASTRUCTURE_PREFIXES: &[&str] = &[
    "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1", // Raydium authority
    "GThUX1Atko4tqhN2NaiTazWSeFWMuiUvfFnyJyUghFMJ", // Raydium CPMM
    "39azUYFWPz3VHgKCf3VChUwbpURdCHRxjWVowf5jUJjg", // pump.fun AMM
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",  // token program
];

pub async fn analyze(
    rpc: &ChainRpcClient,
    top_holders: &[TopHolder],
    probe: &OnChainProbe,
    now_ms: i64,
) -> WalletFunding {
    // Prefer registry holders; fall back to the chain-resolved owners
    let mut wallets: Vec<String> = top_holders
        .iter()
        .filter(|holder| holder.label.is_none() && !is_infrastructure(&holder.owner))
        .map(|holder| holder.owner.clone())
        .collect();
    if wallets.is_empty() {
        wallets = probe
            .top5_owners
            .iter()
            .filter(|owner| !is_infrastructure(owner))
            .cloned()
            .collect();
    }
    wallets.truncate(MAX_HOLDERS_PROBED);

    if wallets.is_empty() {
        return WalletFunding::default();
    }

    // Fetch histories in batches to stay inside provider limits
    let mut histories: Vec<(String, Vec<ChainTransaction>)> = Vec::with_capacity(wallets.len());
    for batch in wallets.chunks(BATCH_SIZE) {
        let futures = batch
            .iter()
            .map(|wallet| rpc.get_transaction_history(wallet, TX_LOOKBACK, None));
        let results = join_all(futures).await;
        histories.extend(batch.iter().cloned().zip(results));
    }

    build_funding_profile(&histories, now_ms)
}

/// Pure aggregation over the fetched histories.
pub fn build_funding_profile(
    histories: &[(String, Vec<ChainTransaction>)],
    now_ms: i64,
) -> WalletFunding {
    let mut source_to_holders: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut fresh_wallet_buyers = 0u32;
    let mut probed = 0u32;

    for (holder, history) in histories {
        if history.is_empty() {
            continue;
        }
        probed += 1;

        for tx in history {
            for transfer in &tx.native_transfers {
                if transfer.to == *holder
                    && transfer.from != *holder
                    && transfer.lamports > MIN_FUNDING_LAMPORTS
                {
                    source_to_holders
                        .entry(transfer.from.as_str())
                        .or_default()
                        .insert(holder.as_str());
                }
            }
        }

        // A wallet whose entire visible history starts inside the last day
        // is "fresh"
        let first_seen_ms = history
            .iter()
            .filter(|tx| tx.timestamp > 0)
            .map(|tx| tx.timestamp * 1000)
            .min();
        if let Some(first_seen) = first_seen_ms {
            if history.len() < TX_LOOKBACK && first_seen > now_ms - FRESH_WINDOW_MS {
                fresh_wallet_buyers += 1;
            }
        }
    }

    let (common_funding_source, clustered_wallets) = source_to_holders
        .iter()
        .max_by_key(|(_, holders)| holders.len())
        .map(|(source, holders)| (Some(source.to_string()), holders.len() as u32))
        .unwrap_or((None, 0));

    let suspicious_funding_pattern = clustered_wallets >= 3
        || (fresh_wallet_buyers >= 3 && fresh_wallet_buyers as f64 >= 0.5 * probed as f64);

    WalletFunding {
        clustered_wallets,
        common_funding_source: if clustered_wallets >= 2 {
            common_funding_source
        } else {
            None
        },
        fresh_wallet_buyers,
        suspicious_funding_pattern,
    }
}

fn is_infrastructure(owner: &str) -> bool {
    INFRASTRUCTURE_PREFIXES
        .iter()
        .any(|prefix| owner.starts_with(prefix))
}
