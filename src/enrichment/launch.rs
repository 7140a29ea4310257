/// Launch-window analysis (full mode only).
///
/// Pulls up to 100 early transactions for the mint and derives sniper and
/// bundling signals: unique buyers inside 60s of the reference time
/// ("early buyers"), inside 300s ("snipers"), transactions sharing the
/// earliest slot ("bundled buys"), and the mean SOL spent by early buyers.
/// The same pass counts pre-first-trade TRANSFER recipients that later
/// sold, feeding the airdrop-scheme check.
use std::collections::{HashMap, HashSet};

use crate::rpc::{ChainRpcClient, ChainTransaction};
use crate::types::LaunchAnalysis;

const EARLY_WINDOW_SECS: i64 = 60;
const SNIPER_WINDOW_SECS: i64 = 300;
const REFERENCE_DRIFT_SECS: i64 = 600;
const HISTORY_LIMIT: usize = 100;

/// Everything the launch pass produces.
#[derive(Default)]
pub struct LaunchOutcome {
    /// Analysis plus the first buyer's wallet, when one was seen
    pub analysis: Option<(LaunchAnalysis, Option<String>)>,
    pub airdrop_transfers_sold: u32,
}

pub async fn analyze(
    rpc: &ChainRpcClient,
    mint: &str,
    migration_timestamp_ms: i64,
    creator: Option<&str>,
) -> LaunchOutcome {
    let history = rpc.get_transaction_history(mint, HISTORY_LIMIT, None).await;
    if history.is_empty() {
        return LaunchOutcome::default();
    }

    let mut transactions = history;
    transactions.sort_by_key(|tx| (tx.timestamp, tx.slot));

    let outcome_analysis = analyze_transactions(&transactions, migration_timestamp_ms, creator);
    let airdrop_transfers_sold = count_airdrop_sellers(&transactions, mint);

    LaunchOutcome {
        analysis: Some(outcome_analysis),
        airdrop_transfers_sold,
    }
}

/// Pure pass over the ordered transaction list.
fn analyze_transactions(
    transactions: &[ChainTransaction],
    migration_timestamp_ms: i64,
    creator: Option<&str>,
) -> (LaunchAnalysis, Option<String>) {
    let swaps: Vec<&ChainTransaction> = transactions
        .iter()
        .filter(|tx| tx.tx_type == "SWAP" && tx.timestamp > 0)
        .collect();

    if swaps.is_empty() {
        return (LaunchAnalysis::default(), None);
    }

    // Reference time: the first transaction when the migration timestamp
    // drifts more than 10 minutes from it (backfilled events do)
    let first_ts = swaps[0].timestamp;
    let migration_secs = migration_timestamp_ms / 1000;
    let reference = if (migration_secs - first_ts).abs() > REFERENCE_DRIFT_SECS {
        first_ts
    } else {
        migration_secs
    };

    let mut early_buyers: HashSet<&str> = HashSet::new();
    let mut snipers: HashSet<&str> = HashSet::new();
    let mut early_sol_spent: Vec<f64> = Vec::new();
    let mut creator_bought_back = false;
    let first_buyer = swaps.first().map(|tx| tx.fee_payer.clone());

    for tx in &swaps {
        let offset = tx.timestamp - reference;
        if offset < 0 {
            continue;
        }
        if offset <= SNIPER_WINDOW_SECS {
            snipers.insert(tx.fee_payer.as_str());
        }
        if offset <= EARLY_WINDOW_SECS {
            if early_buyers.insert(tx.fee_payer.as_str()) {
                early_sol_spent.push(sol_spent_by(tx, &tx.fee_payer));
            }
            if creator == Some(tx.fee_payer.as_str()) {
                creator_bought_back = true;
            }
        }
    }

    let earliest_slot = swaps.iter().map(|tx| tx.slot).min().unwrap_or(0);
    let bundled_buys = swaps.iter().filter(|tx| tx.slot == earliest_slot).count() as u32;

    let avg_first_buy_size = if early_sol_spent.is_empty() {
        0.0
    } else {
        early_sol_spent.iter().sum::<f64>() / early_sol_spent.len() as f64
    };

    let analysis = LaunchAnalysis {
        bundled_buys,
        sniper_count: snipers.len() as u32,
        first_buyer_holdings: 0.0, // resolved against the holder list in fuse
        avg_first_buy_size,
        creator_bought_back,
    };

    (analysis, first_buyer)
}

/// Largest outgoing lamport transfer from the fee payer, in SOL.
fn sol_spent_by(tx: &ChainTransaction, wallet: &str) -> f64 {
    tx.native_transfers
        .iter()
        .filter(|transfer| transfer.from == wallet)
        .map(|transfer| transfer.lamports)
        .max()
        .unwrap_or(0) as f64
        / 1e9
}

/// Recipients of TRANSFERs that landed before the first trade and later
/// show up selling the token.
fn count_airdrop_sellers(transactions: &[ChainTransaction], mint: &str) -> u32 {
    let first_trade_ts = transactions
        .iter()
        .filter(|tx| tx.tx_type == "SWAP" && tx.timestamp > 0)
        .map(|tx| tx.timestamp)
        .min();
    let first_trade_ts = match first_trade_ts {
        Some(ts) => ts,
        None => return 0,
    };

    let mut recipients: HashSet<&str> = HashSet::new();
    for tx in transactions {
        if tx.tx_type == "TRANSFER" && tx.timestamp > 0 && tx.timestamp < first_trade_ts {
            for transfer in &tx.token_transfers {
                if transfer.mint == mint && !transfer.to.is_empty() {
                    recipients.insert(transfer.to.as_str());
                }
            }
        }
    }
    if recipients.is_empty() {
        return 0;
    }

    // A recipient "sells" when a later SWAP moves the token out of their
    // wallet
    let mut sellers: HashMap<&str, bool> = HashMap::new();
    for tx in transactions {
        if tx.tx_type != "SWAP" || tx.timestamp < first_trade_ts {
            continue;
        }
        for transfer in &tx.token_transfers {
            if transfer.mint == mint && recipients.contains(transfer.from.as_str()) {
                sellers.insert(transfer.from.as_str(), true);
            }
        }
    }

    sellers.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{NativeTransfer, TokenTransfer};

    fn swap(slot: u64, ts: i64, payer: &str, spent_sol: f64) -> ChainTransaction {
        ChainTransaction {
            slot,
            timestamp: ts,
            fee_payer: payer.to_string(),
            native_transfers: vec![NativeTransfer {
                from: payer.to_string(),
                to: "pool".to_string(),
                lamports: (spent_sol * 1e9) as u64,
            }],
            token_transfers: Vec::new(),
            tx_type: "SWAP".to_string(),
        }
    }

    fn transfer(ts: i64, mint: &str, from: &str, to: &str) -> ChainTransaction {
        ChainTransaction {
            slot: 1,
            timestamp: ts,
            fee_payer: from.to_string(),
            native_transfers: Vec::new(),
            token_transfers: vec![TokenTransfer {
                from: from.to_string(),
                to: to.to_string(),
                mint: mint.to_string(),
                amount: 1000.0,
            }],
            tx_type: "TRANSFER".to_string(),
        }
    }

    #[test]
    fn test_bundled_and_snipers() {
        let base = 1_739_000_000i64;
        let txs = vec![
            swap(100, base, "alice", 1.0),
            swap(100, base, "bob", 3.0),
            swap(100, base + 5, "carol", 0.5),
            swap(101, base + 120, "dave", 0.2),
            swap(102, base + 400, "erin", 0.2),
        ];
        let (analysis, first_buyer) = analyze_transactions(&txs, base * 1000, None);
        assert_eq!(analysis.bundled_buys, 3); // three txs share slot 100
        assert_eq!(analysis.sniper_count, 4); // erin lands outside 300s
        assert_eq!(first_buyer.as_deref(), Some("alice"));
        // early buyers: alice, bob, carol -> mean of 1.0, 3.0, 0.5
        assert!((analysis.avg_first_buy_size - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_reference_shifts_to_first_tx() {
        let base = 1_739_000_000i64;
        let txs = vec![swap(100, base, "alice", 1.0), swap(101, base + 30, "bob", 1.0)];
        // Migration timestamp an hour later: reference falls back to first tx
        let (analysis, _) = analyze_transactions(&txs, (base + 3600) * 1000, None);
        assert_eq!(analysis.sniper_count, 2);
    }

    #[test]
    fn test_creator_buy_back() {
        let base = 1_739_000_000i64;
        let txs = vec![swap(100, base, "creator1", 2.0)];
        let (analysis, _) = analyze_transactions(&txs, base * 1000, Some("creator1"));
        assert!(analysis.creator_bought_back);
    }

    #[test]
    fn test_airdrop_sellers() {
        let base = 1_739_000_000i64;
        let mint = "mint1";
        let mut txs = vec![
            transfer(base - 100, mint, "dev", "r1"),
            transfer(base - 90, mint, "dev", "r2"),
            transfer(base - 80, mint, "dev", "r3"),
            swap(100, base, "alice", 1.0),
        ];
        // r1 and r2 dump after the first trade
        for seller in ["r1", "r2"] {
            txs.push(ChainTransaction {
                slot: 105,
                timestamp: base + 50,
                fee_payer: seller.to_string(),
                native_transfers: Vec::new(),
                token_transfers: vec![TokenTransfer {
                    from: seller.to_string(),
                    to: "pool".to_string(),
                    mint: mint.to_string(),
                    amount: 1000.0,
                }],
                tx_type: "SWAP".to_string(),
            });
        }
        txs.sort_by_key(|tx| (tx.timestamp, tx.slot));
        assert_eq!(count_airdrop_sellers(&txs, mint), 2);
    }
}
