/// On-chain probes: concentration metrics from the largest token accounts,
/// mint/freeze authority state, and the contract-holder honeypot signal.
use futures::future::join_all;

use crate::apis::holders::TopHolder;
use crate::rpc::ChainRpcClient;
use crate::types::SecurityInfo;

/// Concentration snapshot derived from `getTokenSupply` +
/// `getTokenLargestAccounts` (2 RPC calls) plus at most 5 owner lookups.
#[derive(Debug, Clone, Default)]
pub struct OnChainProbe {
    pub supply_ui: f64,
    pub decimals: u8,
    pub supply_raw: String,
    /// Fractions of supply, 0 when the probe failed
    pub top10_share: f64,
    pub largest_share: f64,
    pub dev_share: f64,
    /// Owner wallets of the top 5 token accounts (when resolved)
    pub top5_owners: Vec<String>,
}

/// Single RPC fan-out per §concentration: supply + largest accounts, then
/// owners of the top 5 accounts only when a creator is known to compare
/// against. Holder count stays unknown (-1) - the chain cannot cheaply
/// provide it.
pub async fn probe(
    rpc: &ChainRpcClient,
    mint: &str,
    creator: Option<&str>,
) -> OnChainProbe {
    let (supply, largest) = tokio::join!(
        rpc.get_token_supply(mint),
        rpc.get_largest_token_accounts(mint),
    );

    let mut result = OnChainProbe::default();
    if let Some(supply) = supply {
        result.supply_ui = supply.ui_amount;
        result.decimals = supply.decimals;
        result.supply_raw = supply.amount_raw;
    }

    if largest.is_empty() || result.supply_ui <= 0.0 {
        return result;
    }

    let amounts: Vec<f64> = largest.iter().take(20).map(|a| a.ui_amount).collect();
    result.largest_share = (amounts.first().copied().unwrap_or(0.0) / result.supply_ui).min(1.0);
    result.top10_share =
        (amounts.iter().take(10).sum::<f64>() / result.supply_ui).min(1.0);

    // Owner resolution is capped at the top 5 accounts
    let owner_futures = largest
        .iter()
        .take(5)
        .map(|account| rpc.get_account_owner(&account.token_account));
    let owners = join_all(owner_futures).await;

    let mut dev_amount = 0.0;
    for (account, owner) in largest.iter().take(5).zip(owners.iter()) {
        if let Some(owner) = owner {
            if creator == Some(owner.as_str()) {
                dev_amount += account.ui_amount;
            }
            result.top5_owners.push(owner.clone());
        }
    }
    result.dev_share = (dev_amount / result.supply_ui).min(1.0);

    result
}

/// Mint authority probe. Pump.fun convention: a failed probe assumes both
/// authorities revoked (the bonding curve revokes them at graduation); a
/// successful probe that still sees an authority is the anomaly we flag.
pub async fn mint_security(rpc: &ChainRpcClient, mint: &str) -> Option<SecurityInfo> {
    let mut security = SecurityInfo::default();

    if let Some(info) = rpc.get_mint_info(mint).await {
        security.mint_authority_revoked = info.mint_authority.is_none();
        security.freeze_authority_revoked = info.freeze_authority.is_none();
        security.is_rugpull_risk =
            !security.mint_authority_revoked || !security.freeze_authority_revoked;
    }

    Some(security)
}

/// Honeypot signal: true when at least 2 of the top-5 holder wallets are
/// executable accounts. Prefers the registry's own contract labels when
/// present; falls back to chain lookups of the resolved owners.
pub async fn top_holders_are_contracts(
    rpc: &ChainRpcClient,
    probe: &OnChainProbe,
    top_holders: &[TopHolder],
) -> bool {
    let registry_contracts = top_holders
        .iter()
        .take(5)
        .filter(|holder| holder.is_contract)
        .count();
    if registry_contracts >= 2 {
        return true;
    }

    if probe.top5_owners.is_empty() {
        return false;
    }

    let flag_futures = probe
        .top5_owners
        .iter()
        .take(5)
        .map(|owner| rpc.get_account_info(owner));
    let flags = join_all(flag_futures).await;

    let executable = flags
        .iter()
        .filter(|flags| flags.as_ref().map_or(false, |f| f.executable))
        .count();
    executable >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_default_is_sentinel() {
        let probe = OnChainProbe::default();
        assert_eq!(probe.supply_ui, 0.0);
        assert_eq!(probe.top10_share, 0.0);
        assert_eq!(probe.dev_share, 0.0);
        assert!(probe.top5_owners.is_empty());
    }
}
