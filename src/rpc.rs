/// Chain RPC client - the on-chain read surface.
///
/// Drives a Helius endpoint three ways: plain JSON-RPC (account info, token
/// supply, largest accounts), the enhanced transaction history API, and DAS
/// asset queries for creator history. Requests are hand-built JSON bodies
/// walked defensively; every operation fails soft to its sentinel.
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::apis::client::{ApiStats, HttpClient, KeyRing};
use crate::arguments::is_debug_rpc_enabled;
use crate::helpers::safe_truncate;
use crate::logger::{log, LogTag};

const RPC_TIMEOUT_SECS: u64 = 8;

/// Parsed mint account.
#[derive(Debug, Clone)]
pub struct MintInfo {
    pub decimals: u8,
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
}

/// Token supply snapshot.
#[derive(Debug, Clone)]
pub struct TokenSupply {
    pub amount_raw: String,
    pub ui_amount: f64,
    pub decimals: u8,
}

/// One of the largest token accounts for a mint.
#[derive(Debug, Clone)]
pub struct LargestAccount {
    pub token_account: String,
    pub ui_amount: f64,
}

/// Executable flag and owning program of an account.
#[derive(Debug, Clone)]
pub struct AccountFlags {
    pub executable: bool,
    pub owner: String,
}

/// Lamport transfer inside a transaction.
#[derive(Debug, Clone)]
pub struct NativeTransfer {
    pub from: String,
    pub to: String,
    pub lamports: u64,
}

/// SPL transfer inside a transaction.
#[derive(Debug, Clone)]
pub struct TokenTransfer {
    pub from: String,
    pub to: String,
    pub mint: String,
    pub amount: f64,
}

/// One enhanced-history transaction.
#[derive(Debug, Clone)]
pub struct ChainTransaction {
    pub slot: u64,
    /// Seconds since epoch
    pub timestamp: i64,
    pub fee_payer: String,
    pub native_transfers: Vec<NativeTransfer>,
    pub token_transfers: Vec<TokenTransfer>,
    pub tx_type: String,
}

/// One asset from the creator index.
#[derive(Debug, Clone)]
pub struct CreatorAsset {
    pub id: String,
    /// Milliseconds since epoch, when the index reports it
    pub created_at: Option<i64>,
    pub interface: String,
    pub name: String,
    pub supply: Option<f64>,
}

pub struct ChainRpcClient {
    http: HttpClient,
    ring: KeyRing,
    request_id: AtomicU64,
    stats: Arc<ApiStats>,
}

impl ChainRpcClient {
    pub fn new(keys: Vec<String>) -> Result<Self, String> {
        Ok(Self {
            http: HttpClient::new(RPC_TIMEOUT_SECS)?,
            ring: KeyRing::new(keys),
            request_id: AtomicU64::new(1),
            stats: Arc::new(ApiStats::new()),
        })
    }

    pub fn stats(&self) -> Arc<ApiStats> {
        self.stats.clone()
    }

    fn rpc_url(&self, key: &str) -> String {
        format!("https://mainnet.helius-rpc.com/?api-key={}", key)
    }

    /// POST a JSON-RPC request, rotating keys on 401/429. Returns the
    /// `result` member or `None` on any failure.
    async fn rpc_call(&self, method: &str, params: Value) -> Option<Value> {
        if self.ring.is_empty() {
            return None;
        }

        let body = json!({
            "jsonrpc": "2.0",
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        for key in self.ring.candidates() {
            let response = match self
                .http
                .client()
                .post(self.rpc_url(key))
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    log(
                        LogTag::Rpc,
                        "WARN",
                        &format!("RPC request failed: method={} error={}", method, e),
                    );
                    self.stats.record(false);
                    return None;
                }
            };

            let status = response.status();
            if status.as_u16() == 401 || status.as_u16() == 429 {
                self.ring.advance();
                continue;
            }
            if !status.is_success() {
                log(
                    LogTag::Rpc,
                    "WARN",
                    &format!("RPC error: method={} status={}", method, status),
                );
                self.stats.record(false);
                return None;
            }

            let payload: Value = match response.json().await {
                Ok(payload) => payload,
                Err(e) => {
                    log(
                        LogTag::Rpc,
                        "WARN",
                        &format!("RPC parse error: method={} error={}", method, e),
                    );
                    self.stats.record(false);
                    return None;
                }
            };

            if let Some(err) = payload.get("error") {
                if is_debug_rpc_enabled() {
                    log(
                        LogTag::Rpc,
                        "DEBUG",
                        &format!(
                            "RPC returned error: method={} error={}",
                            method,
                            safe_truncate(&err.to_string(), 120)
                        ),
                    );
                }
                self.stats.record(false);
                return None;
            }

            self.stats.record(true);
            return payload.get("result").cloned();
        }

        log(LogTag::Rpc, "WARN", &format!("RPC credentials exhausted: method={}", method));
        self.stats.record(false);
        None
    }

    /// Mint account decimals and authority state.
    pub async fn get_mint_info(&self, mint: &str) -> Option<MintInfo> {
        let result = self
            .rpc_call(
                "getAccountInfo",
                json!([mint, {"encoding": "jsonParsed"}]),
            )
            .await?;

        let info = result.pointer("/value/data/parsed/info")?;
        Some(MintInfo {
            decimals: info.get("decimals").and_then(|v| v.as_u64()).unwrap_or(0) as u8,
            mint_authority: info
                .get("mintAuthority")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            freeze_authority: info
                .get("freezeAuthority")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        })
    }

    /// Total supply for a mint.
    pub async fn get_token_supply(&self, mint: &str) -> Option<TokenSupply> {
        let result = self.rpc_call("getTokenSupply", json!([mint])).await?;
        let value = result.get("value")?;
        Some(TokenSupply {
            amount_raw: value
                .get("amount")
                .and_then(|v| v.as_str())
                .unwrap_or("0")
                .to_string(),
            ui_amount: value
                .get("uiAmount")
                .and_then(|v| v.as_f64())
                .or_else(|| {
                    value
                        .get("uiAmountString")
                        .and_then(|v| v.as_str())
                        .and_then(|s| s.parse().ok())
                })
                .unwrap_or(0.0),
            decimals: value.get("decimals").and_then(|v| v.as_u64()).unwrap_or(0) as u8,
        })
    }

    /// The largest token accounts, ordered by balance (RPC caps at 20).
    pub async fn get_largest_token_accounts(&self, mint: &str) -> Vec<LargestAccount> {
        let result = match self.rpc_call("getTokenLargestAccounts", json!([mint])).await {
            Some(result) => result,
            None => return Vec::new(),
        };

        result
            .get("value")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some(LargestAccount {
                            token_account: item.get("address")?.as_str()?.to_string(),
                            ui_amount: item.get("uiAmount").and_then(|v| v.as_f64()).unwrap_or(0.0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Wallet owning a token account.
    pub async fn get_account_owner(&self, token_account: &str) -> Option<String> {
        let result = self
            .rpc_call(
                "getAccountInfo",
                json!([token_account, {"encoding": "jsonParsed"}]),
            )
            .await?;

        result
            .pointer("/value/data/parsed/info/owner")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Executable flag and owning program for an arbitrary account.
    pub async fn get_account_info(&self, address: &str) -> Option<AccountFlags> {
        let result = self
            .rpc_call("getAccountInfo", json!([address, {"encoding": "base64"}]))
            .await?;

        let value = result.get("value")?;
        if value.is_null() {
            return None;
        }
        Some(AccountFlags {
            executable: value
                .get("executable")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            owner: value
                .get("owner")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
        })
    }

    /// Enhanced transaction history for an address, newest first.
    pub async fn get_transaction_history(
        &self,
        address: &str,
        limit: usize,
        type_filter: Option<&str>,
    ) -> Vec<ChainTransaction> {
        let key = match self.ring.current() {
            Some(key) => key.to_string(),
            None => return Vec::new(),
        };

        let mut url = format!(
            "https://api.helius.xyz/v0/addresses/{}/transactions?api-key={}&limit={}",
            address, key, limit
        );
        if let Some(filter) = type_filter {
            url.push_str(&format!("&type={}", filter));
        }

        let response = match self.http.client().get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                log(
                    LogTag::Rpc,
                    "WARN",
                    &format!("Transaction history request failed: {}", e),
                );
                self.stats.record(false);
                return Vec::new();
            }
        };

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 429 {
            self.ring.advance();
            self.stats.record(false);
            return Vec::new();
        }
        if !status.is_success() {
            self.stats.record(false);
            return Vec::new();
        }

        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(_) => {
                self.stats.record(false);
                return Vec::new();
            }
        };

        self.stats.record(true);
        payload
            .as_array()
            .map(|items| items.iter().filter_map(parse_transaction).collect())
            .unwrap_or_default()
    }

    /// Fungible-capable asset listing for a creator wallet (DAS).
    pub async fn get_assets_by_creator(&self, creator: &str, limit: usize) -> Vec<CreatorAsset> {
        let result = match self
            .rpc_call(
                "getAssetsByCreator",
                json!({
                    "creatorAddress": creator,
                    "onlyVerified": false,
                    "page": 1,
                    "limit": limit,
                }),
            )
            .await
        {
            Some(result) => result,
            None => return Vec::new(),
        };

        result
            .get("items")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(parse_creator_asset).collect())
            .unwrap_or_default()
    }

    /// Recover a token's creator from its asset record (DAS).
    pub async fn get_asset_creator(&self, mint: &str) -> Option<String> {
        let result = self.rpc_call("getAsset", json!({"id": mint})).await?;

        // Prefer the verified creator entry, fall back to the update authority
        if let Some(creators) = result.get("creators").and_then(|v| v.as_array()) {
            if let Some(entry) = creators
                .iter()
                .find(|c| c.get("verified").and_then(|v| v.as_bool()).unwrap_or(false))
                .or_else(|| creators.first())
            {
                if let Some(address) = entry.get("address").and_then(|v| v.as_str()) {
                    return Some(address.to_string());
                }
            }
        }

        result
            .get("authorities")
            .and_then(|v| v.as_array())
            .and_then(|auths| auths.first())
            .and_then(|auth| auth.get("address"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

fn parse_transaction(item: &Value) -> Option<ChainTransaction> {
    Some(ChainTransaction {
        slot: item.get("slot").and_then(|v| v.as_u64())?,
        timestamp: item.get("timestamp").and_then(|v| v.as_i64()).unwrap_or(0),
        fee_payer: item
            .get("feePayer")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        native_transfers: item
            .get("nativeTransfers")
            .and_then(|v| v.as_array())
            .map(|transfers| {
                transfers
                    .iter()
                    .filter_map(|t| {
                        Some(NativeTransfer {
                            from: t.get("fromUserAccount")?.as_str()?.to_string(),
                            to: t.get("toUserAccount")?.as_str()?.to_string(),
                            lamports: t.get("amount").and_then(|v| v.as_u64()).unwrap_or(0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        token_transfers: item
            .get("tokenTransfers")
            .and_then(|v| v.as_array())
            .map(|transfers| {
                transfers
                    .iter()
                    .filter_map(|t| {
                        Some(TokenTransfer {
                            from: t
                                .get("fromUserAccount")
                                .and_then(|v| v.as_str())
                                .unwrap_or("")
                                .to_string(),
                            to: t
                                .get("toUserAccount")
                                .and_then(|v| v.as_str())
                                .unwrap_or("")
                                .to_string(),
                            mint: t.get("mint")?.as_str()?.to_string(),
                            amount: t.get("tokenAmount").and_then(|v| v.as_f64()).unwrap_or(0.0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        tx_type: item
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN")
            .to_string(),
    })
}

fn parse_creator_asset(item: &Value) -> Option<CreatorAsset> {
    Some(CreatorAsset {
        id: item.get("id")?.as_str()?.to_string(),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.timestamp_millis()),
        interface: item
            .get("interface")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        name: item
            .pointer("/content/metadata/name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        supply: item
            .pointer("/token_info/supply")
            .and_then(|v| v.as_f64())
            .or_else(|| item.get("supply").and_then(|v| v.as_f64())),
    })
}
