use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forohtoo_types::{derive_associated_token_account, ConfirmationStatus, Network};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::OracleError;
use crate::oracle::{RpcOracle, SignatureInfo, TransactionEffect};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RawSignatureInfo {
    signature: String,
    slot: u64,
    #[serde(rename = "blockTime")]
    block_time: Option<i64>,
    #[serde(rename = "confirmationStatus")]
    confirmation_status: Option<String>,
}

/// A live client over a chain RPC endpoint's JSON-RPC surface. Holds a list
/// of candidate URLs per network and round-robins across them the way the
/// teacher's remote clients round-robin across replicas.
pub struct HttpRpcOracle {
    client: reqwest::Client,
    mainnet_urls: Vec<String>,
    devnet_urls: Vec<String>,
    mainnet_cursor: AtomicUsize,
    devnet_cursor: AtomicUsize,
}

impl HttpRpcOracle {
    pub fn new(mainnet_urls: Vec<String>, devnet_urls: Vec<String>, request_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(request_timeout)
                .build()
                .expect("reqwest client configuration is always valid"),
            mainnet_urls,
            devnet_urls,
            mainnet_cursor: AtomicUsize::new(0),
            devnet_cursor: AtomicUsize::new(0),
        }
    }

    fn endpoint(&self, network: Network) -> &str {
        let (urls, cursor) = match network {
            Network::Mainnet => (&self.mainnet_urls, &self.mainnet_cursor),
            Network::Devnet => (&self.devnet_urls, &self.devnet_cursor),
        };
        let idx = cursor.fetch_add(1, Ordering::Relaxed) % urls.len();
        &urls[idx]
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        network: Network,
        method: &str,
        params: Value,
    ) -> Result<T, OracleError> {
        let request = JsonRpcRequest { jsonrpc: "2.0", id: 1, method, params };
        let response = self.client.post(self.endpoint(network)).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(OracleError::BadStatus(response.status()));
        }
        let body: JsonRpcResponse<T> = response.json().await?;
        if let Some(error) = body.error {
            return Err(OracleError::JsonRpc { code: error.code, message: error.message });
        }
        body.result.ok_or(OracleError::MalformedResponse("result"))
    }
}

#[async_trait]
impl RpcOracle for HttpRpcOracle {
    async fn recent_signatures(
        &self,
        address: &str,
        network: Network,
        limit: u32,
        before: Option<String>,
    ) -> Result<Vec<SignatureInfo>, OracleError> {
        let mut opts = json!({ "limit": limit });
        if let Some(before) = before {
            opts["before"] = json!(before);
        }
        let raw: Vec<RawSignatureInfo> =
            self.call(network, "getSignaturesForAddress", json!([address, opts])).await?;
        raw.into_iter()
            .map(|r| {
                Ok(SignatureInfo {
                    signature: r.signature,
                    slot: r.slot,
                    block_time: block_time_from_unix(r.block_time)?,
                    confirmation_status: parse_confirmation_status(r.confirmation_status.as_deref()),
                })
            })
            .collect()
    }

    async fn get_transaction(
        &self,
        signature: &str,
        network: Network,
        wallet_address: &str,
    ) -> Result<Option<TransactionEffect>, OracleError> {
        let params = json!([
            signature,
            { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
        ]);
        let raw: Option<Value> = self.call(network, "getTransaction", params).await?;
        let Some(raw) = raw else { return Ok(None) };
        decode_transaction_effect(&raw, wallet_address).map(Some)
    }

    async fn derive_token_account(&self, owner: &str, mint: &str) -> Result<String, OracleError> {
        Ok(derive_associated_token_account(owner, mint))
    }
}

fn block_time_from_unix(block_time: Option<i64>) -> Result<DateTime<Utc>, OracleError> {
    let secs = block_time.ok_or(OracleError::MalformedResponse("blockTime"))?;
    DateTime::from_timestamp(secs, 0).ok_or(OracleError::MalformedResponse("blockTime"))
}

fn parse_confirmation_status(raw: Option<&str>) -> ConfirmationStatus {
    match raw {
        Some("finalized") => ConfirmationStatus::Finalized,
        Some("confirmed") => ConfirmationStatus::Confirmed,
        _ => ConfirmationStatus::Processed,
    }
}

/// Derives the effect of a confirmed transaction on `wallet_address` from
/// the `jsonParsed` transaction envelope: a native balance delta via
/// `meta.preBalances`/`postBalances` keyed by account position, or a token
/// balance delta via `meta.preTokenBalances`/`postTokenBalances` keyed by
/// owner. The full wire format carries far more than this; only the fields
/// the Poller's diffing step needs are extracted.
fn decode_transaction_effect(raw: &Value, wallet_address: &str) -> Result<TransactionEffect, OracleError> {
    let slot = raw.get("slot").and_then(Value::as_u64).ok_or(OracleError::MalformedResponse("slot"))?;
    let block_time = block_time_from_unix(raw.get("blockTime").and_then(Value::as_i64))?;
    let confirmation_status = ConfirmationStatus::Finalized;
    let meta = raw.get("meta").ok_or(OracleError::MalformedResponse("meta"))?;

    let account_keys: Vec<String> = raw
        .pointer("/transaction/message/accountKeys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .map(|k| {
                    k.get("pubkey")
                        .and_then(Value::as_str)
                        .or_else(|| k.as_str())
                        .unwrap_or_default()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default();

    let wallet_index = account_keys.iter().position(|k| k == wallet_address);

    let from_address = account_keys.first().filter(|k| k.as_str() != wallet_address).cloned();

    if let Some(idx) = wallet_index {
        let pre = meta.get("preBalances").and_then(Value::as_array).and_then(|a| a.get(idx));
        let post = meta.get("postBalances").and_then(Value::as_array).and_then(|a| a.get(idx));
        if let (Some(pre), Some(post)) = (pre.and_then(Value::as_i64), post.and_then(Value::as_i64)) {
            let amount = post - pre;
            if amount != 0 {
                return Ok(TransactionEffect {
                    from_address,
                    slot,
                    block_time,
                    amount,
                    token_mint: None,
                    memo: extract_memo(raw),
                    confirmation_status,
                });
            }
        }
    }

    let token_delta = token_balance_delta(meta, wallet_address);
    let (amount, token_mint) = token_delta.unwrap_or((0, None));

    Ok(TransactionEffect {
        from_address,
        slot,
        block_time,
        amount,
        token_mint,
        memo: extract_memo(raw),
        confirmation_status,
    })
}

fn token_balance_delta(meta: &Value, wallet_address: &str) -> Option<(i64, Option<String>)> {
    let pre = meta.get("preTokenBalances").and_then(Value::as_array);
    let post = meta.get("postTokenBalances").and_then(Value::as_array);
    let post_entry = post?.iter().find(|b| b.get("owner").and_then(Value::as_str) == Some(wallet_address))?;
    let mint = post_entry.get("mint").and_then(Value::as_str)?.to_string();
    let post_amount = post_entry
        .pointer("/uiTokenAmount/amount")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<i64>().ok())?;
    let pre_amount = pre
        .and_then(|entries| entries.iter().find(|b| b.get("mint").and_then(Value::as_str) == Some(mint.as_str())))
        .and_then(|b| b.pointer("/uiTokenAmount/amount").and_then(Value::as_str))
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);
    Some((post_amount - pre_amount, Some(mint)))
}

fn extract_memo(raw: &Value) -> Option<String> {
    raw.pointer("/transaction/message/instructions")
        .and_then(Value::as_array)?
        .iter()
        .find(|ix| ix.get("program").and_then(Value::as_str) == Some("spl-memo"))
        .and_then(|ix| ix.get("parsed").and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_native_balance_increase() {
        let raw = json!({
            "slot": 42,
            "blockTime": 1_700_000_000,
            "transaction": {
                "message": {
                    "accountKeys": ["sender", "wallet"],
                    "instructions": []
                }
            },
            "meta": {
                "preBalances": [1000, 500],
                "postBalances": [900, 600]
            }
        });
        let effect = decode_transaction_effect(&raw, "wallet").unwrap();
        assert_eq!(effect.amount, 100);
        assert_eq!(effect.token_mint, None);
        assert_eq!(effect.from_address, Some("sender".to_string()));
    }

    #[test]
    fn decodes_token_balance_increase() {
        let raw = json!({
            "slot": 42,
            "blockTime": 1_700_000_000,
            "transaction": { "message": { "accountKeys": ["sender", "wallet"], "instructions": [] } },
            "meta": {
                "preBalances": [1000, 500],
                "postBalances": [1000, 500],
                "preTokenBalances": [{"mint": "usdc-mint", "owner": "wallet", "uiTokenAmount": {"amount": "0"}}],
                "postTokenBalances": [{"mint": "usdc-mint", "owner": "wallet", "uiTokenAmount": {"amount": "1000000"}}]
            }
        });
        let effect = decode_transaction_effect(&raw, "wallet").unwrap();
        assert_eq!(effect.amount, 1_000_000);
        assert_eq!(effect.token_mint, Some("usdc-mint".to_string()));
    }

    #[test]
    fn zero_native_delta_falls_through_to_zero_amount() {
        let raw = json!({
            "slot": 1,
            "blockTime": 1_700_000_000,
            "transaction": { "message": { "accountKeys": ["wallet"], "instructions": [] } },
            "meta": { "preBalances": [500], "postBalances": [500] }
        });
        let effect = decode_transaction_effect(&raw, "wallet").unwrap();
        assert_eq!(effect.amount, 0);
    }
}
