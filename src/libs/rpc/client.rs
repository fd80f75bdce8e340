//! [`RpcTransport`] talks JSON-RPC over HTTP with `reqwest` to a node that
//! holds unlocked accounts (Ganache, a dev geth). Transactions go out through
//! `eth_sendTransaction` and the node signs them; the transport then polls
//! `eth_getTransactionReceipt` until the transaction is mined.
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use super::{CallRequest, Receipt, Transport, TransportError};
use crate::libs::journal::save_log_to_file;

#[derive(Clone, Debug)]
pub struct RpcTransport {
    rpc_url: Url,
    http: HttpClient,
    poll_interval: Duration,
    max_polls: u32,
}

impl RpcTransport {
    pub fn new(rpc_url: &str, poll_interval: Duration, max_polls: u32) -> Result<Self> {
        let url = Url::parse(rpc_url).with_context(|| format!("Failed to parse RPC URL: {rpc_url}"))?;
        Ok(Self::with_url(url, poll_interval, max_polls))
    }

    pub fn with_url(rpc_url: Url, poll_interval: Duration, max_polls: u32) -> Self {
        Self {
            rpc_url,
            http: HttpClient::new(),
            poll_interval,
            max_polls: max_polls.max(1),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.rpc_url
    }

    /// `None` while the transaction is still pending.
    pub async fn receipt(&self, hash: B256) -> Result<Option<Receipt>, TransportError> {
        let res = self
            .rpc("eth_getTransactionReceipt", serde_json::json!([hash]))
            .await?;
        if res.is_null() {
            return Ok(None);
        }
        serde_json::from_value(res)
            .map(Some)
            .map_err(|e| TransportError::Decode(format!("receipt for {hash}: {e}")))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<Receipt, TransportError> {
        for _ in 0..self.max_polls {
            if let Some(receipt) = self.receipt(hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(TransportError::ReceiptTimeout {
            hash,
            polls: self.max_polls,
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let res = self
            .http
            .post(self.rpc_url.as_str())
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        let v: Value = match serde_json::from_slice(&bytes) {
            Ok(json) => json,
            Err(e) => {
                let sample = response_sample(&bytes);
                let hint = if sample.trim_start().starts_with('<') {
                    "Response looks like HTML; the endpoint is not a JSON-RPC node."
                } else if sample.trim().is_empty() {
                    "Empty body from RPC. Endpoint may be down or require authentication."
                } else {
                    "Non-JSON response from RPC."
                };
                return Err(TransportError::Decode(format!(
                    "{method} ({status}): {e}. {hint} Endpoint: {} Sample: {sample}",
                    self.rpc_url
                )));
            }
        };
        if let Some(err) = v.get("error") {
            save_log_to_file(&format!("{method} rpc error: {err}"));
            return Err(TransportError::Rpc {
                code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                data: err.get("data").cloned(),
            });
        }
        Ok(v.get("result").cloned().unwrap_or(Value::Null))
    }
}

/// First 512 characters of a response body, for error messages.
fn response_sample(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).chars().take(512).collect()
}

fn decode<T: serde::de::DeserializeOwned>(method: &str, value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(format!("{method}: {e}")))
}

/// `net_version` answers with a decimal string; some nodes answer in hex.
fn parse_network_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    }
}

impl Transport for RpcTransport {
    async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        let res = self.rpc("eth_accounts", serde_json::json!([])).await?;
        decode("eth_accounts", res)
    }

    async fn network_id(&self) -> Result<u64, TransportError> {
        let res = self.rpc("net_version", serde_json::json!([])).await?;
        parse_network_id(&res)
            .ok_or_else(|| TransportError::Decode(format!("net_version: unexpected {res}")))
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, TransportError> {
        let res = self
            .rpc("eth_call", serde_json::json!([request.to_json(), "latest"]))
            .await?;
        decode("eth_call", res)
    }

    async fn send(&self, request: &CallRequest) -> Result<Receipt, TransportError> {
        let res = self
            .rpc("eth_sendTransaction", serde_json::json!([request.to_json()]))
            .await?;
        let hash: B256 = decode("eth_sendTransaction", res)?;
        save_log_to_file(&format!("submitted {hash}, waiting for receipt"));
        self.wait_for_receipt(hash).await
    }
}
