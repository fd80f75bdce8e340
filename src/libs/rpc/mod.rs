//! The node side of the contract client. [`Transport`] is the small surface
//! [`crate::libs::contract::ContractClient`] needs from an Ethereum node:
//! accounts, network id, `eth_call` and a mined transaction. Two
//! implementations live here: [`client::RpcTransport`] speaks plain JSON-RPC
//! to a node that owns the accounts (Ganache), [`wallet::WalletTransport`]
//! signs locally through an alloy provider.
pub mod client;
pub mod wallet;

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use serde::Deserialize;
use serde_json::Value;

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn accounts(&self) -> Result<Vec<Address>, TransportError>;

    async fn network_id(&self) -> Result<u64, TransportError>;

    /// Execute `request` against the latest block without submitting it.
    async fn call(&self, request: &CallRequest) -> Result<Bytes, TransportError>;

    /// Submit `request` as a transaction and wait until it is mined.
    async fn send(&self, request: &CallRequest) -> Result<Receipt, TransportError>;
}

/// A message call or contract creation (`to == None`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Option<Address>,
    pub data: Bytes,
    pub gas: Option<u64>,
    pub value: Option<U256>,
}

impl CallRequest {
    /// JSON-RPC transaction object for `eth_call` / `eth_sendTransaction`.
    pub fn to_json(&self) -> Value {
        let mut tx = serde_json::json!({
            "from": self.from,
            "data": self.data,
        });
        if let Some(to) = self.to {
            tx["to"] = serde_json::json!(to);
        }
        if let Some(gas) = self.gas {
            tx["gas"] = Value::String(format!("0x{gas:x}"));
        }
        if let Some(value) = self.value {
            tx["value"] = Value::String(format!("0x{value:x}"));
        }
        tx
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The parts of a transaction receipt the client reads.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawReceipt")]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    /// `false` when the transaction was mined but reverted.
    pub status: bool,
    pub logs: Vec<LogEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<U64>,
    #[serde(default)]
    contract_address: Option<Address>,
    #[serde(default)]
    gas_used: Option<U64>,
    // pre-byzantium receipts carry no status
    #[serde(default)]
    status: Option<U64>,
    #[serde(default)]
    logs: Vec<LogEntry>,
}

impl From<RawReceipt> for Receipt {
    fn from(raw: RawReceipt) -> Self {
        Self {
            transaction_hash: raw.transaction_hash,
            block_number: raw.block_number.map(|n| n.to::<u64>()),
            contract_address: raw.contract_address,
            gas_used: raw.gas_used.map(|g| g.to::<u64>()).unwrap_or_default(),
            status: raw.status.map_or(true, |s| !s.is_zero()),
            logs: raw.logs,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad rpc response: {0}")]
    Decode(String),
    #[error("transaction {hash} not mined after {polls} receipt polls")]
    ReceiptTimeout { hash: B256, polls: u32 },
    #[error("provider error: {0}")]
    Provider(String),
}

impl TransportError {
    /// Whether the node rejected the request because contract code reverted,
    /// as opposed to a transport, gas or signing failure.
    pub fn is_revert(&self) -> bool {
        match self {
            TransportError::Rpc { code, message, .. } => {
                *code == 3 || message.to_ascii_lowercase().contains("revert")
            }
            _ => false,
        }
    }

    /// Best effort human reason: the decoded `Error(string)` payload when the
    /// node returned one, otherwise the node's message.
    pub fn revert_reason(&self) -> String {
        if let TransportError::Rpc { message, data, .. } = self {
            if let Some(reason) = data
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|hex| hex.parse::<Bytes>().ok())
                .and_then(|raw| alloy::sol_types::decode_revert_reason(&raw))
            {
                return reason;
            }
            return message.clone();
        }
        self.to_string()
    }
}
