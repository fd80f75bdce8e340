use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{B256, U256};

use crate::libs::rpc::LogEntry;

/// Knobs for a single `write`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Upper gas bound; the node estimates when unset.
    pub gas: Option<u64>,
    /// Wei attached to the call. Only `payable` methods accept it.
    pub value: Option<U256>,
}

impl WriteOptions {
    pub fn gas(gas: u64) -> Self {
        Self {
            gas: Some(gas),
            value: None,
        }
    }
}

/// A contract event decoded from a receipt log.
#[derive(Clone, Debug, PartialEq)]
pub struct EmittedEvent {
    pub name: String,
    /// Parameters in declaration order, indexed ones included.
    pub fields: Vec<(String, DynSolValue)>,
}

impl EmittedEvent {
    pub fn get(&self, field: &str) -> Option<&DynSolValue> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }
}

/// What a mined `write` produced.
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Return values predicted by simulating the call right before it was
    /// submitted. Receipts do not carry return data, so a plain `write`
    /// leaves this empty. The prediction is best effort: another
    /// transaction landing in between can change the real result.
    pub predicted: Option<Vec<DynSolValue>>,
    /// Events from the target contract, in log order.
    pub events: Vec<EmittedEvent>,
    /// Every log of the receipt, undecoded.
    pub logs: Vec<LogEntry>,
}

impl TransactionOutcome {
    pub fn event(&self, name: &str) -> Option<&EmittedEvent> {
        self.events.iter().find(|e| e.name == name)
    }
}
