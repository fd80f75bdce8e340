use alloy::primitives::{Address, B256};

use crate::libs::rpc::TransportError;

/// Every way a contract operation can fail. No variant is retried by the
/// client; the caller decides what to do with it.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("deployment failed: {reason}")]
    Deployment {
        reason: String,
        tx_hash: Option<B256>,
    },
    #[error("invalid method `{method}`: {reason}")]
    InvalidMethod { method: String, reason: String },
    #[error("invalid arguments for `{method}`: {reason}")]
    InvalidArguments { method: String, reason: String },
    #[error("call to `{method}` reverted: {reason}")]
    CallReversion { method: String, reason: String },
    #[error("transaction `{method}` reverted: {reason}")]
    TransactionReverted {
        method: String,
        reason: String,
        tx_hash: Option<B256>,
    },
    #[error("transaction `{method}` failed: {source}")]
    TransactionFailed {
        method: String,
        #[source]
        source: TransportError,
    },
    #[error("contract handle has no address; deploy or attach it first")]
    Unattached,
    #[error("contract handle is already attached to {0}")]
    AlreadyAttached(Address),
    #[error("node returned no accounts")]
    NoAccounts,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("abi error in `{method}`: {reason}")]
    Abi { method: String, reason: String },
}

impl ContractError {
    /// Preconditions fail before anything is sent to the node.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ContractError::Unattached
                | ContractError::AlreadyAttached(_)
                | ContractError::InvalidMethod { .. }
                | ContractError::InvalidArguments { .. }
        )
    }
}
