//! [`WalletTransport`] signs transactions locally with a private key and
//! submits them through an alloy provider. This is the transport behind a
//! `provider` entry of the networks file (a hosted endpoint such as Infura
//! that holds no accounts of its own).
use std::str::FromStr;

use alloy::consensus::TxReceipt;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::eth::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::{RpcError, TransportErrorKind};
use anyhow::{Context, Result};
use url::Url;

use super::{CallRequest, LogEntry, Receipt, Transport, TransportError};

#[derive(Clone, Debug)]
pub struct WalletTransport<P> {
    provider: P,
    /// Address of the local signer; the only account this transport offers.
    pub address: Address,
}

/// Build a signing provider for `endpoint` from a hex encoded private key.
pub fn connect_wallet(
    endpoint: Url,
    private_key: &str,
) -> Result<WalletTransport<impl Provider + Clone>> {
    let signer = PrivateKeySigner::from_str(private_key.trim())
        .context("private key is not a valid hex encoded secret")?;
    let address = signer.address();
    let provider = ProviderBuilder::new().wallet(signer).connect_http(endpoint);
    Ok(WalletTransport::new(provider, address))
}

impl<P: Provider> WalletTransport<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }
}

fn to_tx(request: &CallRequest) -> TransactionRequest {
    let tx = TransactionRequest::default().with_from(request.from);
    let mut tx = match request.to {
        Some(to) => tx.with_to(to).with_input(request.data.clone()),
        None => tx.with_deploy_code(request.data.clone()),
    };
    if let Some(gas) = request.gas {
        tx = tx.with_gas_limit(gas);
    }
    if let Some(value) = request.value {
        tx = tx.with_value(value);
    }
    tx
}

fn rpc_error(err: RpcError<TransportErrorKind>) -> TransportError {
    match err.as_error_resp() {
        Some(payload) => TransportError::Rpc {
            code: payload.code,
            message: payload.message.to_string(),
            data: payload
                .data
                .as_ref()
                .and_then(|raw| serde_json::from_str(raw.get()).ok()),
        },
        None => TransportError::Provider(err.to_string()),
    }
}

fn to_receipt(receipt: &TransactionReceipt) -> Receipt {
    Receipt {
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        contract_address: receipt.contract_address,
        gas_used: receipt.gas_used,
        status: receipt.inner.status(),
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| LogEntry {
                address: log.address(),
                topics: log.topics().to_vec(),
                data: log.data().data.clone(),
            })
            .collect(),
    }
}

impl<P: Provider> Transport for WalletTransport<P> {
    async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        Ok(vec![self.address])
    }

    async fn network_id(&self) -> Result<u64, TransportError> {
        self.provider.get_net_version().await.map_err(rpc_error)
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, TransportError> {
        self.provider.call(to_tx(request)).await.map_err(rpc_error)
    }

    async fn send(&self, request: &CallRequest) -> Result<Receipt, TransportError> {
        let pending = self
            .provider
            .send_transaction(to_tx(request))
            .await
            .map_err(rpc_error)?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| TransportError::Provider(e.to_string()))?;
        Ok(to_receipt(&receipt))
    }
}
