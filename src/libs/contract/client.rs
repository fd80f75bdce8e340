use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::{Function, StateMutability};
use alloy::primitives::{Address, U256};
use tokio::sync::OnceCell;

use super::abi::{self, CallKind};
use super::{ContractError, ContractHandle, TransactionOutcome, WriteOptions};
use crate::libs::journal::save_log_to_file;
use crate::libs::rpc::{CallRequest, Transport, TransportError};
use crate::libs::writing::cc;
use crate::log;

/// Typed deploy/read/write against contracts described by a JSON ABI.
///
/// Accounts and the network id are looked up from the transport the first
/// time they are needed and kept for the life of the client. A failed lookup
/// is not kept, so the next call asks the node again.
pub struct ContractClient<T> {
    transport: T,
    accounts: OnceCell<Vec<Address>>,
    network_id: OnceCell<u64>,
}

impl<T: Transport> ContractClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            accounts: OnceCell::new(),
            network_id: OnceCell::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn accounts(&self) -> Result<&[Address], ContractError> {
        let accounts = self
            .accounts
            .get_or_try_init(|| async { self.transport.accounts().await })
            .await?;
        Ok(accounts.as_slice())
    }

    /// First account the node reports.
    pub async fn default_account(&self) -> Result<Address, ContractError> {
        self.accounts()
            .await?
            .first()
            .copied()
            .ok_or(ContractError::NoAccounts)
    }

    pub async fn network_id(&self) -> Result<u64, ContractError> {
        let id = self
            .network_id
            .get_or_try_init(|| async { self.transport.network_id().await })
            .await?;
        Ok(*id)
    }

    /// Create a new contract instance and attach `handle` to it.
    ///
    /// The handle must be unattached. Any failure leaves it unattached.
    pub async fn deploy(
        &self,
        handle: &ContractHandle,
        bytecode: &[u8],
        args: &[DynSolValue],
        from: Address,
        gas: u64,
    ) -> Result<Address, ContractError> {
        if let Some(existing) = handle.address() {
            return Err(ContractError::AlreadyAttached(existing));
        }
        let data = abi::encode_deploy(handle.interface(), bytecode, args)?;
        let request = CallRequest {
            from,
            to: None,
            data,
            gas: Some(gas),
            value: None,
        };

        let receipt = self.transport.send(&request).await.map_err(|e| {
            let reason = if e.is_revert() {
                e.revert_reason()
            } else {
                e.to_string()
            };
            ContractError::Deployment {
                reason,
                tx_hash: None,
            }
        })?;

        if !receipt.status {
            return Err(ContractError::Deployment {
                reason: "creation transaction reverted".to_string(),
                tx_hash: Some(receipt.transaction_hash),
            });
        }
        let Some(address) = receipt.contract_address else {
            return Err(ContractError::Deployment {
                reason: "receipt carries no contract address".to_string(),
                tx_hash: Some(receipt.transaction_hash),
            });
        };

        handle.attach(address)?;
        log!(
            cc::GREEN,
            "Contract mined! address: {address} transactionHash: {}",
            receipt.transaction_hash
        );
        save_log_to_file(&format!(
            "deployed {address} in {} (gas used {})",
            receipt.transaction_hash, receipt.gas_used
        ));
        Ok(address)
    }

    /// Query a `view`/`pure` method through `eth_call`. No transaction.
    pub async fn read(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[DynSolValue],
        from: Address,
    ) -> Result<Vec<DynSolValue>, ContractError> {
        let to = handle.require_address()?;
        let function = abi::resolve(handle.interface(), method, args.len(), CallKind::Query)?;
        self.call_function(to, function, args, from, None).await
    }

    /// Run a state-changing method through `eth_call` to see what it would
    /// return. Nothing is submitted.
    pub async fn simulate(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[DynSolValue],
        from: Address,
    ) -> Result<Vec<DynSolValue>, ContractError> {
        let to = handle.require_address()?;
        let function = abi::resolve(handle.interface(), method, args.len(), CallKind::Transaction)?;
        self.call_function(to, function, args, from, None).await
    }

    /// Submit one transaction calling `method` and wait for it to be mined.
    pub async fn write(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[DynSolValue],
        from: Address,
        options: WriteOptions,
    ) -> Result<TransactionOutcome, ContractError> {
        let to = handle.require_address()?;
        let function = abi::resolve(handle.interface(), method, args.len(), CallKind::Transaction)?;
        abi::check_args(method, &function.inputs, args)?;
        check_value(function, options.value)?;
        let data = abi::encode_call(function, args)?;
        let request = CallRequest {
            from,
            to: Some(to),
            data,
            gas: options.gas,
            value: options.value,
        };

        let receipt = self
            .transport
            .send(&request)
            .await
            .map_err(|e| send_error(method, e))?;
        if !receipt.status {
            save_log_to_file(&format!("{method} reverted in {}", receipt.transaction_hash));
            return Err(ContractError::TransactionReverted {
                method: method.to_string(),
                reason: "receipt status is 0".to_string(),
                tx_hash: Some(receipt.transaction_hash),
            });
        }

        let events = abi::decode_events(handle.interface(), to, &receipt.logs);
        save_log_to_file(&format!(
            "{method} mined in {} block {:?} gas used {} events {}",
            receipt.transaction_hash,
            receipt.block_number,
            receipt.gas_used,
            events.len()
        ));
        Ok(TransactionOutcome {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            predicted: None,
            events,
            logs: receipt.logs,
        })
    }

    /// Simulate `method` to learn its return values, then submit it with the
    /// same arguments. The outcome's `predicted` holds the simulated values.
    ///
    /// Nothing ties the two steps together. If another transaction touching
    /// the same state is mined in between, the prediction can be wrong.
    pub async fn create_then_confirm(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[DynSolValue],
        from: Address,
        options: WriteOptions,
    ) -> Result<TransactionOutcome, ContractError> {
        let to = handle.require_address()?;
        let function = abi::resolve(handle.interface(), method, args.len(), CallKind::Transaction)?;
        check_value(function, options.value)?;
        let predicted = self
            .call_function(to, function, args, from, options.value)
            .await?;

        let mut outcome = self.write(handle, method, args, from, options).await?;
        outcome.predicted = Some(predicted);
        Ok(outcome)
    }

    async fn call_function(
        &self,
        to: Address,
        function: &Function,
        args: &[DynSolValue],
        from: Address,
        value: Option<U256>,
    ) -> Result<Vec<DynSolValue>, ContractError> {
        abi::check_args(&function.name, &function.inputs, args)?;
        let data = abi::encode_call(function, args)?;
        let request = CallRequest {
            from,
            to: Some(to),
            data,
            gas: None,
            value,
        };
        let raw = self.transport.call(&request).await.map_err(|e| {
            if e.is_revert() {
                ContractError::CallReversion {
                    method: function.name.clone(),
                    reason: e.revert_reason(),
                }
            } else {
                ContractError::Transport(e)
            }
        })?;
        abi::decode_output(function, &raw)
    }
}

fn check_value(function: &Function, value: Option<U256>) -> Result<(), ContractError> {
    match value {
        Some(v) if !v.is_zero() && function.state_mutability != StateMutability::Payable => {
            Err(ContractError::InvalidArguments {
                method: function.name.clone(),
                reason: format!(
                    "{} method cannot receive value",
                    abi::mutability_name(function.state_mutability)
                ),
            })
        }
        _ => Ok(()),
    }
}

fn send_error(method: &str, err: TransportError) -> ContractError {
    if err.is_revert() {
        ContractError::TransactionReverted {
            method: method.to_string(),
            reason: err.revert_reason(),
            tx_hash: None,
        }
    } else {
        ContractError::TransactionFailed {
            method: method.to_string(),
            source: err,
        }
    }
}
