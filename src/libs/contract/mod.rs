//! Typed contract interaction: deploy a contract, query its `view` methods
//! and submit transactions, all checked against its JSON ABI.
pub mod abi;
pub mod artifact;
pub mod client;
pub mod error;
pub mod handle;
pub mod outcome;

#[cfg(test)]
pub(crate) mod testing;

pub use abi::CallKind;
pub use artifact::Artifact;
pub use client::ContractClient;
pub use error::ContractError;
pub use handle::ContractHandle;
pub use outcome::{EmittedEvent, TransactionOutcome, WriteOptions};
