use std::sync::Arc;

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use once_cell::sync::OnceCell;

use super::ContractError;

/// An interface description bound to at most one on-chain address.
///
/// A handle starts unattached (`new`) and becomes attached exactly once,
/// either by a successful deploy or by construction with a known address
/// (`at`). There is no detach.
#[derive(Clone, Debug)]
pub struct ContractHandle {
    interface: Arc<JsonAbi>,
    address: OnceCell<Address>,
}

impl ContractHandle {
    pub fn new(interface: JsonAbi) -> Self {
        Self {
            interface: Arc::new(interface),
            address: OnceCell::new(),
        }
    }

    pub fn at(interface: JsonAbi, address: Address) -> Self {
        Self {
            interface: Arc::new(interface),
            address: OnceCell::with_value(address),
        }
    }

    pub fn interface(&self) -> &JsonAbi {
        &self.interface
    }

    pub fn address(&self) -> Option<Address> {
        self.address.get().copied()
    }

    pub fn is_attached(&self) -> bool {
        self.address.get().is_some()
    }

    pub(crate) fn require_address(&self) -> Result<Address, ContractError> {
        self.address().ok_or(ContractError::Unattached)
    }

    pub(crate) fn attach(&self, address: Address) -> Result<(), ContractError> {
        self.address
            .set(address)
            .map_err(|_| ContractError::AlreadyAttached(self.address().unwrap_or(address)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn attaches_exactly_once() {
        let handle = ContractHandle::new(JsonAbi::default());
        assert!(!handle.is_attached());
        assert!(matches!(handle.require_address(), Err(ContractError::Unattached)));

        let first = address!("0x00000000000000000000000000000000000000c1");
        let second = address!("0x00000000000000000000000000000000000000c2");
        handle.attach(first).unwrap();
        assert_eq!(handle.address(), Some(first));

        match handle.attach(second) {
            Err(ContractError::AlreadyAttached(existing)) => assert_eq!(existing, first),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(handle.address(), Some(first));
    }

    #[test]
    fn attach_only_mode() {
        let handle = ContractHandle::at(JsonAbi::default(), basketgame::DEFAULT_ADDRESS);
        assert!(handle.is_attached());
        assert_eq!(handle.require_address().unwrap(), basketgame::DEFAULT_ADDRESS);
    }
}
