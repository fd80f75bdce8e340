use alloy::primitives::address;
use alloy::primitives::Address;

/// Where a fresh Ganache workspace puts the first BasketGame deployment.
pub const DEFAULT_ADDRESS: Address = address!("0x1CbcCEB59367a2f68d2AD912F836d569d2d22321");

/// Local development node (Ganache GUI default port).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:7545";

pub const DEFAULT_DEPLOY_GAS: u64 = 4_700_000;
