pub mod config;
pub mod contract;
pub mod journal;
pub mod networks;
pub mod rpc;
pub mod writing;
