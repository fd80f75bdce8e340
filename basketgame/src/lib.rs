pub mod abi;
pub mod addresses;
pub mod game;

pub use abi::*;
pub use addresses::*;
pub use game::*;
