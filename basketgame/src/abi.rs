use alloy::json_abi::JsonAbi;
use alloy::primitives::B256;
use alloy::sol_types::SolEvent;
use anyhow::{Context, Result};

/// BasketGame interface as exported by Remix after compiling the contract.
pub const ABI_JSON: &str = include_str!("../abi/BasketGame.json");

pub const CREATE_GAME: &str = "createGame";
pub const FINISH_GAME: &str = "finishGame";
pub const GET_RESULT: &str = "getResult";
pub const IS_GAME_FINISHED: &str = "isGameFinished";

alloy::sol! {
    /// Emitted by `finishGame` with the final score of both teams.
    event FinalResult(uint256 game_id, string message, uint256 home, uint256 visitor);
}

pub fn interface() -> Result<JsonAbi> {
    serde_json::from_str(ABI_JSON).context("embedded BasketGame ABI is not a valid JSON ABI")
}

/// Decode a raw receipt log as `FinalResult`; `None` for any other log.
pub fn decode_final_result(topics: &[B256], data: &[u8]) -> Option<FinalResult> {
    if topics.first() != Some(&FinalResult::SIGNATURE_HASH) {
        return None;
    }
    FinalResult::decode_raw_log(topics.iter().copied(), data).ok()
}
