//! An in-memory chain running BasketGame, for tests that need a node.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{JsonAbi, StateMutability};
use alloy::primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolEvent;
use basketgame::{FinalResult, Shot, Team};

use crate::libs::rpc::{CallRequest, LogEntry, Receipt, Transport, TransportError};

/// Stands in for compiled creation code; the mock never runs it.
pub const FAKE_BYTECODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

pub const NETWORK_ID: u64 = 5777;

#[derive(Clone, Default)]
struct Game {
    home: String,
    visitor: String,
    home_points: U256,
    visitor_points: U256,
    finished: bool,
}

#[derive(Clone, Default)]
struct State {
    // per contract, game id N lives at games[N - 1]
    contracts: HashMap<Address, Vec<Game>>,
    block: u64,
}

pub struct MockChain {
    interface: JsonAbi,
    accounts: Vec<Address>,
    state: Mutex<State>,
    nonce: AtomicU64,
    calls: AtomicUsize,
    sends: AtomicUsize,
    account_lookups: AtomicUsize,
    last_sent: Mutex<Option<CallRequest>>,
    view_revert: Mutex<Option<String>>,
    fail_accounts: AtomicBool,
    fail_deploy: AtomicBool,
    receipt_reverts: AtomicBool,
}

impl MockChain {
    pub fn new() -> Self {
        Self::with_accounts(vec![
            address!("0x627306090abaB3A6e1400e9345bC60c78a8BEf57"),
            address!("0xf17f52151EbEF6C7334FAD080c5704D77216b732"),
        ])
    }

    pub fn without_accounts() -> Self {
        Self::with_accounts(Vec::new())
    }

    fn with_accounts(accounts: Vec<Address>) -> Self {
        Self {
            interface: basketgame::interface().expect("embedded ABI"),
            accounts,
            state: Mutex::new(State::default()),
            nonce: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
            account_lookups: AtomicUsize::new(0),
            last_sent: Mutex::new(None),
            view_revert: Mutex::new(None),
            fail_accounts: AtomicBool::new(false),
            fail_deploy: AtomicBool::new(false),
            receipt_reverts: AtomicBool::new(false),
        }
    }

    /// Put a BasketGame at `address` as if it had been deployed earlier.
    pub fn install(&self, address: Address) -> Address {
        self.state.lock().unwrap().contracts.entry(address).or_default();
        address
    }

    pub fn fail_next_accounts(&self) {
        self.fail_accounts.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_deploy(&self) {
        self.fail_deploy.store(true, Ordering::SeqCst);
    }

    /// Mine reverting transactions with status 0 instead of rejecting them
    /// at submission, the way a node does when gas is set explicitly.
    pub fn revert_in_receipts(&self) {
        self.receipt_reverts.store(true, Ordering::SeqCst);
    }

    /// Make every view function revert with `reason` from now on.
    pub fn revert_views(&self, reason: &str) {
        *self.view_revert.lock().unwrap() = Some(reason.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    /// `eth_call`s plus transactions seen so far.
    pub fn dispatched(&self) -> usize {
        self.calls() + self.sends()
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::SeqCst)
    }

    pub fn last_gas(&self) -> Option<u64> {
        self.last_sent().and_then(|r| r.gas)
    }

    /// The most recent transaction or contract creation.
    pub fn last_sent(&self) -> Option<CallRequest> {
        self.last_sent.lock().unwrap().clone()
    }

    fn function(&self, data: &[u8]) -> Result<&alloy::json_abi::Function, String> {
        if data.len() < 4 {
            return Err("no function selector".into());
        }
        self.interface
            .functions()
            .find(|f| f.selector().as_slice() == &data[..4])
            .ok_or_else(|| "unknown function selector".into())
    }

    fn execute(&self, games: &mut Vec<Game>, to: Address, data: &[u8]) -> Result<(Bytes, Vec<LogEntry>), String> {
        let function = self.function(data)?;
        let args = function
            .abi_decode_input(&data[4..])
            .map_err(|e| e.to_string())?;

        let mut logs = Vec::new();
        let out = match function.name.as_str() {
            "createGame" => {
                games.push(Game {
                    home: text(&args[0]),
                    visitor: text(&args[1]),
                    ..Game::default()
                });
                vec![DynSolValue::Uint(U256::from(games.len()), 256)]
            }
            "getResult" => {
                let game = lookup(games, &args[0]).cloned().unwrap_or_default();
                vec![
                    DynSolValue::String(game.home),
                    DynSolValue::Uint(game.home_points, 256),
                    DynSolValue::String(game.visitor),
                    DynSolValue::Uint(game.visitor_points, 256),
                ]
            }
            "isGameFinished" => {
                let finished = lookup(games, &args[0]).is_some_and(|g| g.finished);
                vec![DynSolValue::Bool(finished)]
            }
            "finishGame" => {
                let game_id = uint(&args[0]);
                let game = open_game(games, &args[0])?;
                game.finished = true;
                let data = FinalResult {
                    game_id,
                    message: "Game finished".into(),
                    home: game.home_points,
                    visitor: game.visitor_points,
                }
                .encode_log_data();
                logs.push(LogEntry {
                    address: to,
                    topics: data.topics().to_vec(),
                    data: data.data.clone(),
                });
                vec![]
            }
            method => {
                let shot = Shot::ALL
                    .into_iter()
                    .find(|s| s.method() == method)
                    .ok_or("unknown function")?;
                let team = u8::try_from(uint(&args[1]))
                    .ok()
                    .and_then(Team::from_u8)
                    .ok_or("invalid team")?;
                let game = open_game(games, &args[0])?;
                let points = U256::from(shot.points());
                match team {
                    Team::Home => game.home_points += points,
                    Team::Visitor => game.visitor_points += points,
                }
                vec![]
            }
        };
        let encoded = function
            .abi_encode_output(&out)
            .map_err(|e| e.to_string())?;
        Ok((encoded.into(), logs))
    }

    fn next_hash(&self) -> B256 {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        keccak256(nonce.to_be_bytes())
    }
}

fn text(value: &DynSolValue) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn uint(value: &DynSolValue) -> U256 {
    value.as_uint().map(|(v, _)| v).unwrap_or_default()
}

fn lookup<'a>(games: &'a [Game], id: &DynSolValue) -> Option<&'a Game> {
    let id = usize::try_from(uint(id)).ok()?;
    games.get(id.checked_sub(1)?)
}

fn open_game<'a>(games: &'a mut [Game], id: &DynSolValue) -> Result<&'a mut Game, String> {
    let idx = usize::try_from(uint(id))
        .ok()
        .and_then(|i| i.checked_sub(1))
        .filter(|i| *i < games.len())
        .ok_or("game does not exist")?;
    let game = &mut games[idx];
    if game.finished {
        return Err("game already finished".into());
    }
    Ok(game)
}

fn revert(reason: &str) -> TransportError {
    TransportError::Rpc {
        code: -32000,
        message: format!("VM Exception while processing transaction: revert {reason}"),
        data: None,
    }
}

impl Transport for MockChain {
    async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_accounts.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Provider("connection refused".into()));
        }
        Ok(self.accounts.clone())
    }

    async fn network_id(&self) -> Result<u64, TransportError> {
        Ok(NETWORK_ID)
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(to) = request.to else {
            return Ok(Bytes::new());
        };
        let Some(mut scratch) = self.state.lock().unwrap().contracts.get(&to).cloned() else {
            return Ok(Bytes::new());
        };
        let view_revert = self.view_revert.lock().unwrap().clone();
        if let Some(reason) = view_revert {
            let is_view = self
                .function(&request.data)
                .is_ok_and(|f| f.state_mutability == StateMutability::View);
            if is_view {
                return Err(revert(&reason));
            }
        }
        self.execute(&mut scratch, to, &request.data)
            .map(|(out, _)| out)
            .map_err(|reason| revert(&reason))
    }

    async fn send(&self, request: &CallRequest) -> Result<Receipt, TransportError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        *self.last_sent.lock().unwrap() = Some(request.clone());
        let mut state = self.state.lock().unwrap();

        let Some(to) = request.to else {
            if self.fail_deploy.swap(false, Ordering::SeqCst) {
                return Err(TransportError::Rpc {
                    code: -32000,
                    message: "exceeds block gas limit".into(),
                    data: None,
                });
            }
            let nonce = self.nonce.load(Ordering::SeqCst);
            let created = request.from.create(nonce);
            state.contracts.insert(created, Vec::new());
            state.block += 1;
            return Ok(Receipt {
                transaction_hash: self.next_hash(),
                block_number: Some(state.block),
                contract_address: Some(created),
                gas_used: 1_200_000,
                status: true,
                logs: Vec::new(),
            });
        };

        let mut next = state.contracts.get(&to).cloned();
        let result = match next.as_mut() {
            Some(games) => self.execute(games, to, &request.data),
            None => Ok((Bytes::new(), Vec::new())),
        };
        let (status, logs) = match result {
            Ok((_, logs)) => {
                if let Some(games) = next {
                    state.contracts.insert(to, games);
                }
                (true, logs)
            }
            Err(reason) if !self.receipt_reverts.load(Ordering::SeqCst) => {
                return Err(revert(&reason));
            }
            Err(_) => (false, Vec::new()),
        };
        state.block += 1;
        Ok(Receipt {
            transaction_hash: self.next_hash(),
            block_number: Some(state.block),
            contract_address: None,
            gas_used: 45_000,
            status,
            logs,
        })
    }
}

/// Lets a test keep the chain while a consumer owns the client.
impl Transport for &MockChain {
    async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        <MockChain as Transport>::accounts(*self).await
    }

    async fn network_id(&self) -> Result<u64, TransportError> {
        <MockChain as Transport>::network_id(*self).await
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, TransportError> {
        <MockChain as Transport>::call(*self, request).await
    }

    async fn send(&self, request: &CallRequest) -> Result<Receipt, TransportError> {
        <MockChain as Transport>::send(*self, request).await
    }
}
