//! The scoreboard flows: create a game, load it, score, finish. Each flow
//! reads its inputs from a [`Presenter`] and writes the contract's view of
//! the game back into it after every change.
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use anyhow::{anyhow, bail, Context, Result};
use basketgame::{GameRecord, Shot, Team, CREATE_GAME, FINISH_GAME, GET_RESULT, IS_GAME_FINISHED};

use crate::constants::PLACEHOLDER;
use crate::libs::contract::{ContractClient, ContractHandle, WriteOptions};
use crate::libs::journal::save_log_to_file;
use crate::libs::rpc::Transport;
use crate::libs::writing::cc;
use crate::log;

pub const HOME_FIELD: &str = "home";
pub const VISITOR_FIELD: &str = "visitor";
pub const GAME_ID_FIELD: &str = "game_id";

/// Output fields, in `getResult` order.
pub const RESULT_FIELDS: [&str; 4] = ["homeName", "homePoints", "visitorName", "visitorPoints"];

pub const FINISH_BUTTON: &str = "finish";

/// Every button that changes a game; all are disabled once it is finished.
pub const GAME_BUTTONS: [&str; 7] = [
    "home_1",
    "home_2",
    "home_3",
    "visitor_1",
    "visitor_2",
    "visitor_3",
    FINISH_BUTTON,
];

/// Where the board reads user input and shows results.
pub trait Presenter {
    fn field(&self, name: &str) -> Option<String>;
    fn set_field(&mut self, name: &str, value: &str);
    fn set_disabled(&mut self, button: &str, disabled: bool);
    fn alert(&mut self, message: &str);
    fn confirm(&mut self, message: &str) -> bool;
    fn set_status(&mut self, status: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Score(Shot, Team),
    Finish,
}

impl Action {
    /// `home_1` is a free throw for the home team, `visitor_3` a three
    /// pointer for the visitors, `finish` ends the game.
    pub fn from_button(id: &str) -> Option<Self> {
        if id == FINISH_BUTTON {
            return Some(Action::Finish);
        }
        let (side, points) = id.split_once('_')?;
        let team = [Team::Home, Team::Visitor]
            .into_iter()
            .find(|t| t.label() == side)?;
        let shot = Shot::from_points(points.parse().ok()?)?;
        Some(Action::Score(shot, team))
    }
}

pub struct GameBoard<T> {
    client: ContractClient<T>,
    handle: ContractHandle,
}

impl<T: Transport> GameBoard<T> {
    pub fn new(client: ContractClient<T>, handle: ContractHandle) -> Self {
        Self { client, handle }
    }

    pub fn client(&self) -> &ContractClient<T> {
        &self.client
    }

    pub fn handle(&self) -> &ContractHandle {
        &self.handle
    }

    pub async fn connect(&self, ui: &mut impl Presenter) -> Result<u64> {
        let id = self.client.network_id().await?;
        ui.set_status(&format!("connected to network {id}"));
        Ok(id)
    }

    async fn account(&self) -> Result<Address> {
        Ok(self.client.default_account().await?)
    }

    /// Create a game from the `home`/`visitor` fields. Does nothing unless
    /// both are filled in.
    pub async fn create_game(&self, ui: &mut impl Presenter) -> Result<Option<U256>> {
        let (Some(home), Some(visitor)) = (filled(&*ui, HOME_FIELD), filled(&*ui, VISITOR_FIELD)) else {
            return Ok(None);
        };
        let from = self.account().await?;
        let args = [DynSolValue::String(home), DynSolValue::String(visitor)];
        let outcome = self
            .client
            .create_then_confirm(&self.handle, CREATE_GAME, &args, from, WriteOptions::default())
            .await?;

        let id = outcome
            .predicted
            .as_deref()
            .and_then(|out| out.first())
            .and_then(DynSolValue::as_uint)
            .map(|(id, _)| id)
            .context("createGame predicted no game id")?;
        save_log_to_file(&format!("created game {id} in {}", outcome.tx_hash));
        ui.alert(&format!("New game created (id {id})"));
        Ok(Some(id))
    }

    /// Show the game named by the `game_id` field. Both reads go out
    /// together.
    pub async fn load_game(&self, ui: &mut impl Presenter) -> Result<Option<GameRecord>> {
        let Some(id) = game_id(&*ui)? else {
            return Ok(None);
        };
        let from = self.account().await?;
        let arg = [DynSolValue::Uint(id, 256)];
        let (result, finished) = tokio::join!(
            self.client.read(&self.handle, GET_RESULT, &arg, from),
            self.client.read(&self.handle, IS_GAME_FINISHED, &arg, from),
        );
        let finished = finished?
            .first()
            .and_then(DynSolValue::as_bool)
            .ok_or_else(|| anyhow!("isGameFinished returned no bool"))?;
        let record = GameRecord::from_result(id, &result?, finished)?;

        match &record {
            Some(game) => {
                let values = [
                    game.home_team.clone(),
                    game.home_points.to_string(),
                    game.visitor_team.clone(),
                    game.visitor_points.to_string(),
                ];
                for (name, value) in RESULT_FIELDS.iter().zip(values) {
                    ui.set_field(name, &value);
                }
            }
            None => {
                for name in RESULT_FIELDS {
                    ui.set_field(name, PLACEHOLDER);
                }
            }
        }
        for button in GAME_BUTTONS {
            ui.set_disabled(button, finished);
        }
        Ok(record)
    }

    pub async fn score(&self, shot: Shot, team: Team, ui: &mut impl Presenter) -> Result<Option<GameRecord>> {
        let Some(id) = game_id(&*ui)? else {
            return Ok(None);
        };
        let from = self.account().await?;
        let args = [DynSolValue::Uint(id, 256), team.to_sol()];
        self.client
            .write(&self.handle, shot.method(), &args, from, WriteOptions::default())
            .await?;
        self.load_game(ui).await
    }

    /// Finish the current game after the user confirms.
    pub async fn finish_game(&self, ui: &mut impl Presenter) -> Result<Option<GameRecord>> {
        let Some(id) = game_id(&*ui)? else {
            return Ok(None);
        };
        if !ui.confirm(&format!("Are you sure you want to finish game {id}")) {
            return Ok(None);
        }
        let from = self.account().await?;
        let outcome = self
            .client
            .write(&self.handle, FINISH_GAME, &[DynSolValue::Uint(id, 256)], from, WriteOptions::default())
            .await?;
        if let Some(result) = outcome
            .logs
            .iter()
            .find_map(|l| basketgame::decode_final_result(&l.topics, &l.data))
        {
            log!(
                cc::LIGHT_GREEN,
                "game {} final: {} - {}",
                result.game_id,
                result.home,
                result.visitor
            );
        }
        self.load_game(ui).await
    }

    pub async fn press(&self, button: &str, ui: &mut impl Presenter) -> Result<Option<GameRecord>> {
        match Action::from_button(button) {
            Some(Action::Score(shot, team)) => self.score(shot, team, ui).await,
            Some(Action::Finish) => self.finish_game(ui).await,
            None => bail!("unknown button `{button}`"),
        }
    }
}

fn filled(ui: &impl Presenter, name: &str) -> Option<String> {
    ui.field(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn game_id(ui: &impl Presenter) -> Result<Option<U256>> {
    filled(ui, GAME_ID_FIELD)
        .map(|raw| {
            raw.parse::<U256>()
                .with_context(|| format!("game id must be a number, got {raw:?}"))
        })
        .transpose()
}
