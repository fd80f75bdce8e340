use alloy::dyn_abi::DynSolValue;
use alloy::primitives::U256;
use anyhow::{bail, Context, Result};

/// Mirrors `enum BasketGame.Team`, encoded on the wire as `uint8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Team {
    Home = 0,
    Visitor = 1,
}

impl Team {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Team::Home),
            1 => Some(Team::Visitor),
            _ => None,
        }
    }

    /// Button prefix of the team on the scoreboard.
    pub fn label(self) -> &'static str {
        match self {
            Team::Home => "home",
            Team::Visitor => "visitor",
        }
    }

    /// The `uint8` argument the scoring methods expect.
    pub fn to_sol(self) -> DynSolValue {
        DynSolValue::Uint(U256::from(self.as_u8()), 8)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shot {
    FreeThrow,
    FieldGoal,
    ThreePointer,
}

impl Shot {
    pub const ALL: [Shot; 3] = [Shot::FreeThrow, Shot::FieldGoal, Shot::ThreePointer];

    pub fn points(self) -> u64 {
        match self {
            Shot::FreeThrow => 1,
            Shot::FieldGoal => 2,
            Shot::ThreePointer => 3,
        }
    }

    pub fn from_points(points: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.points() == points)
    }

    /// Contract method that records this shot.
    pub fn method(self) -> &'static str {
        match self {
            Shot::FreeThrow => "scoreFreeThrow",
            Shot::FieldGoal => "scoreFieldGoal",
            Shot::ThreePointer => "scoreThreePointer",
        }
    }
}

/// A game as the contract reports it through `getResult` and `isGameFinished`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRecord {
    pub game_id: U256,
    pub home_team: String,
    pub home_points: U256,
    pub visitor_team: String,
    pub visitor_points: U256,
    pub finished: bool,
}

impl GameRecord {
    /// Build a record from the `(string, uint256, string, uint256)` tuple of
    /// `getResult`. An empty home team means the contract holds no game under
    /// `game_id`, which yields `Ok(None)`.
    pub fn from_result(game_id: U256, result: &[DynSolValue], finished: bool) -> Result<Option<Self>> {
        if result.len() != 4 {
            bail!("getResult returned {} values, expected 4", result.len());
        }
        let home_team = result[0].as_str().context("getResult[0] is not a string")?;
        if home_team.is_empty() {
            return Ok(None);
        }
        let (home_points, _) = result[1].as_uint().context("getResult[1] is not a uint")?;
        let visitor_team = result[2].as_str().context("getResult[2] is not a string")?;
        let (visitor_points, _) = result[3].as_uint().context("getResult[3] is not a uint")?;

        Ok(Some(Self {
            game_id,
            home_team: home_team.to_string(),
            home_points,
            visitor_team: visitor_team.to_string(),
            visitor_points,
            finished,
        }))
    }

    pub fn points(&self, team: Team) -> U256 {
        match team {
            Team::Home => self.home_points,
            Team::Visitor => self.visitor_points,
        }
    }

    pub fn scoreline(&self) -> String {
        format!(
            "{} {} - {} {}",
            self.home_team, self.home_points, self.visitor_points, self.visitor_team
        )
    }
}
