use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::GridPos;
use crate::systems::{AttackReport, CityReport, MineReport, MoveReport, RecruitReport};
use crate::tile::PlayerId;
use crate::turn::TurnReport;
use crate::unit::UnitId;

/// Why a rule check or command was refused. Refusals are ordinary
/// outcomes; the world is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("no friendly unit stands on this tile")]
    NoUnitPresent,
    #[error("not owned by the acting player")]
    NotOwnedByCaller,
    #[error("tile already belongs to a territory")]
    TileAlreadyClaimed,
    #[error("tile already has a building")]
    TileOccupiedByBuilding,
    #[error("terrain does not allow this action")]
    InvalidTerrain,
    #[error("not enough resources (costs {gold}G / {coal}C)")]
    InsufficientFunds { gold: u32, coal: u32 },
    #[error("no deposit here")]
    NoDeposit,
    #[error("mine already built")]
    MineAlreadyBuilt,
    #[error("tile has no city")]
    NoCity,
    #[error("target is out of range")]
    OutOfRange,
    #[error("target tile is occupied")]
    TargetOccupied,
    #[error("unit has no move points left")]
    NoMovePoints,
    #[error("a unit cannot attack itself")]
    SameUnit,
    #[error("friendly fire is disabled")]
    FriendlyFire,
    #[error("unit is not standing on a tile")]
    UnitHasNoTile,
    #[error("unit is busy")]
    UnitBusy,
    #[error("it is not this player's turn")]
    NotYourTurn,
    #[error("an action is still in progress")]
    ActionInProgress,
    #[error("no tile at {pos}")]
    UnknownTile { pos: GridPos },
    #[error("no unit with id {}", .unit.0)]
    UnknownUnit { unit: UnitId },
    #[error("unknown unit class '{class}'")]
    UnknownUnitClass { class: String },
    #[error("{player} is not an active player")]
    UnknownPlayer { player: PlayerId },
}

impl Rejection {
    /// Stable snake_case code, identical to the serialized `reason` tag.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::NoUnitPresent => "no_unit_present",
            Rejection::NotOwnedByCaller => "not_owned_by_caller",
            Rejection::TileAlreadyClaimed => "tile_already_claimed",
            Rejection::TileOccupiedByBuilding => "tile_occupied_by_building",
            Rejection::InvalidTerrain => "invalid_terrain",
            Rejection::InsufficientFunds { .. } => "insufficient_funds",
            Rejection::NoDeposit => "no_deposit",
            Rejection::MineAlreadyBuilt => "mine_already_built",
            Rejection::NoCity => "no_city",
            Rejection::OutOfRange => "out_of_range",
            Rejection::TargetOccupied => "target_occupied",
            Rejection::NoMovePoints => "no_move_points",
            Rejection::SameUnit => "same_unit",
            Rejection::FriendlyFire => "friendly_fire",
            Rejection::UnitHasNoTile => "unit_has_no_tile",
            Rejection::UnitBusy => "unit_busy",
            Rejection::NotYourTurn => "not_your_turn",
            Rejection::ActionInProgress => "action_in_progress",
            Rejection::UnknownTile { .. } => "unknown_tile",
            Rejection::UnknownUnit { .. } => "unknown_unit",
            Rejection::UnknownUnitClass { .. } => "unknown_unit_class",
            Rejection::UnknownPlayer { .. } => "unknown_player",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    BuildCity {
        at: GridPos,
    },
    BuildMine {
        at: GridPos,
    },
    Recruit {
        at: GridPos,
        #[serde(default)]
        class: Option<String>,
    },
    Move {
        unit: UnitId,
        to: GridPos,
    },
    Attack {
        attacker: UnitId,
        defender: UnitId,
    },
    EndTurn,
}

/// A command issued on behalf of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub player: PlayerId,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    CityFounded(CityReport),
    MineBuilt(MineReport),
    Recruited(RecruitReport),
    Moved(MoveReport),
    Attacked(AttackReport),
    TurnEnded(TurnReport),
    Rejected(Rejection),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, CommandOutcome::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            CommandOutcome::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
