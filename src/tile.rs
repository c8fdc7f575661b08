use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deposit::DepositId;
use crate::grid::GridPos;
use crate::unit::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub(crate) u32);

impl TileId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Player identifier. Unclaimed tiles carry `None` instead of a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Grass,
    Water,
    Forest,
    Mountain,
}

impl Terrain {
    /// Map legend character used by scenario files.
    pub fn from_symbol(symbol: char) -> Option<Terrain> {
        match symbol.to_ascii_uppercase() {
            'G' | '.' => Some(Terrain::Grass),
            'W' | '~' => Some(Terrain::Water),
            'F' => Some(Terrain::Forest),
            'M' => Some(Terrain::Mountain),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Terrain::Grass => 'G',
            Terrain::Water => 'W',
            Terrain::Forest => 'F',
            Terrain::Mountain => 'M',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Building {
    City,
    Mine,
}

/// Per-cell state. Fields are private; mutation goes through the
/// crate-internal setters used by the rule systems.
#[derive(Debug, Clone)]
pub struct TileState {
    id: TileId,
    pos: GridPos,
    terrain: Terrain,
    owner: Option<PlayerId>,
    occupant: Option<UnitId>,
    building: Option<Building>,
    deposit: Option<DepositId>,
}

impl TileState {
    pub(crate) fn new(id: TileId, pos: GridPos, terrain: Terrain) -> Self {
        Self {
            id,
            pos,
            terrain,
            owner: None,
            occupant: None,
            building: None,
            deposit: None,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn is_water(&self) -> bool {
        self.terrain == Terrain::Water
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    pub fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    pub fn has_unit(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn building(&self) -> Option<Building> {
        self.building
    }

    pub fn has_building(&self) -> bool {
        self.building.is_some()
    }

    pub fn has_city(&self) -> bool {
        self.building == Some(Building::City)
    }

    pub fn deposit(&self) -> Option<DepositId> {
        self.deposit
    }

    pub fn has_deposit(&self) -> bool {
        self.deposit.is_some()
    }

    /// Scenery is hidden under units and buildings.
    pub fn decorations_hidden(&self) -> bool {
        self.has_unit() || self.has_building()
    }

    pub(crate) fn set_owner(&mut self, owner: PlayerId) {
        self.owner = Some(owner);
    }

    pub(crate) fn set_building(&mut self, building: Building) {
        self.building = Some(building);
    }

    pub(crate) fn attach_deposit(&mut self, deposit: DepositId) {
        debug_assert!(self.deposit.is_none(), "tile {} already has a deposit", self.pos);
        self.deposit = Some(deposit);
    }

    pub(crate) fn set_occupant(&mut self, unit: UnitId) {
        self.occupant = Some(unit);
    }

    /// Clears the occupant only if it is `unit`.
    pub(crate) fn clear_occupant(&mut self, unit: UnitId) -> bool {
        if self.occupant == Some(unit) {
            self.occupant = None;
            true
        } else {
            false
        }
    }
}
