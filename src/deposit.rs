use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::tile::{Terrain, TileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepositId(pub(crate) u32);

impl DepositId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Gold,
    Coal,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Gold => write!(f, "gold"),
            ResourceKind::Coal => write!(f, "coal"),
        }
    }
}

/// Per-turn yield of a deposit, by terrain and mine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeTiers {
    pub plains: u32,
    pub plains_mine: u32,
    pub mountain: u32,
    pub mountain_mine: u32,
}

impl Default for IncomeTiers {
    fn default() -> Self {
        Self {
            plains: 5,
            plains_mine: 8,
            mountain: 7,
            mountain_mine: 10,
        }
    }
}

impl IncomeTiers {
    pub fn yield_for(&self, terrain: Terrain, has_mine: bool) -> u32 {
        let on_mountain = terrain == Terrain::Mountain;
        match (on_mountain, has_mine) {
            (false, false) => self.plains,
            (false, true) => self.plains_mine,
            (true, false) => self.mountain,
            (true, true) => self.mountain_mine,
        }
    }
}

/// A resource deposit. Placed once at world setup and never removed;
/// only the mine flag changes.
#[derive(Debug, Clone)]
pub struct ResourceDeposit {
    id: DepositId,
    tile: TileId,
    pos: GridPos,
    kind: ResourceKind,
    has_mine: bool,
}

impl ResourceDeposit {
    pub(crate) fn new(id: DepositId, tile: TileId, pos: GridPos, kind: ResourceKind) -> Self {
        Self {
            id,
            tile,
            pos,
            kind,
            has_mine: false,
        }
    }

    pub fn id(&self) -> DepositId {
        self.id
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn has_mine(&self) -> bool {
        self.has_mine
    }

    pub(crate) fn set_mine_built(&mut self) {
        self.has_mine = true;
    }
}
