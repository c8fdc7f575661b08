use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::deposit::{DepositId, ResourceDeposit, ResourceKind};
use crate::events::{EventQueue, GameEvent};
use crate::grid::{GridError, GridIndex, GridPos};
use crate::systems::Ledger;
use crate::tile::{Building, PlayerId, Terrain, TileId, TileState};
use crate::unit::{Unit, UnitId, UnitStats};

/// Errors raised while assembling a world. Gameplay never produces these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("no tile at {0}")]
    UnknownTile(GridPos),
    #[error("tile {0} already has a deposit")]
    DepositExists(GridPos),
    #[error("tile {0} already holds a unit")]
    TileOccupied(GridPos),
    #[error("tile {0} already has a building")]
    BuildingExists(GridPos),
    #[error("no deposit at {0} to put a mine on")]
    NoDeposit(GridPos),
}

/// All game state: tiles, deposits, units and wallets.
///
/// Tile ownership and occupancy only change through the crate-internal
/// setters below; wallets only through [`Ledger`].
#[derive(Debug, Default, Clone)]
pub struct World {
    tiles: Vec<TileState>,
    grid: GridIndex,
    deposits: Vec<ResourceDeposit>,
    units: BTreeMap<UnitId, Unit>,
    next_unit: u32,
    pub(crate) ledger: Ledger,
    pub(crate) events: EventQueue,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tile(&mut self, pos: GridPos, terrain: Terrain) -> Result<TileId, GridError> {
        let id = TileId(self.tiles.len() as u32);
        self.grid.register(pos, id)?;
        self.tiles.push(TileState::new(id, pos, terrain));
        Ok(id)
    }

    pub fn add_deposit(&mut self, pos: GridPos, kind: ResourceKind) -> Result<DepositId, SetupError> {
        let deposit_id = DepositId(self.deposits.len() as u32);
        let tile = self.tile_mut(pos).ok_or(SetupError::UnknownTile(pos))?;
        if tile.has_deposit() {
            return Err(SetupError::DepositExists(pos));
        }
        tile.attach_deposit(deposit_id);
        let tile_id = tile.id();
        self.deposits
            .push(ResourceDeposit::new(deposit_id, tile_id, pos, kind));
        Ok(deposit_id)
    }

    /// Places a prebuilt mine during setup.
    pub fn add_mine(&mut self, pos: GridPos) -> Result<(), SetupError> {
        let deposit = self
            .tile(pos)
            .ok_or(SetupError::UnknownTile(pos))?
            .deposit()
            .ok_or(SetupError::NoDeposit(pos))?;
        self.place_building(pos, Building::Mine)?;
        self.deposits[deposit.0 as usize].set_mine_built();
        Ok(())
    }

    pub fn place_building(&mut self, pos: GridPos, building: Building) -> Result<(), SetupError> {
        let tile = self.tile_mut(pos).ok_or(SetupError::UnknownTile(pos))?;
        if tile.has_building() {
            return Err(SetupError::BuildingExists(pos));
        }
        tile.set_building(building);
        Ok(())
    }

    /// Adds a unit at full health and moves.
    pub fn spawn_unit(
        &mut self,
        owner: PlayerId,
        class: &str,
        stats: Arc<UnitStats>,
        pos: GridPos,
    ) -> Result<UnitId, SetupError> {
        let id = UnitId(self.next_unit);
        let tile = self.tile_mut(pos).ok_or(SetupError::UnknownTile(pos))?;
        if tile.has_unit() {
            return Err(SetupError::TileOccupied(pos));
        }
        tile.set_occupant(id);
        self.next_unit += 1;
        self.units
            .insert(id, Unit::new(id, owner, class.to_string(), stats, pos));
        Ok(id)
    }

    pub fn tile(&self, pos: GridPos) -> Option<&TileState> {
        self.grid.lookup(pos).map(|id| &self.tiles[id.0 as usize])
    }

    pub fn tile_by_id(&self, id: TileId) -> Option<&TileState> {
        self.tiles.get(id.0 as usize)
    }

    pub(crate) fn tile_mut(&mut self, pos: GridPos) -> Option<&mut TileState> {
        let id = self.grid.lookup(pos)?;
        self.tiles.get_mut(id.0 as usize)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileState> {
        self.tiles.iter()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn deposit(&self, id: DepositId) -> Option<&ResourceDeposit> {
        self.deposits.get(id.0 as usize)
    }

    pub(crate) fn deposit_mut(&mut self, id: DepositId) -> Option<&mut ResourceDeposit> {
        self.deposits.get_mut(id.0 as usize)
    }

    pub fn deposit_at(&self, pos: GridPos) -> Option<&ResourceDeposit> {
        self.tile(pos)
            .and_then(|tile| tile.deposit())
            .and_then(|id| self.deposit(id))
    }

    pub fn deposits(&self) -> impl Iterator<Item = &ResourceDeposit> {
        self.deposits.iter()
    }

    pub fn has_any_deposits(&self) -> bool {
        !self.deposits.is_empty()
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |unit| unit.owner() == owner)
    }

    pub fn unit_at(&self, pos: GridPos) -> Option<&Unit> {
        self.tile(pos)
            .and_then(|tile| tile.occupant())
            .and_then(|id| self.unit(id))
    }

    /// The tile a unit stands on, if both sides agree on the occupancy.
    pub fn unit_tile(&self, id: UnitId) -> Option<&TileState> {
        let unit = self.unit(id)?;
        self.tile(unit.pos())
            .filter(|tile| tile.occupant() == Some(id))
    }

    pub fn any_unit_busy(&self) -> bool {
        self.units.values().any(|unit| unit.is_busy())
    }

    pub(crate) fn set_owner(&mut self, pos: GridPos, owner: PlayerId) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.set_owner(owner);
        }
    }

    /// Moves the occupancy of `id` to `to`. Callers validate first; a broken
    /// precondition here is a programming error.
    pub(crate) fn relocate_unit(&mut self, id: UnitId, to: GridPos) {
        let Some(from) = self.unit(id).map(|unit| unit.pos()) else {
            tracing::error!(unit = id.0, "relocating a unit that does not exist");
            debug_assert!(false, "relocating unknown unit {}", id.0);
            return;
        };
        let target_free = self.tile(to).is_some_and(|tile| !tile.has_unit());
        if !target_free {
            tracing::error!(unit = id.0, %to, "relocation target is missing or occupied");
            debug_assert!(false, "relocation target {to} is missing or occupied");
            return;
        }
        if let Some(origin) = self.tile_mut(from) {
            let cleared = origin.clear_occupant(id);
            debug_assert!(cleared, "unit {} was not registered on {from}", id.0);
        }
        if let Some(target) = self.tile_mut(to) {
            target.set_occupant(id);
        }
        if let Some(unit) = self.unit_mut(id) {
            unit.set_pos(to);
        }
    }

    /// Removes a unit from its tile and from the world.
    pub(crate) fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        match self.tile_mut(unit.pos()) {
            Some(tile) => {
                if !tile.clear_occupant(id) {
                    tracing::error!(unit = id.0, pos = %unit.pos(), "removed unit was not on its tile");
                    debug_assert!(false, "removed unit {} was not on its tile", id.0);
                }
            }
            None => {
                tracing::error!(unit = id.0, "removed unit had no tile");
                debug_assert!(false, "removed unit {} had no tile", id.0);
            }
        }
        Some(unit)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// `has_unit` agrees with the unit table for every tile.
    pub fn occupancy_consistent(&self) -> bool {
        let tiles_ok = self.tiles.iter().all(|tile| match tile.occupant() {
            Some(id) => self.unit(id).is_some_and(|unit| unit.pos() == tile.pos()),
            None => true,
        });
        let units_ok = self
            .units
            .values()
            .all(|unit| self.unit_tile(unit.id()).is_some());
        tiles_ok && units_ok
    }
}
