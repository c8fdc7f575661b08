use serde::Serialize;

use crate::command::Rejection;
use crate::config::{Cost, RulesConfig};
use crate::deposit::ResourceKind;
use crate::events::GameEvent;
use crate::grid::GridPos;
use crate::systems::{economy, territory};
use crate::tile::{Building, PlayerId};
use crate::unit::UnitId;
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityReport {
    pub at: GridPos,
    pub owner: PlayerId,
    pub consumed_unit: UnitId,
    pub captured: Vec<GridPos>,
    pub income: Cost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MineReport {
    pub at: GridPos,
    pub owner: PlayerId,
    pub kind: ResourceKind,
    pub income: Cost,
}

/// A city needs an idle friendly unit standing on unclaimed, unbuilt land.
pub fn can_build_city(
    world: &World,
    rules: &RulesConfig,
    player: PlayerId,
    at: GridPos,
) -> Result<UnitId, Rejection> {
    let tile = world.tile(at).ok_or(Rejection::UnknownTile { pos: at })?;
    let unit = tile
        .occupant()
        .and_then(|id| world.unit(id))
        .ok_or(Rejection::NoUnitPresent)?;
    if unit.is_busy() {
        return Err(Rejection::UnitBusy);
    }
    if unit.owner() != player {
        return Err(Rejection::NotOwnedByCaller);
    }
    if tile.is_claimed() {
        return Err(Rejection::TileAlreadyClaimed);
    }
    if tile.has_building() {
        return Err(Rejection::TileOccupiedByBuilding);
    }
    if tile.is_water() {
        return Err(Rejection::InvalidTerrain);
    }
    let cost = rules.city.cost;
    if !world.ledger().can_afford(player, cost) {
        return Err(Rejection::InsufficientFunds {
            gold: cost.gold,
            coal: cost.coal,
        });
    }
    Ok(unit.id())
}

/// Founds a city, consuming the unit on the tile. Payment is the last gate,
/// so a refusal never leaves a half-built city behind.
pub(crate) fn try_build_city(
    world: &mut World,
    rules: &RulesConfig,
    player: PlayerId,
    at: GridPos,
) -> Result<CityReport, Rejection> {
    let founder = can_build_city(world, rules, player, at)?;
    economy::spend(world, player, rules.city.cost)?;

    world.remove_unit(founder);
    if let Some(tile) = world.tile_mut(at) {
        tile.set_building(Building::City);
    }
    world.emit(GameEvent::CityFounded { owner: player, at });
    let captured = territory::capture_around(world, at, player, rules.city.capture_radius);
    let income = economy::recalculate_income(world, rules, player);

    tracing::info!(%player, %at, captured = captured.len(), "city founded");
    Ok(CityReport {
        at,
        owner: player,
        consumed_unit: founder,
        captured,
        income,
    })
}

/// A mine goes on an unbuilt deposit inside the player's own territory.
pub fn can_build_mine(
    world: &World,
    rules: &RulesConfig,
    player: PlayerId,
    at: GridPos,
) -> Result<(), Rejection> {
    let tile = world.tile(at).ok_or(Rejection::UnknownTile { pos: at })?;
    if tile.owner() != Some(player) {
        return Err(Rejection::NotOwnedByCaller);
    }
    if tile.has_building() {
        return Err(Rejection::TileOccupiedByBuilding);
    }
    let deposit = tile
        .deposit()
        .and_then(|id| world.deposit(id))
        .ok_or(Rejection::NoDeposit)?;
    if deposit.has_mine() {
        return Err(Rejection::MineAlreadyBuilt);
    }
    let cost = rules.mine.cost;
    if !world.ledger().can_afford(player, cost) {
        return Err(Rejection::InsufficientFunds {
            gold: cost.gold,
            coal: cost.coal,
        });
    }
    Ok(())
}

pub(crate) fn try_build_mine(
    world: &mut World,
    rules: &RulesConfig,
    player: PlayerId,
    at: GridPos,
) -> Result<MineReport, Rejection> {
    can_build_mine(world, rules, player, at)?;
    let deposit_id = world
        .tile(at)
        .and_then(|tile| tile.deposit())
        .ok_or(Rejection::NoDeposit)?;
    let kind = world
        .deposit(deposit_id)
        .map(|deposit| deposit.kind())
        .ok_or(Rejection::NoDeposit)?;
    economy::spend(world, player, rules.mine.cost)?;

    if let Some(deposit) = world.deposit_mut(deposit_id) {
        deposit.set_mine_built();
    }
    if let Some(tile) = world.tile_mut(at) {
        tile.set_building(Building::Mine);
    }
    world.emit(GameEvent::MineBuilt {
        owner: player,
        at,
        kind,
    });
    let income = economy::recalculate_income(world, rules, player);

    tracing::info!(%player, %at, %kind, "mine built");
    Ok(MineReport {
        at,
        owner: player,
        kind,
        income,
    })
}
