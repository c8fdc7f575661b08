use anyhow::Result;
use serde::Serialize;

use crate::command::Rejection;
use crate::config::RulesConfig;
use crate::events::GameEvent;
use crate::grid::GridPos;
use crate::turn::{RoundContext, RoundSystem};
use crate::unit::UnitId;
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    pub unit: UnitId,
    pub from: GridPos,
    pub to: GridPos,
    pub cost: u32,
    pub moves_left: u32,
}

fn passable(world: &World, rules: &RulesConfig, pos: GridPos) -> Option<bool> {
    world
        .tile(pos)
        .map(|tile| !(rules.movement.block_water && tile.is_water()))
}

/// Legal destinations: every tile within the remaining move budget that is
/// passable and empty. Busy units have none. Moves are priced by straight-line Chebyshev distance,
/// not by path.
pub fn reachable_tiles(world: &World, rules: &RulesConfig, unit: UnitId) -> Vec<GridPos> {
    let Some(unit) = world.unit(unit) else {
        return Vec::new();
    };
    if unit.is_busy() {
        return Vec::new();
    }
    unit.pos()
        .ring_area(unit.moves_left())
        .filter(|pos| {
            passable(world, rules, *pos).unwrap_or(false)
                && world.tile(*pos).is_some_and(|tile| !tile.has_unit())
        })
        .collect()
}

pub fn check_move(
    world: &World,
    rules: &RulesConfig,
    unit: UnitId,
    to: GridPos,
) -> Result<u32, Rejection> {
    let mover = world.unit(unit).ok_or(Rejection::UnknownUnit { unit })?;
    if mover.is_busy() {
        return Err(Rejection::UnitBusy);
    }
    if !mover.has_moves() {
        return Err(Rejection::NoMovePoints);
    }
    let target = world.tile(to).ok_or(Rejection::UnknownTile { pos: to })?;
    if !passable(world, rules, to).unwrap_or(false) {
        return Err(Rejection::InvalidTerrain);
    }
    if target.has_unit() {
        return Err(Rejection::TargetOccupied);
    }
    let cost = mover.pos().chebyshev(to);
    if cost == 0 || cost > mover.moves_left() {
        return Err(Rejection::OutOfRange);
    }
    Ok(cost)
}

/// Moves a unit in one step: the origin is vacated and the target taken
/// together, and the full distance is paid up front.
pub(crate) fn try_move(
    world: &mut World,
    rules: &RulesConfig,
    unit: UnitId,
    to: GridPos,
) -> Result<MoveReport, Rejection> {
    let cost = check_move(world, rules, unit, to)?;
    let from = world
        .unit(unit)
        .map(|mover| mover.pos())
        .ok_or(Rejection::UnknownUnit { unit })?;

    world.relocate_unit(unit, to);
    let moves_left = match world.unit_mut(unit) {
        Some(mover) => {
            mover.spend_moves(cost);
            mover.moves_left()
        }
        None => 0,
    };
    world.emit(GameEvent::UnitMoved {
        unit,
        from,
        to,
        moves_left,
    });

    tracing::debug!(unit = unit.0, %from, %to, cost, moves_left, "unit moved");
    Ok(MoveReport {
        unit,
        from,
        to,
        cost,
        moves_left,
    })
}

/// Refills move points for every active player's units at round end.
pub struct ReadinessSystem;

impl ReadinessSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReadinessSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundSystem for ReadinessSystem {
    fn name(&self) -> &str {
        "readiness"
    }

    fn run(&mut self, ctx: &RoundContext, world: &mut World) -> Result<()> {
        let ids: Vec<UnitId> = world
            .units()
            .filter(|unit| ctx.players.contains(&unit.owner()))
            .map(|unit| unit.id())
            .collect();
        for id in &ids {
            if let Some(unit) = world.unit_mut(*id) {
                unit.reset_moves();
            }
        }
        tracing::debug!(turn = ctx.turn, units = ids.len(), "move points restored");
        Ok(())
    }
}
