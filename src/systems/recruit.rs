use std::sync::Arc;

use serde::Serialize;

use crate::command::Rejection;
use crate::events::GameEvent;
use crate::grid::GridPos;
use crate::systems::economy;
use crate::tile::PlayerId;
use crate::unit::{UnitId, UnitRoster, UnitStats};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecruitReport {
    pub unit: UnitId,
    pub owner: PlayerId,
    pub class: String,
    pub at: GridPos,
}

/// Units are raised on an empty tile holding one of the player's cities.
pub fn can_recruit(
    world: &World,
    roster: &UnitRoster,
    player: PlayerId,
    at: GridPos,
    class: &str,
) -> Result<Arc<UnitStats>, Rejection> {
    let tile = world.tile(at).ok_or(Rejection::UnknownTile { pos: at })?;
    if !tile.has_city() {
        return Err(Rejection::NoCity);
    }
    if tile.owner() != Some(player) {
        return Err(Rejection::NotOwnedByCaller);
    }
    if tile.has_unit() {
        return Err(Rejection::TargetOccupied);
    }
    let stats = roster.get(class).ok_or_else(|| Rejection::UnknownUnitClass {
        class: class.to_string(),
    })?;
    let cost = stats.cost();
    if !world.ledger().can_afford(player, cost) {
        return Err(Rejection::InsufficientFunds {
            gold: cost.gold,
            coal: cost.coal,
        });
    }
    Ok(stats)
}

pub(crate) fn try_recruit(
    world: &mut World,
    roster: &UnitRoster,
    player: PlayerId,
    at: GridPos,
    class: &str,
) -> Result<RecruitReport, Rejection> {
    let stats = can_recruit(world, roster, player, at, class)?;
    economy::spend(world, player, stats.cost())?;

    let unit = match world.spawn_unit(player, class, stats, at) {
        Ok(unit) => unit,
        Err(err) => {
            tracing::error!(%at, %err, "recruitment passed validation but spawning failed");
            debug_assert!(false, "spawn failed after validation: {err}");
            return Err(Rejection::TargetOccupied);
        }
    };
    world.emit(GameEvent::UnitRecruited {
        unit,
        owner: player,
        at,
    });

    tracing::info!(%player, %at, class, unit = unit.0, "unit recruited");
    Ok(RecruitReport {
        unit,
        owner: player,
        class: class.to_string(),
        at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::tile::{Building, Terrain};

    fn city_world() -> (World, UnitRoster) {
        let mut world = World::new();
        for x in 0..3 {
            world.add_tile(GridPos::new(x, 0), Terrain::Grass).unwrap();
        }
        world
            .place_building(GridPos::new(0, 0), Building::City)
            .unwrap();
        world.set_owner(GridPos::new(0, 0), PlayerId(1));
        world.ledger.open(PlayerId(1), 20, 10);
        let roster = UnitRoster::from_classes(&RulesConfig::default().units);
        (world, roster)
    }

    #[test]
    fn test_recruit_spawns_fresh_unit() {
        let (mut world, roster) = city_world();

        let report = try_recruit(&mut world, &roster, PlayerId(1), GridPos::new(0, 0), "basic")
            .unwrap();

        let unit = world.unit(report.unit).unwrap();
        assert_eq!(unit.owner(), PlayerId(1));
        assert_eq!(unit.moves_left(), 3);
        assert_eq!(unit.hp(), 10);
        let wallet = world.ledger().wallet(PlayerId(1)).unwrap();
        assert_eq!((wallet.gold, wallet.coal), (5, 5));
        assert!(world.occupancy_consistent());
    }

    #[test]
    fn test_recruit_rejections() {
        let (mut world, roster) = city_world();
        let city = GridPos::new(0, 0);

        assert_eq!(
            can_recruit(&world, &roster, PlayerId(1), GridPos::new(1, 0), "basic").unwrap_err(),
            Rejection::NoCity
        );
        assert_eq!(
            can_recruit(&world, &roster, PlayerId(2), city, "basic").unwrap_err(),
            Rejection::NotOwnedByCaller
        );
        assert_eq!(
            can_recruit(&world, &roster, PlayerId(1), city, "knight").unwrap_err(),
            Rejection::UnknownUnitClass {
                class: "knight".into()
            }
        );

        try_recruit(&mut world, &roster, PlayerId(1), city, "basic").unwrap();
        assert_eq!(
            can_recruit(&world, &roster, PlayerId(1), city, "basic").unwrap_err(),
            Rejection::TargetOccupied
        );
    }

    #[test]
    fn test_recruit_requires_funds() {
        let (mut world, roster) = city_world();
        world.ledger.open(PlayerId(1), 14, 5);

        assert_eq!(
            try_recruit(&mut world, &roster, PlayerId(1), GridPos::new(0, 0), "basic"),
            Err(Rejection::InsufficientFunds { gold: 15, coal: 5 })
        );
        assert!(!world.tile(GridPos::new(0, 0)).unwrap().has_unit());
    }
}
