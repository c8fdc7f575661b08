use serde::Serialize;

use crate::command::Rejection;
use crate::config::{CombatRules, RulesConfig};
use crate::events::GameEvent;
use crate::unit::{Unit, UnitId};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackReport {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub damage_dealt: u32,
    pub counter_damage: u32,
    pub attacker_hp: u32,
    pub defender_hp: u32,
    pub countered: bool,
    pub attacker_died: bool,
    pub defender_died: bool,
}

/// Expected result of an attack, computed without touching the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackPreview {
    pub damage: u32,
    pub counter_damage: u32,
    pub defender_dies: bool,
    pub attacker_dies: bool,
}

fn defense_on_tile(world: &World, combat: &CombatRules, unit: &Unit) -> u32 {
    let bonus = world
        .unit_tile(unit.id())
        .map(|tile| combat.terrain_defense_bonus(tile.terrain()))
        .unwrap_or(0);
    unit.defense() + bonus
}

fn counter_damage(world: &World, combat: &CombatRules, attacker: &Unit, defender: &Unit) -> u32 {
    if !combat.counter_attacks {
        return 0;
    }
    let raw = defender
        .attack()
        .saturating_sub(defense_on_tile(world, combat, attacker));
    // Halves round to the even neighbour: 0.5 -> 0, 1.5 -> 2.
    let scaled = (raw as f64 * combat.counter_multiplier).round_ties_even();
    scaled.max(0.0) as u32
}

pub fn attack_check(
    world: &World,
    rules: &RulesConfig,
    attacker: UnitId,
    defender: UnitId,
) -> Result<(), Rejection> {
    let striker = world
        .unit(attacker)
        .ok_or(Rejection::UnknownUnit { unit: attacker })?;
    let target = world
        .unit(defender)
        .ok_or(Rejection::UnknownUnit { unit: defender })?;
    if attacker == defender {
        return Err(Rejection::SameUnit);
    }
    if striker.is_busy() || target.is_busy() {
        return Err(Rejection::UnitBusy);
    }
    if world.unit_tile(attacker).is_none() || world.unit_tile(defender).is_none() {
        return Err(Rejection::UnitHasNoTile);
    }
    if !rules.combat.allow_friendly_fire && striker.owner() == target.owner() {
        return Err(Rejection::FriendlyFire);
    }
    if !striker.has_moves() {
        return Err(Rejection::NoMovePoints);
    }
    if striker.pos().chebyshev(target.pos()) > striker.attack_range() {
        return Err(Rejection::OutOfRange);
    }
    Ok(())
}

pub fn can_attack(world: &World, rules: &RulesConfig, attacker: UnitId, defender: UnitId) -> bool {
    attack_check(world, rules, attacker, defender).is_ok()
}

pub fn preview_attack(
    world: &World,
    rules: &RulesConfig,
    attacker: UnitId,
    defender: UnitId,
) -> Result<AttackPreview, Rejection> {
    attack_check(world, rules, attacker, defender)?;
    let striker = world
        .unit(attacker)
        .ok_or(Rejection::UnknownUnit { unit: attacker })?;
    let target = world
        .unit(defender)
        .ok_or(Rejection::UnknownUnit { unit: defender })?;

    let combat = &rules.combat;
    let damage = striker
        .attack()
        .saturating_sub(defense_on_tile(world, combat, target));
    let defender_dies = damage >= target.hp();
    let counter = if defender_dies {
        0
    } else {
        counter_damage(world, combat, striker, target)
    };
    Ok(AttackPreview {
        damage,
        counter_damage: counter,
        defender_dies,
        attacker_dies: counter >= striker.hp(),
    })
}

/// Enemy units `attacker` could strike right now.
pub fn attack_targets(world: &World, rules: &RulesConfig, attacker: UnitId) -> Vec<UnitId> {
    world
        .units()
        .map(|unit| unit.id())
        .filter(|id| can_attack(world, rules, attacker, *id))
        .collect()
}

fn apply_damage(world: &mut World, unit: UnitId, amount: u32) -> (u32, bool) {
    let Some(target) = world.unit_mut(unit) else {
        return (0, false);
    };
    let applied = target.take_damage(amount);
    let (hp, max_hp, owner, at) = (target.hp(), target.max_hp(), target.owner(), target.pos());
    if applied > 0 {
        world.emit(GameEvent::UnitHealthChanged { unit, hp, max_hp });
    }
    if hp > 0 {
        return (hp, false);
    }
    world.remove_unit(unit);
    world.emit(GameEvent::UnitDied { unit, owner, at });
    tracing::debug!(unit = unit.0, %owner, %at, "unit destroyed");
    (0, true)
}

/// Resolves one exchange. The attacker ends with no move points whatever
/// happens; a defender that survives may strike back.
pub(crate) fn resolve_attack(
    world: &mut World,
    rules: &RulesConfig,
    attacker: UnitId,
    defender: UnitId,
) -> Result<AttackReport, Rejection> {
    let preview = preview_attack(world, rules, attacker, defender)?;

    if let Some(striker) = world.unit_mut(attacker) {
        striker.consume_all_moves();
    }
    let (defender_hp, defender_died) = apply_damage(world, defender, preview.damage);

    let countered = !defender_died && rules.combat.counter_attacks;
    let (attacker_hp, attacker_died) = if countered {
        apply_damage(world, attacker, preview.counter_damage)
    } else {
        (world.unit(attacker).map(|unit| unit.hp()).unwrap_or(0), false)
    };

    tracing::debug!(
        attacker = attacker.0,
        defender = defender.0,
        damage = preview.damage,
        counter = preview.counter_damage,
        "attack resolved"
    );
    Ok(AttackReport {
        attacker,
        defender,
        damage_dealt: preview.damage,
        counter_damage: if countered { preview.counter_damage } else { 0 },
        attacker_hp,
        defender_hp,
        countered,
        attacker_died,
        defender_died,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPos;
    use crate::tile::{PlayerId, Terrain};
    use crate::unit::UnitStats;
    use std::sync::Arc;

    fn duel(defender_terrain: Terrain) -> World {
        let mut world = World::new();
        world.add_tile(GridPos::new(0, 0), Terrain::Grass).unwrap();
        world.add_tile(GridPos::new(1, 0), defender_terrain).unwrap();
        world.add_tile(GridPos::new(2, 0), Terrain::Grass).unwrap();
        world.add_tile(GridPos::new(3, 0), Terrain::Grass).unwrap();
        world
    }

    fn spawn(world: &mut World, owner: u8, pos: (i32, i32), attack: u32, hp: u32) -> UnitId {
        let stats = UnitStats {
            attack,
            hp,
            ..UnitStats::default()
        };
        world
            .spawn_unit(PlayerId(owner), "basic", Arc::new(stats), pos.into())
            .unwrap()
    }

    #[test]
    fn test_terrain_bonus_reduces_damage() {
        let mut world = duel(Terrain::Mountain);
        let rules = RulesConfig::default();
        let attacker = spawn(&mut world, 1, (0, 0), 5, 10);
        let defender = spawn(&mut world, 2, (1, 0), 1, 10);

        let report = resolve_attack(&mut world, &rules, attacker, defender).unwrap();

        // 5 - (1 + 3) = 1; counter 1 - 1 = 0.
        assert_eq!(report.damage_dealt, 1);
        assert_eq!(report.defender_hp, 9);
        assert!(report.countered);
        assert_eq!(report.counter_damage, 0);
        assert_eq!(world.unit(attacker).unwrap().moves_left(), 0);
    }

    #[test]
    fn test_zero_counter_leaves_attacker_health_unreported() {
        let mut world = duel(Terrain::Mountain);
        let rules = RulesConfig::default();
        let attacker = spawn(&mut world, 1, (0, 0), 5, 10);
        let defender = spawn(&mut world, 2, (1, 0), 1, 10);

        resolve_attack(&mut world, &rules, attacker, defender).unwrap();

        let health: Vec<UnitId> = world
            .events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                GameEvent::UnitHealthChanged { unit, .. } => Some(unit),
                _ => None,
            })
            .collect();
        assert_eq!(health, vec![defender]);
    }

    #[test]
    fn test_counter_rounds_half_to_even() {
        let rules = RulesConfig::default();

        let mut world = duel(Terrain::Grass);
        let attacker = spawn(&mut world, 1, (0, 0), 2, 10);
        let defender = spawn(&mut world, 2, (1, 0), 2, 10);
        // raw counter 2 - 1 = 1 -> 0.5 -> 0
        let report = resolve_attack(&mut world, &rules, attacker, defender).unwrap();
        assert_eq!(report.counter_damage, 0);

        let mut world = duel(Terrain::Grass);
        let attacker = spawn(&mut world, 1, (0, 0), 2, 10);
        let defender = spawn(&mut world, 2, (1, 0), 4, 10);
        // raw counter 4 - 1 = 3 -> 1.5 -> 2
        let report = resolve_attack(&mut world, &rules, attacker, defender).unwrap();
        assert_eq!(report.counter_damage, 2);
        assert_eq!(report.attacker_hp, 8);
    }

    #[test]
    fn test_lethal_attack_has_no_counter() {
        let mut world = duel(Terrain::Grass);
        let rules = RulesConfig::default();
        let attacker = spawn(&mut world, 1, (0, 0), 6, 10);
        let defender = spawn(&mut world, 2, (1, 0), 9, 3);

        let report = resolve_attack(&mut world, &rules, attacker, defender).unwrap();

        assert!(report.defender_died);
        assert!(!report.countered);
        assert_eq!(report.attacker_hp, 10);
        assert!(world.unit(defender).is_none());
        assert!(!world.tile(GridPos::new(1, 0)).unwrap().has_unit());
        assert!(world.occupancy_consistent());
    }

    #[test]
    fn test_attacker_can_die_to_counter() {
        let mut world = duel(Terrain::Grass);
        let mut rules = RulesConfig::default();
        rules.combat.counter_multiplier = 1.0;
        let attacker = spawn(&mut world, 1, (0, 0), 2, 2);
        let defender = spawn(&mut world, 2, (1, 0), 5, 10);

        let report = resolve_attack(&mut world, &rules, attacker, defender).unwrap();

        assert!(report.attacker_died);
        assert!(world.unit(attacker).is_none());
        assert_eq!(world.unit(defender).unwrap().hp(), 9);
    }

    #[test]
    fn test_attack_check_order() {
        let mut world = duel(Terrain::Grass);
        let rules = RulesConfig::default();
        let a = spawn(&mut world, 1, (0, 0), 1, 10);
        let friend = spawn(&mut world, 1, (1, 0), 1, 10);
        let far = spawn(&mut world, 2, (3, 0), 1, 10);

        assert_eq!(attack_check(&world, &rules, a, a), Err(Rejection::SameUnit));
        assert_eq!(attack_check(&world, &rules, a, friend), Err(Rejection::FriendlyFire));
        assert_eq!(attack_check(&world, &rules, a, far), Err(Rejection::OutOfRange));
        assert!(attack_targets(&world, &rules, a).is_empty());

        world.unit_mut(far).unwrap().set_busy(true);
        assert_eq!(attack_check(&world, &rules, a, far), Err(Rejection::UnitBusy));

        let mut rules = rules;
        rules.combat.allow_friendly_fire = true;
        assert_eq!(attack_targets(&world, &rules, a), vec![friend]);
        world.unit_mut(a).unwrap().consume_all_moves();
        assert_eq!(attack_check(&world, &rules, a, friend), Err(Rejection::NoMovePoints));
    }
}
