//! Round bookkeeping: whose turn it is, who has ended, and the pipeline of
//! systems that runs once every player has ended.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::command::Rejection;
use crate::config::RulesConfig;
use crate::events::GameEvent;
use crate::systems::{economy, IncomeSystem, ReadinessSystem};
use crate::tile::PlayerId;
use crate::world::World;

pub struct RoundContext<'a> {
    pub turn: u32,
    pub players: &'a [PlayerId],
    pub rules: &'a RulesConfig,
}

/// A step of the end-of-round pipeline.
pub trait RoundSystem: Send {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &RoundContext, world: &mut World) -> Result<()>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("a game needs at least one player")]
    NoPlayers,
    #[error("{0} is listed twice")]
    DuplicatePlayer(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerIncome {
    pub player: PlayerId,
    pub gold: u32,
    pub coal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// Turn number after the call.
    pub turn: u32,
    pub active: PlayerId,
    pub round_completed: bool,
    /// Resources credited by the round pipeline; empty on a mid-round handoff.
    pub income_applied: Vec<PlayerIncome>,
}

pub struct TurnCoordinator {
    players: Vec<PlayerId>,
    ended: BTreeSet<PlayerId>,
    active: usize,
    turn: u32,
    systems: Vec<Box<dyn RoundSystem>>,
}

impl TurnCoordinator {
    /// Players act in the given order. No round systems are installed.
    pub fn new(players: Vec<PlayerId>) -> Result<Self, TurnError> {
        if players.is_empty() {
            return Err(TurnError::NoPlayers);
        }
        let mut seen = BTreeSet::new();
        for player in &players {
            if !seen.insert(*player) {
                return Err(TurnError::DuplicatePlayer(*player));
            }
        }
        Ok(Self {
            players,
            ended: BTreeSet::new(),
            active: 0,
            turn: 1,
            systems: Vec::new(),
        })
    }

    /// Income first, then move points.
    pub fn standard(players: Vec<PlayerId>) -> Result<Self, TurnError> {
        Ok(Self::new(players)?
            .with_system(IncomeSystem::new())
            .with_system(ReadinessSystem::new()))
    }

    pub fn with_system(mut self, system: impl RoundSystem + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl RoundSystem + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn is_player(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    pub fn active_player(&self) -> PlayerId {
        self.players[self.active]
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn has_ended(&self, player: PlayerId) -> bool {
        self.ended.contains(&player)
    }

    fn next_waiting(&self) -> Option<usize> {
        let count = self.players.len();
        (1..=count)
            .map(|step| (self.active + step) % count)
            .find(|index| !self.ended.contains(&self.players[*index]))
    }

    pub(crate) fn end_turn(
        &mut self,
        world: &mut World,
        rules: &RulesConfig,
        player: PlayerId,
    ) -> Result<TurnReport, Rejection> {
        if !self.is_player(player) {
            return Err(Rejection::UnknownPlayer { player });
        }
        if player != self.active_player() {
            return Err(Rejection::NotYourTurn);
        }
        if world.any_unit_busy() {
            return Err(Rejection::ActionInProgress);
        }

        self.ended.insert(player);
        if let Some(next) = self.next_waiting() {
            self.active = next;
            let active = self.active_player();
            economy::recalculate_income(world, rules, active);
            world.emit(GameEvent::ActivePlayerChanged { player: active });
            tracing::debug!(turn = self.turn, from = %player, to = %active, "turn handed over");
            return Ok(TurnReport {
                turn: self.turn,
                active,
                round_completed: false,
                income_applied: Vec::new(),
            });
        }

        let income_applied = self.complete_round(world, rules);
        Ok(TurnReport {
            turn: self.turn,
            active: self.active_player(),
            round_completed: true,
            income_applied,
        })
    }

    fn complete_round(&mut self, world: &mut World, rules: &RulesConfig) -> Vec<PlayerIncome> {
        self.ended.clear();
        self.turn += 1;

        let before: Vec<(u32, u32)> = self
            .players
            .iter()
            .map(|player| {
                world
                    .ledger()
                    .wallet(*player)
                    .map(|wallet| (wallet.gold, wallet.coal))
                    .unwrap_or_default()
            })
            .collect();

        let ctx = RoundContext {
            turn: self.turn,
            players: &self.players,
            rules,
        };
        for system in self.systems.iter_mut() {
            if let Err(err) = system.run(&ctx, world) {
                tracing::error!(system = system.name(), turn = self.turn, %err, "round system failed");
            }
        }

        let income_applied = self
            .players
            .iter()
            .zip(before)
            .map(|(player, (gold, coal))| {
                let after = world.ledger().wallet(*player).copied().unwrap_or_default();
                PlayerIncome {
                    player: *player,
                    gold: after.gold.saturating_sub(gold),
                    coal: after.coal.saturating_sub(coal),
                }
            })
            .collect();

        self.active = 0;
        let active = self.active_player();
        economy::recalculate_income(world, rules, active);
        world.emit(GameEvent::TurnChanged { turn: self.turn });
        world.emit(GameEvent::ActivePlayerChanged { player: active });
        tracing::info!(turn = self.turn, active = %active, "round complete");
        income_applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPos;
    use crate::tile::Terrain;

    fn players() -> Vec<PlayerId> {
        vec![PlayerId(1), PlayerId(2), PlayerId(3)]
    }

    fn world_for(players: &[PlayerId]) -> World {
        let mut world = World::new();
        world.add_tile(GridPos::new(0, 0), Terrain::Grass).unwrap();
        for player in players {
            world.ledger.open(*player, 10, 10);
        }
        world
    }

    #[test]
    fn test_rejects_bad_rosters() {
        assert_eq!(TurnCoordinator::new(vec![]).err(), Some(TurnError::NoPlayers));
        assert_eq!(
            TurnCoordinator::new(vec![PlayerId(1), PlayerId(1)]).err(),
            Some(TurnError::DuplicatePlayer(PlayerId(1)))
        );
    }

    #[test]
    fn test_handoff_then_round() {
        let rules = RulesConfig::default();
        let mut turns = TurnCoordinator::standard(players()).unwrap();
        let mut world = world_for(turns.players());

        let report = turns.end_turn(&mut world, &rules, PlayerId(1)).unwrap();
        assert!(!report.round_completed);
        assert_eq!(report.active, PlayerId(2));
        assert_eq!(world.ledger().wallet(PlayerId(1)).unwrap().gold, 10);

        turns.end_turn(&mut world, &rules, PlayerId(2)).unwrap();
        let report = turns.end_turn(&mut world, &rules, PlayerId(3)).unwrap();

        assert!(report.round_completed);
        assert_eq!(report.turn, 2);
        assert_eq!(report.active, PlayerId(1));
        assert_eq!(report.income_applied.len(), 3);
        // No deposits anywhere: every player gets the fallback exactly once.
        for (_, wallet) in world.ledger().wallets() {
            assert_eq!((wallet.gold, wallet.coal), (15, 15));
        }
    }

    #[test]
    fn test_only_active_player_may_end() {
        let rules = RulesConfig::default();
        let mut turns = TurnCoordinator::standard(players()).unwrap();
        let mut world = world_for(turns.players());

        assert_eq!(
            turns.end_turn(&mut world, &rules, PlayerId(2)),
            Err(Rejection::NotYourTurn)
        );
        assert_eq!(
            turns.end_turn(&mut world, &rules, PlayerId(7)),
            Err(Rejection::UnknownPlayer {
                player: PlayerId(7)
            })
        );
        assert_eq!(turns.active_player(), PlayerId(1));
        assert!(!turns.has_ended(PlayerId(1)));
    }

    #[test]
    fn test_single_player_completes_round_each_end() {
        let rules = RulesConfig::default();
        let mut turns = TurnCoordinator::standard(vec![PlayerId(4)]).unwrap();
        let mut world = world_for(turns.players());

        for expected in 2..5 {
            let report = turns.end_turn(&mut world, &rules, PlayerId(4)).unwrap();
            assert!(report.round_completed);
            assert_eq!(report.turn, expected);
        }
        assert_eq!(world.ledger().wallet(PlayerId(4)).unwrap().gold, 25);
    }

    #[test]
    fn test_pipeline_order() {
        let turns = TurnCoordinator::standard(players()).unwrap();
        assert_eq!(turns.system_names(), vec!["income", "readiness"]);
    }
}
