//! The game facade: read-only queries, validated commands and change
//! notifications, all over one [`World`].

use crate::command::{Command, CommandOutcome, Rejection};
use crate::config::{Cost, RulesConfig, DEFAULT_UNIT_CLASS};
use crate::events::{EventBus, GameObserver};
use crate::grid::GridPos;
use crate::snapshot::{GameSnapshot, TileSnapshot, UnitSnapshot, WalletSnapshot};
use crate::systems::{
    build, combat, economy, movement, recruit, AttackPreview, AttackReport, CityReport,
    DepositIncome, MineReport, MoveReport, RecruitReport, Wallet,
};
use crate::tile::PlayerId;
use crate::turn::{TurnCoordinator, TurnReport};
use crate::unit::{UnitId, UnitRoster};
use crate::world::World;

pub struct Game {
    world: World,
    rules: RulesConfig,
    roster: UnitRoster,
    turns: TurnCoordinator,
    bus: EventBus,
}

impl Game {
    /// Opens a starting wallet for every player that does not have one yet
    /// and primes each player's displayed income. Setup events are dropped.
    pub fn new(mut world: World, rules: RulesConfig, turns: TurnCoordinator) -> Self {
        for &player in turns.players() {
            if world.ledger().wallet(player).is_none() {
                world
                    .ledger
                    .open(player, rules.economy.start_gold, rules.economy.start_coal);
            }
            economy::recalculate_income(&mut world, &rules, player);
        }
        world.events.drain();

        let roster = UnitRoster::from_classes(&rules.units);
        tracing::info!(
            players = turns.players().len(),
            tiles = world.tile_count(),
            units = world.units().count(),
            "game ready"
        );
        Self {
            world,
            rules,
            roster,
            turns,
            bus: EventBus::default(),
        }
    }

    pub fn register_observer(&mut self, observer: Box<dyn GameObserver>) {
        self.bus.register(observer);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn turn(&self) -> u32 {
        self.turns.turn()
    }

    pub fn active_player(&self) -> PlayerId {
        self.turns.active_player()
    }

    pub fn players(&self) -> &[PlayerId] {
        self.turns.players()
    }

    pub fn has_ended_turn(&self, player: PlayerId) -> bool {
        self.turns.has_ended(player)
    }

    // --- queries -------------------------------------------------------

    pub fn wallet(&self, player: PlayerId) -> Option<Wallet> {
        self.world.ledger().wallet(player).copied()
    }

    pub fn tile(&self, pos: GridPos) -> Option<TileSnapshot> {
        self.world
            .tile(pos)
            .map(|tile| TileSnapshot::capture(&self.world, tile))
    }

    pub fn unit(&self, id: UnitId) -> Option<UnitSnapshot> {
        self.world.unit(id).map(UnitSnapshot::from)
    }

    pub fn units_of(&self, player: PlayerId) -> Vec<UnitSnapshot> {
        self.world.units_of(player).map(UnitSnapshot::from).collect()
    }

    pub fn income_breakdown(&self, player: PlayerId) -> Vec<DepositIncome> {
        economy::income_breakdown(&self.world, &self.rules, player)
    }

    pub fn can_build_city(&self, player: PlayerId, at: GridPos) -> Result<(), Rejection> {
        build::can_build_city(&self.world, &self.rules, player, at).map(|_| ())
    }

    pub fn can_build_mine(&self, player: PlayerId, at: GridPos) -> Result<(), Rejection> {
        build::can_build_mine(&self.world, &self.rules, player, at)
    }

    pub fn can_recruit(
        &self,
        player: PlayerId,
        at: GridPos,
        class: Option<&str>,
    ) -> Result<(), Rejection> {
        let class = class.unwrap_or(DEFAULT_UNIT_CLASS);
        recruit::can_recruit(&self.world, &self.roster, player, at, class).map(|_| ())
    }

    pub fn reachable_tiles(&self, unit: UnitId) -> Vec<GridPos> {
        movement::reachable_tiles(&self.world, &self.rules, unit)
    }

    pub fn attack_check(&self, attacker: UnitId, defender: UnitId) -> Result<(), Rejection> {
        combat::attack_check(&self.world, &self.rules, attacker, defender)
    }

    pub fn can_attack(&self, attacker: UnitId, defender: UnitId) -> bool {
        combat::can_attack(&self.world, &self.rules, attacker, defender)
    }

    pub fn preview_attack(
        &self,
        attacker: UnitId,
        defender: UnitId,
    ) -> Result<AttackPreview, Rejection> {
        combat::preview_attack(&self.world, &self.rules, attacker, defender)
    }

    pub fn attack_targets(&self, attacker: UnitId) -> Vec<UnitId> {
        combat::attack_targets(&self.world, &self.rules, attacker)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            turn: self.turn(),
            active_player: self.active_player(),
            players: self.players().to_vec(),
            wallets: self
                .world
                .ledger()
                .wallets()
                .map(|(player, wallet)| WalletSnapshot {
                    player,
                    wallet: *wallet,
                })
                .collect(),
            tiles: self
                .world
                .tiles()
                .map(|tile| TileSnapshot::capture(&self.world, tile))
                .collect(),
            units: self.world.units().map(UnitSnapshot::from).collect(),
        }
    }

    // --- commands ------------------------------------------------------

    fn ensure_turn(&self, player: PlayerId) -> Result<(), Rejection> {
        if !self.turns.is_player(player) {
            return Err(Rejection::UnknownPlayer { player });
        }
        if self.turns.active_player() != player {
            return Err(Rejection::NotYourTurn);
        }
        Ok(())
    }

    fn ensure_owned(&self, player: PlayerId, unit: UnitId) -> Result<(), Rejection> {
        let unit = self.world.unit(unit).ok_or(Rejection::UnknownUnit { unit })?;
        if unit.owner() != player {
            return Err(Rejection::NotOwnedByCaller);
        }
        Ok(())
    }

    /// Publishes what the command produced. Rejections never produce events.
    fn finish<T>(&mut self, result: Result<T, Rejection>) -> Result<T, Rejection> {
        let events = self.world.events.drain();
        if let Err(rejection) = &result {
            debug_assert!(events.is_empty(), "rejected command emitted events");
            tracing::debug!(reason = rejection.code(), "command rejected");
        }
        self.bus.publish(&events);
        result
    }

    pub fn build_city(&mut self, player: PlayerId, at: GridPos) -> Result<CityReport, Rejection> {
        let result = self
            .ensure_turn(player)
            .and_then(|_| build::try_build_city(&mut self.world, &self.rules, player, at));
        self.finish(result)
    }

    pub fn build_mine(&mut self, player: PlayerId, at: GridPos) -> Result<MineReport, Rejection> {
        let result = self
            .ensure_turn(player)
            .and_then(|_| build::try_build_mine(&mut self.world, &self.rules, player, at));
        self.finish(result)
    }

    pub fn recruit(
        &mut self,
        player: PlayerId,
        at: GridPos,
        class: Option<&str>,
    ) -> Result<RecruitReport, Rejection> {
        let class = class.unwrap_or(DEFAULT_UNIT_CLASS);
        let result = self
            .ensure_turn(player)
            .and_then(|_| recruit::try_recruit(&mut self.world, &self.roster, player, at, class));
        self.finish(result)
    }

    pub fn move_unit(
        &mut self,
        player: PlayerId,
        unit: UnitId,
        to: GridPos,
    ) -> Result<MoveReport, Rejection> {
        let result = self
            .ensure_turn(player)
            .and_then(|_| self.ensure_owned(player, unit))
            .and_then(|_| movement::try_move(&mut self.world, &self.rules, unit, to));
        self.finish(result)
    }

    pub fn attack(
        &mut self,
        player: PlayerId,
        attacker: UnitId,
        defender: UnitId,
    ) -> Result<AttackReport, Rejection> {
        let result = self
            .ensure_turn(player)
            .and_then(|_| self.ensure_owned(player, attacker))
            .and_then(|_| combat::resolve_attack(&mut self.world, &self.rules, attacker, defender));
        self.finish(result)
    }

    pub fn end_turn(&mut self, player: PlayerId) -> Result<TurnReport, Rejection> {
        let result = self.turns.end_turn(&mut self.world, &self.rules, player);
        self.finish(result)
    }

    /// Dispatches a command on behalf of `player`.
    pub fn apply(&mut self, player: PlayerId, command: Command) -> CommandOutcome {
        let outcome = match command {
            Command::BuildCity { at } => self.build_city(player, at).map(CommandOutcome::CityFounded),
            Command::BuildMine { at } => self.build_mine(player, at).map(CommandOutcome::MineBuilt),
            Command::Recruit { at, class } => self
                .recruit(player, at, class.as_deref())
                .map(CommandOutcome::Recruited),
            Command::Move { unit, to } => self.move_unit(player, unit, to).map(CommandOutcome::Moved),
            Command::Attack { attacker, defender } => self
                .attack(player, attacker, defender)
                .map(CommandOutcome::Attacked),
            Command::EndTurn => self.end_turn(player).map(CommandOutcome::TurnEnded),
        };
        outcome.unwrap_or_else(CommandOutcome::Rejected)
    }

    /// Credits resources outside the normal income flow (setup, tests).
    pub fn grant(&mut self, player: PlayerId, gold: u32, coal: u32) -> Result<(), Rejection> {
        let result = economy::grant(&mut self.world, player, Cost::new(gold, coal));
        self.finish(result)
    }

    /// Locks or releases a unit while the presentation layer animates it.
    pub fn set_unit_busy(&mut self, unit: UnitId, busy: bool) -> Result<(), Rejection> {
        let target = self
            .world
            .unit_mut(unit)
            .ok_or(Rejection::UnknownUnit { unit })?;
        target.set_busy(busy);
        Ok(())
    }
}
