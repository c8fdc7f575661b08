//! Small builder for setting up games in tests without a scenario file.

use std::collections::BTreeMap;

use crate::config::{RulesConfig, DEFAULT_UNIT_CLASS};
use crate::deposit::ResourceKind;
use crate::game::Game;
use crate::grid::GridPos;
use crate::scenario::ScenarioError;
use crate::systems::territory;
use crate::tile::{Building, PlayerId, Terrain};
use crate::turn::TurnCoordinator;
use crate::unit::UnitRoster;
use crate::world::World;

pub struct GameBuilder {
    players: Vec<PlayerId>,
    rules: RulesConfig,
    tiles: BTreeMap<GridPos, Terrain>,
    deposits: Vec<(GridPos, ResourceKind, bool)>,
    wallets: Vec<(PlayerId, u32, u32)>,
    cities: Vec<(GridPos, PlayerId)>,
    owners: Vec<(GridPos, PlayerId)>,
    units: Vec<(PlayerId, GridPos, String)>,
}

impl GameBuilder {
    /// Two players, default rules, no tiles.
    pub fn new() -> Self {
        Self {
            players: vec![PlayerId(1), PlayerId(2)],
            rules: RulesConfig::default(),
            tiles: BTreeMap::new(),
            deposits: Vec::new(),
            wallets: Vec::new(),
            cities: Vec::new(),
            owners: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn players(mut self, players: &[u8]) -> Self {
        self.players = players.iter().map(|id| PlayerId(*id)).collect();
        self
    }

    pub fn rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    pub fn tweak_rules(mut self, tweak: impl FnOnce(&mut RulesConfig)) -> Self {
        tweak(&mut self.rules);
        self
    }

    /// Fills `width` x `height` with `terrain`, keeping tiles already set.
    pub fn grid(mut self, width: i32, height: i32, terrain: Terrain) -> Self {
        for y in 0..height {
            for x in 0..width {
                self.tiles.entry(GridPos::new(x, y)).or_insert(terrain);
            }
        }
        self
    }

    pub fn terrain(mut self, at: impl Into<GridPos>, terrain: Terrain) -> Self {
        self.tiles.insert(at.into(), terrain);
        self
    }

    pub fn deposit(mut self, at: impl Into<GridPos>, kind: ResourceKind) -> Self {
        self.deposits.push((at.into(), kind, false));
        self
    }

    pub fn mine(mut self, at: impl Into<GridPos>, kind: ResourceKind) -> Self {
        self.deposits.push((at.into(), kind, true));
        self
    }

    pub fn wallet(mut self, player: u8, gold: u32, coal: u32) -> Self {
        self.wallets.push((PlayerId(player), gold, coal));
        self
    }

    /// A city with its captured territory.
    pub fn city(mut self, at: impl Into<GridPos>, owner: u8) -> Self {
        self.cities.push((at.into(), PlayerId(owner)));
        self
    }

    pub fn owner(mut self, at: impl Into<GridPos>, owner: u8) -> Self {
        self.owners.push((at.into(), PlayerId(owner)));
        self
    }

    /// Units get ids 0, 1, 2, ... in the order they are added.
    pub fn unit(mut self, owner: u8, at: impl Into<GridPos>) -> Self {
        self.units
            .push((PlayerId(owner), at.into(), DEFAULT_UNIT_CLASS.to_string()));
        self
    }

    pub fn unit_of_class(mut self, owner: u8, at: impl Into<GridPos>, class: &str) -> Self {
        self.units.push((PlayerId(owner), at.into(), class.to_string()));
        self
    }

    pub fn build(self) -> Result<Game, ScenarioError> {
        let mut world = World::new();
        for (pos, terrain) in &self.tiles {
            world.add_tile(*pos, *terrain)?;
        }
        for (pos, kind, mine) in &self.deposits {
            world.add_deposit(*pos, *kind)?;
            if *mine {
                world.add_mine(*pos)?;
            }
        }
        for (player, gold, coal) in &self.wallets {
            world.ledger.open(*player, *gold, *coal);
        }
        for (pos, owner) in &self.cities {
            world.place_building(*pos, Building::City)?;
            territory::capture_around(&mut world, *pos, *owner, self.rules.city.capture_radius);
        }
        for (pos, owner) in &self.owners {
            world.set_owner(*pos, *owner);
        }
        let roster = UnitRoster::from_classes(&self.rules.units);
        for (owner, pos, class) in &self.units {
            let stats = roster
                .get(class)
                .ok_or_else(|| ScenarioError::UnknownUnitClass(class.clone()))?;
            world.spawn_unit(*owner, class, stats, *pos)?;
        }

        let turns = TurnCoordinator::standard(self.players)?;
        Ok(Game::new(world, self.rules, turns))
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
