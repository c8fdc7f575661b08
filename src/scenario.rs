use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;

use crate::command::Order;
use crate::config::{RulesConfig, DEFAULT_UNIT_CLASS};
use crate::deposit::ResourceKind;
use crate::game::Game;
use crate::grid::{GridError, GridPos};
use crate::rng::RngManager;
use crate::systems::territory;
use crate::tile::{Building, PlayerId, Terrain};
use crate::turn::{TurnCoordinator, TurnError};
use crate::unit::UnitRoster;
use crate::world::{SetupError, World};

fn default_snapshot_interval_rounds() -> u32 {
    0
}

fn default_rounds() -> u32 {
    10
}

fn default_class() -> String {
    DEFAULT_UNIT_CLASS.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    pub players: Vec<PlayerId>,
    /// One string per row, top row is `y = 0`. See [`Terrain::from_symbol`].
    pub map: Vec<String>,
    #[serde(default)]
    pub deposits: Vec<ScenarioDeposit>,
    #[serde(default)]
    pub cities: Vec<ScenarioCity>,
    #[serde(default)]
    pub units: Vec<ScenarioUnit>,
    #[serde(default)]
    pub wallets: Vec<ScenarioWallet>,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default = "default_snapshot_interval_rounds")]
    pub snapshot_interval_rounds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioDeposit {
    pub at: GridPos,
    pub kind: ResourceKind,
    #[serde(default)]
    pub mine: bool,
}

/// A starting city. Without `at`, a free land tile is picked from the seed.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCity {
    pub owner: PlayerId,
    #[serde(default)]
    pub at: Option<GridPos>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioUnit {
    pub owner: PlayerId,
    pub at: GridPos,
    #[serde(default = "default_class")]
    pub class: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioWallet {
    pub player: PlayerId,
    pub gold: u32,
    pub coal: u32,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unknown terrain symbol '{symbol}' at ({x}, {y})")]
    UnknownTerrain { symbol: char, x: i32, y: i32 },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error("{player} is not listed in players")]
    UnknownPlayer { player: PlayerId },
    #[error("unknown unit class '{0}'")]
    UnknownUnitClass(String),
    #[error("no free land left for {player}'s start city")]
    NoStartTile { player: PlayerId },
    #[error("{player}'s start city at {at} would stand on water")]
    StartCityOnWater { player: PlayerId, at: GridPos },
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    fn check_player(&self, player: PlayerId) -> Result<(), ScenarioError> {
        if self.players.contains(&player) {
            Ok(())
        } else {
            Err(ScenarioError::UnknownPlayer { player })
        }
    }

    pub fn build_world(&self) -> Result<World, ScenarioError> {
        let mut world = World::new();
        for (y, row) in self.map.iter().enumerate() {
            let symbols = row.chars().filter(|symbol| !symbol.is_whitespace());
            for (x, symbol) in symbols.enumerate() {
                let (x, y) = (x as i32, y as i32);
                let terrain = Terrain::from_symbol(symbol)
                    .ok_or(ScenarioError::UnknownTerrain { symbol, x, y })?;
                world.add_tile(GridPos::new(x, y), terrain)?;
            }
        }

        for deposit in &self.deposits {
            world.add_deposit(deposit.at, deposit.kind)?;
            if deposit.mine {
                world.add_mine(deposit.at)?;
            }
        }

        for &player in &self.players {
            world
                .ledger
                .open(player, self.rules.economy.start_gold, self.rules.economy.start_coal);
        }
        for wallet in &self.wallets {
            self.check_player(wallet.player)?;
            world.ledger.open(wallet.player, wallet.gold, wallet.coal);
        }

        let mut rng = RngManager::new(self.seed);
        for city in &self.cities {
            self.check_player(city.owner)?;
            let at = match city.at {
                Some(at) => at,
                None => {
                    let candidates: Vec<GridPos> = world
                        .tiles()
                        .filter(|tile| {
                            matches!(tile.terrain(), Terrain::Grass | Terrain::Forest)
                                && !tile.is_claimed()
                                && !tile.has_building()
                                && !tile.has_unit()
                        })
                        .map(|tile| tile.pos())
                        .collect();
                    *candidates
                        .choose(&mut rng.stream("start_cities"))
                        .ok_or(ScenarioError::NoStartTile { player: city.owner })?
                }
            };
            if world.tile(at).is_some_and(|tile| tile.is_water()) {
                return Err(ScenarioError::StartCityOnWater {
                    player: city.owner,
                    at,
                });
            }
            world.place_building(at, Building::City)?;
            territory::capture_around(&mut world, at, city.owner, self.rules.city.capture_radius);
            tracing::debug!(player = %city.owner, %at, "start city placed");
        }

        let roster = UnitRoster::from_classes(&self.rules.units);
        for unit in &self.units {
            self.check_player(unit.owner)?;
            let stats = roster
                .get(&unit.class)
                .ok_or_else(|| ScenarioError::UnknownUnitClass(unit.class.clone()))?;
            world.spawn_unit(unit.owner, &unit.class, stats, unit.at)?;
        }

        Ok(world)
    }

    /// Builds the world and wires it into a game with the standard round
    /// pipeline.
    pub fn build_game(&self) -> Result<Game, ScenarioError> {
        let world = self.build_world()?;
        let turns = TurnCoordinator::standard(self.players.clone())?;
        tracing::info!(scenario = %self.name, seed = self.seed, "scenario loaded");
        Ok(Game::new(world, self.rules.clone(), turns))
    }

    pub fn rounds(&self, override_rounds: Option<u32>) -> u32 {
        override_rounds.unwrap_or(self.rounds)
    }
}
