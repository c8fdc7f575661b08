pub mod command;
pub mod config;
pub mod deposit;
pub mod events;
pub mod game;
pub mod grid;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod testing;
pub mod tile;
pub mod turn;
pub mod unit;
pub mod web;
pub mod world;

pub use command::{Command, CommandOutcome, Order, Rejection};
pub use config::RulesConfig;
pub use game::Game;
pub use grid::GridPos;
pub use scenario::{Scenario, ScenarioLoader};
pub use tile::{PlayerId, Terrain};
pub use unit::UnitId;
