use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deposit::ResourceKind;
use crate::grid::GridPos;
use crate::systems::Wallet;
use crate::tile::{Building, PlayerId, Terrain, TileState};
use crate::unit::{Unit, UnitId};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSnapshot {
    pub kind: ResourceKind,
    pub has_mine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub pos: GridPos,
    pub terrain: Terrain,
    pub owner: Option<PlayerId>,
    pub unit: Option<UnitId>,
    pub building: Option<Building>,
    pub deposit: Option<DepositSnapshot>,
    pub decorations_hidden: bool,
}

impl TileSnapshot {
    pub fn capture(world: &World, tile: &TileState) -> Self {
        let deposit = tile
            .deposit()
            .and_then(|id| world.deposit(id))
            .map(|deposit| DepositSnapshot {
                kind: deposit.kind(),
                has_mine: deposit.has_mine(),
            });
        Self {
            pos: tile.pos(),
            terrain: tile.terrain(),
            owner: tile.owner(),
            unit: tile.occupant(),
            building: tile.building(),
            deposit,
            decorations_hidden: tile.decorations_hidden(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub owner: PlayerId,
    pub class: String,
    pub pos: GridPos,
    pub hp: u32,
    pub max_hp: u32,
    pub moves_left: u32,
    pub max_moves: u32,
    pub attack: u32,
    pub defense: u32,
    pub busy: bool,
}

impl From<&Unit> for UnitSnapshot {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            owner: unit.owner(),
            class: unit.class().to_string(),
            pos: unit.pos(),
            hp: unit.hp(),
            max_hp: unit.max_hp(),
            moves_left: unit.moves_left(),
            max_moves: unit.max_moves(),
            attack: unit.attack(),
            defense: unit.defense(),
            busy: unit.is_busy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub player: PlayerId,
    #[serde(flatten)]
    pub wallet: Wallet,
}

/// Everything a presentation layer needs to draw the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: u32,
    pub active_player: PlayerId,
    pub players: Vec<PlayerId>,
    pub wallets: Vec<WalletSnapshot>,
    pub tiles: Vec<TileSnapshot>,
    pub units: Vec<UnitSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub scenario: String,
    pub turn: u32,
    pub written_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub metadata: SnapshotMetadata,
    pub state: GameSnapshot,
}

/// Writes `<dir>/<scenario>/turn_NNNNNN.json` every `interval_rounds`
/// completed rounds. An interval of zero disables writing.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_rounds: u32,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_rounds: u32) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_rounds,
        }
    }

    pub fn is_due(&self, turn: u32) -> bool {
        let completed = turn.saturating_sub(1);
        self.interval_rounds > 0 && completed > 0 && completed % self.interval_rounds == 0
    }

    pub fn maybe_write(&self, snapshot: &GameSnapshot, scenario: &str) -> Result<Option<PathBuf>> {
        if !self.is_due(snapshot.turn) {
            return Ok(None);
        }
        self.write(snapshot, scenario).map(Some)
    }

    pub fn write(&self, snapshot: &GameSnapshot, scenario: &str) -> Result<PathBuf> {
        let dir = self.dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("turn_{:06}.json", snapshot.turn));
        let file = SnapshotFile {
            metadata: SnapshotMetadata {
                scenario: scenario.to_string(),
                turn: snapshot.turn,
                written_at: Utc::now(),
            },
            state: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), turn = snapshot.turn, "snapshot written");
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<SnapshotFile> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let file = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_due_every_interval() {
        let writer = SnapshotWriter::new("unused", 2);

        assert!(!writer.is_due(1));
        assert!(!writer.is_due(2));
        assert!(writer.is_due(3));
        assert!(!writer.is_due(4));
        assert!(writer.is_due(5));
        assert!(!SnapshotWriter::new("unused", 0).is_due(3));
    }
}
