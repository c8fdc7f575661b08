use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Cost;
use crate::grid::GridPos;
use crate::tile::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

/// Stat template shared by every unit of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    pub move_points: u32,
    pub attack: u32,
    pub defense: u32,
    pub hp: u32,
    pub attack_range: u32,
    pub gold_cost: u32,
    pub coal_cost: u32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            move_points: 3,
            attack: 1,
            defense: 1,
            hp: 10,
            attack_range: 1,
            gold_cost: 15,
            coal_cost: 5,
        }
    }
}

impl UnitStats {
    pub fn cost(&self) -> Cost {
        Cost::new(self.gold_cost, self.coal_cost)
    }
}

/// Shared stat templates, one per unit class.
#[derive(Debug, Clone, Default)]
pub struct UnitRoster {
    classes: BTreeMap<String, Arc<UnitStats>>,
}

impl UnitRoster {
    pub fn from_classes(classes: &BTreeMap<String, UnitStats>) -> Self {
        Self {
            classes: classes
                .iter()
                .map(|(name, stats)| (name.clone(), Arc::new(stats.clone())))
                .collect(),
        }
    }

    pub fn get(&self, class: &str) -> Option<Arc<UnitStats>> {
        self.classes.get(class).cloned()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct Unit {
    id: UnitId,
    owner: PlayerId,
    class: String,
    stats: Arc<UnitStats>,
    pos: GridPos,
    moves_left: u32,
    hp: u32,
    busy: bool,
}

impl Unit {
    /// Spawns with full health and a full move budget.
    pub(crate) fn new(
        id: UnitId,
        owner: PlayerId,
        class: String,
        stats: Arc<UnitStats>,
        pos: GridPos,
    ) -> Self {
        let moves_left = stats.move_points;
        let hp = stats.hp;
        Self {
            id,
            owner,
            class,
            stats,
            pos,
            moves_left,
            hp,
            busy: false,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn stats(&self) -> &UnitStats {
        &self.stats
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn max_moves(&self) -> u32 {
        self.stats.move_points
    }

    pub fn has_moves(&self) -> bool {
        self.moves_left > 0
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    pub fn attack(&self) -> u32 {
        self.stats.attack
    }

    pub fn defense(&self) -> u32 {
        self.stats.defense
    }

    pub fn attack_range(&self) -> u32 {
        self.stats.attack_range
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn set_pos(&mut self, pos: GridPos) {
        self.pos = pos;
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub(crate) fn reset_moves(&mut self) {
        self.moves_left = self.stats.move_points;
    }

    pub(crate) fn spend_moves(&mut self, cost: u32) {
        self.moves_left = self.moves_left.saturating_sub(cost);
    }

    pub(crate) fn consume_all_moves(&mut self) {
        self.moves_left = 0;
    }

    /// Returns the damage actually applied.
    pub(crate) fn take_damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.hp);
        self.hp -= applied;
        applied
    }
}
