//! Rule constants. Everything tunable lives here so balance changes never
//! touch the rule systems.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::deposit::IncomeTiers;
use crate::tile::Terrain;
use crate::unit::UnitStats;

pub const DEFAULT_UNIT_CLASS: &str = "basic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cost {
    pub gold: u32,
    pub coal: u32,
}

impl Cost {
    pub const fn new(gold: u32, coal: u32) -> Self {
        Self { gold, coal }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub economy: EconomyRules,
    pub city: CityRules,
    pub mine: MineRules,
    pub units: BTreeMap<String, UnitStats>,
    pub movement: MovementRules,
    pub combat: CombatRules,
    pub logging: LoggingConfig,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let mut units = BTreeMap::new();
        units.insert(DEFAULT_UNIT_CLASS.to_string(), UnitStats::default());
        Self {
            economy: EconomyRules::default(),
            city: CityRules::default(),
            mine: MineRules::default(),
            units,
            movement: MovementRules::default(),
            combat: CombatRules::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    pub start_gold: u32,
    pub start_coal: u32,
    /// Used only when the world contains no deposits at all.
    pub fallback_income: Cost,
    pub income: IncomeTiers,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            start_gold: 10,
            start_coal: 10,
            fallback_income: Cost::new(5, 5),
            income: IncomeTiers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityRules {
    pub cost: Cost,
    pub capture_radius: u32,
}

impl Default for CityRules {
    fn default() -> Self {
        Self {
            cost: Cost::new(20, 0),
            capture_radius: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MineRules {
    pub cost: Cost,
}

impl Default for MineRules {
    fn default() -> Self {
        Self {
            cost: Cost::new(0, 5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementRules {
    pub block_water: bool,
}

impl Default for MovementRules {
    fn default() -> Self {
        Self { block_water: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    pub counter_attacks: bool,
    pub counter_multiplier: f64,
    pub allow_friendly_fire: bool,
    pub forest_defense: u32,
    pub mountain_defense: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            counter_attacks: true,
            counter_multiplier: 0.5,
            allow_friendly_fire: false,
            forest_defense: 1,
            mountain_defense: 3,
        }
    }
}

impl CombatRules {
    pub fn terrain_defense_bonus(&self, terrain: Terrain) -> u32 {
        match terrain {
            Terrain::Forest => self.forest_defense,
            Terrain::Mountain => self.mountain_defense,
            Terrain::Grass | Terrain::Water => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl RulesConfig {
    /// Load rules from a YAML file; missing keys fall back to defaults.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        let config: RulesConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn unit_class(&self, class: &str) -> Option<&UnitStats> {
        self.units.get(class)
    }
}
