//! Bundled static tables: the enemy catalog and the encounter grid.
use serde::{Deserialize, Serialize};

use crate::combat::Enemy;
use crate::encounters::EncounterKind;

const DEFAULT_ENEMY_DATA: &str = include_str!("../data/enemies.json");
const DEFAULT_ENCOUNTER_DATA: &str = include_str!("../data/encounters.json");

/// One enemy archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyRecord {
    pub id: String,
    pub name: String,
    pub strength: i32,
    pub accuracy: i32,
    pub agility: i32,
    #[serde(default)]
    pub ranged_only: bool,
    #[serde(default)]
    pub description: String,
}

impl EnemyRecord {
    #[must_use]
    pub fn to_enemy(&self) -> Enemy {
        Enemy::new(self.name.clone(), self.strength, self.accuracy, self.agility)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnemyCatalog {
    #[serde(default)]
    pub enemies: Vec<EnemyRecord>,
}

impl EnemyCatalog {
    /// Load the bundled catalog; an unreadable asset yields an empty catalog.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_ENEMY_DATA).unwrap_or_else(|err| {
            log::warn!("bundled enemy catalog rejected: {err}");
            Self::default()
        })
    }

    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into enemy records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EnemyRecord> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }
}

/// Enemy reference inside an encounter record: a catalog id or inline stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnemySpec {
    Catalog(String),
    Inline(Enemy),
}

/// Raw encounter entry as authored in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRecord {
    pub x: i32,
    pub y: i32,
    pub kind: EncounterKind,
    #[serde(default = "default_one_shot")]
    pub one_shot: bool,
    #[serde(default)]
    pub enemy: Option<EnemySpec>,
    /// Overrides the catalog flag for this encounter.
    #[serde(default)]
    pub ranged_only: Option<bool>,
    #[serde(default = "default_stages")]
    pub stages: u8,
    /// Overrides the configured reward chance.
    #[serde(default)]
    pub reward_chance: Option<f32>,
    /// Health delta for `damage` and `heal` encounters.
    #[serde(default)]
    pub amount: i32,
}

const fn default_one_shot() -> bool {
    true
}

const fn default_stages() -> u8 {
    1
}

/// Container for all encounter data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EncounterData {
    #[serde(default)]
    pub encounters: Vec<EncounterRecord>,
}

impl EncounterData {
    /// Create empty encounter data (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_ENCOUNTER_DATA).unwrap_or_else(|err| {
            log::warn!("bundled encounter table rejected: {err}");
            Self::default()
        })
    }

    /// Load encounter data from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid encounter data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
