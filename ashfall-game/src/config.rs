//! Balance configuration.
//!
//! Every tunable is grouped by the controller that reads it. Missing JSON
//! fields fall back to the coded defaults in [`crate::constants`].
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    AUTO_ADVANCE_DELAY_SECS, BASE_ATTRIBUTE, COMBAT_ENERGY_COST, COMBAT_HUNGER_COST,
    COMBAT_PANEL_SECS, CRAFT_ENERGY_COST, CRAFT_PANEL_SECS, DAMAGE_SCALE, DAY_SLEEP_ENERGY,
    DIFFICULTY_MODIFIER, EVENT_ENERGY_COST, EVENT_HUNGER_COST, FORCED_RECOVERY_ENERGY,
    FORCED_RECOVERY_SEGMENTS, INJURY_DURATION_SECS, ITEM_BOOST_DURATION_SECS, MAX_CARRY_WEIGHT,
    MAX_ENERGY, MAX_HEALTH, MAX_HUNGER, MAX_RADIATION, MEDICAL_STATION_CHANCE, MIN_DAMAGE,
    MOVE_ENERGY_BASE, MOVE_HUNGER_COST, NIGHT_SLEEP_ENERGY, REST_HUNGER_COST, REST_PANEL_SECS,
    RESTAURANT_CHANCE, RESTAURANT_HUNGER, SCRAP_YARD_CHANCE, SLEEP_HEALTH, STORM_DAMAGE,
    STORM_RADIATION, TRAIN_ENERGY_COST,
};

const DEFAULT_BALANCE_DATA: &str = include_str!("../data/balance.json");

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid balance json: {0}")]
    Parse(String),
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} starts at {value}, outside [0, {max}]")]
    StartOutOfRange {
        field: &'static str,
        value: f32,
        max: f32,
    },
    #[error("probability {field} must lie in [0, 1] (got {value})")]
    Probability { field: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsConfig {
    #[serde(default = "default_max_health")]
    pub max_health: i32,
    #[serde(default = "default_max_hunger")]
    pub max_hunger: f32,
    #[serde(default = "default_max_energy")]
    pub max_energy: f32,
    #[serde(default = "default_max_radiation")]
    pub max_radiation: f32,
    #[serde(default = "default_max_health")]
    pub start_health: i32,
    #[serde(default = "default_max_hunger")]
    pub start_hunger: f32,
    #[serde(default = "default_max_energy")]
    pub start_energy: f32,
    #[serde(default)]
    pub start_radiation: f32,
    #[serde(default = "default_base_attribute")]
    pub base_strength: i32,
    #[serde(default = "default_base_attribute")]
    pub base_accuracy: i32,
    #[serde(default = "default_base_attribute")]
    pub base_agility: i32,
    #[serde(default = "default_base_attribute")]
    pub base_defense: i32,
    #[serde(default = "default_max_carry_weight")]
    pub max_carry_weight: f32,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            max_health: MAX_HEALTH,
            max_hunger: MAX_HUNGER,
            max_energy: MAX_ENERGY,
            max_radiation: MAX_RADIATION,
            start_health: MAX_HEALTH,
            start_hunger: MAX_HUNGER,
            start_energy: MAX_ENERGY,
            start_radiation: 0.0,
            base_strength: BASE_ATTRIBUTE,
            base_accuracy: BASE_ATTRIBUTE,
            base_agility: BASE_ATTRIBUTE,
            base_defense: BASE_ATTRIBUTE,
            max_carry_weight: MAX_CARRY_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    #[serde(default = "default_move_hunger_cost")]
    pub move_hunger_cost: f32,
    #[serde(default = "default_move_energy_base")]
    pub move_energy_base: f32,
    #[serde(default = "default_event_hunger_cost")]
    pub event_hunger_cost: f32,
    #[serde(default = "default_event_energy_cost")]
    pub event_energy_cost: f32,
    #[serde(default = "default_combat_hunger_cost")]
    pub combat_hunger_cost: f32,
    #[serde(default = "default_combat_energy_cost")]
    pub combat_energy_cost: f32,
    #[serde(default = "default_auto_advance_delay")]
    pub auto_advance_delay_secs: f32,
    #[serde(default = "default_forced_recovery_energy")]
    pub forced_recovery_energy: f32,
    #[serde(default = "default_forced_recovery_segments")]
    pub forced_recovery_segments: u8,
    /// Real-time seconds per segment; `None` keeps time move-driven only.
    #[serde(default)]
    pub segment_period_secs: Option<f32>,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            move_hunger_cost: MOVE_HUNGER_COST,
            move_energy_base: MOVE_ENERGY_BASE,
            event_hunger_cost: EVENT_HUNGER_COST,
            event_energy_cost: EVENT_ENERGY_COST,
            combat_hunger_cost: COMBAT_HUNGER_COST,
            combat_energy_cost: COMBAT_ENERGY_COST,
            auto_advance_delay_secs: AUTO_ADVANCE_DELAY_SECS,
            forced_recovery_energy: FORCED_RECOVERY_ENERGY,
            forced_recovery_segments: FORCED_RECOVERY_SEGMENTS,
            segment_period_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_hunger_cost")]
    pub hunger_cost: f32,
    #[serde(default = "default_train_energy_cost")]
    pub train_energy_cost: f32,
    #[serde(default = "default_craft_energy_cost")]
    pub craft_energy_cost: f32,
    #[serde(default = "default_day_sleep_energy")]
    pub day_sleep_energy: f32,
    #[serde(default = "default_night_sleep_energy")]
    pub night_sleep_energy: f32,
    #[serde(default = "default_sleep_health")]
    pub sleep_health: i32,
    #[serde(default = "default_rest_panel_secs")]
    pub panel_secs: f32,
    #[serde(default = "default_craft_panel_secs")]
    pub craft_panel_secs: f32,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            hunger_cost: REST_HUNGER_COST,
            train_energy_cost: TRAIN_ENERGY_COST,
            craft_energy_cost: CRAFT_ENERGY_COST,
            day_sleep_energy: DAY_SLEEP_ENERGY,
            night_sleep_energy: NIGHT_SLEEP_ENERGY,
            sleep_health: SLEEP_HEALTH,
            panel_secs: REST_PANEL_SECS,
            craft_panel_secs: CRAFT_PANEL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    #[serde(default = "default_difficulty_modifier")]
    pub difficulty_modifier: i32,
    #[serde(default = "default_damage_scale")]
    pub damage_scale: f32,
    #[serde(default = "default_min_damage")]
    pub min_damage: i32,
    #[serde(default = "default_combat_panel_secs")]
    pub panel_close_secs: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            difficulty_modifier: DIFFICULTY_MODIFIER,
            damage_scale: DAMAGE_SCALE,
            min_damage: MIN_DAMAGE,
            panel_close_secs: COMBAT_PANEL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    #[serde(default = "default_scrap_yard_chance")]
    pub scrap_yard_chance: f32,
    #[serde(default = "default_medical_station_chance")]
    pub medical_station_chance: f32,
    #[serde(default = "default_restaurant_chance")]
    pub restaurant_chance: f32,
    #[serde(default = "default_restaurant_hunger")]
    pub restaurant_hunger: f32,
    #[serde(default = "default_storm_damage")]
    pub storm_damage: i32,
    #[serde(default = "default_storm_radiation")]
    pub storm_radiation: f32,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            scrap_yard_chance: SCRAP_YARD_CHANCE,
            medical_station_chance: MEDICAL_STATION_CHANCE,
            restaurant_chance: RESTAURANT_CHANCE,
            restaurant_hunger: RESTAURANT_HUNGER,
            storm_damage: STORM_DAMAGE,
            storm_radiation: STORM_RADIATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    #[serde(default = "default_injury_duration")]
    pub injury_duration_secs: f32,
    #[serde(default = "default_item_boost_duration")]
    pub item_boost_duration_secs: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            injury_duration_secs: INJURY_DURATION_SECS,
            item_boost_duration_secs: ITEM_BOOST_DURATION_SECS,
        }
    }
}

/// All tunables for one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceConfig {
    #[serde(default)]
    pub vitals: VitalsConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub encounters: EncounterConfig,
    #[serde(default)]
    pub effects: EffectConfig,
}

impl BalanceConfig {
    /// Parse the bundled balance asset, falling back to coded defaults.
    #[must_use]
    pub fn load_from_static() -> Self {
        match Self::from_json(DEFAULT_BALANCE_DATA) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("bundled balance data rejected, using defaults: {err}");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self::load_from_static()
    }

    /// Parse and validate a balance document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the matching
    /// variant for the first violated constraint.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints the controllers rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.vitals;
        positive("vitals.max_health", crate::numbers::i32_to_f32(v.max_health))?;
        positive("vitals.max_hunger", v.max_hunger)?;
        positive("vitals.max_energy", v.max_energy)?;
        positive("vitals.max_radiation", v.max_radiation)?;
        positive("vitals.max_carry_weight", v.max_carry_weight)?;
        within(
            "vitals.start_health",
            crate::numbers::i32_to_f32(v.start_health),
            crate::numbers::i32_to_f32(v.max_health),
        )?;
        within("vitals.start_hunger", v.start_hunger, v.max_hunger)?;
        within("vitals.start_energy", v.start_energy, v.max_energy)?;
        within("vitals.start_radiation", v.start_radiation, v.max_radiation)?;

        let t = &self.time;
        for (field, value) in [
            ("time.move_hunger_cost", t.move_hunger_cost),
            ("time.move_energy_base", t.move_energy_base),
            ("time.event_hunger_cost", t.event_hunger_cost),
            ("time.event_energy_cost", t.event_energy_cost),
            ("time.combat_hunger_cost", t.combat_hunger_cost),
            ("time.combat_energy_cost", t.combat_energy_cost),
            ("time.auto_advance_delay_secs", t.auto_advance_delay_secs),
        ] {
            non_negative(field, value)?;
        }
        positive("time.forced_recovery_energy", t.forced_recovery_energy)?;
        if let Some(period) = t.segment_period_secs {
            positive("time.segment_period_secs", period)?;
        }

        let r = &self.rest;
        for (field, value) in [
            ("rest.hunger_cost", r.hunger_cost),
            ("rest.train_energy_cost", r.train_energy_cost),
            ("rest.craft_energy_cost", r.craft_energy_cost),
            ("rest.day_sleep_energy", r.day_sleep_energy),
            ("rest.night_sleep_energy", r.night_sleep_energy),
            ("rest.panel_secs", r.panel_secs),
            ("rest.craft_panel_secs", r.craft_panel_secs),
        ] {
            non_negative(field, value)?;
        }

        let c = &self.combat;
        positive("combat.damage_scale", c.damage_scale)?;
        non_negative("combat.panel_close_secs", c.panel_close_secs)?;

        let e = &self.encounters;
        for (field, value) in [
            ("encounters.scrap_yard_chance", e.scrap_yard_chance),
            ("encounters.medical_station_chance", e.medical_station_chance),
            ("encounters.restaurant_chance", e.restaurant_chance),
        ] {
            probability(field, value)?;
        }
        non_negative("encounters.storm_radiation", e.storm_radiation)?;

        positive("effects.injury_duration_secs", self.effects.injury_duration_secs)?;
        positive(
            "effects.item_boost_duration_secs",
            self.effects.item_boost_duration_secs,
        )?;
        Ok(())
    }
}

/// Validate a reward chance carried outside the balance document.
///
/// # Errors
///
/// Returns [`ConfigError::Probability`] when `value` is not in `[0, 1]`.
pub fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn within(field: &'static str, value: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::StartOutOfRange { field, value, max })
    }
}

const fn default_max_health() -> i32 {
    MAX_HEALTH
}
const fn default_max_hunger() -> f32 {
    MAX_HUNGER
}
const fn default_max_energy() -> f32 {
    MAX_ENERGY
}
const fn default_max_radiation() -> f32 {
    MAX_RADIATION
}
const fn default_base_attribute() -> i32 {
    BASE_ATTRIBUTE
}
const fn default_max_carry_weight() -> f32 {
    MAX_CARRY_WEIGHT
}
const fn default_move_hunger_cost() -> f32 {
    MOVE_HUNGER_COST
}
const fn default_move_energy_base() -> f32 {
    MOVE_ENERGY_BASE
}
const fn default_event_hunger_cost() -> f32 {
    EVENT_HUNGER_COST
}
const fn default_event_energy_cost() -> f32 {
    EVENT_ENERGY_COST
}
const fn default_combat_hunger_cost() -> f32 {
    COMBAT_HUNGER_COST
}
const fn default_combat_energy_cost() -> f32 {
    COMBAT_ENERGY_COST
}
const fn default_auto_advance_delay() -> f32 {
    AUTO_ADVANCE_DELAY_SECS
}
const fn default_forced_recovery_energy() -> f32 {
    FORCED_RECOVERY_ENERGY
}
const fn default_forced_recovery_segments() -> u8 {
    FORCED_RECOVERY_SEGMENTS
}
const fn default_rest_hunger_cost() -> f32 {
    REST_HUNGER_COST
}
const fn default_train_energy_cost() -> f32 {
    TRAIN_ENERGY_COST
}
const fn default_craft_energy_cost() -> f32 {
    CRAFT_ENERGY_COST
}
const fn default_day_sleep_energy() -> f32 {
    DAY_SLEEP_ENERGY
}
const fn default_night_sleep_energy() -> f32 {
    NIGHT_SLEEP_ENERGY
}
const fn default_sleep_health() -> i32 {
    SLEEP_HEALTH
}
const fn default_rest_panel_secs() -> f32 {
    REST_PANEL_SECS
}
const fn default_craft_panel_secs() -> f32 {
    CRAFT_PANEL_SECS
}
const fn default_difficulty_modifier() -> i32 {
    DIFFICULTY_MODIFIER
}
const fn default_damage_scale() -> f32 {
    DAMAGE_SCALE
}
const fn default_min_damage() -> i32 {
    MIN_DAMAGE
}
const fn default_combat_panel_secs() -> f32 {
    COMBAT_PANEL_SECS
}
const fn default_scrap_yard_chance() -> f32 {
    SCRAP_YARD_CHANCE
}
const fn default_medical_station_chance() -> f32 {
    MEDICAL_STATION_CHANCE
}
const fn default_restaurant_chance() -> f32 {
    RESTAURANT_CHANCE
}
const fn default_restaurant_hunger() -> f32 {
    RESTAURANT_HUNGER
}
const fn default_storm_damage() -> i32 {
    STORM_DAMAGE
}
const fn default_storm_radiation() -> f32 {
    STORM_RADIATION
}
const fn default_injury_duration() -> f32 {
    INJURY_DURATION_SECS
}
const fn default_item_boost_duration() -> f32 {
    ITEM_BOOST_DURATION_SECS
}
