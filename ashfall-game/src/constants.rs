//! Centralized balance and tuning constants for Ashfall game logic.
//!
//! These values seed [`crate::config::BalanceConfig`] defaults and the
//! threshold tables that derive status effects from vitals. Threshold
//! bands are not data-driven: changing them changes the rules.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_DEFEATED: &str = "log.vitals.defeated";
pub(crate) const LOG_FORCED_RECOVERY: &str = "log.time.forced-recovery";
pub(crate) const LOG_REWARD_FOUND: &str = "log.encounter.reward-found";
pub(crate) const LOG_REWARD_EMPTY: &str = "log.encounter.reward-empty";
pub(crate) const LOG_SAVE_POINT: &str = "log.encounter.save-point";
pub(crate) const LOG_STORM: &str = "log.encounter.radiation-storm";
pub(crate) const LOG_CALM_WEATHER: &str = "log.encounter.calm-weather";
pub(crate) const LOG_SIDE_EFFECT: &str = "log.item.side-effect";

// Vitals -------------------------------------------------------------------
pub(crate) const MAX_HEALTH: i32 = 100;
pub(crate) const MAX_HUNGER: f32 = 100.0;
pub(crate) const MAX_ENERGY: f32 = 100.0;
pub(crate) const MAX_RADIATION: f32 = 100.0;
pub(crate) const BASE_ATTRIBUTE: i32 = 10;
pub(crate) const MAX_CARRY_WEIGHT: f32 = 25.0;
pub(crate) const ATTRIBUTE_FLOOR: i32 = 1;
pub(crate) const DERIVED_MAX_FLOOR: i32 = 1;

// Threshold bands ----------------------------------------------------------
pub(crate) const HUNGER_LOW: f32 = 30.0;
pub(crate) const HUNGER_HIGH: f32 = 70.0;
pub(crate) const ENERGY_LOW: f32 = 30.0;
pub(crate) const ENERGY_HIGH: f32 = 70.0;
pub(crate) const RADIATION_DISCOMFORT: f32 = 40.0;
pub(crate) const RADIATION_SICKNESS: f32 = 60.0;
pub(crate) const RADIATION_MUTATION: f32 = 80.0;
pub(crate) const DISCOMFORT_MAX_HEALTH: i32 = -20;
pub(crate) const SICKNESS_MAX_HEALTH: i32 = -30;
pub(crate) const MUTATION_MAX_HEALTH: i32 = -60;
pub(crate) const SICKNESS_ATTRIBUTE_BONUS: i32 = 1;
pub(crate) const MUTATION_ATTRIBUTE_BONUS: i32 = 3;

// Injury catalog -----------------------------------------------------------
pub(crate) const INFECTION_MAX_HEALTH: i32 = -15;
pub(crate) const FRACTURE_AGILITY: i32 = -2;
pub(crate) const BLEEDING_MAX_HEALTH: i32 = -10;
pub(crate) const DEEP_WOUND_MAX_HEALTH: i32 = -30;
pub(crate) const DIARRHEA_MAX_HUNGER: i32 = -30;
pub(crate) const INJURY_DURATION_SECS: f32 = 3_600.0;
pub(crate) const ITEM_BOOST_DURATION_SECS: f32 = 600.0;

// Movement and time --------------------------------------------------------
pub(crate) const SEGMENTS_PER_DAY: u8 = 4;
pub(crate) const MOVE_HUNGER_COST: f32 = 5.0;
pub(crate) const MOVE_ENERGY_BASE: f32 = 10.0;
pub(crate) const EVENT_HUNGER_COST: f32 = 5.0;
pub(crate) const EVENT_ENERGY_COST: f32 = 10.0;
pub(crate) const COMBAT_HUNGER_COST: f32 = 5.0;
pub(crate) const COMBAT_ENERGY_COST: f32 = 15.0;
pub(crate) const AUTO_ADVANCE_DELAY_SECS: f32 = 1.0;
pub(crate) const FORCED_RECOVERY_ENERGY: f32 = 50.0;
pub(crate) const FORCED_RECOVERY_SEGMENTS: u8 = 2;

/// Weight-ratio bands: `(upper bound, moves per segment, energy multiplier)`.
/// The last band catches everything at or above the final bound.
pub(crate) const LOAD_BANDS: [(f32, u8, f32); 4] = [
    (0.4, 4, 0.5),
    (0.6, 3, 1.0),
    (0.8, 2, 1.5),
    (f32::INFINITY, 1, 2.0),
];

// Rest ---------------------------------------------------------------------
pub(crate) const REST_HUNGER_COST: f32 = 5.0;
pub(crate) const TRAIN_ENERGY_COST: f32 = 20.0;
pub(crate) const CRAFT_ENERGY_COST: f32 = 20.0;
pub(crate) const DAY_SLEEP_ENERGY: f32 = 20.0;
pub(crate) const NIGHT_SLEEP_ENERGY: f32 = 30.0;
pub(crate) const SLEEP_HEALTH: i32 = 10;
pub(crate) const REST_PANEL_SECS: f32 = 2.0;
pub(crate) const CRAFT_PANEL_SECS: f32 = 1.0;

// Combat -------------------------------------------------------------------
pub(crate) const DIFFICULTY_MODIFIER: i32 = 10;
pub(crate) const DAMAGE_SCALE: f32 = 0.5;
pub(crate) const MIN_DAMAGE: i32 = 1;
pub(crate) const ATTACK_DICE: u32 = 3;
pub(crate) const ESCAPE_DICE: u32 = 1;
pub(crate) const DIE_SIDES: u32 = 6;
pub(crate) const COMBAT_PANEL_SECS: f32 = 2.0;

// Encounters ---------------------------------------------------------------
pub(crate) const SCRAP_YARD_CHANCE: f32 = 0.7;
pub(crate) const MEDICAL_STATION_CHANCE: f32 = 0.6;
pub(crate) const RESTAURANT_CHANCE: f32 = 0.5;
pub(crate) const RESTAURANT_HUNGER: f32 = 20.0;
pub(crate) const STORM_DAMAGE: i32 = 10;
pub(crate) const STORM_RADIATION: f32 = 15.0;
