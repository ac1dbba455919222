//! Grid-keyed encounters and their dispatch.
//!
//! Coordinates arrive already resolved by the movement layer. A one-shot
//! descriptor is consumed the moment it is taken, so a second lookup at the
//! same coordinate yields nothing.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::combat::{BattleDescriptor, CombatEngine};
use crate::config::EncounterConfig;
use crate::constants::{LOG_CALM_WEATHER, LOG_REWARD_EMPTY, LOG_REWARD_FOUND, LOG_SAVE_POINT, LOG_STORM};
use crate::data::{EncounterData, EncounterRecord, EnemyCatalog, EnemySpec};
use crate::error::CommandError;
use crate::events::{GameEvent, Outbox};
use crate::scheduler::TimeScheduler;
use crate::vitals::{Vital, VitalsController};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterCategory {
    Resource,
    Haven,
    Combat,
    Environmental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    ScrapYard,
    MedicalStation,
    AbandonedRestaurant,
    AbandonedCamp,
    RaiderCamp,
    AnimalGroup,
    RadiationAnimalGroup,
    WanderingRaider,
    Airdrop,
    RadiationStorm,
    NormalWeather,
    Damage,
    Heal,
}

impl EncounterKind {
    #[must_use]
    pub const fn category(self) -> EncounterCategory {
        match self {
            Self::ScrapYard | Self::MedicalStation | Self::AbandonedRestaurant => {
                EncounterCategory::Resource
            }
            Self::AbandonedCamp => EncounterCategory::Haven,
            Self::RaiderCamp
            | Self::AnimalGroup
            | Self::RadiationAnimalGroup
            | Self::WanderingRaider
            | Self::Airdrop => EncounterCategory::Combat,
            Self::RadiationStorm | Self::NormalWeather | Self::Damage | Self::Heal => {
                EncounterCategory::Environmental
            }
        }
    }

    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::ScrapYard => "encounter.scrap-yard",
            Self::MedicalStation => "encounter.medical-station",
            Self::AbandonedRestaurant => "encounter.abandoned-restaurant",
            Self::AbandonedCamp => "encounter.abandoned-camp",
            Self::RaiderCamp => "encounter.raider-camp",
            Self::AnimalGroup => "encounter.animal-group",
            Self::RadiationAnimalGroup => "encounter.radiation-animal-group",
            Self::WanderingRaider => "encounter.wandering-raider",
            Self::Airdrop => "encounter.airdrop",
            Self::RadiationStorm => "encounter.radiation-storm",
            Self::NormalWeather => "encounter.normal-weather",
            Self::Damage => "encounter.damage",
            Self::Heal => "encounter.heal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncounterTableError {
    #[error("two encounters share coordinate {0}")]
    DuplicateCoordinate(GridCoord),
    #[error("combat encounter at {0} has no enemy")]
    MissingEnemy(GridCoord),
    #[error("encounter at {coord} names unknown enemy `{id}`")]
    UnknownEnemy { coord: GridCoord, id: String },
    #[error("combat encounter at {0} has zero stages")]
    ZeroStages(GridCoord),
    #[error("encounter at {coord} has reward chance {value} outside [0, 1]")]
    InvalidChance { coord: GridCoord, value: f32 },
}

/// A resolved, ready-to-dispatch encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterDescriptor {
    pub coord: GridCoord,
    pub kind: EncounterKind,
    pub one_shot: bool,
    #[serde(default)]
    pub battle: Option<BattleDescriptor>,
    #[serde(default)]
    pub reward_chance: Option<f32>,
    #[serde(default)]
    pub amount: i32,
}

impl EncounterDescriptor {
    #[must_use]
    pub const fn new(coord: GridCoord, kind: EncounterKind, one_shot: bool) -> Self {
        Self {
            coord,
            kind,
            one_shot,
            battle: None,
            reward_chance: None,
            amount: 0,
        }
    }

    #[must_use]
    pub fn with_battle(mut self, battle: BattleDescriptor) -> Self {
        self.battle = Some(battle);
        self
    }

    #[must_use]
    pub const fn with_reward_chance(mut self, chance: f32) -> Self {
        self.reward_chance = Some(chance);
        self
    }

    #[must_use]
    pub const fn with_amount(mut self, amount: i32) -> Self {
        self.amount = amount;
        self
    }

    fn resolve(
        record: &EncounterRecord,
        catalog: &EnemyCatalog,
    ) -> Result<Self, EncounterTableError> {
        let coord = GridCoord::new(record.x, record.y);
        if let Some(value) = record.reward_chance {
            if !(0.0..=1.0).contains(&value) {
                return Err(EncounterTableError::InvalidChance { coord, value });
            }
        }
        let mut descriptor = Self {
            coord,
            kind: record.kind,
            one_shot: record.one_shot,
            battle: None,
            reward_chance: record.reward_chance,
            amount: record.amount,
        };
        if record.kind.category() == EncounterCategory::Combat {
            if record.stages == 0 {
                return Err(EncounterTableError::ZeroStages(coord));
            }
            let (enemy, catalog_ranged) = match &record.enemy {
                None => return Err(EncounterTableError::MissingEnemy(coord)),
                Some(EnemySpec::Inline(enemy)) => (enemy.clone(), false),
                Some(EnemySpec::Catalog(id)) => {
                    let entry = catalog.get(id).ok_or_else(|| EncounterTableError::UnknownEnemy {
                        coord,
                        id: id.clone(),
                    })?;
                    (entry.to_enemy(), entry.ranged_only)
                }
            };
            descriptor.battle = Some(BattleDescriptor::new(
                enemy,
                record.ranged_only.unwrap_or(catalog_ranged),
                record.stages,
            ));
        }
        Ok(descriptor)
    }
}

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    NoEvent,
    Reward { kind: EncounterKind, found: bool },
    SavePoint,
    BattleStarted,
    Environmental { kind: EncounterKind },
}

/// Everything a dispatch may touch, borrowed from the session for one call.
pub struct EncounterContext<'a, R: ?Sized> {
    pub vitals: &'a mut VitalsController,
    pub scheduler: &'a TimeScheduler,
    pub combat: &'a mut CombatEngine,
    pub rng: &'a mut R,
}

#[derive(Debug, Clone)]
pub struct EncounterDispatcher {
    config: EncounterConfig,
    table: BTreeMap<GridCoord, EncounterDescriptor>,
    triggered: BTreeSet<GridCoord>,
}

impl EncounterDispatcher {
    /// Build a dispatcher from already-resolved descriptors.
    ///
    /// # Errors
    ///
    /// Rejects duplicate coordinates and combat descriptors without a battle.
    pub fn new(
        descriptors: impl IntoIterator<Item = EncounterDescriptor>,
        config: &EncounterConfig,
    ) -> Result<Self, EncounterTableError> {
        let mut table = BTreeMap::new();
        for descriptor in descriptors {
            let coord = descriptor.coord;
            if descriptor.kind.category() == EncounterCategory::Combat {
                match &descriptor.battle {
                    None => return Err(EncounterTableError::MissingEnemy(coord)),
                    Some(battle) if battle.stages == 0 => {
                        return Err(EncounterTableError::ZeroStages(coord));
                    }
                    Some(_) => {}
                }
            }
            if table.insert(coord, descriptor).is_some() {
                return Err(EncounterTableError::DuplicateCoordinate(coord));
            }
        }
        Ok(Self {
            config: config.clone(),
            table,
            triggered: BTreeSet::new(),
        })
    }

    /// Resolve authored records against the enemy catalog.
    ///
    /// # Errors
    ///
    /// Any [`EncounterTableError`] found while resolving.
    pub fn from_data(
        data: &EncounterData,
        catalog: &EnemyCatalog,
        config: &EncounterConfig,
    ) -> Result<Self, EncounterTableError> {
        let descriptors = data
            .encounters
            .iter()
            .map(|record| EncounterDescriptor::resolve(record, catalog))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(descriptors, config)
    }

    #[must_use]
    pub fn empty(config: &EncounterConfig) -> Self {
        Self {
            config: config.clone(),
            table: BTreeMap::new(),
            triggered: BTreeSet::new(),
        }
    }

    /// Descriptor at `coord` if it can still fire.
    #[must_use]
    pub fn peek(&self, coord: GridCoord) -> Option<&EncounterDescriptor> {
        self.table
            .get(&coord)
            .filter(|descriptor| !(descriptor.one_shot && self.triggered.contains(&coord)))
    }

    /// Take the descriptor at `coord`, consuming it when one-shot.
    pub fn take(&mut self, coord: GridCoord) -> Option<EncounterDescriptor> {
        let descriptor = self.peek(coord)?.clone();
        if descriptor.one_shot {
            self.triggered.insert(coord);
        }
        Some(descriptor)
    }

    /// Descriptors that can still fire, in coordinate order.
    pub fn active_encounters(&self) -> impl Iterator<Item = &EncounterDescriptor> {
        self.table
            .values()
            .filter(|descriptor| !(descriptor.one_shot && self.triggered.contains(&descriptor.coord)))
    }

    #[must_use]
    pub fn triggered(&self) -> Vec<GridCoord> {
        self.triggered.iter().copied().collect()
    }

    /// Mark coordinates as already fired, e.g. after loading a save.
    pub fn restore_triggered(&mut self, coords: &[GridCoord]) {
        self.triggered = coords
            .iter()
            .copied()
            .filter(|coord| self.table.contains_key(coord))
            .collect();
    }

    /// Re-arm every one-shot descriptor.
    pub fn reset(&mut self) {
        self.triggered.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn default_chance(&self, kind: EncounterKind) -> f32 {
        match kind {
            EncounterKind::ScrapYard => self.config.scrap_yard_chance,
            EncounterKind::MedicalStation => self.config.medical_station_chance,
            EncounterKind::AbandonedRestaurant => self.config.restaurant_chance,
            _ => 0.0,
        }
    }

    /// Fire the encounter at `coord`: charge the event cost, then branch on
    /// its category.
    ///
    /// # Errors
    ///
    /// [`CommandError::BattleInProgress`] while a battle is running; the
    /// descriptor is not consumed.
    pub fn dispatch<R>(
        &mut self,
        coord: GridCoord,
        ctx: &mut EncounterContext<'_, R>,
        outbox: &mut Outbox,
    ) -> Result<DispatchOutcome, CommandError>
    where
        R: Rng + ?Sized,
    {
        if ctx.combat.is_in_combat() {
            return Err(CommandError::BattleInProgress);
        }
        let Some(descriptor) = self.take(coord) else {
            return Ok(DispatchOutcome::NoEvent);
        };
        let kind = descriptor.kind;
        log::debug!("encounter {kind:?} at {coord}");
        ctx.scheduler.consume_event(ctx.vitals, outbox);
        outbox.push(GameEvent::EncounterTriggered { coord, kind });

        let outcome = match kind.category() {
            EncounterCategory::Resource => {
                let chance = descriptor
                    .reward_chance
                    .unwrap_or_else(|| self.default_chance(kind));
                let roll: f32 = ctx.rng.r#gen();
                let found = roll < chance;
                if found {
                    if kind == EncounterKind::AbandonedRestaurant {
                        ctx.vitals
                            .apply_delta(Vital::Hunger, self.config.restaurant_hunger, outbox);
                    }
                    log::info!("{LOG_REWARD_FOUND}: {kind:?} at {coord}");
                    outbox.push(GameEvent::RewardFound { coord, kind });
                } else {
                    log::info!("{LOG_REWARD_EMPTY}: {kind:?} at {coord}");
                    outbox.push(GameEvent::RewardMissed { coord, kind });
                }
                DispatchOutcome::Reward { kind, found }
            }
            EncounterCategory::Haven => {
                log::info!("{LOG_SAVE_POINT}: {coord}");
                outbox.push(GameEvent::SavePoint { coord });
                DispatchOutcome::SavePoint
            }
            EncounterCategory::Combat => {
                let Some(battle) = descriptor.battle else {
                    // Construction guarantees a battle for combat kinds.
                    return Ok(DispatchOutcome::NoEvent);
                };
                ctx.combat.start(battle, outbox)?;
                ctx.scheduler.consume_combat(ctx.vitals, outbox);
                DispatchOutcome::BattleStarted
            }
            EncounterCategory::Environmental => {
                match kind {
                    EncounterKind::RadiationStorm => {
                        log::info!("{LOG_STORM}: {coord}");
                        ctx.vitals.damage(self.config.storm_damage, outbox);
                        ctx.vitals
                            .apply_delta(Vital::Radiation, self.config.storm_radiation, outbox);
                        outbox.push(GameEvent::message(LOG_STORM));
                    }
                    EncounterKind::Damage => {
                        ctx.vitals.damage(descriptor.amount, outbox);
                    }
                    EncounterKind::Heal => {
                        ctx.vitals.change_health(descriptor.amount.max(0), outbox);
                    }
                    _ => {
                        outbox.push(GameEvent::message(LOG_CALM_WEATHER));
                    }
                }
                DispatchOutcome::Environmental { kind }
            }
        };
        Ok(outcome)
    }
}
