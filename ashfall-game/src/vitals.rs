//! Player vitals, effective attributes and threshold-derived status effects.
//!
//! Every mutation clamps into range and recomputes the threshold bands before
//! returning, so callers never observe a vital outside its bounds or a stale
//! band effect.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{EffectConfig, VitalsConfig};
use crate::constants::{
    ATTRIBUTE_FLOOR, BLEEDING_MAX_HEALTH, DEEP_WOUND_MAX_HEALTH, DERIVED_MAX_FLOOR,
    DIARRHEA_MAX_HUNGER, DISCOMFORT_MAX_HEALTH, ENERGY_HIGH, ENERGY_LOW, FRACTURE_AGILITY,
    HUNGER_HIGH, HUNGER_LOW, INFECTION_MAX_HEALTH, LOG_DEFEATED, LOG_SIDE_EFFECT,
    MUTATION_ATTRIBUTE_BONUS, MUTATION_MAX_HEALTH, RADIATION_DISCOMFORT, RADIATION_MUTATION,
    RADIATION_SICKNESS, SICKNESS_ATTRIBUTE_BONUS, SICKNESS_MAX_HEALTH,
};
use crate::effects::{
    Attribute, AttributeDeltas, EffectChange, EffectDuration, StatusEffect, StatusEffectRegistry,
    StatusKind, ThresholdFamily,
};
use crate::error::CommandError;
use crate::events::{GameEvent, Outbox};
use crate::numbers::{clamp_finite, i32_to_f32, ratio, round_to_i32};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    Health,
    Hunger,
    Energy,
    Radiation,
}

impl Vital {
    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::Health => "vital.health",
            Self::Hunger => "vital.hunger",
            Self::Energy => "vital.energy",
            Self::Radiation => "vital.radiation",
        }
    }
}

/// Base combat attributes before equipment and effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAttributes {
    pub strength: i32,
    pub accuracy: i32,
    pub agility: i32,
    pub defense: i32,
}

impl BaseAttributes {
    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Accuracy => self.accuracy,
            Attribute::Agility => self.agility,
            Attribute::Defense => self.defense,
            Attribute::MaxHealth | Attribute::MaxHunger => 0,
        }
    }

    fn get_mut(&mut self, attribute: Attribute) -> Option<&mut i32> {
        match attribute {
            Attribute::Strength => Some(&mut self.strength),
            Attribute::Accuracy => Some(&mut self.accuracy),
            Attribute::Agility => Some(&mut self.agility),
            Attribute::Defense => Some(&mut self.defense),
            Attribute::MaxHealth | Attribute::MaxHunger => None,
        }
    }
}

/// Status effect attached to a consumable, optionally rolled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusGrant {
    pub kind: StatusKind,
    /// Probability in `[0, 1]` that the grant lands.
    #[serde(default = "certain")]
    pub chance: f32,
    /// Overrides the injury catalog deltas.
    #[serde(default)]
    pub deltas: Option<AttributeDeltas>,
    #[serde(default)]
    pub duration_secs: Option<f32>,
}

const fn certain() -> f32 {
    1.0
}

/// Payload of an "item used" notification from the inventory collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemEffect {
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub hunger: f32,
    #[serde(default)]
    pub energy: f32,
    #[serde(default)]
    pub radiation: f32,
    #[serde(default)]
    pub cures: Option<StatusKind>,
    #[serde(default)]
    pub grant: Option<StatusGrant>,
    /// Temporary attribute bonus applied as [`StatusKind::ItemBoost`].
    #[serde(default)]
    pub boost: Option<AttributeDeltas>,
    #[serde(default)]
    pub boost_secs: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub cured: Option<StatusKind>,
    pub granted: Option<StatusKind>,
    pub boosted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjuryStatus {
    pub kind: StatusKind,
    pub remaining_secs: f32,
}

/// Scalar vitals state for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    pub health: i32,
    pub hunger: f32,
    pub energy: f32,
    pub radiation: f32,
    pub base: BaseAttributes,
}

/// Catalog deltas for an injury kind when the grant carries none.
#[must_use]
pub const fn default_injury_deltas(kind: StatusKind) -> AttributeDeltas {
    match kind {
        StatusKind::Infection => AttributeDeltas::NONE.with_max_health(INFECTION_MAX_HEALTH),
        StatusKind::Fracture => AttributeDeltas {
            agility: FRACTURE_AGILITY,
            ..AttributeDeltas::NONE
        },
        StatusKind::Bleeding => AttributeDeltas::NONE.with_max_health(BLEEDING_MAX_HEALTH),
        StatusKind::DeepWound => AttributeDeltas::NONE.with_max_health(DEEP_WOUND_MAX_HEALTH),
        StatusKind::Diarrhea => AttributeDeltas {
            max_hunger: DIARRHEA_MAX_HUNGER,
            ..AttributeDeltas::NONE
        },
        _ => AttributeDeltas::NONE,
    }
}

fn hunger_band(hunger: f32) -> Option<StatusEffect> {
    if hunger < HUNGER_LOW {
        Some(StatusEffect::derived(
            StatusKind::Undernourished,
            AttributeDeltas::offensive(1),
        ))
    } else if hunger > HUNGER_HIGH {
        Some(StatusEffect::derived(
            StatusKind::Overfed,
            AttributeDeltas::offensive(-1),
        ))
    } else {
        None
    }
}

fn energy_band(energy: f32) -> Option<StatusEffect> {
    if energy > ENERGY_HIGH {
        Some(StatusEffect::derived(
            StatusKind::Energized,
            AttributeDeltas::offensive(1),
        ))
    } else if energy < ENERGY_LOW {
        Some(StatusEffect::derived(
            StatusKind::Exhausted,
            AttributeDeltas::offensive(-1),
        ))
    } else {
        None
    }
}

fn radiation_band(radiation: f32) -> Option<StatusEffect> {
    if radiation > RADIATION_MUTATION {
        Some(StatusEffect::derived(
            StatusKind::Mutation,
            AttributeDeltas::offensive(MUTATION_ATTRIBUTE_BONUS).with_max_health(MUTATION_MAX_HEALTH),
        ))
    } else if radiation > RADIATION_SICKNESS {
        Some(StatusEffect::derived(
            StatusKind::RadiationSickness,
            AttributeDeltas::offensive(SICKNESS_ATTRIBUTE_BONUS)
                .with_max_health(SICKNESS_MAX_HEALTH),
        ))
    } else if radiation > RADIATION_DISCOMFORT {
        Some(StatusEffect::derived(
            StatusKind::RadiationDiscomfort,
            AttributeDeltas::NONE.with_max_health(DISCOMFORT_MAX_HEALTH),
        ))
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct VitalsController {
    config: VitalsConfig,
    effect_config: EffectConfig,
    health: i32,
    hunger: f32,
    energy: f32,
    radiation: f32,
    base: BaseAttributes,
    equipment: AttributeDeltas,
    effects: StatusEffectRegistry,
    carried_weight: f32,
    defeat_signaled: bool,
    recovery_armed: bool,
    recovery_pending: bool,
}

impl VitalsController {
    #[must_use]
    pub fn new(config: &VitalsConfig, effect_config: &EffectConfig) -> Self {
        let mut vitals = Self {
            config: config.clone(),
            effect_config: effect_config.clone(),
            health: config.start_health,
            hunger: config.start_hunger,
            energy: config.start_energy,
            radiation: config.start_radiation,
            base: BaseAttributes {
                strength: config.base_strength,
                accuracy: config.base_accuracy,
                agility: config.base_agility,
                defense: config.base_defense,
            },
            equipment: AttributeDeltas::NONE,
            effects: StatusEffectRegistry::new(),
            carried_weight: 0.0,
            defeat_signaled: false,
            recovery_armed: true,
            recovery_pending: false,
        };
        let mut scratch = Outbox::new();
        vitals.settle(&mut scratch);
        vitals
    }

    // Queries -------------------------------------------------------------

    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    #[must_use]
    pub const fn hunger(&self) -> f32 {
        self.hunger
    }

    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.energy
    }

    #[must_use]
    pub const fn radiation(&self) -> f32 {
        self.radiation
    }

    #[must_use]
    pub const fn max_energy(&self) -> f32 {
        self.config.max_energy
    }

    #[must_use]
    pub const fn max_radiation(&self) -> f32 {
        self.config.max_radiation
    }

    #[must_use]
    pub fn value(&self, vital: Vital) -> f32 {
        match vital {
            Vital::Health => i32_to_f32(self.health),
            Vital::Hunger => self.hunger,
            Vital::Energy => self.energy,
            Vital::Radiation => self.radiation,
        }
    }

    /// Upper bound currently in force for a vital.
    #[must_use]
    pub fn max(&self, vital: Vital) -> f32 {
        match vital {
            Vital::Health => i32_to_f32(self.effective_max_health()),
            Vital::Hunger => self.effective_max_hunger(),
            Vital::Energy => self.config.max_energy,
            Vital::Radiation => self.config.max_radiation,
        }
    }

    #[must_use]
    pub const fn base(&self) -> BaseAttributes {
        self.base
    }

    #[must_use]
    pub const fn equipment(&self) -> AttributeDeltas {
        self.equipment
    }

    /// Base plus equipment plus every active effect, floored at 1.
    #[must_use]
    pub fn effective(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::MaxHealth => self.effective_max_health(),
            Attribute::MaxHunger => round_to_i32(self.effective_max_hunger()),
            _ => self
                .base
                .get(attribute)
                .saturating_add(self.equipment.get(attribute))
                .saturating_add(self.effects.sum(attribute))
                .max(ATTRIBUTE_FLOOR),
        }
    }

    #[must_use]
    pub fn effective_max_health(&self) -> i32 {
        self.config
            .max_health
            .saturating_add(self.equipment.max_health)
            .saturating_add(self.effects.sum(Attribute::MaxHealth))
            .max(DERIVED_MAX_FLOOR)
    }

    #[must_use]
    pub fn effective_max_hunger(&self) -> f32 {
        let delta = i32_to_f32(self.effects.sum(Attribute::MaxHunger));
        (self.config.max_hunger + delta).max(i32_to_f32(DERIVED_MAX_FLOOR))
    }

    #[must_use]
    pub const fn effects(&self) -> &StatusEffectRegistry {
        &self.effects
    }

    #[must_use]
    pub const fn carried_weight(&self) -> f32 {
        self.carried_weight
    }

    #[must_use]
    pub const fn max_carry_weight(&self) -> f32 {
        self.config.max_carry_weight
    }

    #[must_use]
    pub fn weight_ratio(&self) -> f32 {
        ratio(self.carried_weight, self.config.max_carry_weight)
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.defeat_signaled
    }

    #[must_use]
    pub fn has_injury(&self) -> bool {
        self.effects.injuries().next().is_some()
    }

    #[must_use]
    pub fn injury_report(&self) -> Vec<InjuryStatus> {
        self.effects
            .injuries()
            .map(|effect| InjuryStatus {
                kind: effect.kind,
                remaining_secs: effect.remaining_secs().unwrap_or(0.0),
            })
            .collect()
    }

    // Mutations -----------------------------------------------------------

    /// Add `amount` to a vital, clamp, and recompute derived state.
    /// Health amounts are rounded half away from zero.
    pub fn apply_delta(&mut self, vital: Vital, amount: f32, outbox: &mut Outbox) {
        match vital {
            Vital::Health => self.change_health(round_to_i32(amount), outbox),
            Vital::Hunger => {
                let max = self.effective_max_hunger();
                self.hunger = clamp_finite(self.hunger + amount, 0.0, max);
                outbox.mark_vitals();
                self.settle(outbox);
            }
            Vital::Energy => {
                self.energy = clamp_finite(self.energy + amount, 0.0, self.config.max_energy);
                outbox.mark_vitals();
                self.settle(outbox);
            }
            Vital::Radiation => {
                self.radiation =
                    clamp_finite(self.radiation + amount, 0.0, self.config.max_radiation);
                outbox.mark_vitals();
                self.settle(outbox);
            }
        }
    }

    /// Set a vital to an absolute value, clamped.
    pub fn set(&mut self, vital: Vital, value: f32, outbox: &mut Outbox) {
        let current = self.value(vital);
        self.apply_delta(vital, value - current, outbox);
    }

    pub fn change_health(&mut self, amount: i32, outbox: &mut Outbox) {
        let max = self.effective_max_health();
        self.health = self.health.saturating_add(amount).clamp(0, max);
        outbox.mark_vitals();
        self.check_defeat(outbox);
    }

    /// Take damage; returns the amount actually removed.
    pub fn damage(&mut self, amount: i32, outbox: &mut Outbox) -> i32 {
        let before = self.health;
        self.change_health(-amount.max(0), outbox);
        before - self.health
    }

    /// Whether energy hit zero since the last call. Latched: one exhaustion
    /// yields exactly one `true` until energy climbs above zero again.
    pub fn take_forced_recovery(&mut self) -> bool {
        std::mem::take(&mut self.recovery_pending)
    }

    #[must_use]
    pub const fn forced_recovery_pending(&self) -> bool {
        self.recovery_pending
    }

    pub fn set_carried_weight(&mut self, weight: f32) -> bool {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        if (weight - self.carried_weight).abs() <= f32::EPSILON {
            return false;
        }
        self.carried_weight = weight;
        true
    }

    /// Replace the equipment contribution wholesale.
    pub fn set_equipment_bonus(&mut self, deltas: AttributeDeltas, outbox: &mut Outbox) {
        if self.equipment == deltas {
            return;
        }
        self.equipment = deltas;
        outbox.mark_vitals();
        self.reclamp(outbox);
    }

    /// Raise a base combat attribute by one.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotTrainable`] for derived maxima.
    pub fn train(&mut self, attribute: Attribute) -> Result<i32, CommandError> {
        let slot = self
            .base
            .get_mut(attribute)
            .ok_or(CommandError::NotTrainable { attribute })?;
        *slot = slot.saturating_add(1);
        Ok(*slot)
    }

    /// Grant an injury or item boost.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotGrantable`] for threshold-derived kinds.
    pub fn grant_status(
        &mut self,
        kind: StatusKind,
        deltas: Option<AttributeDeltas>,
        duration_secs: Option<f32>,
        outbox: &mut Outbox,
    ) -> Result<EffectChange, CommandError> {
        if kind.is_threshold() {
            return Err(CommandError::NotGrantable { kind });
        }
        let default_secs = if kind == StatusKind::ItemBoost {
            self.effect_config.item_boost_duration_secs
        } else {
            self.effect_config.injury_duration_secs
        };
        let change = self.effects.add_or_refresh(
            kind,
            deltas.unwrap_or_else(|| default_injury_deltas(kind)),
            EffectDuration::Timed {
                remaining_secs: duration_secs
                    .filter(|secs| secs.is_finite())
                    .unwrap_or(default_secs),
            },
        );
        // Refreshing swaps deltas too, so totals may move either way.
        outbox.mark_effects();
        outbox.mark_vitals();
        self.reclamp(outbox);
        Ok(change)
    }

    /// Remove an injury or item boost. `Ok(false)` when it was not active.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotCurable`] for threshold-derived kinds.
    pub fn cure(&mut self, kind: StatusKind, outbox: &mut Outbox) -> Result<bool, CommandError> {
        if kind.is_threshold() {
            return Err(CommandError::NotCurable { kind });
        }
        if self.effects.remove(kind).is_none() {
            return Ok(false);
        }
        outbox.mark_effects();
        outbox.mark_vitals();
        self.reclamp(outbox);
        Ok(true)
    }

    /// Apply a consumable. Validation happens before any mutation.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotCurable`] or [`CommandError::NotGrantable`]
    /// when the payload targets a threshold-derived kind.
    pub fn apply_item_effect<R>(
        &mut self,
        item: &ItemEffect,
        rng: &mut R,
        outbox: &mut Outbox,
    ) -> Result<ItemOutcome, CommandError>
    where
        R: Rng + ?Sized,
    {
        if let Some(kind) = item.cures.filter(|kind| kind.is_threshold()) {
            return Err(CommandError::NotCurable { kind });
        }
        if let Some(grant) = item.grant.filter(|grant| grant.kind.is_threshold()) {
            return Err(CommandError::NotGrantable { kind: grant.kind });
        }

        let mut outcome = ItemOutcome::default();
        if item.health != 0 {
            self.change_health(item.health, outbox);
        }
        if item.hunger != 0.0 {
            self.apply_delta(Vital::Hunger, item.hunger, outbox);
        }
        if item.energy != 0.0 {
            self.apply_delta(Vital::Energy, item.energy, outbox);
        }
        if item.radiation != 0.0 {
            self.apply_delta(Vital::Radiation, item.radiation, outbox);
        }
        if let Some(kind) = item.cures {
            if self.cure(kind, outbox)? {
                outcome.cured = Some(kind);
            }
        }
        if let Some(deltas) = item.boost.filter(|deltas| !deltas.is_empty()) {
            self.grant_status(StatusKind::ItemBoost, Some(deltas), item.boost_secs, outbox)?;
            outcome.boosted = true;
        }
        if let Some(grant) = item.grant {
            let roll: f32 = rng.r#gen();
            if roll < grant.chance {
                self.grant_status(grant.kind, grant.deltas, grant.duration_secs, outbox)?;
                outcome.granted = Some(grant.kind);
                log::info!("{LOG_SIDE_EFFECT}: {:?}", grant.kind);
                outbox.push(GameEvent::message(LOG_SIDE_EFFECT));
            }
        }
        Ok(outcome)
    }

    /// Count timed effects down and recompute bands.
    pub fn tick(&mut self, delta_secs: f32, outbox: &mut Outbox) {
        let expired = self.effects.tick(delta_secs);
        if !expired.is_empty() {
            for kind in &expired {
                log::debug!("status effect expired: {kind:?}");
                outbox.push(GameEvent::StatusEffectExpired { kind: *kind });
            }
            outbox.mark_effects();
            outbox.mark_vitals();
        }
        self.settle(outbox);
    }

    #[must_use]
    pub fn snapshot(&self) -> VitalsSnapshot {
        VitalsSnapshot {
            health: self.health,
            hunger: self.hunger,
            energy: self.energy,
            radiation: self.radiation,
            base: self.base,
        }
    }

    /// Load persisted scalars. Timed effects are not persisted.
    pub fn restore(&mut self, snapshot: &VitalsSnapshot, outbox: &mut Outbox) {
        self.effects.clear();
        self.base = snapshot.base;
        self.radiation = clamp_finite(snapshot.radiation, 0.0, self.config.max_radiation);
        self.energy = clamp_finite(snapshot.energy, 0.0, self.config.max_energy);
        self.settle(outbox);
        self.hunger = clamp_finite(snapshot.hunger, 0.0, self.effective_max_hunger());
        self.health = snapshot.health.clamp(0, self.effective_max_health());
        self.defeat_signaled = false;
        self.recovery_armed = self.energy > 0.0;
        self.recovery_pending = false;
        self.settle(outbox);
        outbox.mark_vitals();
        outbox.mark_effects();
        self.check_defeat(outbox);
    }

    // Internals -----------------------------------------------------------

    /// Recompute threshold bands, then re-clamp against new maxima.
    fn settle(&mut self, outbox: &mut Outbox) {
        let bands = [
            (ThresholdFamily::Hunger, hunger_band(self.hunger)),
            (ThresholdFamily::Energy, energy_band(self.energy)),
            (ThresholdFamily::Radiation, radiation_band(self.radiation)),
        ];
        let mut changed = false;
        for (family, wanted) in bands {
            changed |= self.effects.replace_family(family, wanted);
        }
        if changed {
            outbox.mark_effects();
            outbox.mark_vitals();
        }
        self.reclamp(outbox);
        self.check_exhaustion();
    }

    fn reclamp(&mut self, outbox: &mut Outbox) {
        let max_health = self.effective_max_health();
        if self.health > max_health {
            self.health = max_health;
            outbox.mark_vitals();
        }
        let max_hunger = self.effective_max_hunger();
        if self.hunger > max_hunger {
            self.hunger = max_hunger;
            outbox.mark_vitals();
            // Lower hunger may cross a band; bands never raise max hunger.
            let changed = self
                .effects
                .replace_family(ThresholdFamily::Hunger, hunger_band(self.hunger));
            if changed {
                outbox.mark_effects();
            }
        }
        self.check_defeat(outbox);
    }

    fn check_exhaustion(&mut self) {
        if self.energy <= 0.0 {
            if self.recovery_armed {
                self.recovery_armed = false;
                self.recovery_pending = true;
            }
        } else {
            self.recovery_armed = true;
        }
    }

    fn check_defeat(&mut self, outbox: &mut Outbox) {
        if self.health <= 0 && !self.defeat_signaled {
            self.defeat_signaled = true;
            log::info!("{LOG_DEFEATED}");
            outbox.push(GameEvent::Defeated);
        }
    }
}
