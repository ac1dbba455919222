//! Status effects: named modifier bundles keyed by kind.
//!
//! The registry holds at most one effect per [`StatusKind`]. Re-adding a kind
//! swaps in the new deltas and duration in place, so the active count never
//! grows from a refresh.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Attributes that status effects and equipment can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Strength,
    Accuracy,
    Agility,
    Defense,
    MaxHealth,
    MaxHunger,
}

impl Attribute {
    /// The four attributes that feed dice checks.
    pub const COMBAT: [Self; 4] = [
        Self::Strength,
        Self::Accuracy,
        Self::Agility,
        Self::Defense,
    ];

    #[must_use]
    pub const fn is_combat(self) -> bool {
        matches!(
            self,
            Self::Strength | Self::Accuracy | Self::Agility | Self::Defense
        )
    }

    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::Strength => "attribute.strength",
            Self::Accuracy => "attribute.accuracy",
            Self::Agility => "attribute.agility",
            Self::Defense => "attribute.defense",
            Self::MaxHealth => "attribute.max-health",
            Self::MaxHunger => "attribute.max-hunger",
        }
    }
}

/// Which vital a threshold-derived effect is recomputed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdFamily {
    Hunger,
    Energy,
    Radiation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Undernourished,
    Overfed,
    Energized,
    Exhausted,
    RadiationDiscomfort,
    RadiationSickness,
    Mutation,
    Infection,
    Fracture,
    Bleeding,
    DeepWound,
    Diarrhea,
    ItemBoost,
}

impl StatusKind {
    pub const INJURIES: [Self; 5] = [
        Self::Infection,
        Self::Fracture,
        Self::Bleeding,
        Self::DeepWound,
        Self::Diarrhea,
    ];

    /// Family for kinds recomputed from vitals; `None` for timed kinds.
    #[must_use]
    pub const fn family(self) -> Option<ThresholdFamily> {
        match self {
            Self::Undernourished | Self::Overfed => Some(ThresholdFamily::Hunger),
            Self::Energized | Self::Exhausted => Some(ThresholdFamily::Energy),
            Self::RadiationDiscomfort | Self::RadiationSickness | Self::Mutation => {
                Some(ThresholdFamily::Radiation)
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_threshold(self) -> bool {
        self.family().is_some()
    }

    #[must_use]
    pub const fn is_injury(self) -> bool {
        matches!(
            self,
            Self::Infection | Self::Fracture | Self::Bleeding | Self::DeepWound | Self::Diarrhea
        )
    }

    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::Undernourished => "status.undernourished",
            Self::Overfed => "status.overfed",
            Self::Energized => "status.energized",
            Self::Exhausted => "status.exhausted",
            Self::RadiationDiscomfort => "status.radiation-discomfort",
            Self::RadiationSickness => "status.radiation-sickness",
            Self::Mutation => "status.mutation",
            Self::Infection => "status.infection",
            Self::Fracture => "status.fracture",
            Self::Bleeding => "status.bleeding",
            Self::DeepWound => "status.deep-wound",
            Self::Diarrhea => "status.diarrhea",
            Self::ItemBoost => "status.item-boost",
        }
    }
}

/// Signed attribute bonuses carried by one effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeDeltas {
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub accuracy: i32,
    #[serde(default)]
    pub agility: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub max_health: i32,
    #[serde(default)]
    pub max_hunger: i32,
}

impl AttributeDeltas {
    pub const NONE: Self = Self {
        strength: 0,
        accuracy: 0,
        agility: 0,
        defense: 0,
        max_health: 0,
        max_hunger: 0,
    };

    /// Same bonus on strength, accuracy and agility.
    #[must_use]
    pub const fn offensive(amount: i32) -> Self {
        Self {
            strength: amount,
            accuracy: amount,
            agility: amount,
            ..Self::NONE
        }
    }

    #[must_use]
    pub const fn with_max_health(mut self, amount: i32) -> Self {
        self.max_health = amount;
        self
    }

    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Accuracy => self.accuracy,
            Attribute::Agility => self.agility,
            Attribute::Defense => self.defense,
            Attribute::MaxHealth => self.max_health,
            Attribute::MaxHunger => self.max_hunger,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.strength == 0
            && self.accuracy == 0
            && self.agility == 0
            && self.defense == 0
            && self.max_health == 0
            && self.max_hunger == 0
    }
}

/// How long an effect lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectDuration {
    /// Held while a vital sits inside its band; never counts down.
    Derived,
    Timed { remaining_secs: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub deltas: AttributeDeltas,
    pub duration: EffectDuration,
}

impl StatusEffect {
    #[must_use]
    pub const fn derived(kind: StatusKind, deltas: AttributeDeltas) -> Self {
        Self {
            kind,
            deltas,
            duration: EffectDuration::Derived,
        }
    }

    #[must_use]
    pub const fn timed(kind: StatusKind, deltas: AttributeDeltas, secs: f32) -> Self {
        Self {
            kind,
            deltas,
            duration: EffectDuration::Timed {
                remaining_secs: secs,
            },
        }
    }

    #[must_use]
    pub const fn remaining_secs(&self) -> Option<f32> {
        match self.duration {
            EffectDuration::Derived => None,
            EffectDuration::Timed { remaining_secs } => Some(remaining_secs),
        }
    }
}

/// Result of [`StatusEffectRegistry::add_or_refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectChange {
    Added,
    Refreshed,
}

pub type ExpiredKinds = SmallVec<[StatusKind; 4]>;

/// Active effects in insertion order, unique by kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusEffectRegistry {
    effects: SmallVec<[StatusEffect; 6]>,
}

impl StatusEffectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an effect, or overwrite deltas and duration of the existing
    /// effect of the same kind without changing its position.
    pub fn add_or_refresh(
        &mut self,
        kind: StatusKind,
        deltas: AttributeDeltas,
        duration: EffectDuration,
    ) -> EffectChange {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == kind) {
            existing.deltas = deltas;
            existing.duration = duration;
            return EffectChange::Refreshed;
        }
        self.effects.push(StatusEffect {
            kind,
            deltas,
            duration,
        });
        EffectChange::Added
    }

    pub fn insert(&mut self, effect: StatusEffect) -> EffectChange {
        self.add_or_refresh(effect.kind, effect.deltas, effect.duration)
    }

    pub fn remove(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        let idx = self.effects.iter().position(|e| e.kind == kind)?;
        Some(self.effects.remove(idx))
    }

    /// Make `wanted` the only effect of `family`. Returns whether the set of
    /// active kinds changed; swapping deltas on an already-present kind does not count.
    pub fn replace_family(&mut self, family: ThresholdFamily, wanted: Option<StatusEffect>) -> bool {
        let before = self.effects.len();
        let keep = wanted.map(|effect| effect.kind);
        self.effects
            .retain(|e| e.kind.family() != Some(family) || Some(e.kind) == keep);
        let mut changed = self.effects.len() != before;
        if let Some(effect) = wanted {
            changed |= self.insert(effect) == EffectChange::Added;
        }
        changed
    }

    /// Count timed effects down by `delta_secs` and drop the ones that ran out.
    /// Each expired kind is reported once, on the tick that removed it.
    pub fn tick(&mut self, delta_secs: f32) -> ExpiredKinds {
        let step = if delta_secs.is_finite() {
            delta_secs.max(0.0)
        } else {
            0.0
        };
        let mut expired = ExpiredKinds::new();
        self.effects.retain(|effect| match &mut effect.duration {
            EffectDuration::Derived => true,
            EffectDuration::Timed { remaining_secs } => {
                *remaining_secs -= step;
                if *remaining_secs <= 0.0 {
                    expired.push(effect.kind);
                    false
                } else {
                    true
                }
            }
        });
        expired
    }

    /// Aggregate delta for one attribute across all active effects.
    #[must_use]
    pub fn sum(&self, attribute: Attribute) -> i32 {
        self.effects
            .iter()
            .fold(0_i32, |acc, e| acc.saturating_add(e.deltas.get(attribute)))
    }

    #[must_use]
    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    #[must_use]
    pub fn contains(&self, kind: StatusKind) -> bool {
        self.get(kind).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn injuries(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter().filter(|e| e.kind.is_injury())
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_keeps_count_and_position() {
        let mut registry = StatusEffectRegistry::new();
        registry.add_or_refresh(
            StatusKind::Fracture,
            AttributeDeltas {
                agility: -2,
                ..AttributeDeltas::NONE
            },
            EffectDuration::Timed {
                remaining_secs: 10.0,
            },
        );
        registry.add_or_refresh(
            StatusKind::Bleeding,
            AttributeDeltas::NONE.with_max_health(-10),
            EffectDuration::Timed {
                remaining_secs: 10.0,
            },
        );
        let change = registry.add_or_refresh(
            StatusKind::Fracture,
            AttributeDeltas {
                agility: -2,
                ..AttributeDeltas::NONE
            },
            EffectDuration::Timed {
                remaining_secs: 99.0,
            },
        );

        assert_eq!(change, EffectChange::Refreshed);
        assert_eq!(registry.len(), 2);
        let first = registry.iter().next().unwrap();
        assert_eq!(first.kind, StatusKind::Fracture);
        assert_eq!(first.remaining_secs(), Some(99.0));
    }

    #[test]
    fn tick_reports_each_expiry_once() {
        let mut registry = StatusEffectRegistry::new();
        registry.insert(StatusEffect::timed(
            StatusKind::Infection,
            AttributeDeltas::NONE.with_max_health(-15),
            1.0,
        ));
        registry.insert(StatusEffect::derived(
            StatusKind::Overfed,
            AttributeDeltas::offensive(-1),
        ));

        assert!(registry.tick(0.6).is_empty());
        let expired = registry.tick(0.6);
        assert_eq!(expired.as_slice(), &[StatusKind::Infection]);
        assert!(registry.tick(5.0).is_empty());
        assert!(registry.contains(StatusKind::Overfed));
    }

    #[test]
    fn negative_or_nan_tick_does_not_extend_durations() {
        let mut registry = StatusEffectRegistry::new();
        registry.insert(StatusEffect::timed(
            StatusKind::ItemBoost,
            AttributeDeltas::offensive(2),
            5.0,
        ));
        registry.tick(-10.0);
        registry.tick(f32::NAN);
        assert_eq!(
            registry.get(StatusKind::ItemBoost).unwrap().remaining_secs(),
            Some(5.0)
        );
    }

    #[test]
    fn sum_aggregates_across_kinds() {
        let mut registry = StatusEffectRegistry::new();
        registry.insert(StatusEffect::derived(
            StatusKind::Energized,
            AttributeDeltas::offensive(1),
        ));
        registry.insert(StatusEffect::derived(
            StatusKind::Mutation,
            AttributeDeltas::offensive(3).with_max_health(-60),
        ));
        assert_eq!(registry.sum(Attribute::Strength), 4);
        assert_eq!(registry.sum(Attribute::Defense), 0);
        assert_eq!(registry.sum(Attribute::MaxHealth), -60);
    }

    #[test]
    fn replace_family_swaps_band_members() {
        let mut registry = StatusEffectRegistry::new();
        let sickness = StatusEffect::derived(
            StatusKind::RadiationSickness,
            AttributeDeltas::offensive(1).with_max_health(-30),
        );
        assert!(registry.replace_family(ThresholdFamily::Radiation, Some(sickness)));
        assert!(!registry.replace_family(ThresholdFamily::Radiation, Some(sickness)));

        let mutation = StatusEffect::derived(
            StatusKind::Mutation,
            AttributeDeltas::offensive(3).with_max_health(-60),
        );
        assert!(registry.replace_family(ThresholdFamily::Radiation, Some(mutation)));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(StatusKind::Mutation));

        assert!(registry.replace_family(ThresholdFamily::Radiation, None));
        assert!(registry.is_empty());
    }

    #[test]
    fn kind_classification_is_disjoint() {
        for kind in StatusKind::INJURIES {
            assert!(kind.is_injury());
            assert!(!kind.is_threshold());
        }
        assert!(!StatusKind::ItemBoost.is_injury());
        assert!(!StatusKind::ItemBoost.is_threshold());
        assert_eq!(
            StatusKind::Exhausted.family(),
            Some(ThresholdFamily::Energy)
        );
    }
}
