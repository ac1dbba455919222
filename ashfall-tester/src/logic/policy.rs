use std::fmt;

use ashfall_game::{
    Attribute, CombatAction, Enemy, ItemEffect, RestKind, StatusGrant, StatusKind, SurvivalSession,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// What a policy wants to do outside of battle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlannedAction {
    /// Step to the next tile of the sweep route.
    Advance,
    /// Step by an arbitrary offset.
    Wander { dx: i32, dy: i32 },
    Rest(RestKind),
    UseItem(ItemEffect),
    /// Let the clock run.
    Wait,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next overworld action.
    fn plan(&mut self, session: &SurvivalSession) -> PlannedAction;

    /// Pick the next battle action.
    fn fight(&mut self, session: &SurvivalSession) -> CombatAction;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameplayStrategy {
    Cautious,
    Reckless,
    Balanced,
    Chaotic,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Reckless, Self::Balanced, Self::Chaotic];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Reckless => "Reckless",
            Self::Balanced => "Balanced",
            Self::Chaotic => "Chaotic",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Reckless => Box::new(RecklessPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Chaotic => Box::new(ChaoticPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct RecklessPolicy;
struct BalancedPolicy;

struct ChaoticPolicy {
    rng: ChaCha20Rng,
}

impl ChaoticPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0xC4A0_5EED),
        }
    }
}

/// Bandage pack: patches health and stops bleeding.
#[must_use]
pub fn medkit() -> ItemEffect {
    ItemEffect {
        health: 25,
        cures: Some(StatusKind::Bleeding),
        ..ItemEffect::default()
    }
}

/// Canned food of doubtful age.
#[must_use]
pub fn ration() -> ItemEffect {
    ItemEffect {
        hunger: 30.0,
        grant: Some(StatusGrant {
            kind: StatusKind::Diarrhea,
            chance: 0.1,
            deltas: None,
            duration_secs: None,
        }),
        ..ItemEffect::default()
    }
}

fn can_rest(session: &SurvivalSession) -> bool {
    !session.rest_in_progress() && session.hunger() >= session.config().rest.hunger_cost
}

fn health_fraction(session: &SurvivalSession) -> f32 {
    let max = session.vitals().effective_max_health().max(1);
    ashfall_game::numbers::ratio(
        ashfall_game::numbers::i32_to_f32(session.health()),
        ashfall_game::numbers::i32_to_f32(max),
    )
}

fn current_enemy(session: &SurvivalSession) -> Option<&Enemy> {
    session.current_battle().and_then(|battle| battle.current_enemy())
}

/// Attack with whichever stat beats the enemy by more.
fn best_attack(session: &SurvivalSession) -> CombatAction {
    let Some(battle) = session.current_battle() else {
        return CombatAction::Ranged;
    };
    let Some(enemy) = battle.current_enemy() else {
        return CombatAction::Ranged;
    };
    if battle.is_ranged_only() {
        return CombatAction::Ranged;
    }
    let melee = session.effective(Attribute::Strength) - enemy.strength;
    let ranged = session.effective(Attribute::Accuracy) - enemy.accuracy;
    if melee > ranged {
        CombatAction::Melee
    } else {
        CombatAction::Ranged
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn plan(&mut self, session: &SurvivalSession) -> PlannedAction {
        let tired = session.energy() < 50.0 || health_fraction(session) < 0.6;
        if health_fraction(session) < 0.4 {
            PlannedAction::UseItem(medkit())
        } else if session.hunger() < 25.0 {
            PlannedAction::UseItem(ration())
        } else if tired && can_rest(session) {
            PlannedAction::Rest(RestKind::Sleep)
        } else if session.moves_remaining() == 0 {
            PlannedAction::Wait
        } else {
            PlannedAction::Advance
        }
    }

    fn fight(&mut self, session: &SurvivalSession) -> CombatAction {
        let outmatched = current_enemy(session).is_some_and(|enemy| {
            enemy.power() > session.effective(Attribute::Strength) + 6
                && enemy.agility < session.effective(Attribute::Agility) + 4
        });
        if health_fraction(session) < 0.35 || outmatched {
            CombatAction::Escape
        } else {
            best_attack(session)
        }
    }
}

impl PlayerPolicy for RecklessPolicy {
    fn name(&self) -> &'static str {
        "Reckless"
    }

    fn plan(&mut self, session: &SurvivalSession) -> PlannedAction {
        if session.energy() < 15.0 && can_rest(session) {
            PlannedAction::Rest(RestKind::Train {
                attribute: Attribute::Strength,
            })
        } else if session.moves_remaining() == 0 {
            PlannedAction::Wait
        } else {
            PlannedAction::Advance
        }
    }

    fn fight(&mut self, session: &SurvivalSession) -> CombatAction {
        if session
            .current_battle()
            .is_some_and(|battle| battle.is_ranged_only())
        {
            CombatAction::Ranged
        } else {
            CombatAction::Melee
        }
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn plan(&mut self, session: &SurvivalSession) -> PlannedAction {
        if session.hunger() < 15.0 {
            return PlannedAction::UseItem(ration());
        }
        if !can_rest(session) {
            return if session.moves_remaining() == 0 {
                PlannedAction::Wait
            } else {
                PlannedAction::Advance
            };
        }
        if session.energy() < 35.0 || health_fraction(session) < 0.5 {
            PlannedAction::Rest(RestKind::Sleep)
        } else if session.segment().is_night() && session.energy() > 80.0 {
            PlannedAction::Rest(RestKind::Train {
                attribute: Attribute::Accuracy,
            })
        } else if session.moves_remaining() == 0 {
            PlannedAction::Wait
        } else {
            PlannedAction::Advance
        }
    }

    fn fight(&mut self, session: &SurvivalSession) -> CombatAction {
        if health_fraction(session) < 0.25 {
            CombatAction::Escape
        } else {
            best_attack(session)
        }
    }
}

impl PlayerPolicy for ChaoticPolicy {
    fn name(&self) -> &'static str {
        "Chaotic"
    }

    fn plan(&mut self, _session: &SurvivalSession) -> PlannedAction {
        match self.rng.gen_range(0..10) {
            0 => PlannedAction::Rest(RestKind::Sleep),
            1 => PlannedAction::Rest(RestKind::Craft),
            2 => PlannedAction::Rest(RestKind::Train {
                attribute: Attribute::COMBAT[self.rng.gen_range(0..Attribute::COMBAT.len())],
            }),
            3 => PlannedAction::Wait,
            4 => PlannedAction::UseItem(if self.rng.gen_bool(0.5) {
                medkit()
            } else {
                ration()
            }),
            5..=6 => PlannedAction::Advance,
            _ => PlannedAction::Wander {
                dx: self.rng.gen_range(-2..=2),
                dy: self.rng.gen_range(-2..=2),
            },
        }
    }

    fn fight(&mut self, _session: &SurvivalSession) -> CombatAction {
        match self.rng.gen_range(0..3) {
            0 => CombatAction::Melee,
            1 => CombatAction::Ranged,
            _ => CombatAction::Escape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_game::BattleDescriptor;

    #[test]
    fn chaotic_policy_is_seeded() {
        let session = SurvivalSession::with_bundled_data(1);
        let mut a = GameplayStrategy::Chaotic.create_policy(9);
        let mut b = GameplayStrategy::Chaotic.create_policy(9);
        for _ in 0..32 {
            assert_eq!(a.plan(&session), b.plan(&session));
        }
    }

    #[test]
    fn cautious_patches_up_before_walking() {
        let mut session = SurvivalSession::with_bundled_data(1);
        let wound = ItemEffect {
            health: -70,
            ..ItemEffect::default()
        };
        session.apply_item_effect(&wound).unwrap();
        let mut policy = GameplayStrategy::Cautious.create_policy(1);
        assert_eq!(policy.plan(&session), PlannedAction::UseItem(medkit()));
    }

    #[test]
    fn reckless_never_melees_a_ranged_only_enemy() {
        let mut session = SurvivalSession::with_bundled_data(1);
        session
            .start_battle(BattleDescriptor::new(Enemy::new("Spider", 10, 0, 14), true, 1))
            .unwrap();
        let mut policy = GameplayStrategy::Reckless.create_policy(1);
        assert_eq!(policy.fight(&session), CombatAction::Ranged);
    }

    #[test]
    fn balanced_prefers_the_weaker_enemy_stat() {
        let mut session = SurvivalSession::with_bundled_data(1);
        session
            .start_battle(BattleDescriptor::new(Enemy::new("Wolf", 14, 2, 16), false, 1))
            .unwrap();
        let mut policy = GameplayStrategy::Balanced.create_policy(1);
        assert_eq!(policy.fight(&session), CombatAction::Ranged);
        assert_eq!(policy.name(), "Balanced");
    }
}
