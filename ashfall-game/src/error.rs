//! Rejection reasons for inbound commands.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::{Attribute, StatusKind};

/// Why a command was refused. A refused command never mutates state.
#[derive(Debug, Clone, Copy, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CommandError {
    #[error("no battle is active")]
    NoActiveBattle,
    #[error("a battle is already in progress")]
    BattleInProgress,
    #[error("melee is impossible against a ranged-only enemy")]
    MeleeUnavailable,
    #[error("no moves remain in this segment")]
    NoMovesRemaining,
    #[error("time is paused")]
    TimePaused,
    #[error("a rest is already underway")]
    RestInProgress,
    #[error("not enough hunger to rest (need {required:.0})")]
    InsufficientHunger { required: f32 },
    #[error("not enough energy (need {required:.0})")]
    InsufficientEnergy { required: f32 },
    #[error("crafting materials are missing")]
    MissingMaterials,
    #[error("{kind:?} cannot be cured directly")]
    NotCurable { kind: StatusKind },
    #[error("{kind:?} is derived from vitals and cannot be granted")]
    NotGrantable { kind: StatusKind },
    #[error("{attribute:?} cannot be trained")]
    NotTrainable { attribute: Attribute },
    #[error("the battle has already been resolved")]
    BattleResolved,
    #[error("the player has been defeated")]
    PlayerDefeated,
}

impl CommandError {
    /// Stable i18n key for the rejection message.
    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::NoActiveBattle => "reject.no-battle",
            Self::BattleInProgress => "reject.battle-in-progress",
            Self::MeleeUnavailable => "reject.melee-unavailable",
            Self::NoMovesRemaining => "reject.no-moves",
            Self::TimePaused => "reject.time-paused",
            Self::RestInProgress => "reject.rest-in-progress",
            Self::InsufficientHunger { .. } => "reject.hunger-low",
            Self::InsufficientEnergy { .. } => "reject.energy-low",
            Self::MissingMaterials => "reject.materials-missing",
            Self::NotCurable { .. } => "reject.not-curable",
            Self::NotGrantable { .. } => "reject.not-grantable",
            Self::NotTrainable { .. } => "reject.not-trainable",
            Self::BattleResolved => "reject.battle-resolved",
            Self::PlayerDefeated => "reject.defeated",
        }
    }
}
