//! Camping and rest actions
use serde::{Deserialize, Serialize};

use crate::config::RestConfig;
use crate::effects::Attribute;
use crate::error::CommandError;
use crate::events::{GameEvent, Outbox};
use crate::scheduler::{Segment, TimeScheduler};
use crate::timers::{TimerKind, TimerQueue};
use crate::vitals::{Vital, VitalsController};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestKind {
    Sleep,
    Train { attribute: Attribute },
    Craft,
}

impl RestKind {
    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::Sleep => "rest.sleep",
            Self::Train { .. } => "rest.train",
            Self::Craft => "rest.craft",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestOutcome {
    pub kind: RestKind,
    /// Segment the rest started in; decides the sleep recovery amount.
    pub rested_in: Segment,
    pub energy_delta: f32,
    pub health_delta: i32,
    pub trained_to: Option<i32>,
}

/// Everything a rest touches, borrowed from the session for one call.
pub struct Camp<'a> {
    pub config: &'a RestConfig,
    pub scheduler: &'a mut TimeScheduler,
    pub vitals: &'a mut VitalsController,
    pub timers: &'a mut TimerQueue,
    /// `None` when no inventory collaborator is linked.
    pub has_materials: Option<bool>,
}

impl Camp<'_> {
    fn check(&self, kind: RestKind) -> Result<(), CommandError> {
        if self.timers.is_pending(TimerKind::RestPanelClose) {
            return Err(CommandError::RestInProgress);
        }
        let hunger_cost = self.config.hunger_cost;
        if self.vitals.hunger() < hunger_cost {
            return Err(CommandError::InsufficientHunger {
                required: hunger_cost,
            });
        }
        match kind {
            RestKind::Sleep => Ok(()),
            RestKind::Train { attribute } => {
                if !attribute.is_combat() {
                    return Err(CommandError::NotTrainable { attribute });
                }
                need_energy(self.vitals, self.config.train_energy_cost)
            }
            RestKind::Craft => {
                need_energy(self.vitals, self.config.craft_energy_cost)?;
                if self.has_materials == Some(true) {
                    Ok(())
                } else {
                    Err(CommandError::MissingMaterials)
                }
            }
        }
    }

    /// Run one rest action: pay costs, apply recovery, advance one segment,
    /// then hold the rest panel open.
    ///
    /// # Errors
    ///
    /// Any [`CommandError`] from the checks; nothing is mutated on error.
    pub fn rest(&mut self, kind: RestKind, outbox: &mut Outbox) -> Result<RestOutcome, CommandError> {
        self.check(kind)?;

        let rested_in = self.scheduler.segment();
        let mut outcome = RestOutcome {
            kind,
            rested_in,
            energy_delta: 0.0,
            health_delta: 0,
            trained_to: None,
        };
        self.vitals
            .apply_delta(Vital::Hunger, -self.config.hunger_cost, outbox);

        let panel_secs = match kind {
            RestKind::Sleep => {
                let energy = if rested_in.is_night() {
                    self.config.night_sleep_energy
                } else {
                    self.config.day_sleep_energy
                };
                self.vitals.apply_delta(Vital::Energy, energy, outbox);
                self.vitals.change_health(self.config.sleep_health, outbox);
                outcome.energy_delta = energy;
                outcome.health_delta = self.config.sleep_health;
                self.config.panel_secs
            }
            RestKind::Train { attribute } => {
                let cost = self.config.train_energy_cost;
                self.vitals.apply_delta(Vital::Energy, -cost, outbox);
                outcome.energy_delta = -cost;
                outcome.trained_to = Some(self.vitals.train(attribute)?);
                outbox.mark_vitals();
                self.config.panel_secs
            }
            RestKind::Craft => {
                let cost = self.config.craft_energy_cost;
                self.vitals.apply_delta(Vital::Energy, -cost, outbox);
                outcome.energy_delta = -cost;
                self.config.craft_panel_secs
            }
        };

        self.scheduler.advance(self.vitals, outbox);
        self.timers.schedule(TimerKind::RestPanelClose, panel_secs);
        log::debug!("rest {kind:?} in {rested_in:?}");
        outbox.push(GameEvent::RestStarted { kind });
        Ok(outcome)
    }
}

fn need_energy(vitals: &VitalsController, cost: f32) -> Result<(), CommandError> {
    if vitals.energy() < cost {
        Err(CommandError::InsufficientEnergy { required: cost })
    } else {
        Ok(())
    }
}
