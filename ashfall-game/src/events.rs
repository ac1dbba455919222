//! Notifications published to presentation collaborators.
//!
//! Controllers never call observers directly. They write into an [`Outbox`]
//! while a command runs; the session hands the settled batch to the
//! [`EventBus`] once the command has finished mutating state.

use serde::{Deserialize, Serialize};

use crate::camp::RestKind;
use crate::combat::{BattleDescriptor, BattleResult};
use crate::effects::StatusKind;
use crate::encounters::{EncounterKind, GridCoord};
use crate::error::CommandError;
use crate::scheduler::Segment;

/// Severity tier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Hint for how the UI should surface a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSurfaceHint {
    Silent,
    Log,
    Toast,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Some vital or derived maximum settled at a new value.
    VitalsChanged,
    /// The set of active status kinds changed.
    StatusEffectsChanged,
    StatusEffectExpired {
        kind: StatusKind,
    },
    Defeated,
    ForcedRecovery {
        segments: u8,
    },
    TimeSegmentChanged {
        segment: Segment,
        day: u32,
    },
    MovesChanged {
        remaining: u8,
        max: u8,
    },
    RestStarted {
        kind: RestKind,
    },
    RestPanelClosed,
    BattleStarted {
        descriptor: BattleDescriptor,
    },
    BattleEnded {
        result: BattleResult,
    },
    CombatLog {
        line: String,
    },
    CombatPanelClosed,
    EncounterTriggered {
        coord: GridCoord,
        kind: EncounterKind,
    },
    RewardFound {
        coord: GridCoord,
        kind: EncounterKind,
    },
    RewardMissed {
        coord: GridCoord,
        kind: EncounterKind,
    },
    SavePoint {
        coord: GridCoord,
    },
    /// Free-form presentation line identified by an i18n key.
    Message {
        key: String,
    },
    Rejected {
        error: CommandError,
    },
}

impl GameEvent {
    #[must_use]
    pub const fn severity(&self) -> EventSeverity {
        match self {
            Self::Defeated => EventSeverity::Critical,
            Self::ForcedRecovery { .. } | Self::Rejected { .. } => EventSeverity::Warning,
            _ => EventSeverity::Info,
        }
    }

    #[must_use]
    pub const fn ui_surface_hint(&self) -> UiSurfaceHint {
        match self {
            Self::VitalsChanged
            | Self::StatusEffectsChanged
            | Self::MovesChanged { .. }
            | Self::RestPanelClosed
            | Self::CombatPanelClosed => UiSurfaceHint::Silent,
            Self::Defeated | Self::BattleStarted { .. } | Self::BattleEnded { .. } => {
                UiSurfaceHint::Modal
            }
            Self::Rejected { .. }
            | Self::ForcedRecovery { .. }
            | Self::SavePoint { .. }
            | Self::StatusEffectExpired { .. } => UiSurfaceHint::Toast,
            _ => UiSurfaceHint::Log,
        }
    }

    pub(crate) fn message(key: &str) -> Self {
        Self::Message {
            key: key.to_string(),
        }
    }
}

/// Per-command event buffer.
///
/// `VitalsChanged` and `StatusEffectsChanged` are flags rather than entries,
/// so a command that touches hunger five times still yields one notification.
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<GameEvent>,
    vitals_dirty: bool,
    effects_dirty: bool,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn mark_vitals(&mut self) {
        self.vitals_dirty = true;
    }

    pub fn mark_effects(&mut self) {
        self.effects_dirty = true;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.vitals_dirty && !self.effects_dirty
    }

    /// Take the settled batch: coalesced state notifications first, then
    /// discrete events in emission order.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        let mut batch = Vec::with_capacity(self.events.len() + 2);
        if std::mem::take(&mut self.vitals_dirty) {
            batch.push(GameEvent::VitalsChanged);
        }
        if std::mem::take(&mut self.effects_dirty) {
            batch.push(GameEvent::StatusEffectsChanged);
        }
        batch.append(&mut self.events);
        batch
    }
}

/// Receiver of settled notifications.
pub trait Subscriber {
    fn notify(&mut self, event: &GameEvent);
}

impl<F> Subscriber for F
where
    F: FnMut(&GameEvent),
{
    fn notify(&mut self, event: &GameEvent) {
        self(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u32);

/// Ordered subscriber list. Every subscriber sees every batch in
/// registration order.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriberId, Box<dyn Subscriber>)>,
    next_id: u32,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push((id, subscriber));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn publish(&mut self, batch: &[GameEvent]) {
        for event in batch {
            for (_, subscriber) in &mut self.subscribers {
                subscriber.notify(event);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
