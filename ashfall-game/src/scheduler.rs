//! Day segments and the per-segment move budget.
use serde::{Deserialize, Serialize};

use crate::config::TimeConfig;
use crate::constants::{LOAD_BANDS, LOG_FORCED_RECOVERY, SEGMENTS_PER_DAY};
use crate::error::CommandError;
use crate::events::{GameEvent, Outbox};
use crate::timers::{TimerKind, TimerQueue};
use crate::vitals::{Vital, VitalsController};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    #[default]
    Morning,
    Afternoon,
    Evening,
    LateNight,
}

impl Segment {
    pub const ALL: [Self; SEGMENTS_PER_DAY as usize] =
        [Self::Morning, Self::Afternoon, Self::Evening, Self::LateNight];

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Morning => 0,
            Self::Afternoon => 1,
            Self::Evening => 2,
            Self::LateNight => 3,
        }
    }

    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index % SEGMENTS_PER_DAY) as usize]
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Evening and late night sleep restores more energy.
    #[must_use]
    pub const fn is_night(self) -> bool {
        matches!(self, Self::Evening | Self::LateNight)
    }

    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::Morning => "segment.morning",
            Self::Afternoon => "segment.afternoon",
            Self::Evening => "segment.evening",
            Self::LateNight => "segment.late-night",
        }
    }
}

fn load_band(weight_ratio: f32) -> (u8, f32) {
    let ratio = if weight_ratio.is_nan() {
        f32::INFINITY
    } else {
        weight_ratio
    };
    LOAD_BANDS
        .iter()
        .find(|(upper, _, _)| ratio < *upper)
        .map_or((1, 2.0), |&(_, moves, multiplier)| (moves, multiplier))
}

/// Moves per segment for a carried-weight ratio.
#[must_use]
pub fn moves_max(weight_ratio: f32) -> u8 {
    load_band(weight_ratio).0
}

/// Multiplier on the base move energy cost for a carried-weight ratio.
#[must_use]
pub fn energy_multiplier(weight_ratio: f32) -> f32 {
    load_band(weight_ratio).1
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSnapshot {
    pub segment: Segment,
    pub day: u32,
    pub moves_remaining: u8,
}

#[derive(Debug, Clone)]
pub struct TimeScheduler {
    config: TimeConfig,
    segment: Segment,
    day: u32,
    moves_remaining: u8,
    moves_max: u8,
    paused: bool,
    segment_clock: f32,
}

impl TimeScheduler {
    #[must_use]
    pub fn new(config: &TimeConfig, weight_ratio: f32) -> Self {
        let max = moves_max(weight_ratio);
        Self {
            config: config.clone(),
            segment: Segment::Morning,
            day: 1,
            moves_remaining: max,
            moves_max: max,
            paused: false,
            segment_clock: 0.0,
        }
    }

    #[must_use]
    pub const fn segment(&self) -> Segment {
        self.segment
    }

    /// One-based day counter.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub const fn moves_remaining(&self) -> u8 {
        self.moves_remaining
    }

    #[must_use]
    pub const fn moves_max(&self) -> u8 {
        self.moves_max
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Move to the next segment and refill the move budget.
    pub fn advance(&mut self, vitals: &VitalsController, outbox: &mut Outbox) -> Segment {
        self.segment = self.segment.next();
        if self.segment == Segment::Morning {
            self.day = self.day.saturating_add(1);
        }
        self.moves_max = moves_max(vitals.weight_ratio());
        self.moves_remaining = self.moves_max;
        self.segment_clock = 0.0;
        log::debug!(
            "segment -> {:?} (day {}, {} moves)",
            self.segment,
            self.day,
            self.moves_max
        );
        outbox.push(GameEvent::TimeSegmentChanged {
            segment: self.segment,
            day: self.day,
        });
        self.publish_moves(outbox);
        self.segment
    }

    /// Spend one move. Reaching zero queues a debounced auto-advance.
    ///
    /// # Errors
    ///
    /// Rejected while paused or when the budget is already empty.
    pub fn consume_move(
        &mut self,
        vitals: &mut VitalsController,
        timers: &mut TimerQueue,
        outbox: &mut Outbox,
    ) -> Result<u8, CommandError> {
        if self.paused {
            return Err(CommandError::TimePaused);
        }
        if self.moves_remaining == 0 {
            return Err(CommandError::NoMovesRemaining);
        }
        self.moves_remaining -= 1;
        let energy_cost = self.config.move_energy_base * energy_multiplier(vitals.weight_ratio());
        vitals.apply_delta(Vital::Hunger, -self.config.move_hunger_cost, outbox);
        vitals.apply_delta(Vital::Energy, -energy_cost, outbox);
        self.publish_moves(outbox);
        if self.moves_remaining == 0 {
            // Each depletion gets a full delay, even if an earlier one is pending.
            timers.schedule(TimerKind::AutoAdvanceSegment, self.config.auto_advance_delay_secs);
        }
        Ok(self.moves_remaining)
    }

    /// Delayed advance after the budget ran out. Skipped when the budget was
    /// refilled meanwhile or time is paused.
    pub fn on_auto_advance(&mut self, vitals: &VitalsController, outbox: &mut Outbox) -> bool {
        if self.moves_remaining != 0 || self.paused {
            return false;
        }
        self.advance(vitals, outbox);
        true
    }

    pub fn consume_event(&self, vitals: &mut VitalsController, outbox: &mut Outbox) {
        vitals.apply_delta(Vital::Hunger, -self.config.event_hunger_cost, outbox);
        vitals.apply_delta(Vital::Energy, -self.config.event_energy_cost, outbox);
    }

    pub fn consume_combat(&self, vitals: &mut VitalsController, outbox: &mut Outbox) {
        vitals.apply_delta(Vital::Hunger, -self.config.combat_hunger_cost, outbox);
        vitals.apply_delta(Vital::Energy, -self.config.combat_energy_cost, outbox);
    }

    /// Recompute the budget after carried weight changed. The remaining count
    /// only ever shrinks here; a lighter load pays off at the next segment.
    pub fn sync_weight(&mut self, weight_ratio: f32, outbox: &mut Outbox) {
        let max = moves_max(weight_ratio);
        if max == self.moves_max {
            return;
        }
        self.moves_max = max;
        self.moves_remaining = self.moves_remaining.min(max);
        self.publish_moves(outbox);
    }

    /// Involuntary sleep after energy ran out.
    pub fn force_recovery(
        &mut self,
        vitals: &mut VitalsController,
        timers: &mut TimerQueue,
        outbox: &mut Outbox,
    ) {
        let segments = self.config.forced_recovery_segments;
        for _ in 0..segments {
            self.advance(vitals, outbox);
        }
        vitals.set(Vital::Energy, self.config.forced_recovery_energy, outbox);
        timers.cancel(TimerKind::AutoAdvanceSegment);
        log::info!("{LOG_FORCED_RECOVERY}: skipped {segments} segments");
        outbox.push(GameEvent::ForcedRecovery { segments });
    }

    /// Real-time segment progression, when configured.
    pub fn tick(&mut self, delta_secs: f32, vitals: &VitalsController, outbox: &mut Outbox) {
        let Some(period) = self.config.segment_period_secs else {
            return;
        };
        if self.paused || !delta_secs.is_finite() || delta_secs <= 0.0 || period <= 0.0 {
            return;
        }
        self.segment_clock += delta_secs;
        while self.segment_clock >= period {
            let carry = self.segment_clock - period;
            self.advance(vitals, outbox);
            self.segment_clock = carry;
        }
    }

    #[must_use]
    pub const fn snapshot(&self) -> TimeSnapshot {
        TimeSnapshot {
            segment: self.segment,
            day: self.day,
            moves_remaining: self.moves_remaining,
        }
    }

    pub fn restore(&mut self, snapshot: &TimeSnapshot, weight_ratio: f32, outbox: &mut Outbox) {
        self.segment = snapshot.segment;
        self.day = snapshot.day.max(1);
        self.moves_max = moves_max(weight_ratio);
        self.moves_remaining = snapshot.moves_remaining.min(self.moves_max);
        self.segment_clock = 0.0;
        outbox.push(GameEvent::TimeSegmentChanged {
            segment: self.segment,
            day: self.day,
        });
        self.publish_moves(outbox);
    }

    fn publish_moves(&self, outbox: &mut Outbox) {
        outbox.push(GameEvent::MovesChanged {
            remaining: self.moves_remaining,
            max: self.moves_max,
        });
    }
}
