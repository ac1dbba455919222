//! Scheduled continuations.
//!
//! The core never sleeps. Anything that should happen "in a second" is queued
//! here and fires from [`TimerQueue::advance`] when the frame driver has
//! accumulated enough elapsed time.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Advance the segment if the move budget is still empty.
    AutoAdvanceSegment,
    RestPanelClose,
    CombatPanelClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct PendingTimer {
    kind: TimerKind,
    due_at: f64,
}

pub type FiredTimers = SmallVec<[TimerKind; 3]>;

/// At most one pending timer per kind; rescheduling a kind moves its deadline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerQueue {
    now: f64,
    pending: SmallVec<[PendingTimer; 3]>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds elapsed since the queue was created.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    pub fn schedule(&mut self, kind: TimerKind, delay_secs: f32) {
        let due_at = self.now + f64::from(delay_secs.max(0.0));
        if let Some(timer) = self.pending.iter_mut().find(|t| t.kind == kind) {
            timer.due_at = due_at;
        } else {
            self.pending.push(PendingTimer { kind, due_at });
        }
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.kind != kind);
        self.pending.len() != before
    }

    #[must_use]
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|t| t.kind == kind)
    }

    #[must_use]
    pub fn remaining(&self, kind: TimerKind) -> Option<f64> {
        self.pending
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| (t.due_at - self.now).max(0.0))
    }

    /// Move the clock forward and return due timers, earliest first.
    pub fn advance(&mut self, delta_secs: f32) -> FiredTimers {
        if delta_secs.is_finite() && delta_secs > 0.0 {
            self.now += f64::from(delta_secs);
        }
        let now = self.now;
        let mut due: SmallVec<[PendingTimer; 3]> =
            self.pending.iter().copied().filter(|t| t.due_at <= now).collect();
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at));
        self.pending.retain(|t| t.due_at > now);
        due.into_iter().map(|t| t.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::RestPanelClose, 2.0);
        assert!(timers.advance(1.5).is_empty());
        assert_eq!(timers.advance(0.5).as_slice(), &[TimerKind::RestPanelClose]);
        assert!(timers.advance(10.0).is_empty());
    }

    #[test]
    fn rescheduling_moves_the_deadline() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::AutoAdvanceSegment, 1.0);
        timers.advance(0.6);
        timers.schedule(TimerKind::AutoAdvanceSegment, 1.0);
        assert!(timers.advance(0.4).is_empty());
        assert_eq!(
            timers.advance(0.6).as_slice(),
            &[TimerKind::AutoAdvanceSegment]
        );
    }

    #[test]
    fn fired_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::CombatPanelClose, 2.0);
        timers.schedule(TimerKind::RestPanelClose, 1.0);
        assert_eq!(
            timers.advance(3.0).as_slice(),
            &[TimerKind::RestPanelClose, TimerKind::CombatPanelClose]
        );
    }

    #[test]
    fn cancel_and_remaining() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::CombatPanelClose, 2.0);
        timers.advance(0.5);
        assert_eq!(timers.remaining(TimerKind::CombatPanelClose), Some(1.5));
        assert!(timers.cancel(TimerKind::CombatPanelClose));
        assert!(timers.advance(5.0).is_empty());
    }
}
