use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use ashfall_game::{
    BattleResult, CombatAction, GameEvent, GridCoord, SaveSnapshot, Segment, SurvivalSession,
    Vital,
};
use sha2::{Digest, Sha256};

use crate::logic::policy::{GameplayStrategy, PlannedAction, PlayerPolicy};

/// Side length of the square grid the sweep route walks.
pub const GRID_SIZE: i32 = 8;
/// Simulated seconds between driver steps.
pub const STEP_SECS: f32 = 0.5;

/// Serpentine walk over the grid: left to right, then right to left.
#[must_use]
pub fn sweep_tile(index: usize) -> GridCoord {
    let side = usize::try_from(GRID_SIZE).unwrap_or(8);
    let cell = index % (side * side);
    let row = cell / side;
    let column = if row % 2 == 0 {
        cell % side
    } else {
        side - 1 - cell % side
    };
    GridCoord::new(
        i32::try_from(column).unwrap_or(0),
        i32::try_from(row).unwrap_or(0),
    )
}

/// One driver step.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: usize,
    pub day: u32,
    pub segment: Segment,
    pub label: String,
    pub rejected: bool,
}

/// Drives one [`SurvivalSession`] with a policy and audits it after every step.
pub struct SimulationSession {
    session: SurvivalSession,
    strategy: GameplayStrategy,
    route_index: usize,
    position: GridCoord,
    events_seen: usize,
    battles_started: u32,
    victories: u32,
    defeats: u32,
    escapes: u32,
    rejections: u32,
    forced_recoveries: u32,
    violations: Vec<String>,
    hasher: Sha256,
}

impl SimulationSession {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            session: SurvivalSession::with_bundled_data(seed),
            strategy,
            route_index: 0,
            position: GridCoord::new(0, 0),
            events_seen: 0,
            battles_started: 0,
            victories: 0,
            defeats: 0,
            escapes: 0,
            rejections: 0,
            forced_recoveries: 0,
            violations: Vec::new(),
            hasher: Sha256::new(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SurvivalSession {
        &self.session
    }

    /// Run one step: a battle action when fighting, otherwise the policy's
    /// overworld choice; then let the clock run.
    pub fn advance(&mut self, step: usize, policy: &mut dyn PlayerPolicy) -> StepRecord {
        let (label, rejected) = if self.session.is_in_combat() {
            let action = policy.fight(&self.session);
            let rejected = self.session.submit_combat_action(action).is_err();
            self.absorb();
            (combat_label(action).to_string(), rejected)
        } else {
            let planned = policy.plan(&self.session);
            let outcome = self.overworld(planned);
            if planned != PlannedAction::Wait {
                self.absorb();
            }
            outcome
        };
        self.session.tick(STEP_SECS);
        self.absorb();
        self.audit(step);
        StepRecord {
            step,
            day: self.session.day(),
            segment: self.session.segment(),
            label,
            rejected,
        }
    }

    fn overworld(&mut self, action: PlannedAction) -> (String, bool) {
        match action {
            PlannedAction::Advance => {
                let target = sweep_tile(self.route_index + 1);
                let rejected = self.travel(target);
                if !rejected {
                    self.route_index += 1;
                }
                (format!("travel {target}"), rejected)
            }
            PlannedAction::Wander { dx, dy } => {
                let target = GridCoord::new(
                    (self.position.x + dx).clamp(0, GRID_SIZE - 1),
                    (self.position.y + dy).clamp(0, GRID_SIZE - 1),
                );
                let rejected = self.travel(target);
                (format!("wander {target}"), rejected)
            }
            PlannedAction::Rest(kind) => {
                let rejected = self.session.request_rest(kind).is_err();
                (format!("rest {kind:?}"), rejected)
            }
            PlannedAction::UseItem(item) => {
                let rejected = self.session.apply_item_effect(&item).is_err();
                let label = if item.cures.is_some() { "medkit" } else { "ration" };
                (format!("use {label}"), rejected)
            }
            PlannedAction::Wait => ("wait".to_string(), false),
        }
    }

    fn travel(&mut self, target: GridCoord) -> bool {
        match self.session.travel_to(target) {
            Ok(_) => {
                self.position = target;
                false
            }
            Err(_) => true,
        }
    }

    fn absorb(&mut self) {
        let batch = self.session.last_events();
        if batch.is_empty() {
            return;
        }
        self.events_seen += batch.len();
        if let Ok(encoded) = serde_json::to_vec(batch) {
            self.hasher.update(&encoded);
        }
        for event in batch {
            match event {
                GameEvent::BattleStarted { .. } => self.battles_started += 1,
                GameEvent::BattleEnded { result } => match result {
                    BattleResult::Victory => self.victories += 1,
                    BattleResult::Defeat => self.defeats += 1,
                    BattleResult::Escaped => self.escapes += 1,
                    BattleResult::InProgress => {}
                },
                GameEvent::Rejected { .. } => self.rejections += 1,
                GameEvent::ForcedRecovery { .. } => self.forced_recoveries += 1,
                _ => {}
            }
        }
    }

    fn audit(&mut self, step: usize) {
        let vitals = self.session.vitals();
        for vital in [Vital::Health, Vital::Hunger, Vital::Energy, Vital::Radiation] {
            let value = vitals.value(vital);
            let max = vitals.max(vital);
            if !(0.0..=max).contains(&value) {
                self.violations
                    .push(format!("step {step}: {vital:?} {value} outside [0, {max}]"));
            }
        }
        if self.session.moves_remaining() > self.session.moves_max() {
            self.violations.push(format!(
                "step {step}: {} moves remaining exceeds budget {}",
                self.session.moves_remaining(),
                self.session.moves_max()
            ));
        }
        let mut kinds = HashSet::new();
        for effect in self.session.active_effects().iter() {
            if !kinds.insert(effect.kind) {
                self.violations
                    .push(format!("step {step}: duplicate effect {:?}", effect.kind));
            }
        }
        if self.session.is_in_combat() && self.session.is_defeated() {
            self.violations
                .push(format!("step {step}: battle still running after defeat"));
        }
    }

    #[must_use]
    pub fn into_summary(self, seed: u64, steps: usize) -> SimulationSummary {
        let digest = self
            .hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        SimulationSummary {
            seed,
            strategy: self.strategy,
            steps,
            days_survived: self.session.day(),
            final_segment: self.session.segment(),
            defeated: self.session.is_defeated(),
            events_seen: self.events_seen,
            battles_started: self.battles_started,
            victories: self.victories,
            defeats: self.defeats,
            escapes: self.escapes,
            rejections: self.rejections,
            forced_recoveries: self.forced_recoveries,
            violations: self.violations,
            event_digest: digest,
            replay_digest: None,
            final_snapshot: self.session.snapshot(),
            decision_log: Vec::new(),
        }
    }
}

const fn combat_label(action: CombatAction) -> &'static str {
    match action {
        CombatAction::Melee => "melee",
        CombatAction::Ranged => "ranged",
        CombatAction::Escape => "escape",
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// What to run and what must hold afterwards.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_steps: usize,
    /// Run the same seed twice and record the second digest.
    pub replay: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_steps: 200,
            replay: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub const fn with_replay(mut self) -> Self {
        self.replay = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub steps: usize,
    pub days_survived: u32,
    pub final_segment: Segment,
    pub defeated: bool,
    pub events_seen: usize,
    pub battles_started: u32,
    pub victories: u32,
    pub defeats: u32,
    pub escapes: u32,
    pub rejections: u32,
    pub forced_recoveries: u32,
    pub violations: Vec<String>,
    pub event_digest: String,
    pub replay_digest: Option<String>,
    pub final_snapshot: SaveSnapshot,
    /// Last few steps, newest last.
    pub decision_log: Vec<StepRecord>,
}

const DECISION_LOG_LEN: usize = 8;

/// Runs plans to completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameTester {
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut summary = self.run_once(plan, seed);
        if plan.replay {
            summary.replay_digest = Some(self.run_once(plan, seed).event_digest);
        }
        summary
    }

    fn run_once(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut policy = plan.strategy.create_policy(seed);
        let mut sim = SimulationSession::new(plan.strategy, seed);
        let mut recent = Vec::with_capacity(DECISION_LOG_LEN);
        let mut steps = 0;
        while steps < plan.max_steps && !sim.session().is_defeated() {
            let record = sim.advance(steps, policy.as_mut());
            if self.verbose {
                log::debug!(
                    "[{} seed {seed}] step {} day {} {:?}: {}{}",
                    policy.name(),
                    record.step,
                    record.day,
                    record.segment,
                    record.label,
                    if record.rejected { " (rejected)" } else { "" }
                );
            }
            if recent.len() == DECISION_LOG_LEN {
                recent.remove(0);
            }
            recent.push(record);
            steps += 1;
        }
        let mut summary = sim.into_summary(seed, steps);
        summary.decision_log = recent;
        summary
    }
}
