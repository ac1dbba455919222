//! Dice-versus-threshold battle resolution.
//!
//! A battle walks a queue of enemies. Each valid action rolls dice plus one
//! effective player attribute against the current enemy's matching stat plus
//! the difficulty modifier; the roll must beat the threshold strictly.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;

use crate::config::CombatConfig;
use crate::constants::{ATTACK_DICE, DIE_SIDES, ESCAPE_DICE};
use crate::effects::Attribute;
use crate::error::CommandError;
use crate::events::{GameEvent, Outbox};
use crate::numbers::scaled_damage;
use crate::timers::{TimerKind, TimerQueue};
use crate::vitals::VitalsController;

pub type Rolls = SmallVec<[u32; 3]>;

/// Source of die faces. Every `rand::Rng` is one; tests can script faces.
pub trait Dice {
    /// One face in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;

    fn roll(&mut self, count: u32, sides: u32) -> Rolls {
        (0..count).map(|_| self.roll_die(sides)).collect()
    }
}

impl<R: Rng + ?Sized> Dice for R {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.gen_range(1..=sides.max(1))
    }
}

/// Replays fixed faces in order, then repeats the last one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u32>,
    last: u32,
}

impl ScriptedDice {
    #[must_use]
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            last: 1,
        }
    }
}

impl Dice for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if let Some(face) = self.faces.pop_front() {
            self.last = face;
        }
        self.last.clamp(1, sides.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub strength: i32,
    pub accuracy: i32,
    pub agility: i32,
}

impl Enemy {
    #[must_use]
    pub fn new(name: impl Into<String>, strength: i32, accuracy: i32, agility: i32) -> Self {
        Self {
            name: name.into(),
            strength,
            accuracy,
            agility,
        }
    }

    /// The stronger of the two attack stats, used when an escape fails.
    #[must_use]
    pub fn power(&self) -> i32 {
        self.strength.max(self.accuracy)
    }
}

/// What an encounter hands to the combat engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleDescriptor {
    pub enemy: Enemy,
    #[serde(default)]
    pub ranged_only: bool,
    /// How many copies of the enemy must be beaten in sequence.
    #[serde(default = "one_stage")]
    pub stages: u8,
}

const fn one_stage() -> u8 {
    1
}

impl BattleDescriptor {
    #[must_use]
    pub const fn new(enemy: Enemy, ranged_only: bool, stages: u8) -> Self {
        Self {
            enemy,
            ranged_only,
            stages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatAction {
    Melee,
    Ranged,
    Escape,
}

impl CombatAction {
    /// Player attribute the action rolls with.
    #[must_use]
    pub const fn attribute(self) -> Attribute {
        match self {
            Self::Melee => Attribute::Strength,
            Self::Ranged => Attribute::Accuracy,
            Self::Escape => Attribute::Agility,
        }
    }

    #[must_use]
    pub const fn dice(self) -> u32 {
        match self {
            Self::Melee | Self::Ranged => ATTACK_DICE,
            Self::Escape => ESCAPE_DICE,
        }
    }

    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::Melee => "combat.melee",
            Self::Ranged => "combat.ranged",
            Self::Escape => "combat.escape",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleResult {
    #[default]
    InProgress,
    Victory,
    Defeat,
    Escaped,
}

impl BattleResult {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for BattleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InProgress => "in progress",
            Self::Victory => "victory",
            Self::Defeat => "defeat",
            Self::Escaped => "escaped",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    descriptor: BattleDescriptor,
    enemies: Vec<Enemy>,
    current: usize,
    ranged_only: bool,
    turn_counter: u32,
    result: BattleResult,
}

impl Battle {
    #[must_use]
    pub fn new(descriptor: BattleDescriptor) -> Self {
        let stages = usize::from(descriptor.stages.max(1));
        let enemies = vec![descriptor.enemy.clone(); stages];
        Self {
            ranged_only: descriptor.ranged_only,
            descriptor,
            enemies,
            current: 0,
            turn_counter: 0,
            result: BattleResult::InProgress,
        }
    }

    #[must_use]
    pub const fn descriptor(&self) -> &BattleDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn current_enemy(&self) -> Option<&Enemy> {
        self.enemies.get(self.current)
    }

    /// Zero-based index of the enemy being fought.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    #[must_use]
    pub const fn is_ranged_only(&self) -> bool {
        self.ranged_only
    }

    #[must_use]
    pub const fn turn_counter(&self) -> u32 {
        self.turn_counter
    }

    #[must_use]
    pub const fn result(&self) -> BattleResult {
        self.result
    }

    /// Outcome implied by the current state. Defeat wins over everything.
    #[must_use]
    pub fn evaluate(&self, player_health: i32) -> BattleResult {
        if player_health <= 0 {
            BattleResult::Defeat
        } else if self.result.is_terminal() {
            self.result
        } else if self.current >= self.enemies.len() {
            BattleResult::Victory
        } else {
            BattleResult::InProgress
        }
    }

    #[must_use]
    pub fn info(&self) -> Option<BattleInfo> {
        let enemy = self.current_enemy()?;
        Some(BattleInfo {
            enemy: enemy.clone(),
            position: self.current + 1,
            total: self.enemies.len(),
            ranged_only: self.ranged_only,
            turn: self.turn_counter,
        })
    }
}

/// Summary for the combat panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleInfo {
    pub enemy: Enemy,
    /// One-based position in the queue.
    pub position: usize,
    pub total: usize,
    pub ranged_only: bool,
    pub turn: u32,
}

impl fmt::Display for BattleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}) STR {} ACC {} AGI {}",
            self.enemy.name,
            self.position,
            self.total,
            self.enemy.strength,
            self.enemy.accuracy,
            self.enemy.agility
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u32,
    pub action: CombatAction,
    pub dice: Rolls,
    pub total: i32,
    pub threshold: i32,
    pub success: bool,
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub line: String,
    pub result: BattleResult,
}

#[derive(Debug, Clone)]
pub struct CombatEngine {
    config: CombatConfig,
    active: Option<Battle>,
    last_result: Option<BattleResult>,
    battles_started: u32,
}

impl CombatEngine {
    #[must_use]
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            config: config.clone(),
            active: None,
            last_result: None,
            battles_started: 0,
        }
    }

    #[must_use]
    pub const fn is_in_combat(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub const fn current_battle(&self) -> Option<&Battle> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn battle_info(&self) -> Option<BattleInfo> {
        self.active.as_ref().and_then(Battle::info)
    }

    #[must_use]
    pub const fn last_result(&self) -> Option<BattleResult> {
        self.last_result
    }

    #[must_use]
    pub const fn battles_started(&self) -> u32 {
        self.battles_started
    }

    /// Open a battle.
    ///
    /// # Errors
    ///
    /// [`CommandError::BattleInProgress`] when one is already active; the
    /// running battle is left untouched.
    pub fn start(
        &mut self,
        descriptor: BattleDescriptor,
        outbox: &mut Outbox,
    ) -> Result<(), CommandError> {
        if self.active.is_some() {
            return Err(CommandError::BattleInProgress);
        }
        let battle = Battle::new(descriptor);
        let enemy = &battle.descriptor.enemy;
        log::info!(
            "battle start: {} x{} (ranged only: {})",
            enemy.name,
            battle.enemy_count(),
            battle.ranged_only
        );
        outbox.push(GameEvent::BattleStarted {
            descriptor: battle.descriptor.clone(),
        });
        log_line(outbox, format!("Battle! {} x{} approach.", enemy.name, battle.enemy_count()));
        log_line(
            outbox,
            format!(
                "Enemy stats: STR {} ACC {} AGI {}",
                enemy.strength, enemy.accuracy, enemy.agility
            ),
        );
        if battle.ranged_only {
            log_line(outbox, "This enemy can only be fought at range.".to_string());
        }
        self.active = Some(battle);
        self.last_result = None;
        self.battles_started = self.battles_started.saturating_add(1);
        Ok(())
    }

    /// Resolve one player action against the current enemy.
    ///
    /// # Errors
    ///
    /// [`CommandError::NoActiveBattle`] without a battle and
    /// [`CommandError::MeleeUnavailable`] for melee against a ranged-only
    /// enemy. Neither consumes a turn.
    pub fn act<D>(
        &mut self,
        action: CombatAction,
        vitals: &mut VitalsController,
        dice: &mut D,
        timers: &mut TimerQueue,
        outbox: &mut Outbox,
    ) -> Result<TurnReport, CommandError>
    where
        D: Dice + ?Sized,
    {
        let battle = self.active.as_mut().ok_or(CommandError::NoActiveBattle)?;
        if battle.result.is_terminal() {
            return Err(CommandError::BattleResolved);
        }
        if action == CombatAction::Melee && battle.ranged_only {
            log_line(outbox, "Melee is useless here; attack from range.".to_string());
            return Err(CommandError::MeleeUnavailable);
        }
        let enemy = battle
            .current_enemy()
            .cloned()
            .ok_or(CommandError::BattleResolved)?;

        battle.turn_counter = battle.turn_counter.saturating_add(1);
        let turn = battle.turn_counter;
        let player_stat = vitals.effective(action.attribute());
        let enemy_stat = match action {
            CombatAction::Melee => enemy.strength,
            CombatAction::Ranged => enemy.accuracy,
            CombatAction::Escape => enemy.agility,
        };
        let rolls = dice.roll(action.dice(), DIE_SIDES);
        let rolled: i32 = rolls.iter().map(|&face| i32::try_from(face).unwrap_or(0)).sum();
        let total = rolled.saturating_add(player_stat);
        let threshold = enemy_stat.saturating_add(self.config.difficulty_modifier);
        let success = total > threshold;

        let mut damage_dealt = 0;
        let mut damage_taken = 0;
        let mut escaped = false;
        let line = if success {
            match action {
                CombatAction::Escape => {
                    escaped = true;
                    format!("Escape succeeded: {rolled}+{player_stat}={total} > {threshold}.")
                }
                CombatAction::Melee | CombatAction::Ranged => {
                    damage_dealt = scaled_damage(
                        player_stat,
                        0,
                        self.config.damage_scale,
                        self.config.min_damage,
                    );
                    battle.current += 1;
                    format!(
                        "{} hit {}: {rolled}+{player_stat}={total} > {threshold}, {damage_dealt} damage.",
                        verb(action),
                        enemy.name
                    )
                }
            }
        } else {
            let attacker = match action {
                CombatAction::Melee => enemy.strength,
                CombatAction::Ranged => enemy.accuracy,
                CombatAction::Escape => enemy.power(),
            };
            let damage = scaled_damage(
                attacker,
                vitals.effective(Attribute::Defense),
                self.config.damage_scale,
                self.config.min_damage,
            );
            damage_taken = vitals.damage(damage, outbox);
            format!(
                "{} failed: {rolled}+{player_stat}={total} <= {threshold}, took {damage_taken} damage.",
                verb(action)
            )
        };
        log::debug!("turn {turn}: {line}");
        log_line(outbox, line.clone());

        let mut result = battle.evaluate(vitals.health());
        if escaped && result != BattleResult::Defeat {
            result = BattleResult::Escaped;
        }
        battle.result = result;
        if result.is_terminal() {
            self.finish(result, timers, outbox);
        }

        Ok(TurnReport {
            turn,
            action,
            dice: rolls,
            total,
            threshold,
            success,
            damage_dealt,
            damage_taken,
            line,
            result,
        })
    }

    /// Re-evaluate the active battle after damage from outside a turn.
    pub fn check_battle_end(
        &mut self,
        vitals: &VitalsController,
        timers: &mut TimerQueue,
        outbox: &mut Outbox,
    ) -> BattleResult {
        let Some(battle) = self.active.as_mut() else {
            return self.last_result.unwrap_or_default();
        };
        let result = battle.evaluate(vitals.health());
        battle.result = result;
        if result.is_terminal() {
            self.finish(result, timers, outbox);
        }
        result
    }

    /// Cancel the active battle through the normal terminal path.
    /// `InProgress` is treated as an escape.
    ///
    /// # Errors
    ///
    /// [`CommandError::NoActiveBattle`] when nothing is running.
    pub fn force_end(
        &mut self,
        result: BattleResult,
        timers: &mut TimerQueue,
        outbox: &mut Outbox,
    ) -> Result<BattleResult, CommandError> {
        let battle = self.active.as_mut().ok_or(CommandError::NoActiveBattle)?;
        let result = if result.is_terminal() {
            result
        } else {
            BattleResult::Escaped
        };
        battle.result = result;
        self.finish(result, timers, outbox);
        Ok(result)
    }

    fn finish(&mut self, result: BattleResult, timers: &mut TimerQueue, outbox: &mut Outbox) {
        let Some(battle) = self.active.take() else {
            return;
        };
        log::info!(
            "battle end: {result} after {} turns against {}",
            battle.turn_counter,
            battle.descriptor.enemy.name
        );
        let banner = match result {
            BattleResult::Victory => "Battle won!",
            BattleResult::Defeat => "Battle lost!",
            BattleResult::Escaped => "Got away safely.",
            BattleResult::InProgress => "Battle over.",
        };
        log_line(outbox, format!("Battle over: {banner}"));
        outbox.push(GameEvent::BattleEnded { result });
        self.last_result = Some(result);
        timers.schedule(TimerKind::CombatPanelClose, self.config.panel_close_secs);
    }
}

const fn verb(action: CombatAction) -> &'static str {
    match action {
        CombatAction::Melee => "Melee attack",
        CombatAction::Ranged => "Ranged attack",
        CombatAction::Escape => "Escape",
    }
}

fn log_line(outbox: &mut Outbox, line: String) {
    outbox.push(GameEvent::CombatLog { line });
}
