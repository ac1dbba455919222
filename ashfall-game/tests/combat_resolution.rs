use ashfall_game::config::{CombatConfig, EffectConfig, VitalsConfig};
use ashfall_game::events::Outbox;
use ashfall_game::{
    Attribute, BattleDescriptor, BattleResult, CombatAction, CombatEngine, CommandError, Enemy,
    GameEvent, ScriptedDice, SurvivalSession, TimerKind, TimerQueue, Vital, VitalsController,
};

struct Arena {
    engine: CombatEngine,
    vitals: VitalsController,
    timers: TimerQueue,
    outbox: Outbox,
}

impl Arena {
    fn with_strength(strength: i32) -> Self {
        let config = VitalsConfig {
            base_strength: strength,
            ..VitalsConfig::default()
        };
        let mut vitals = VitalsController::new(&config, &EffectConfig::default());
        let mut outbox = Outbox::new();
        vitals.set(Vital::Hunger, 50.0, &mut outbox);
        vitals.set(Vital::Energy, 50.0, &mut outbox);
        outbox.drain();
        Self {
            engine: CombatEngine::new(&CombatConfig::default()),
            vitals,
            timers: TimerQueue::new(),
            outbox,
        }
    }

    fn start(&mut self, enemy: Enemy, ranged_only: bool, stages: u8) {
        self.engine
            .start(
                BattleDescriptor::new(enemy, ranged_only, stages),
                &mut self.outbox,
            )
            .unwrap();
    }

    fn act(
        &mut self,
        action: CombatAction,
        faces: &[u32],
    ) -> Result<ashfall_game::TurnReport, CommandError> {
        let mut dice = ScriptedDice::new(faces.iter().copied());
        self.engine.act(
            action,
            &mut self.vitals,
            &mut dice,
            &mut self.timers,
            &mut self.outbox,
        )
    }
}

fn raider() -> Enemy {
    Enemy::new("Raider", 12, 12, 12)
}

#[test]
fn melee_total_above_threshold_hits_for_half_power() {
    let mut arena = Arena::with_strength(13);
    assert_eq!(arena.vitals.effective(Attribute::Strength), 13);
    arena.start(raider(), false, 2);

    // 4 + 3 + 3 + 13 = 23 > 12 + 10
    let report = arena.act(CombatAction::Melee, &[4, 3, 3]).unwrap();
    assert_eq!(report.total, 23);
    assert_eq!(report.threshold, 22);
    assert!(report.success);
    assert_eq!(report.damage_dealt, 7);
    assert_eq!(report.damage_taken, 0);
    assert_eq!(report.result, BattleResult::InProgress);
    assert_eq!(arena.engine.current_battle().unwrap().current_index(), 1);
}

#[test]
fn total_equal_to_threshold_misses() {
    let mut arena = Arena::with_strength(13);
    arena.start(raider(), false, 1);
    let report = arena.act(CombatAction::Melee, &[3, 3, 3]).unwrap();
    assert_eq!(report.total, 22);
    assert!(!report.success);
    // (12 - 10) * 0.5
    assert_eq!(report.damage_taken, 1);
    assert_eq!(arena.vitals.health(), 99);
}

#[test]
fn every_resolved_action_counts_one_turn() {
    let mut arena = Arena::with_strength(10);
    arena.start(Enemy::new("Brute", 30, 30, 30), false, 1);
    for expected in 1..=3 {
        let action = [CombatAction::Melee, CombatAction::Ranged, CombatAction::Escape]
            [usize::try_from(expected - 1).unwrap()];
        let report = arena.act(action, &[1]).unwrap();
        assert_eq!(report.turn, expected);
        assert_eq!(
            arena.engine.current_battle().unwrap().turn_counter(),
            expected
        );
    }
}

#[test]
fn ranged_only_enemies_refuse_melee() {
    let mut arena = Arena::with_strength(10);
    arena.start(Enemy::new("Spider", 10, 0, 14), true, 1);
    assert_eq!(
        arena.act(CombatAction::Melee, &[6, 6, 6]),
        Err(CommandError::MeleeUnavailable)
    );
    assert_eq!(arena.engine.current_battle().unwrap().turn_counter(), 0);
    assert_eq!(arena.vitals.health(), 100);

    let report = arena.act(CombatAction::Ranged, &[6, 6, 6]).unwrap();
    assert!(report.success);
    assert_eq!(report.result, BattleResult::Victory);
    assert!(!arena.engine.is_in_combat());
}

#[test]
fn clearing_the_queue_is_a_victory() {
    let mut arena = Arena::with_strength(10);
    arena.start(Enemy::new("Rat", 1, 1, 1), false, 3);
    for _ in 0..2 {
        let report = arena.act(CombatAction::Melee, &[6, 6, 6]).unwrap();
        assert_eq!(report.result, BattleResult::InProgress);
    }
    let report = arena.act(CombatAction::Melee, &[6, 6, 6]).unwrap();
    assert_eq!(report.result, BattleResult::Victory);
    assert_eq!(arena.engine.last_result(), Some(BattleResult::Victory));
    assert!(arena.timers.is_pending(TimerKind::CombatPanelClose));
    assert!(
        arena
            .outbox
            .drain()
            .contains(&GameEvent::BattleEnded {
                result: BattleResult::Victory
            })
    );
}

#[test]
fn successful_escape_ends_the_battle() {
    let mut arena = Arena::with_strength(10);
    arena.start(Enemy::new("Slug", 10, 10, 1), false, 1);
    let report = arena.act(CombatAction::Escape, &[6]).unwrap();
    assert_eq!(report.dice.len(), 1);
    assert_eq!(report.result, BattleResult::Escaped);
    assert_eq!(
        arena.act(CombatAction::Escape, &[6]),
        Err(CommandError::NoActiveBattle)
    );
}

#[test]
fn failed_escape_takes_damage_from_the_stronger_stat() {
    let mut arena = Arena::with_strength(10);
    arena.start(Enemy::new("Sniper", 14, 40, 30), false, 1);
    let report = arena.act(CombatAction::Escape, &[1]).unwrap();
    assert!(!report.success);
    // (40 - 10) * 0.5
    assert_eq!(report.damage_taken, 15);
}

#[test]
fn second_start_is_rejected_without_touching_the_first() {
    let mut session = SurvivalSession::with_bundled_data(17);
    session
        .start_battle(BattleDescriptor::new(Enemy::new("Wolf", 14, 2, 16), false, 3))
        .unwrap();
    let before = session.current_battle().cloned();
    assert_eq!(
        session.start_battle(BattleDescriptor::new(raider(), true, 1)),
        Err(CommandError::BattleInProgress)
    );
    assert_eq!(session.current_battle().cloned(), before);
    assert_eq!(
        session.last_events(),
        &[GameEvent::Rejected {
            error: CommandError::BattleInProgress
        }]
    );
}

#[test]
fn zero_health_mid_battle_is_a_defeat_even_with_enemies_left() {
    let mut arena = Arena::with_strength(10);
    arena.start(raider(), false, 3);
    arena.vitals.damage(1_000, &mut arena.outbox);
    assert_eq!(arena.vitals.health(), 0);
    let result = arena
        .engine
        .check_battle_end(&arena.vitals, &mut arena.timers, &mut arena.outbox);
    assert_eq!(result, BattleResult::Defeat);
    assert!(!arena.engine.is_in_combat());
}

#[test]
fn defeat_wins_over_a_successful_escape() {
    let mut session = SurvivalSession::with_bundled_data(2);
    session
        .start_battle(BattleDescriptor::new(raider(), false, 2))
        .unwrap();
    session
        .apply_item_effect(&ashfall_game::ItemEffect {
            health: -100,
            ..ashfall_game::ItemEffect::default()
        })
        .unwrap();
    assert!(!session.is_in_combat());
    assert_eq!(session.combat().last_result(), Some(BattleResult::Defeat));
    assert!(session.is_defeated());
    assert_eq!(
        session.submit_combat_action(CombatAction::Escape),
        Err(CommandError::NoActiveBattle)
    );
}

#[test]
fn cancel_runs_the_normal_terminal_path() {
    let mut session = SurvivalSession::with_bundled_data(6);
    session
        .start_battle(BattleDescriptor::new(raider(), false, 1))
        .unwrap();
    assert_eq!(session.cancel_battle(), Ok(BattleResult::Escaped));
    let events = session.last_events();
    assert!(events.contains(&GameEvent::BattleEnded {
        result: BattleResult::Escaped
    }));
    assert!(
        events
            .iter()
            .any(|event| matches!(event, GameEvent::CombatLog { .. }))
    );
    assert!(session.combat_panel_open());
    assert_eq!(session.cancel_battle(), Err(CommandError::NoActiveBattle));
}

#[test]
fn battle_info_names_the_current_enemy() {
    let mut session = SurvivalSession::with_bundled_data(6);
    session
        .start_battle(BattleDescriptor::new(raider(), false, 3))
        .unwrap();
    let info = session.battle_info().unwrap();
    assert_eq!(info.position, 1);
    assert_eq!(info.total, 3);
    assert_eq!(info.to_string(), "Raider (1/3) STR 12 ACC 12 AGI 12");
}

#[test]
fn seeded_sessions_fight_identically() {
    let fight = |seed: u64| {
        let mut session = SurvivalSession::with_bundled_data(seed);
        session
            .start_battle(BattleDescriptor::new(raider(), false, 3))
            .unwrap();
        let mut lines = Vec::new();
        while session.is_in_combat() {
            let report = session.submit_combat_action(CombatAction::Melee).unwrap();
            lines.push(report.line);
        }
        lines
    };
    assert_eq!(fight(1234), fight(1234));
}
