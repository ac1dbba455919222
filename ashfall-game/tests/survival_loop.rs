use ashfall_game::config::{EffectConfig, VitalsConfig};
use ashfall_game::events::Outbox;
use ashfall_game::scheduler::moves_max;
use ashfall_game::{
    Attribute, AttributeDeltas, BattleDescriptor, BattleResult, CombatAction, CommandError, Enemy,
    GameEvent, InventoryLink, ItemEffect, RestKind, Segment, StatusGrant, StatusKind,
    SurvivalSession, Vital, VitalsController,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::cell::Cell;
use std::rc::Rc;

fn vitals() -> VitalsController {
    VitalsController::new(&VitalsConfig::default(), &EffectConfig::default())
}

fn count_forced_recoveries(events: &[GameEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, GameEvent::ForcedRecovery { .. }))
        .count()
}

struct Scale(Rc<Cell<f32>>);

impl InventoryLink for Scale {
    fn carried_weight(&self) -> f32 {
        self.0.get()
    }

    fn has_crafting_materials(&self) -> bool {
        false
    }
}

#[test]
fn vitals_stay_in_range_under_random_mutation() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
    let mut vitals = vitals();
    let mut outbox = Outbox::new();
    let all = [Vital::Health, Vital::Hunger, Vital::Energy, Vital::Radiation];
    for step in 0..2_000 {
        let vital = all[rng.gen_range(0..all.len())];
        let amount = rng.gen_range(-250.0_f32..250.0);
        vitals.apply_delta(vital, amount, &mut outbox);
        if step % 97 == 0 {
            let kind = StatusKind::INJURIES[rng.gen_range(0..StatusKind::INJURIES.len())];
            vitals
                .grant_status(kind, None, Some(5.0), &mut outbox)
                .unwrap();
        }
        vitals.tick(0.25, &mut outbox);
        for vital in all {
            let value = vitals.value(vital);
            assert!(
                (0.0..=vitals.max(vital)).contains(&value),
                "{vital:?} out of range at step {step}: {value}"
            );
        }
        assert!(vitals.effective_max_health() >= 1);
        assert!(vitals.effective_max_hunger() >= 1.0);
        for attribute in Attribute::COMBAT {
            assert!(vitals.effective(attribute) >= 1);
        }
        outbox.drain();
    }
}

#[test]
fn hunger_bands_are_exclusive() {
    let mut outbox = Outbox::new();
    for whole in 0_u8..=100 {
        let hunger = f32::from(whole);
        let mut vitals = vitals();
        vitals.set(Vital::Hunger, hunger, &mut outbox);
        let effects = vitals.effects();
        let under = effects.contains(StatusKind::Undernourished);
        let over = effects.contains(StatusKind::Overfed);
        if hunger < 30.0 {
            assert!(under && !over, "hunger {hunger}");
        } else if hunger > 70.0 {
            assert!(over && !under, "hunger {hunger}");
        } else {
            assert!(!under && !over, "hunger {hunger}");
        }
    }
}

#[test]
fn regranting_an_injury_refreshes_instead_of_stacking() {
    let mut vitals = vitals();
    let mut outbox = Outbox::new();
    vitals
        .grant_status(StatusKind::Fracture, None, Some(10.0), &mut outbox)
        .unwrap();
    let count = vitals.effects().len();
    vitals.tick(8.0, &mut outbox);
    vitals
        .grant_status(StatusKind::Fracture, None, Some(10.0), &mut outbox)
        .unwrap();
    assert_eq!(vitals.effects().len(), count);
    let remaining = vitals
        .effects()
        .get(StatusKind::Fracture)
        .and_then(|effect| effect.remaining_secs())
        .unwrap();
    assert!((remaining - 10.0).abs() < f32::EPSILON);
}

#[test]
fn expiry_is_announced_once() {
    let mut session = SurvivalSession::with_bundled_data(11);
    session
        .grant_status(StatusKind::Bleeding, None, Some(1.0))
        .unwrap();
    session.tick(0.6);
    session.tick(0.6);
    let expired = |events: &[GameEvent]| {
        events
            .iter()
            .filter(|event| {
                **event
                    == GameEvent::StatusEffectExpired {
                        kind: StatusKind::Bleeding,
                    }
            })
            .count()
    };
    assert_eq!(expired(session.last_events()), 1);
    session.tick(0.6);
    assert_eq!(expired(session.last_events()), 0);
    assert!(!session.active_effects().contains(StatusKind::Bleeding));
}

#[test]
fn move_budget_steps_with_weight_ratio() {
    assert_eq!(moves_max(0.3), 4);
    assert_eq!(moves_max(0.5), 3);
    assert_eq!(moves_max(0.7), 2);
    assert_eq!(moves_max(0.9), 1);
}

#[test]
fn heavier_loads_cost_more_energy_per_move() {
    let weight = Rc::new(Cell::new(0.0));
    let mut session = SurvivalSession::with_bundled_data(3);
    session.set_inventory(Box::new(Scale(Rc::clone(&weight))));

    let before = session.energy();
    session.request_move().unwrap();
    let light = before - session.energy();

    weight.set(22.0);
    session.sync_inventory();
    let before = session.energy();
    session.request_move().unwrap();
    let heavy = before - session.energy();

    assert!((light - 5.0).abs() < 1e-4);
    assert!((heavy - 20.0).abs() < 1e-4);
}

#[test]
fn energy_exhaustion_forces_exactly_one_recovery() {
    let mut session = SurvivalSession::with_bundled_data(99);
    assert_eq!(session.segment(), Segment::Morning);
    session
        .apply_item_effect(&ItemEffect {
            energy: -1_000.0,
            ..ItemEffect::default()
        })
        .unwrap();
    assert_eq!(count_forced_recoveries(session.last_events()), 1);
    assert_eq!(session.segment(), Segment::Evening);
    assert!((session.energy() - 50.0).abs() < f32::EPSILON);

    session.tick(1.0);
    assert_eq!(count_forced_recoveries(session.last_events()), 0);
    assert_eq!(session.segment(), Segment::Evening);
}

#[test]
fn exhaustion_mid_battle_waits_for_the_battle_to_end() {
    let mut session = SurvivalSession::with_bundled_data(5);
    session
        .trigger_encounter(ashfall_game::GridCoord::new(3, 3))
        .unwrap();
    assert!(session.is_in_combat());
    session
        .apply_item_effect(&ItemEffect {
            energy: -1_000.0,
            ..ItemEffect::default()
        })
        .unwrap();
    assert_eq!(count_forced_recoveries(session.last_events()), 0);
    assert_eq!(session.segment(), Segment::Morning);

    session.cancel_battle().unwrap();
    assert_eq!(count_forced_recoveries(session.last_events()), 1);
    assert_eq!(session.segment(), Segment::Evening);
}

#[test]
fn defeat_cancels_a_deferred_recovery() {
    let mut session = SurvivalSession::with_bundled_data(5);
    session
        .apply_item_effect(&ItemEffect {
            health: -95,
            energy: -85.0,
            ..ItemEffect::default()
        })
        .unwrap();
    session
        .start_battle(BattleDescriptor::new(
            Enemy::new("Warlord", 40, 40, 40),
            false,
            1,
        ))
        .unwrap();
    // The combat cost drains the last 15 energy.
    assert!(session.energy() <= 0.0);

    let mut batches = Vec::new();
    while session.is_in_combat() {
        session.submit_combat_action(CombatAction::Melee).unwrap();
        batches.extend_from_slice(session.last_events());
    }
    assert!(batches.iter().any(|event| matches!(
        event,
        GameEvent::BattleEnded {
            result: BattleResult::Defeat
        }
    )));
    session.tick(5.0);
    batches.extend_from_slice(session.last_events());

    assert!(session.is_defeated());
    assert_eq!(count_forced_recoveries(&batches), 0);
    assert_eq!(session.segment(), Segment::Morning);
    assert!(session.energy() <= 0.0);
}

#[test]
fn defeat_and_exhaustion_in_one_command_skip_recovery() {
    let mut session = SurvivalSession::with_bundled_data(6);
    session
        .apply_item_effect(&ItemEffect {
            health: -500,
            energy: -500.0,
            ..ItemEffect::default()
        })
        .unwrap();
    assert!(session.is_defeated());
    assert_eq!(count_forced_recoveries(session.last_events()), 0);
    session.tick(5.0);
    assert_eq!(count_forced_recoveries(session.last_events()), 0);
    assert_eq!(session.segment(), Segment::Morning);
}

#[test]
fn second_depletion_waits_the_full_auto_advance_delay() {
    let mut session = SurvivalSession::with_bundled_data(7);
    let delay = session.config().time.auto_advance_delay_secs;
    while session.moves_remaining() > 0 {
        session.request_move().unwrap();
    }
    session.tick(delay * 0.5);
    assert_eq!(session.segment(), Segment::Morning);

    session.request_rest(RestKind::Sleep).unwrap();
    assert_eq!(session.segment(), Segment::Afternoon);
    while session.moves_remaining() > 0 {
        session.request_move().unwrap();
    }

    // The first depletion's deadline passes without advancing.
    session.tick(delay * 0.6);
    assert_eq!(session.segment(), Segment::Afternoon);
    session.tick(delay * 0.5);
    assert_eq!(session.segment(), Segment::Evening);
}

#[test]
fn sleeping_at_night_restores_more_than_by_day() {
    let mut day = SurvivalSession::with_bundled_data(1);
    day.apply_item_effect(&ItemEffect {
        energy: -60.0,
        ..ItemEffect::default()
    })
    .unwrap();
    let outcome = day.request_rest(RestKind::Sleep).unwrap();
    assert!((outcome.energy_delta - 20.0).abs() < f32::EPSILON);
    assert_eq!(day.segment(), Segment::Afternoon);

    let mut night = SurvivalSession::with_bundled_data(1);
    night
        .apply_item_effect(&ItemEffect {
            energy: -90.0,
            ..ItemEffect::default()
        })
        .unwrap();
    night.request_rest(RestKind::Sleep).unwrap();
    night.tick(2.0);
    night.request_rest(RestKind::Sleep).unwrap();
    night.tick(2.0);
    assert_eq!(night.segment(), Segment::Evening);
    let outcome = night.request_rest(RestKind::Sleep).unwrap();
    assert!((outcome.energy_delta - 30.0).abs() < f32::EPSILON);
    assert_eq!(night.segment(), Segment::LateNight);
}

#[test]
fn overlapping_rests_are_refused_until_the_panel_closes() {
    let mut session = SurvivalSession::with_bundled_data(8);
    session.request_rest(RestKind::Sleep).unwrap();
    assert!(session.rest_in_progress());
    assert_eq!(
        session.request_rest(RestKind::Sleep),
        Err(CommandError::RestInProgress)
    );
    session.tick(2.0);
    assert!(session.last_events().contains(&GameEvent::RestPanelClosed));
    assert!(session.request_rest(RestKind::Sleep).is_ok());
}

#[test]
fn training_raises_a_combat_attribute() {
    let mut session = SurvivalSession::with_bundled_data(4);
    let base = session.vitals().base().strength;
    let outcome = session
        .request_rest(RestKind::Train {
            attribute: Attribute::Strength,
        })
        .unwrap();
    assert_eq!(outcome.trained_to, Some(base + 1));
    session.tick(2.0);
    assert_eq!(
        session.request_rest(RestKind::Train {
            attribute: Attribute::MaxHealth,
        }),
        Err(CommandError::NotTrainable {
            attribute: Attribute::MaxHealth
        })
    );
}

#[test]
fn item_boosts_and_side_effects_ride_the_timed_effect_path() {
    let mut session = SurvivalSession::with_bundled_data(21);
    let outcome = session
        .apply_item_effect(&ItemEffect {
            hunger: 10.0,
            boost: Some(AttributeDeltas::offensive(2)),
            boost_secs: Some(30.0),
            grant: Some(StatusGrant {
                kind: StatusKind::Diarrhea,
                chance: 1.0,
                deltas: None,
                duration_secs: Some(60.0),
            }),
            ..ItemEffect::default()
        })
        .unwrap();
    assert!(outcome.boosted);
    assert_eq!(outcome.granted, Some(StatusKind::Diarrhea));
    assert!(session.active_effects().contains(StatusKind::ItemBoost));
    assert!(session.active_effects().contains(StatusKind::Diarrhea));
    assert!(session.vitals().effective_max_hunger() < 100.0);
    assert!(session.hunger() <= session.vitals().effective_max_hunger());

    assert_eq!(session.cure(StatusKind::Diarrhea), Ok(true));
    assert_eq!(
        session.cure(StatusKind::Overfed),
        Err(CommandError::NotCurable {
            kind: StatusKind::Overfed
        })
    );
}
