use ashfall_game::config::EncounterConfig;
use ashfall_game::data::EncounterData;
use ashfall_game::{
    BattleDescriptor, BattleResult, CommandError, DispatchOutcome, EncounterDescriptor,
    EncounterDispatcher, EncounterKind, EncounterTableError, EnemyCatalog, GameEvent, GridCoord,
    SurvivalSession,
};

fn session() -> SurvivalSession {
    SurvivalSession::with_bundled_data(0xA5F0)
}

#[test]
fn one_shot_raider_camp_fires_once() {
    let mut session = session();
    let camp = GridCoord::new(3, 3);
    assert_eq!(
        session.trigger_encounter(camp),
        Ok(DispatchOutcome::BattleStarted)
    );
    let info = session.battle_info().unwrap();
    assert_eq!(info.enemy.name, "Raider Camp");
    assert_eq!(
        (info.enemy.strength, info.enemy.accuracy, info.enemy.agility),
        (15, 12, 10)
    );
    session.cancel_battle().unwrap();

    assert_eq!(session.trigger_encounter(camp), Ok(DispatchOutcome::NoEvent));
    assert!(!session.is_in_combat());
    assert!(session.last_events().is_empty());
}

#[test]
fn dispatch_charges_event_then_combat_costs() {
    let mut session = session();
    let hunger = session.hunger();
    let energy = session.energy();
    session.trigger_encounter(GridCoord::new(5, 2)).unwrap();
    assert!((hunger - session.hunger() - 10.0).abs() < 1e-4);
    assert!((energy - session.energy() - 25.0).abs() < 1e-4);
    let info = session.battle_info().unwrap();
    assert_eq!(info.total, 3);
}

#[test]
fn encounters_are_refused_while_fighting() {
    let mut session = session();
    session.trigger_encounter(GridCoord::new(6, 4)).unwrap();
    assert!(session.current_battle().unwrap().is_ranged_only());
    let scrap = GridCoord::new(1, 0);
    assert_eq!(
        session.trigger_encounter(scrap),
        Err(CommandError::BattleInProgress)
    );
    assert!(session.encounters().peek(scrap).is_some());
}

#[test]
fn radiation_storm_is_deterministic_and_repeatable() {
    let mut session = session();
    let storm = GridCoord::new(4, 4);
    for round in 1..=2 {
        let health = session.health();
        let radiation = session.radiation();
        assert_eq!(
            session.trigger_encounter(storm),
            Ok(DispatchOutcome::Environmental {
                kind: EncounterKind::RadiationStorm
            })
        );
        assert_eq!(health - session.health(), 10, "round {round}");
        assert!((session.radiation() - radiation - 15.0).abs() < 1e-4);
    }
}

#[test]
fn damage_and_heal_tiles_use_authored_amounts() {
    let mut session = session();
    session.trigger_encounter(GridCoord::new(6, 1)).unwrap();
    assert_eq!(session.health(), 85);
    session.trigger_encounter(GridCoord::new(3, 6)).unwrap();
    assert_eq!(session.health(), 100);
}

#[test]
fn haven_announces_a_save_point() {
    let mut session = session();
    let coord = GridCoord::new(4, 0);
    assert_eq!(
        session.trigger_encounter(coord),
        Ok(DispatchOutcome::SavePoint)
    );
    assert!(session.last_events().contains(&GameEvent::SavePoint { coord }));
    assert_eq!(
        session.trigger_encounter(coord),
        Ok(DispatchOutcome::SavePoint)
    );
}

#[test]
fn reward_rolls_honour_descriptor_overrides() {
    let config = EncounterConfig::default();
    let always = GridCoord::new(0, 0);
    let never = GridCoord::new(1, 1);
    let dispatcher = EncounterDispatcher::new(
        [
            EncounterDescriptor::new(always, EncounterKind::AbandonedRestaurant, true)
                .with_reward_chance(1.0),
            EncounterDescriptor::new(never, EncounterKind::ScrapYard, true)
                .with_reward_chance(0.0),
        ],
        &config,
    )
    .unwrap();
    let mut session = SurvivalSession::new(Default::default(), dispatcher, 9);
    session
        .apply_item_effect(&ashfall_game::ItemEffect {
            hunger: -50.0,
            ..ashfall_game::ItemEffect::default()
        })
        .unwrap();

    let hunger = session.hunger();
    assert_eq!(
        session.trigger_encounter(always),
        Ok(DispatchOutcome::Reward {
            kind: EncounterKind::AbandonedRestaurant,
            found: true
        })
    );
    // event cost 5, meal 20
    assert!((session.hunger() - hunger - 15.0).abs() < 1e-4);

    assert_eq!(
        session.trigger_encounter(never),
        Ok(DispatchOutcome::Reward {
            kind: EncounterKind::ScrapYard,
            found: false
        })
    );
    assert!(session.last_events().contains(&GameEvent::RewardMissed {
        coord: never,
        kind: EncounterKind::ScrapYard
    }));
}

#[test]
fn empty_coordinates_cost_nothing() {
    let mut session = session();
    let before = session.snapshot();
    assert_eq!(
        session.trigger_encounter(GridCoord::new(40, -3)),
        Ok(DispatchOutcome::NoEvent)
    );
    assert_eq!(session.snapshot(), before);
}

#[test]
fn travel_spends_a_move_before_dispatching() {
    let mut session = session();
    let outcome = session.travel_to(GridCoord::new(3, 3)).unwrap();
    assert_eq!(outcome, DispatchOutcome::BattleStarted);
    assert_eq!(session.moves_remaining(), 3);
    assert_eq!(
        session.travel_to(GridCoord::new(1, 0)),
        Err(CommandError::BattleInProgress)
    );
    assert_eq!(session.moves_remaining(), 3);
}

#[test]
fn duplicate_coordinates_are_rejected() {
    let coord = GridCoord::new(2, 2);
    let result = EncounterDispatcher::new(
        [
            EncounterDescriptor::new(coord, EncounterKind::ScrapYard, true),
            EncounterDescriptor::new(coord, EncounterKind::Heal, false).with_amount(5),
        ],
        &EncounterConfig::default(),
    );
    assert_eq!(
        result.unwrap_err(),
        EncounterTableError::DuplicateCoordinate(coord)
    );
}

#[test]
fn combat_descriptors_need_an_enemy() {
    let coord = GridCoord::new(0, 1);
    let missing = EncounterDispatcher::new(
        [EncounterDescriptor::new(coord, EncounterKind::Airdrop, true)],
        &EncounterConfig::default(),
    );
    assert_eq!(
        missing.unwrap_err(),
        EncounterTableError::MissingEnemy(coord)
    );

    let data = EncounterData::from_json(
        r#"{"encounters":[{"x":0,"y":1,"kind":"airdrop","enemy":"ghost"}]}"#,
    )
    .unwrap();
    let unknown =
        EncounterDispatcher::from_data(&data, &EnemyCatalog::load_from_static(), &EncounterConfig::default());
    assert!(matches!(
        unknown,
        Err(EncounterTableError::UnknownEnemy { .. })
    ));
}

#[test]
fn repeatable_combat_can_be_fought_again() {
    let mut session = session();
    let raider = GridCoord::new(2, 5);
    session.trigger_encounter(raider).unwrap();
    assert_eq!(session.cancel_battle(), Ok(BattleResult::Escaped));
    assert_eq!(
        session.trigger_encounter(raider),
        Ok(DispatchOutcome::BattleStarted)
    );
    let started = session
        .current_battle()
        .map(|battle| battle.descriptor().clone());
    assert!(matches!(started, Some(BattleDescriptor { stages: 1, .. })));
}
