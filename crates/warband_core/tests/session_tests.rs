//! End-to-end tests of the army session against an in-memory store.

use warband_core::campaign::{CampaignData, CampaignRules, ResourcePools};
use warband_core::doctrine::DoctrineBook;
use warband_core::error::{Rejection, TrackerError};
use warband_core::health::UnitHealth;
use warband_core::roster::{compute_roster_points, Roster};
use warband_core::session::{ArmySession, MoraleTest, TrackerEvent};
use warband_core::status::{Action, MoraleOutcome, StatusFlag};
use warband_core::store::{KvStore, MemoryStore};
use warband_test_utils::fixtures::{
    sample_campaign, sample_roster, CAMPAIGN_JSON, DOCTRINES_JSON, ROSTER_JSON,
};

fn open() -> ArmySession<MemoryStore> {
    ArmySession::new("sample", sample_roster(), MemoryStore::new())
}

#[test]
fn roster_document_points() {
    let roster = Roster::from_json(ROSTER_JSON).unwrap();
    // 150 + 10 banner + 80 joined wizard
    assert_eq!(compute_roster_points(&roster), 240);
}

#[test]
fn campaign_pools_for_sample_army() {
    let rules = CampaignRules::default();
    let campaign = CampaignData::from_json(CAMPAIGN_JSON).unwrap();
    let points = compute_roster_points(&Roster::from_json(ROSTER_JSON).unwrap());

    // sample: 750 + 300 + 75 = 1125, rival: 750 + 300 + 150 = 1200
    assert_eq!(campaign.allowed_points("sample", &rules).unwrap(), 1125);
    let pools = ResourcePools::derive(&campaign, &rules, points);
    assert_eq!(pools.command_points, 0);
    assert_eq!(pools.underdog_points, (1200 - 240) / 50);
}

#[test]
fn shaken_unit_cannot_change_other_flags_until_activated() {
    let mut session = open();
    session.toggle_unit_status("squad", StatusFlag::Shaken).unwrap();

    let err = session
        .toggle_unit_status("squad", StatusFlag::InMelee)
        .unwrap_err();
    assert_eq!(
        err,
        TrackerError::Rejected(Rejection::Shaken(StatusFlag::InMelee))
    );

    session.activate_unit("squad", Action::Hold).unwrap();
    let status = session.get_unit_status("squad").unwrap();
    assert!(!status.shaken);
    assert_eq!(status.action, Some(Action::Hold));
    assert!(session
        .toggle_unit_status("squad", StatusFlag::InMelee)
        .unwrap());
}

#[test]
fn unrouting_a_recovered_unit_leaves_it_shaken() {
    let mut session = open();
    assert!(session.toggle_unit_status("squad", StatusFlag::Routed).unwrap());
    assert!(!session.toggle_unit_status("squad", StatusFlag::Shaken).unwrap());

    let status = session.get_unit_status("squad").unwrap();
    assert!(status.routed && !status.shaken);

    assert!(!session.toggle_unit_status("squad", StatusFlag::Routed).unwrap());
    let status = session.get_unit_status("squad").unwrap();
    assert!(!status.routed);
    assert!(status.shaken);
}

#[test]
fn declared_pass_on_shaken_unit_still_fails() {
    let mut session = open();
    for _ in 0..6 {
        session.kill_model("squad").unwrap();
    }
    session.toggle_unit_status("squad", StatusFlag::Shaken).unwrap();
    assert_eq!(
        session.handle_morale_result("squad", true).unwrap(),
        MoraleOutcome::Routed
    );
    let squad = session.get_unit_status("squad").unwrap();
    assert!(squad.shaken && squad.routed);

    session.toggle_unit_status("scout", StatusFlag::Shaken).unwrap();
    assert_eq!(
        session.handle_morale_result("scout", true).unwrap(),
        MoraleOutcome::Shaken
    );
    let scout = session.get_unit_status("scout").unwrap();
    assert!(scout.shaken && !scout.routed);
}

#[test]
fn toggling_models_and_wounds() {
    let mut session = open();

    assert!(!session.toggle_model("squad", 3).unwrap());
    assert_eq!(session.get_unit_health("squad").unwrap().remaining(), 9);
    assert!(session.toggle_model("squad", 3).unwrap());
    assert_eq!(
        session.toggle_model("squad", 10),
        Err(TrackerError::Rejected(Rejection::IndexOutOfRange {
            index: 10,
            len: 10
        }))
    );

    assert_eq!(
        session.toggle_model("champion", 0),
        Err(TrackerError::Rejected(Rejection::WrongHealthShape {
            operation: "Toggling a model",
            shape: "a Tough model",
        }))
    );
    assert!(session.toggle_wound("champion", 1).unwrap());
    assert_eq!(
        session.get_unit_health("champion").unwrap(),
        UnitHealth::Wounds {
            wounds: vec![false, true, false]
        }
    );
    assert_eq!(
        session.toggle_wound("squad", 0),
        Err(TrackerError::Rejected(Rejection::WrongHealthShape {
            operation: "Toggling a wound",
            shape: "a multi-model unit",
        }))
    );

    assert!(!session.toggle_model("scout", 0).unwrap());
    assert!(session.get_unit_health("scout").unwrap().is_destroyed());
}

#[test]
fn reviving_models() {
    let mut session = open();

    session.kill_model("squad").unwrap();
    session.kill_model("squad").unwrap();
    assert!(session.revive_model("squad").unwrap());
    let UnitHealth::Models { models } = session.get_unit_health("squad").unwrap() else {
        panic!("squad should track models");
    };
    assert_eq!(models.iter().filter(|&&m| m).count(), 9);
    assert!(models[8]);
    assert!(!models[9]);

    session.wound("champion").unwrap();
    assert!(session.kill_model("champion").unwrap());
    assert!(session.get_unit_health("champion").unwrap().is_destroyed());
    assert!(session.revive_model("champion").unwrap());
    assert_eq!(session.get_unit_health("champion").unwrap().remaining(), 3);

    session.drain_events();
    assert!(!session.revive_model("champion").unwrap());
    assert!(session.drain_events().is_empty());
}

#[test]
fn full_round_of_play() {
    let mut session = open();
    session.initialize_pools(ResourcePools::derive(
        &sample_campaign(),
        &CampaignRules::default(),
        session.roster_points(),
    ));

    // Squad charges, loses models and fails morale below half strength.
    session.activate_unit("squad", Action::Charge).unwrap();
    session.fight_in_melee("squad").unwrap();
    for _ in 0..5 {
        assert!(session.kill_model("squad").unwrap());
    }
    assert!(session.is_below_half_strength("squad").unwrap());
    assert_eq!(
        session.take_morale_test("squad").unwrap(),
        MoraleTest::RollRequired { quality: 4 }
    );
    assert_eq!(
        session.handle_morale_result("squad", false).unwrap(),
        MoraleOutcome::Routed
    );

    // The wizard casts twice and runs dry.
    assert_eq!(session.spend_token("wizard").unwrap(), 0);
    assert_eq!(session.spend_token("wizard").unwrap(), 1);
    assert_eq!(
        session.spend_token("wizard"),
        Err(TrackerError::Rejected(Rejection::NoTokensLeft))
    );

    // Champion takes one wound of three.
    session.wound("champion").unwrap();
    assert!(!session.is_below_half_strength("champion").unwrap());

    assert_eq!(session.start_new_round(), 2);

    let squad = session.get_unit_status("squad").unwrap();
    assert!(squad.routed && squad.shaken && squad.fatigued);
    assert!(!squad.activated && !squad.has_fought_in_melee);
    assert_eq!(session.get_tokens("wizard").unwrap().unspent(), 2);
    assert_eq!(session.get_unit_health("squad").unwrap().remaining(), 5);

    let events = session.drain_events();
    assert!(events.contains(&TrackerEvent::RoundStarted { round: 2 }));
}

#[test]
fn stratagems_cost_command_points() {
    let book = DoctrineBook::from_json(DOCTRINES_JSON).unwrap();
    let mut session = open();
    session.initialize_pools(ResourcePools {
        command_points: 2,
        underdog_points: 0,
    });

    assert_eq!(
        session.use_stratagem(&book, "shock", "Furious Charge"),
        Err(TrackerError::Rejected(Rejection::DoctrineNotSelected(
            "shock".to_string()
        )))
    );
    assert!(session.toggle_doctrine(&book, "shock").unwrap());
    assert_eq!(session.use_stratagem(&book, "universal", "Rally"), Ok(1));
    assert!(matches!(
        session.use_stratagem(&book, "shock", "Furious Charge"),
        Err(TrackerError::Rejected(Rejection::InsufficientPoints { .. }))
    ));
    assert_eq!(session.command_points(), 1);

    assert_eq!(
        session.toggle_doctrine(&book, "universal"),
        Err(TrackerError::Rejected(Rejection::UniversalDoctrine))
    );
    assert!(matches!(
        session.toggle_doctrine(&book, "missing"),
        Err(TrackerError::UnknownDoctrine(_))
    ));
}

#[test]
fn state_survives_reopening_the_store() {
    let mut session = open();
    session.wound("champion").unwrap();
    session.toggle_unit_status("scout", StatusFlag::Fatigued).unwrap();
    session.start_new_round();
    let store = session.into_store();

    assert_eq!(store.get("sample-current-round").as_deref(), Some("2"));
    assert_eq!(
        store.get("unit-health-sample-champion").as_deref(),
        Some(r#"{"wounds":[true,false,false]}"#)
    );

    let mut reopened = ArmySession::new("sample", sample_roster(), store);
    assert_eq!(reopened.current_round(), 2);
    assert!(reopened.get_unit_status("scout").unwrap().fatigued);
    assert_eq!(reopened.get_unit_health("champion").unwrap().lost(), 1);
}

#[test]
fn sessions_over_one_store_are_isolated_by_army() {
    let mut store = MemoryStore::new();
    {
        let mut first = ArmySession::new("one", sample_roster(), &mut store);
        first.wound("champion").unwrap();
    }
    let mut second = ArmySession::new("two", sample_roster(), &mut store);
    assert_eq!(second.get_unit_health("champion").unwrap().lost(), 0);
}
