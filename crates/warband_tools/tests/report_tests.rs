//! Report output tests.

use warband_core::campaign::{CampaignData, CampaignRules};
use warband_core::roster::{Roster, Unit};
use warband_core::session::ArmySession;
use warband_core::status::StatusFlag;
use warband_test_utils::fixtures::{joined, sample_campaign, sample_roster, CAMPAIGN_JSON, ROSTER_JSON};
use warband_tools::file_store::JsonFileStore;
use warband_tools::report;

#[test]
fn points_report_nests_joined_units() {
    let text = report::points(&Roster::from_json(ROSTER_JSON).unwrap());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Sample Army");
    assert!(lines[1].contains("Infantry x10 [squad]") && lines[1].ends_with("160"));
    assert!(lines[2].contains("+ Merla [wizard]") && lines[2].ends_with("80"));
    assert!(lines[3].contains("Total") && lines[3].ends_with("240"));
}

#[test]
fn points_report_keeps_joins_to_combined_members() {
    let mut first = Unit::new("riflemen", "a", 5, 100);
    first.combined_with = Some("g1".to_string());
    let mut second = Unit::new("riflemen", "b", 5, 100);
    second.combined_with = Some("g1".to_string());
    let hero = joined(Unit::new("hero", "h", 1, 50), "b");

    let text = report::points(&Roster::new(vec![first, second, hero]));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains("riflemen x10 [a]") && lines[1].ends_with("200"));
    assert!(lines[2].contains("+ hero [h]") && lines[2].ends_with("50"));
    assert!(lines[3].contains("Total") && lines[3].ends_with("250"));
}

#[test]
fn validation_reports_dangling_join() {
    let mut roster = sample_roster();
    roster.units.push(joined(
        Unit::new("scout", "lost", 1, 20),
        "nowhere",
    ));
    let (text, issues) = report::validation(&roster);
    assert_eq!(issues.len(), 1);
    assert!(text.contains("unit lost joins missing unit nowhere"));
}

#[test]
fn standings_report_orders_by_wins() {
    let text = report::standings(&sample_campaign(), &CampaignRules::default());
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert!(rows[0].contains("rival"));
    assert!(rows[2].contains("newcomer") || rows[2].contains("sample"));
}

#[test]
fn resources_report_for_unknown_army_fails() {
    let campaign = CampaignData::from_json(CAMPAIGN_JSON).unwrap();
    let roster = Roster::from_json(ROSTER_JSON).unwrap();
    let rules = CampaignRules::default();

    assert!(report::resources(&campaign, &rules, "ghost", &roster).is_err());
    let text = report::resources(&campaign, &rules, "sample", &roster).unwrap();
    assert!(text.contains("Underdog points: 19"));
}

#[test]
fn tracking_through_a_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut session = ArmySession::new("sample", sample_roster(), JsonFileStore::open(&path).unwrap());
    session.wound("champion").unwrap();
    session
        .toggle_unit_status("scout", StatusFlag::Fatigued)
        .unwrap();
    drop(session);

    let mut session = ArmySession::new("sample", sample_roster(), JsonFileStore::open(&path).unwrap());
    let text = report::session_state(&mut session).unwrap();
    assert!(text.starts_with("Round 1 | 0 CP | 0 UP"));
    assert!(text.contains("2/3 W"));
    assert!(text.contains("fatigued"));
    assert!(text.contains("tokens:2"));
}
