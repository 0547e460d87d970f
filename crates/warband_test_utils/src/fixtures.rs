//! Test fixtures and helpers.
//!
//! Pre-built units, rosters and campaign documents for consistent testing.

use warband_core::campaign::{CampaignArmy, CampaignData};
use warband_core::roster::{Roster, Rule, Unit, CASTER, TOUGH};

/// A multi-model infantry squad.
#[must_use]
pub fn squad(selection_id: &str, size: u32, cost: i32) -> Unit {
    Unit::new("infantry", selection_id, size, cost)
}

/// A single model with `Tough(wounds)`.
#[must_use]
pub fn tough_hero(selection_id: &str, wounds: i32) -> Unit {
    let mut unit = Unit::new("hero", selection_id, 1, 60);
    unit.rules.push(Rule::rated(TOUGH, wounds));
    unit
}

/// A single model with `Tough(3)` and `Caster(tokens)`.
#[must_use]
pub fn caster(selection_id: &str, tokens: i32) -> Unit {
    let mut unit = tough_hero(selection_id, 3);
    unit.id = "wizard".to_string();
    unit.rules.push(Rule::rated(CASTER, tokens));
    unit
}

/// Attach `unit` to the root with selection id `root`.
#[must_use]
pub fn joined(mut unit: Unit, root: &str) -> Unit {
    unit.join_to_unit = Some(root.to_string());
    unit
}

/// A small army: a squad with a joined caster, a lone Tough hero and a
/// single scout.
#[must_use]
pub fn sample_roster() -> Roster {
    Roster {
        id: "sample".to_string(),
        name: "Sample Army".to_string(),
        units: vec![
            squad("squad", 10, 150),
            joined(caster("wizard", 2), "squad"),
            tough_hero("champion", 3),
            Unit::new("scout", "scout", 1, 25),
        ],
    }
}

/// A campaign army entry.
#[must_use]
pub fn campaign_army(id: &str, wins: u32, losses: u32, objectives: u32) -> CampaignArmy {
    CampaignArmy {
        army_forge_id: id.to_string(),
        wins,
        losses,
        objectives,
        ..CampaignArmy::default()
    }
}

/// A three-army campaign at 750 base points.
#[must_use]
pub fn sample_campaign() -> CampaignData {
    CampaignData {
        base_points: 750,
        armies: vec![
            campaign_army("sample", 0, 1, 1),
            campaign_army("rival", 2, 0, 2),
            campaign_army("newcomer", 0, 0, 0),
        ],
    }
}

/// Roster JSON as produced by the army builder.
pub const ROSTER_JSON: &str = r#"{
    "id": "sample",
    "name": "Sample Army",
    "units": [
        {
            "id": "infantry",
            "selectionId": "squad",
            "name": "Infantry",
            "size": 10,
            "cost": 150,
            "quality": 4,
            "defense": 5,
            "rules": [{"name": "Relentless"}],
            "loadout": [{"name": "Rifle", "range": 24, "attacks": 1, "specialRules": [], "count": 10}],
            "selectedUpgrades": [{"option": {"label": "Banner", "costs": [{"unitId": "infantry", "cost": 10}]}}]
        },
        {
            "id": "wizard",
            "selectionId": "wizard",
            "name": "Wizard",
            "customName": "Merla",
            "size": 1,
            "cost": 80,
            "quality": 4,
            "defense": 4,
            "rules": [{"name": "Tough", "rating": 3}, {"name": "Caster", "rating": "2"}],
            "joinToUnit": "squad"
        }
    ]
}"#;

/// Campaign JSON matching [`ROSTER_JSON`].
pub const CAMPAIGN_JSON: &str = r#"{
    "basePoints": 750,
    "armies": [
        {"armyForgeID": "sample", "armyURL": "https://example.test/sample", "wins": 0, "losses": 1, "objectives": 1, "earnedPts": 0},
        {"armyForgeID": "rival", "armyURL": "https://example.test/rival", "wins": 2, "losses": 0, "objectives": 2, "earnedPts": 0}
    ]
}"#;

/// Doctrine JSON with the universal doctrine and one optional doctrine.
pub const DOCTRINES_JSON: &str = r#"[
    {"id": "universal", "name": "Universal", "stratagems": [
        {"name": "Rally", "cost": 1, "description": "Remove Shaken from one unit."}
    ]},
    {"id": "shock", "name": "Shock Assault", "stratagems": [
        {"name": "Furious Charge", "cost": 2, "description": "Charging unit gets Furious."}
    ]}
]"#;
