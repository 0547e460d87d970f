//! Proptest strategies for engine testing.
//!
//! These strategies generate random but reproducible units and rosters
//! for property-based testing of points accounting and health tracking.

use proptest::prelude::*;
use warband_core::roster::{Roster, Rule, SelectedUpgrade, Unit, UpgradeCost, UpgradeOption, TOUGH};
use warband_core::status::{Action, StatusFlag, UnitStatus};

/// Generate a base cost (5-500).
pub fn arb_cost() -> impl Strategy<Value = i32> {
    5i32..500
}

/// Generate a Tough rating (1-12).
pub fn arb_tough() -> impl Strategy<Value = u32> {
    1u32..12
}

/// Generate a model count (1-20).
pub fn arb_size() -> impl Strategy<Value = u32> {
    1u32..20
}

/// Generate an upgrade priced for `unit_id` or, sometimes, another unit.
pub fn arb_upgrade(unit_id: &'static str) -> impl Strategy<Value = SelectedUpgrade> {
    (any::<bool>(), 0i32..100).prop_map(move |(matches, cost)| SelectedUpgrade {
        option: UpgradeOption {
            label: None,
            costs: vec![UpgradeCost {
                unit_id: if matches { unit_id } else { "elsewhere" }.to_string(),
                cost,
            }],
        },
    })
}

/// Generate an unjoined unit with a unique selection id.
pub fn arb_unit(index: usize) -> impl Strategy<Value = Unit> {
    (
        arb_size(),
        arb_cost(),
        proptest::collection::vec(arb_upgrade("generated"), 0..4),
    )
        .prop_map(move |(size, cost, upgrades)| {
            let mut unit = Unit::new("generated", format!("unit-{index}"), size, cost);
            unit.selected_upgrades = upgrades;
            unit
        })
}

/// Generate a roster of unjoined units.
pub fn arb_flat_roster(max_units: usize) -> impl Strategy<Value = Roster> {
    (0..max_units)
        .prop_flat_map(|n| (0..n).map(arb_unit).collect::<Vec<_>>())
        .prop_map(Roster::new)
}

/// Generate a single model with `Tough(n)`.
pub fn arb_tough_model() -> impl Strategy<Value = Unit> {
    arb_tough().prop_map(|n| {
        let mut unit = Unit::new("hero", "hero", 1, 50);
        unit.rules.push(Rule::rated(TOUGH, i32::try_from(n).unwrap_or(1)));
        unit
    })
}

/// Generate any action.
pub fn arb_action() -> impl Strategy<Value = Action> {
    proptest::sample::select(Action::ALL.to_vec())
}

/// Generate any status flag.
pub fn arb_flag() -> impl Strategy<Value = StatusFlag> {
    proptest::sample::select(StatusFlag::ALL.to_vec())
}

/// Generate an arbitrary status.
pub fn arb_status() -> impl Strategy<Value = UnitStatus> {
    (
        proptest::option::of(arb_action()),
        proptest::collection::vec(any::<bool>(), 7),
    )
        .prop_map(|(action, flags)| UnitStatus {
            activated: flags[0],
            action,
            shaken: flags[1],
            fatigued: flags[2],
            routed: flags[3],
            has_struck_back: flags[4],
            has_fought_in_melee: flags[5],
            in_melee: flags[6],
        })
}
