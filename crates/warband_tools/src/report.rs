//! Plain-text reports.

use std::fmt::Write as _;

use warband_core::campaign::{CampaignData, CampaignRules, ResourcePools};
use warband_core::health::UnitHealth;
use warband_core::roster::{compute_roster_points, compute_unit_points, Roster, RosterIssue};
use warband_core::session::ArmySession;
use warband_core::status::{StatusFlag, UnitStatus};
use warband_core::store::KvStore;

use crate::Result;

/// List the structural problems of a roster.
pub fn validation(roster: &Roster) -> (String, Vec<RosterIssue>) {
    let issues = roster.validate();
    let mut out = String::new();
    if issues.is_empty() {
        let _ = writeln!(out, "{}: {} units, no issues", label(roster), roster.units.len());
    }
    for issue in &issues {
        let _ = writeln!(out, "- {issue}");
    }
    (out, issues)
}

/// Per-unit points of the merged view, joined units indented under their
/// root, and the roster total.
pub fn points(roster: &Roster) -> String {
    let view = warband_core::combine::merge_combined_units(roster);
    let mut out = String::new();
    let _ = writeln!(out, "{}", label(roster));
    for root in view.root_units() {
        let _ = writeln!(out, "  {:<32} {:>5}", unit_label(root), compute_unit_points(root));
        for joined in view.joined_to(&root.selection_id) {
            let _ = writeln!(
                out,
                "    + {:<28} {:>5}",
                unit_label(joined),
                compute_unit_points(joined)
            );
        }
    }
    let _ = writeln!(out, "  {:<32} {:>5}", "Total", compute_roster_points(roster));
    out
}

/// Campaign leaderboard.
pub fn standings(campaign: &CampaignData, rules: &CampaignRules) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:<24} {:>3} {:>3} {:>3} {:>6}", "#", "Army", "W", "L", "O", "AP");
    for row in campaign.standings(rules) {
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:>3} {:>3} {:>3} {:>6}",
            row.rank, row.name, row.wins, row.losses, row.objectives, row.allowed_points
        );
    }
    out
}

/// Allowance, validity and starting pools of one army.
pub fn resources(
    campaign: &CampaignData,
    rules: &CampaignRules,
    army_id: &str,
    roster: &Roster,
) -> Result<String> {
    let points = compute_roster_points(roster);
    let allowed = campaign.allowed_points(army_id, rules)?;
    let validity = campaign.validity(army_id, rules, points)?;
    let pools = ResourcePools::derive(campaign, rules, points);

    let mut out = String::new();
    let _ = writeln!(out, "Roster points:   {points}");
    let _ = writeln!(out, "Allowed points:  {allowed}");
    if validity.over_allowed {
        let _ = writeln!(out, "  ! over the army's allowance");
    }
    if validity.over_minimum {
        let _ = writeln!(
            out,
            "  ! more than {} over the smallest allowance",
            rules.minimum_points_slack
        );
    }
    let _ = writeln!(out, "Command points:  {}", pools.command_points);
    let _ = writeln!(out, "Underdog points: {}", pools.underdog_points);
    Ok(out)
}

/// Current state of every unit in a session.
pub fn session_state<S: KvStore>(session: &mut ArmySession<S>) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Round {} | {} CP | {} UP",
        session.current_round(),
        session.command_points(),
        session.underdog_points()
    );

    let ids: Vec<String> = session
        .view()
        .units
        .iter()
        .map(|u| u.selection_id.clone())
        .collect();
    for id in ids {
        let status = session.get_unit_status(&id)?;
        let health = session.get_unit_health(&id)?;
        let unit = session.unit(&id)?;
        let name = unit_label(unit);
        let tokens = match unit.caster() {
            Some(_) => Some(session.get_tokens(&id)?.unspent()),
            None => None,
        };

        let _ = write!(out, "{name:<32} {:<12} {}", health_label(&health), status_label(&status));
        if let Some(unspent) = tokens {
            let _ = write!(out, " tokens:{unspent}");
        }
        out.push('\n');
    }
    Ok(out)
}

fn label(roster: &Roster) -> &str {
    if roster.name.is_empty() {
        "Roster"
    } else {
        &roster.name
    }
}

fn unit_label(unit: &warband_core::roster::Unit) -> String {
    if unit.is_single_model() {
        format!("{} [{}]", unit.display_name(), unit.selection_id)
    } else {
        format!("{} x{} [{}]", unit.display_name(), unit.size, unit.selection_id)
    }
}

fn health_label(health: &UnitHealth) -> String {
    match health {
        UnitHealth::Single { alive: true } => "alive".to_string(),
        UnitHealth::Single { alive: false } => "dead".to_string(),
        UnitHealth::Wounds { .. } => format!("{}/{} W", health.remaining(), health.capacity()),
        UnitHealth::Models { .. } => format!("{}/{} M", health.remaining(), health.capacity()),
    }
}

fn status_label(status: &UnitStatus) -> String {
    let mut parts: Vec<String> = Vec::new();
    if status.activated {
        parts.push(match status.action {
            Some(action) => format!("activated({action})"),
            None => "activated".to_string(),
        });
    }
    parts.extend(
        StatusFlag::ALL
            .into_iter()
            .filter(|&f| status.get(f))
            .map(|f| f.to_string()),
    );
    if parts.is_empty() {
        "ready".to_string()
    } else {
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_core::status::Action;

    #[test]
    fn test_status_label() {
        let mut status = UnitStatus::default();
        assert_eq!(status_label(&status), "ready");
        status.activate(Action::Rush).unwrap();
        status.fatigued = true;
        assert_eq!(status_label(&status), "activated(rush),fatigued");
    }

    #[test]
    fn test_health_label() {
        let health = UnitHealth::Wounds {
            wounds: vec![true, false, false],
        };
        assert_eq!(health_label(&health), "2/3 W");
        assert_eq!(health_label(&UnitHealth::Single { alive: false }), "dead");
    }
}
