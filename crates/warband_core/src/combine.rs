//! Combined-unit merge.
//!
//! Units sharing a group key are presented as one larger unit. The merge is
//! a derived view: the source roster is never modified.

use std::collections::{HashMap, HashSet};

use crate::roster::{LoadoutItem, Roster, Rule, Unit};

/// Identity of a loadout entry for merging: name, range, attacks and the
/// normalized special rules.
type LoadoutKey = (String, Option<u32>, Option<u32>, Vec<Rule>);

fn loadout_key(item: &LoadoutItem) -> LoadoutKey {
    let mut rules = item.special_rules.clone();
    rules.sort();
    (item.name.clone(), item.range, item.attacks, rules)
}

/// Group key of a unit: its `combinedWith` key, or its own selection id when
/// only the `combined` flag is set.
fn group_key(unit: &Unit) -> Option<&str> {
    match (&unit.combined_with, unit.combined) {
        (Some(key), _) => Some(key.as_str()),
        (None, true) => Some(unit.selection_id.as_str()),
        (None, false) => None,
    }
}

/// Merge every combined group into one synthetic unit.
///
/// The first member of a group (in roster order) is the base: its identity,
/// quality and defense carry over unchanged. Size, cost and upgrades
/// accumulate, xp takes the maximum, identical loadout entries have their
/// counts summed and rules are deduplicated by name and rating. Joins to
/// any member of a group point at the merged unit afterwards.
#[must_use]
pub fn merge_combined_units(roster: &Roster) -> Roster {
    let mut units: Vec<Unit> = Vec::with_capacity(roster.units.len());
    let mut group_slots: HashMap<&str, usize> = HashMap::new();

    for unit in &roster.units {
        let Some(key) = group_key(unit) else {
            units.push(unit.clone());
            continue;
        };

        if let Some(&slot) = group_slots.get(key) {
            absorb(&mut units[slot], unit);
        } else {
            group_slots.insert(key, units.len());
            let mut base = unit.clone();
            base.combined_members = vec![unit.selection_id.clone()];
            units.push(base);
        }
    }

    let mut merged_into: HashMap<String, String> = HashMap::new();
    for unit in &mut units {
        if !unit.combined_members.is_empty() {
            finish_merge(unit);
            for member in &unit.combined_members[1..] {
                merged_into.insert(member.clone(), unit.selection_id.clone());
            }
        }
    }

    // Units joined to an absorbed member follow it into the merged unit.
    for unit in &mut units {
        if let Some(base) = unit
            .join_to_unit
            .as_deref()
            .and_then(|target| merged_into.get(target))
        {
            unit.join_to_unit = Some(base.clone());
        }
    }

    Roster {
        id: roster.id.clone(),
        name: roster.name.clone(),
        units,
    }
}

fn absorb(base: &mut Unit, member: &Unit) {
    if base.quality != member.quality || base.defense != member.defense {
        tracing::warn!(
            "Combining {} into {} with differing stats (Q{}+ D{}+ vs Q{}+ D{}+); keeping the first",
            member.selection_id,
            base.selection_id,
            member.quality,
            member.defense,
            base.quality,
            base.defense
        );
    }

    base.size += member.size;
    base.cost += member.cost;
    base.xp = base.xp.max(member.xp);
    base.selected_upgrades
        .extend(member.selected_upgrades.iter().cloned());
    base.rules.extend(member.rules.iter().cloned());
    base.loadout.extend(member.loadout.iter().cloned());
    base.combined_members.push(member.selection_id.clone());
}

/// Deduplicate the accumulated rules and loadout, then drop the group markers.
fn finish_merge(unit: &mut Unit) {
    let mut seen_rules = HashSet::new();
    unit.rules.retain(|r| seen_rules.insert((r.name.clone(), r.rating)));

    let mut merged: Vec<LoadoutItem> = Vec::with_capacity(unit.loadout.len());
    let mut slots: HashMap<LoadoutKey, usize> = HashMap::new();
    for item in unit.loadout.drain(..) {
        let key = loadout_key(&item);
        if let Some(&slot) = slots.get(&key) {
            merged[slot].count += item.count;
        } else {
            slots.insert(key, merged.len());
            merged.push(item);
        }
    }
    unit.loadout = merged;

    unit.combined = false;
    unit.combined_with = None;

    tracing::debug!(
        "Merged {:?} into {} ({} models)",
        unit.combined_members,
        unit.selection_id,
        unit.size
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::compute_roster_points;

    fn rifle(count: u32) -> LoadoutItem {
        LoadoutItem {
            name: "Rifle".to_string(),
            label: None,
            range: Some(24),
            attacks: Some(1),
            special_rules: vec![Rule::rated("AP", 1)],
            count,
        }
    }

    fn squad(selection_id: &str, group: &str) -> Unit {
        let mut unit = Unit::new("riflemen", selection_id, 5, 100);
        unit.combined_with = Some(group.to_string());
        unit.loadout = vec![rifle(5)];
        unit.rules = vec![Rule::new("Relentless")];
        unit
    }

    #[test]
    fn test_merge_sums_size_cost_and_weapons() {
        let mut second = squad("b", "g1");
        second.xp = 7;
        second.rules.push(Rule::rated("Tough", 1));
        let roster = Roster::new(vec![squad("a", "g1"), second]);

        let merged = merge_combined_units(&roster);
        assert_eq!(merged.units.len(), 1);

        let unit = &merged.units[0];
        assert_eq!(unit.selection_id, "a");
        assert_eq!(unit.size, 10);
        assert_eq!(unit.cost, 200);
        assert_eq!(unit.xp, 7);
        assert_eq!(unit.loadout.len(), 1);
        assert_eq!(unit.loadout[0].count, 10);
        assert_eq!(
            unit.rules,
            vec![Rule::new("Relentless"), Rule::rated("Tough", 1)]
        );
        assert_eq!(unit.combined_members, vec!["a".to_string(), "b".to_string()]);
        assert!(!unit.is_combined());
    }

    #[test]
    fn test_merge_keeps_distinct_weapons_apart() {
        let mut second = squad("b", "g1");
        second.loadout[0].range = Some(18);
        let roster = Roster::new(vec![squad("a", "g1"), second]);

        let merged = merge_combined_units(&roster);
        assert_eq!(merged.units[0].loadout.len(), 2);
    }

    #[test]
    fn test_merge_is_non_destructive_and_preserves_points() {
        let plain = Unit::new("hero", "h", 1, 50);
        let roster = Roster::new(vec![squad("a", "g1"), plain, squad("b", "g1")]);
        let before = roster.clone();

        let merged = merge_combined_units(&roster);
        assert_eq!(roster, before);
        assert_eq!(merged.units.len(), 2);
        assert_eq!(merged.units[0].selection_id, "a");
        assert_eq!(merged.units[1].selection_id, "h");
        assert_eq!(compute_roster_points(&merged), compute_roster_points(&roster));
    }

    #[test]
    fn test_self_keyed_group() {
        let mut base = Unit::new("riflemen", "a", 5, 100);
        base.combined = true;
        let mut partner = Unit::new("riflemen", "b", 5, 100);
        partner.combined_with = Some("a".to_string());
        let roster = Roster::new(vec![base, partner]);

        let merged = merge_combined_units(&roster);
        assert_eq!(merged.units.len(), 1);
        assert_eq!(merged.units[0].size, 10);
    }

    #[test]
    fn test_join_to_absorbed_member_follows_merge() {
        let mut hero = Unit::new("hero", "h", 1, 50);
        hero.join_to_unit = Some("b".to_string());
        let roster = Roster::new(vec![squad("a", "g1"), squad("b", "g1"), hero]);

        let merged = merge_combined_units(&roster);
        assert_eq!(merged.units[1].join_to_unit.as_deref(), Some("a"));
        assert_eq!(merged.root_units().count(), 1);
        let joined: Vec<_> = merged.joined_to("a").map(|u| u.selection_id.as_str()).collect();
        assert_eq!(joined, vec!["h"]);
        assert_eq!(roster.units[2].join_to_unit.as_deref(), Some("b"));
    }

    #[test]
    fn test_base_stats_win_on_mismatch() {
        let mut second = squad("b", "g1");
        second.quality = 3;
        let roster = Roster::new(vec![squad("a", "g1"), second]);

        let merged = merge_combined_units(&roster);
        assert_eq!(merged.units[0].quality, 4);
    }
}
