//! Roster documents and points accounting.
//!
//! Roster JSON is produced by the external army builder and consumed
//! read-only. Point totals are always derived, never stored.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Name of the rule granting extra wounds to a single model.
pub const TOUGH: &str = "Tough";

/// Name of the rule granting spell tokens.
pub const CASTER: &str = "Caster";

/// A special rule, optionally rated (e.g. `Tough(3)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rule {
    /// Rule name.
    pub name: String,
    /// Rule-specific integer modifier.
    #[serde(
        default,
        with = "rating_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<i32>,
}

impl Rule {
    /// Create an unrated rule.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rating: None,
        }
    }

    /// Create a rated rule.
    #[must_use]
    pub fn rated(name: impl Into<String>, rating: i32) -> Self {
        Self {
            name: name.into(),
            rating: Some(rating),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rating {
            Some(rating) => write!(f, "{}({rating})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Serde support for rule ratings.
///
/// The army builder emits ratings as numbers in some documents and as
/// numeric strings in others; both decode to `Option<i32>`.
pub mod rating_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRating {
        Number(i64),
        Text(String),
    }

    /// Serialize a rating as a plain number.
    pub fn serialize<S>(value: &Option<i32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_i32(*v),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize a rating from a number, a numeric string, or null.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawRating>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RawRating::Number(n)) => i32::try_from(n).map(Some).map_err(D::Error::custom),
            Some(RawRating::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(None)
                } else {
                    s.parse().map(Some).map_err(D::Error::custom)
                }
            }
        }
    }
}

/// A weapon or item carried by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadoutItem {
    /// Item name.
    pub name: String,
    /// Display label, if the builder supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Range in inches (None for melee weapons and items).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<u32>,
    /// Attack dice (None for non-weapon items).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacks: Option<u32>,
    /// Weapon special rules.
    #[serde(default)]
    pub special_rules: Vec<Rule>,
    /// How many of this item the unit carries.
    #[serde(default = "default_count")]
    pub count: u32,
}

const fn default_count() -> u32 {
    1
}

impl LoadoutItem {
    /// Whether this item is a weapon.
    #[must_use]
    pub const fn is_weapon(&self) -> bool {
        self.attacks.is_some()
    }
}

/// Incremental cost of an upgrade option for one unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeCost {
    /// Catalog id of the unit this cost applies to.
    pub unit_id: String,
    /// Points added.
    pub cost: i32,
}

/// The option chosen for an upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeOption {
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Cost per unit type.
    #[serde(default)]
    pub costs: Vec<UpgradeCost>,
}

impl UpgradeOption {
    /// Cost of this option for the given unit type, zero if not listed.
    #[must_use]
    pub fn cost_for(&self, unit_id: &str) -> i32 {
        self.costs
            .iter()
            .find(|c| c.unit_id == unit_id)
            .map_or(0, |c| c.cost)
    }
}

/// An upgrade selected on a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedUpgrade {
    /// Chosen option.
    pub option: UpgradeOption,
}

/// One roster entry: a squad or a single model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Catalog reference.
    pub id: String,
    /// Unique instance key within the roster.
    pub selection_id: String,
    /// Catalog name.
    pub name: String,
    /// Player-assigned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Model count.
    #[serde(default = "default_size")]
    pub size: u32,
    /// Base points cost before upgrades.
    #[serde(default)]
    pub cost: i32,
    /// Quality stat (target number for quality and morale tests).
    #[serde(default)]
    pub quality: u32,
    /// Defense stat.
    #[serde(default)]
    pub defense: u32,
    /// Campaign experience.
    #[serde(default)]
    pub xp: u32,
    /// Special rules.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Weapons and items.
    #[serde(default)]
    pub loadout: Vec<LoadoutItem>,
    /// Upgrades in selection order.
    #[serde(default)]
    pub selected_upgrades: Vec<SelectedUpgrade>,
    /// Selection id of the unit this one is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_to_unit: Option<String>,
    /// Combined with a copy of itself.
    #[serde(default)]
    pub combined: bool,
    /// Group key shared by combined units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_with: Option<String>,
    /// Selection ids of the units merged into this one (merged view only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combined_members: Vec<String>,
}

const fn default_size() -> u32 {
    1
}

impl Unit {
    /// Create a unit with the given identity, size and base cost.
    #[must_use]
    pub fn new(id: impl Into<String>, selection_id: impl Into<String>, size: u32, cost: i32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            selection_id: selection_id.into(),
            custom_name: None,
            size,
            cost,
            quality: 4,
            defense: 4,
            xp: 0,
            rules: Vec::new(),
            loadout: Vec::new(),
            selected_upgrades: Vec::new(),
            join_to_unit: None,
            combined: false,
            combined_with: None,
            combined_members: Vec::new(),
        }
    }

    /// Name shown to the player.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }

    /// Find a rule by name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Whether the unit has the named rule.
    #[must_use]
    pub fn has_rule(&self, name: &str) -> bool {
        self.rule(name).is_some()
    }

    /// Rating of the named rule, if present and rated.
    #[must_use]
    pub fn rating_of(&self, name: &str) -> Option<i32> {
        self.rule(name).and_then(|r| r.rating)
    }

    /// Wound count granted by `Tough(N)`.
    #[must_use]
    pub fn tough(&self) -> Option<u32> {
        self.rating_of(TOUGH)
            .and_then(|r| u32::try_from(r).ok())
            .filter(|&r| r > 0)
    }

    /// Token count granted by `Caster(N)`.
    #[must_use]
    pub fn caster(&self) -> Option<u32> {
        self.rating_of(CASTER)
            .and_then(|r| u32::try_from(r).ok())
            .filter(|&r| r > 0)
    }

    /// Whether this unit represents one model.
    #[must_use]
    pub const fn is_single_model(&self) -> bool {
        self.size <= 1
    }

    /// Whether this unit takes part in a combined group.
    #[must_use]
    pub fn is_combined(&self) -> bool {
        self.combined || self.combined_with.is_some()
    }
}

/// Points cost of one unit: base cost plus its upgrades.
#[must_use]
pub fn compute_unit_points(unit: &Unit) -> i32 {
    unit.cost
        + unit
            .selected_upgrades
            .iter()
            .map(|u| u.option.cost_for(&unit.id))
            .sum::<i32>()
}

/// Points cost of a whole roster.
///
/// Visits every root unit and the units joined to it, each exactly once.
#[must_use]
pub fn compute_roster_points(roster: &Roster) -> i32 {
    roster
        .root_units()
        .map(|root| {
            compute_unit_points(root)
                + roster
                    .joined_to(&root.selection_id)
                    .map(compute_unit_points)
                    .sum::<i32>()
        })
        .sum()
}

/// A problem found by [`Roster::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterIssue {
    /// Two units share a selection id.
    DuplicateSelectionId(String),
    /// A unit joins a selection id that is not in the roster.
    DanglingJoin {
        /// Joining unit.
        unit: String,
        /// Missing target.
        target: String,
    },
    /// A unit joins a unit that is itself joined.
    NestedJoin {
        /// Joining unit.
        unit: String,
        /// Target that is not a root.
        target: String,
    },
    /// A unit declares zero models.
    EmptyUnit(String),
}

impl fmt::Display for RosterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSelectionId(id) => write!(f, "duplicate selection id {id}"),
            Self::DanglingJoin { unit, target } => {
                write!(f, "unit {unit} joins missing unit {target}")
            }
            Self::NestedJoin { unit, target } => {
                write!(f, "unit {unit} joins {target}, which is itself joined")
            }
            Self::EmptyUnit(id) => write!(f, "unit {id} has no models"),
        }
    }
}

/// An army roster: units in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    /// Army id assigned by the army builder.
    #[serde(default)]
    pub id: String,
    /// Army name.
    #[serde(default)]
    pub name: String,
    /// Units in list order.
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl Roster {
    /// Create a roster from units.
    #[must_use]
    pub fn new(units: Vec<Unit>) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    /// Parse a roster document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TrackerError::DataParse {
            what: "roster".to_string(),
            message: e.to_string(),
        })
    }

    /// Find a unit by selection id.
    #[must_use]
    pub fn get(&self, selection_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.selection_id == selection_id)
    }

    /// The root a unit is joined to.
    ///
    /// `None` when the unit is unjoined, or when its join target is missing
    /// or is itself joined; such units count as roots.
    #[must_use]
    pub fn join_target(&self, unit: &Unit) -> Option<&Unit> {
        let target_id = unit.join_to_unit.as_deref()?;
        self.get(target_id).filter(|t| t.join_to_unit.is_none())
    }

    /// Units that stand on their own in the list.
    pub fn root_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| self.join_target(u).is_none())
    }

    /// Units attached to the given root.
    pub fn joined_to<'a>(&'a self, root_selection_id: &'a str) -> impl Iterator<Item = &'a Unit> {
        self.units.iter().filter(move |u| {
            self.join_target(u)
                .is_some_and(|t| t.selection_id == root_selection_id)
        })
    }

    /// Check the structural invariants of the roster.
    #[must_use]
    pub fn validate(&self) -> Vec<RosterIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for unit in &self.units {
            if !seen.insert(unit.selection_id.as_str()) {
                issues.push(RosterIssue::DuplicateSelectionId(unit.selection_id.clone()));
            }
            if unit.size == 0 {
                issues.push(RosterIssue::EmptyUnit(unit.selection_id.clone()));
            }
            if let Some(target) = unit.join_to_unit.as_deref() {
                match self.get(target) {
                    None => issues.push(RosterIssue::DanglingJoin {
                        unit: unit.selection_id.clone(),
                        target: target.to_string(),
                    }),
                    Some(t) if t.join_to_unit.is_some() => issues.push(RosterIssue::NestedJoin {
                        unit: unit.selection_id.clone(),
                        target: target.to_string(),
                    }),
                    Some(_) => {}
                }
            }
        }

        issues
    }
}
