//! Campaign documents, resource pools and standings.
//!
//! All functions here are pure: they derive figures from the campaign
//! document and a roster's point total, and hold no state of their own.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Arithmetic constants of the campaign rules.
///
/// Defaults match the published campaign pack; groups can override them
/// with a RON file loaded by the tools binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignRules {
    /// Allowed points gained per win.
    pub points_per_win: i32,
    /// Allowed points gained per loss.
    pub points_per_loss: i32,
    /// Allowed points gained per objective.
    pub points_per_objective: i32,
    /// Command points granted per full step of roster points.
    pub command_points_per_step: u32,
    /// Roster points per command point step.
    pub command_point_step: i32,
    /// Points gap worth one underdog point.
    pub underdog_point_divisor: i32,
    /// How far a roster may exceed the smallest allowance in the campaign.
    pub minimum_points_slack: i32,
}

impl Default for CampaignRules {
    fn default() -> Self {
        Self {
            points_per_win: 150,
            points_per_loss: 300,
            points_per_objective: 75,
            command_points_per_step: 4,
            command_point_step: 1000,
            underdog_point_divisor: 50,
            minimum_points_slack: 250,
        }
    }
}

/// One army's entry in the campaign document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignArmy {
    /// Army builder id; doubles as the army id for persisted state.
    #[serde(rename = "armyForgeID")]
    pub army_forge_id: String,
    /// Link to the army in the builder.
    #[serde(rename = "armyURL", default)]
    pub army_url: String,
    /// Army display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Player name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    /// Games won.
    #[serde(default)]
    pub wins: u32,
    /// Games lost.
    #[serde(default)]
    pub losses: u32,
    /// Objectives achieved.
    #[serde(default)]
    pub objectives: u32,
    /// Bonus allowance awarded by the organiser.
    #[serde(default)]
    pub earned_pts: i32,
}

/// The campaign document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignData {
    /// Starting allowance for every army.
    pub base_points: i32,
    /// Participating armies.
    #[serde(default)]
    pub armies: Vec<CampaignArmy>,
}

/// Whether a roster fits the campaign limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointsValidity {
    /// Roster exceeds its own allowance.
    pub over_allowed: bool,
    /// Roster exceeds the smallest allowance plus slack.
    pub over_minimum: bool,
}

impl PointsValidity {
    /// Whether the roster is within every limit.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.over_allowed && !self.over_minimum
    }
}

/// Resource pools an army starts a game with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourcePools {
    /// Command points for stratagems.
    pub command_points: u32,
    /// Underdog points for the smaller army.
    pub underdog_points: u32,
}

impl ResourcePools {
    /// Derive the pools for one army.
    ///
    /// `roster_points` is the army's current roster total; the underdog gap
    /// is measured against the largest *allowance* in the campaign.
    #[must_use]
    pub fn derive(campaign: &CampaignData, rules: &CampaignRules, roster_points: i32) -> Self {
        Self {
            command_points: command_points(rules, roster_points),
            underdog_points: underdog_points(
                rules,
                roster_points,
                campaign.max_allowed_points(rules),
            ),
        }
    }
}

/// Command points for a roster: a fixed grant per full step of points.
#[must_use]
pub fn command_points(rules: &CampaignRules, roster_points: i32) -> u32 {
    if roster_points <= 0 || rules.command_point_step <= 0 {
        return 0;
    }
    let steps = u32::try_from(roster_points / rules.command_point_step).unwrap_or(0);
    rules.command_points_per_step.saturating_mul(steps)
}

/// Underdog points for a roster smaller than the campaign maximum.
#[must_use]
pub fn underdog_points(rules: &CampaignRules, roster_points: i32, max_points: Option<i32>) -> u32 {
    match max_points {
        Some(max) if roster_points < max && rules.underdog_point_divisor > 0 => {
            u32::try_from(max.saturating_sub(roster_points) / rules.underdog_point_divisor).unwrap_or(0)
        }
        _ => 0,
    }
}

impl CampaignArmy {
    /// Points this army may field.
    #[must_use]
    pub fn allowed_points(&self, base_points: i32, rules: &CampaignRules) -> i32 {
        let count = |n: u32| i32::try_from(n).unwrap_or(i32::MAX);
        base_points
            .saturating_add(count(self.wins).saturating_mul(rules.points_per_win))
            .saturating_add(count(self.losses).saturating_mul(rules.points_per_loss))
            .saturating_add(count(self.objectives).saturating_mul(rules.points_per_objective))
            .saturating_add(self.earned_pts)
    }

    /// Name shown on the leaderboard.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.army_forge_id)
    }
}

impl CampaignData {
    /// Parse a campaign document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TrackerError::DataParse {
            what: "campaign".to_string(),
            message: e.to_string(),
        })
    }

    /// Find an army by builder id.
    pub fn army(&self, army_id: &str) -> Result<&CampaignArmy> {
        self.armies
            .iter()
            .find(|a| a.army_forge_id == army_id)
            .ok_or_else(|| TrackerError::UnknownArmy(army_id.to_string()))
    }

    /// Allowance of the named army.
    pub fn allowed_points(&self, army_id: &str, rules: &CampaignRules) -> Result<i32> {
        Ok(self.army(army_id)?.allowed_points(self.base_points, rules))
    }

    /// Largest allowance in the campaign, `None` if no armies.
    #[must_use]
    pub fn max_allowed_points(&self, rules: &CampaignRules) -> Option<i32> {
        self.armies
            .iter()
            .map(|a| a.allowed_points(self.base_points, rules))
            .max()
    }

    /// Smallest allowance in the campaign, `None` if no armies.
    #[must_use]
    pub fn min_allowed_points(&self, rules: &CampaignRules) -> Option<i32> {
        self.armies
            .iter()
            .map(|a| a.allowed_points(self.base_points, rules))
            .min()
    }

    /// Check a roster total against the named army's limits.
    pub fn validity(
        &self,
        army_id: &str,
        rules: &CampaignRules,
        roster_points: i32,
    ) -> Result<PointsValidity> {
        let allowed = self.allowed_points(army_id, rules)?;
        let over_minimum = self
            .min_allowed_points(rules)
            .is_some_and(|min| roster_points > min.saturating_add(rules.minimum_points_slack));
        Ok(PointsValidity {
            over_allowed: roster_points > allowed,
            over_minimum,
        })
    }

    /// Leaderboard ordering.
    ///
    /// Wins descending, then objectives descending, then losses ascending;
    /// armies level on all three share a rank. Army id breaks display ties.
    #[must_use]
    pub fn standings(&self, rules: &CampaignRules) -> Vec<Standing> {
        let mut armies: Vec<&CampaignArmy> = self.armies.iter().collect();
        armies.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then(b.objectives.cmp(&a.objectives))
                .then(a.losses.cmp(&b.losses))
                .then(a.army_forge_id.cmp(&b.army_forge_id))
        });

        let mut standings: Vec<Standing> = Vec::with_capacity(armies.len());
        for (i, army) in armies.into_iter().enumerate() {
            let rank = match standings.last() {
                Some(prev)
                    if prev.wins == army.wins
                        && prev.objectives == army.objectives
                        && prev.losses == army.losses =>
                {
                    prev.rank
                }
                _ => i + 1,
            };
            standings.push(Standing {
                rank,
                army_id: army.army_forge_id.clone(),
                name: army.display_name().to_string(),
                wins: army.wins,
                losses: army.losses,
                objectives: army.objectives,
                allowed_points: army.allowed_points(self.base_points, rules),
            });
        }
        standings
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank; tied armies share a rank.
    pub rank: usize,
    /// Army builder id.
    pub army_id: String,
    /// Display name.
    pub name: String,
    /// Games won.
    pub wins: u32,
    /// Games lost.
    pub losses: u32,
    /// Objectives achieved.
    pub objectives: u32,
    /// Current allowance.
    pub allowed_points: i32,
}
