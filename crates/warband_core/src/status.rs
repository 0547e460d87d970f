//! Per-unit status flags and their transitions.
//!
//! Conditions combine orthogonally (a unit can be fatigued, in melee and
//! shaken at once), so status is a set of flags rather than one enum.
//! The methods here are pure transitions; persistence lives in
//! [`crate::session`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Rejection;

/// What a unit does when it activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Stay in place and shoot.
    Hold,
    /// Move and shoot.
    Advance,
    /// Double move, no shooting.
    Rush,
    /// Double move into melee.
    Charge,
}

impl Action {
    /// All actions in menu order.
    pub const ALL: [Self; 4] = [Self::Hold, Self::Advance, Self::Rush, Self::Charge];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Advance => "advance",
            Self::Rush => "rush",
            Self::Charge => "charge",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

/// A player-toggleable status flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFlag {
    /// Forced idle until the next activation.
    Shaken,
    /// Fought in melee; hits only on sixes.
    Fatigued,
    /// Broken and leaving the table.
    Routed,
    /// Currently locked in melee.
    InMelee,
    /// Struck back against a charge this round.
    HasStruckBack,
    /// Fought in melee this round.
    HasFoughtInMelee,
}

impl StatusFlag {
    /// All flags in display order.
    pub const ALL: [Self; 6] = [
        Self::Shaken,
        Self::Fatigued,
        Self::Routed,
        Self::InMelee,
        Self::HasStruckBack,
        Self::HasFoughtInMelee,
    ];

    /// Name used in persisted state and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shaken => "shaken",
            Self::Fatigued => "fatigued",
            Self::Routed => "routed",
            Self::InMelee => "inMelee",
            Self::HasStruckBack => "hasStruckBack",
            Self::HasFoughtInMelee => "hasFoughtInMelee",
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown status flag '{s}'"))
    }
}

/// Result of a declared morale test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoraleOutcome {
    /// Test passed; nothing changes.
    Passed,
    /// Test failed at or above half strength.
    Shaken,
    /// Test failed below half strength.
    Routed,
}

/// Mutable combat state of one unit.
///
/// Created lazily with every flag cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitStatus {
    /// Activated this round.
    pub activated: bool,
    /// Action chosen at activation.
    pub action: Option<Action>,
    /// Shaken: only the shaken flag may change.
    pub shaken: bool,
    /// Fatigued from melee.
    pub fatigued: bool,
    /// Routed; always also shaken when set.
    pub routed: bool,
    /// Struck back this round.
    pub has_struck_back: bool,
    /// Fought in melee this round.
    pub has_fought_in_melee: bool,
    /// Locked in melee.
    pub in_melee: bool,
}

impl UnitStatus {
    /// Read a flag.
    #[must_use]
    pub const fn get(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Shaken => self.shaken,
            StatusFlag::Fatigued => self.fatigued,
            StatusFlag::Routed => self.routed,
            StatusFlag::InMelee => self.in_melee,
            StatusFlag::HasStruckBack => self.has_struck_back,
            StatusFlag::HasFoughtInMelee => self.has_fought_in_melee,
        }
    }

    fn slot(&mut self, flag: StatusFlag) -> &mut bool {
        match flag {
            StatusFlag::Shaken => &mut self.shaken,
            StatusFlag::Fatigued => &mut self.fatigued,
            StatusFlag::Routed => &mut self.routed,
            StatusFlag::InMelee => &mut self.in_melee,
            StatusFlag::HasStruckBack => &mut self.has_struck_back,
            StatusFlag::HasFoughtInMelee => &mut self.has_fought_in_melee,
        }
    }

    /// Flip a flag.
    ///
    /// While shaken only `Shaken` itself may change. Any change to `Routed`
    /// leaves the unit shaken; clearing `Shaken` leaves `Routed` alone.
    ///
    /// Returns the flag's new value.
    pub fn toggle(&mut self, flag: StatusFlag) -> Result<bool, Rejection> {
        if self.shaken && flag != StatusFlag::Shaken {
            return Err(Rejection::Shaken(flag));
        }

        let slot = self.slot(flag);
        *slot = !*slot;
        let value = *slot;

        if flag == StatusFlag::Routed {
            self.shaken = true;
        }
        Ok(value)
    }

    /// Activate the unit with the given action.
    ///
    /// A shaken unit's activation is spent recovering, which clears the flag.
    pub fn activate(&mut self, action: Action) -> Result<(), Rejection> {
        if self.activated {
            return Err(Rejection::AlreadyActivated);
        }
        self.activated = true;
        self.action = Some(action);
        self.shaken = false;
        Ok(())
    }

    /// Mark the unit as having fought in melee; fighting leaves it fatigued.
    pub fn fight_in_melee(&mut self) -> Result<(), Rejection> {
        if self.shaken {
            return Err(Rejection::Shaken(StatusFlag::HasFoughtInMelee));
        }
        self.in_melee = true;
        self.has_fought_in_melee = true;
        self.fatigued = true;
        Ok(())
    }

    /// Strike back against a charge, once per round.
    pub fn strike_back(&mut self) -> Result<(), Rejection> {
        if self.shaken {
            return Err(Rejection::ShakenCannotStrikeBack);
        }
        if self.has_struck_back {
            return Err(Rejection::AlreadyStruckBack);
        }
        self.in_melee = true;
        self.has_struck_back = true;
        self.fatigued = true;
        Ok(())
    }

    /// Clear the per-round flags. Shaken, fatigued and routed persist.
    pub fn start_round(&mut self) {
        self.activated = false;
        self.action = None;
        self.has_fought_in_melee = false;
        self.has_struck_back = false;
    }

    /// Record a declared morale result.
    ///
    /// A failure shakes the unit, and routs it when below half strength.
    /// A unit that is already shaken fails whatever was declared.
    pub fn apply_morale_result(&mut self, passed: bool, below_half: bool) -> MoraleOutcome {
        if passed && !self.shaken {
            return MoraleOutcome::Passed;
        }
        self.shaken = true;
        if below_half {
            self.routed = true;
            MoraleOutcome::Routed
        } else {
            MoraleOutcome::Shaken
        }
    }
}
