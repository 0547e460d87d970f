//! Error types for the army state engine.

use thiserror::Error;

use crate::status::StatusFlag;

/// Result type alias using [`TrackerError`].
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Top-level error type for all engine errors.
///
/// None of these are fatal: the presentation layer shows the message and
/// keeps the page usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The selection id does not name a unit in the roster.
    #[error("Unit not found: {0}")]
    UnknownUnit(String),

    /// The army id does not appear in the campaign.
    #[error("Army not found in campaign: {0}")]
    UnknownArmy(String),

    /// The doctrine id does not appear in the doctrine book.
    #[error("Doctrine not found: {0}")]
    UnknownDoctrine(String),

    /// An external document could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    DataParse {
        /// Which document failed (roster, campaign, doctrines).
        what: String,
        /// Parser error message.
        message: String,
    },

    /// A state mutation was refused by the combat rules.
    #[error("{0}")]
    Rejected(#[from] Rejection),
}

/// Reasons a state mutation request is refused.
///
/// The `Display` text is the notification shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Only the shaken flag may change while a unit is shaken.
    #[error("Cannot change {0} while Shaken")]
    Shaken(StatusFlag),

    /// The unit has already activated this round.
    #[error("Unit has already activated this round")]
    AlreadyActivated,

    /// The unit has already struck back this round.
    #[error("Unit has already struck back this round")]
    AlreadyStruckBack,

    /// A shaken unit cannot strike back.
    #[error("Shaken units cannot strike back")]
    ShakenCannotStrikeBack,

    /// The health operation does not apply to this unit's shape.
    #[error("{operation} does not apply to {shape}")]
    WrongHealthShape {
        /// Attempted operation.
        operation: &'static str,
        /// Health shape of the unit.
        shape: &'static str,
    },

    /// A model or wound index is past the end of the unit.
    #[error("Index {index} out of range (unit has {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of slots available.
        len: usize,
    },

    /// The unit has no Caster rule.
    #[error("Unit is not a spellcaster")]
    NotACaster,

    /// All spell tokens are already spent.
    #[error("No spell tokens left this round")]
    NoTokensLeft,

    /// A resource pool cannot cover the cost.
    #[error("Insufficient {pool}: need {required}, have {available}")]
    InsufficientPoints {
        /// Pool name.
        pool: &'static str,
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// The universal doctrine is always selected.
    #[error("The universal doctrine cannot be deselected")]
    UniversalDoctrine,

    /// The stratagem belongs to a doctrine that is not selected.
    #[error("Doctrine {0} is not selected")]
    DoctrineNotSelected(String),

    /// The doctrine has no stratagem with this name.
    #[error("Stratagem not found: {0}")]
    UnknownStratagem(String),
}

impl TrackerError {
    /// Whether this error is a rule rejection rather than missing data.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
