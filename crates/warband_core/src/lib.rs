//! # Warband Core
//!
//! Army state engine for the tabletop campaign tracker.
//!
//! This crate contains **only** state logic:
//! - No rendering
//! - No network fetches
//! - No dice (roll outcomes are declared by the caller)
//! - No storage of its own (persistence goes through an injected [`store::KvStore`])
//!
//! This separation enables:
//! - A presentation layer that only observes state and re-renders
//! - Swappable persistence (browser storage, JSON files, in-memory maps)
//! - Fast, deterministic tests of every combat rule
//!
//! ## Crate Structure
//!
//! - [`roster`] - Roster documents and points accounting
//! - [`combine`] - Combined-unit merge
//! - [`campaign`] - Campaign documents, resource pools and standings
//! - [`status`] - Per-unit status flags and their transitions
//! - [`health`] - Wound and model tracking
//! - [`tokens`] - Spellcaster tokens
//! - [`doctrine`] - Doctrines, stratagems and doctrine selection
//! - [`session`] - The engine entry point tying everything to a store

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod campaign;
pub mod combine;
pub mod doctrine;
pub mod error;
pub mod health;
pub mod roster;
pub mod session;
pub mod status;
pub mod store;
pub mod tokens;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::campaign::{
        CampaignArmy, CampaignData, CampaignRules, PointsValidity, ResourcePools, Standing,
    };
    pub use crate::combine::merge_combined_units;
    pub use crate::doctrine::{Doctrine, DoctrineBook, DoctrineSelection, Stratagem};
    pub use crate::error::{Rejection, Result, TrackerError};
    pub use crate::health::UnitHealth;
    pub use crate::roster::{compute_roster_points, compute_unit_points, Roster, Rule, Unit};
    pub use crate::session::{ArmySession, MoraleTest, TrackerEvent};
    pub use crate::status::{Action, StatusFlag, UnitStatus};
    pub use crate::store::{KvStore, MemoryStore, StoreKey};
    pub use crate::tokens::SpellTokens;
}
