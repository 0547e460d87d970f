//! # Warband Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Roster and campaign fixtures
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
