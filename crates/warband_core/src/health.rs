//! Wound and model tracking.
//!
//! A unit's health takes one of three shapes, fixed when it is first
//! created from the unit's size and Tough rating.

use serde::{Deserialize, Serialize};

use crate::error::Rejection;
use crate::roster::Unit;

/// Health of one unit.
///
/// Persisted untagged, so the stored JSON is `{"alive": ..}`,
/// `{"wounds": [..]}` or `{"models": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitHealth {
    /// Single model with `Tough(N)`: one slot per wound, `true` = taken.
    Wounds {
        /// Wound slots in fill order.
        wounds: Vec<bool>,
    },
    /// Multi-model unit: one slot per model, `true` = alive.
    Models {
        /// Model slots.
        models: Vec<bool>,
    },
    /// Single model without Tough.
    Single {
        /// Whether the model is alive.
        alive: bool,
    },
}

impl UnitHealth {
    /// Fresh, undamaged health for a unit.
    #[must_use]
    pub fn for_unit(unit: &Unit) -> Self {
        if !unit.is_single_model() {
            return Self::Models {
                models: vec![true; unit.size as usize],
            };
        }
        match unit.tough() {
            Some(n) => Self::Wounds {
                wounds: vec![false; n as usize],
            },
            None => Self::Single { alive: true },
        }
    }

    /// Whether this health has the shape and length the unit requires.
    #[must_use]
    pub fn matches_unit(&self, unit: &Unit) -> bool {
        match (self, Self::for_unit(unit)) {
            (Self::Wounds { wounds }, Self::Wounds { wounds: fresh }) => wounds.len() == fresh.len(),
            (Self::Models { models }, Self::Models { models: fresh }) => models.len() == fresh.len(),
            (Self::Single { .. }, Self::Single { .. }) => true,
            _ => false,
        }
    }

    /// Human-readable shape name.
    #[must_use]
    pub const fn shape_name(&self) -> &'static str {
        match self {
            Self::Wounds { .. } => "a Tough model",
            Self::Models { .. } => "a multi-model unit",
            Self::Single { .. } => "a single model",
        }
    }

    /// Wounds or models the unit can lose in total.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match self {
            Self::Wounds { wounds } => wounds.len(),
            Self::Models { models } => models.len(),
            Self::Single { .. } => 1,
        }
    }

    /// Wounds or models still standing.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match self {
            Self::Wounds { wounds } => wounds.iter().filter(|&&w| !w).count(),
            Self::Models { models } => models.iter().filter(|&&m| m).count(),
            Self::Single { alive } => usize::from(*alive),
        }
    }

    /// Wounds taken or models lost.
    #[must_use]
    pub fn lost(&self) -> usize {
        self.capacity() - self.remaining()
    }

    /// Whether nothing is left standing.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether the unit has lost at least half of its wounds or models
    /// (rounded up).
    #[must_use]
    pub fn is_below_half_strength(&self) -> bool {
        match self {
            Self::Single { alive } => !alive,
            _ => self.lost() >= self.capacity().div_ceil(2),
        }
    }

    /// Apply one wound.
    ///
    /// Tough models fill their first open slot, multi-model units lose their
    /// last living model, single models die. Returns `false` when there is
    /// nothing left to wound.
    pub fn wound(&mut self) -> bool {
        match self {
            Self::Wounds { wounds } => set_first(wounds, false, true),
            Self::Models { models } => set_last(models, true, false),
            Self::Single { alive } => std::mem::replace(alive, false),
        }
    }

    /// Undo one wound, in reverse order of wounding.
    ///
    /// Returns `false` when the unit is already at full health.
    pub fn heal(&mut self) -> bool {
        match self {
            Self::Wounds { wounds } => set_last(wounds, true, false),
            Self::Models { models } => set_first(models, false, true),
            Self::Single { alive } => !std::mem::replace(alive, true),
        }
    }

    /// Remove a model: the last living one in a unit, or a whole Tough model.
    pub fn kill_model(&mut self) -> bool {
        match self {
            Self::Wounds { wounds } => fill(wounds, true),
            Self::Models { models } => set_last(models, true, false),
            Self::Single { alive } => std::mem::replace(alive, false),
        }
    }

    /// Return a model: the first dead one in a unit, or a whole Tough model.
    pub fn revive_model(&mut self) -> bool {
        match self {
            Self::Wounds { wounds } => fill(wounds, false),
            Self::Models { models } => set_first(models, false, true),
            Self::Single { alive } => !std::mem::replace(alive, true),
        }
    }

    /// Flip one model's alive flag. Returns the new value.
    pub fn toggle_model(&mut self, index: usize) -> Result<bool, Rejection> {
        match self {
            Self::Models { models } => flip(models, index),
            Self::Single { alive } if index == 0 => {
                *alive = !*alive;
                Ok(*alive)
            }
            Self::Single { .. } => Err(Rejection::IndexOutOfRange { index, len: 1 }),
            Self::Wounds { .. } => Err(Rejection::WrongHealthShape {
                operation: "Toggling a model",
                shape: "a Tough model",
            }),
        }
    }

    /// Flip one wound slot of a Tough model. Returns the new value.
    pub fn toggle_wound(&mut self, index: usize) -> Result<bool, Rejection> {
        let shape = self.shape_name();
        match self {
            Self::Wounds { wounds } => flip(wounds, index),
            _ => Err(Rejection::WrongHealthShape {
                operation: "Toggling a wound",
                shape,
            }),
        }
    }
}

fn set_first(slots: &mut [bool], from: bool, to: bool) -> bool {
    match slots.iter_mut().find(|s| **s == from) {
        Some(slot) => {
            *slot = to;
            true
        }
        None => false,
    }
}

fn set_last(slots: &mut [bool], from: bool, to: bool) -> bool {
    match slots.iter_mut().rev().find(|s| **s == from) {
        Some(slot) => {
            *slot = to;
            true
        }
        None => false,
    }
}

fn fill(slots: &mut [bool], value: bool) -> bool {
    let changed = slots.iter().any(|&s| s != value);
    slots.fill(value);
    changed
}

fn flip(slots: &mut [bool], index: usize) -> Result<bool, Rejection> {
    let len = slots.len();
    let slot = slots
        .get_mut(index)
        .ok_or(Rejection::IndexOutOfRange { index, len })?;
    *slot = !*slot;
    Ok(*slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Rule, TOUGH};

    fn tough_model(n: i32) -> Unit {
        let mut unit = Unit::new("hero", "h", 1, 50);
        unit.rules.push(Rule::rated(TOUGH, n));
        unit
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            UnitHealth::for_unit(&tough_model(3)),
            UnitHealth::Wounds {
                wounds: vec![false; 3]
            }
        );
        assert_eq!(
            UnitHealth::for_unit(&Unit::new("squad", "s", 5, 100)),
            UnitHealth::Models {
                models: vec![true; 5]
            }
        );
        assert_eq!(
            UnitHealth::for_unit(&Unit::new("scout", "c", 1, 20)),
            UnitHealth::Single { alive: true }
        );
    }

    #[test]
    fn test_matches_unit() {
        let health = UnitHealth::for_unit(&tough_model(3));
        assert!(health.matches_unit(&tough_model(3)));
        assert!(!health.matches_unit(&tough_model(6)));
        assert!(!health.matches_unit(&Unit::new("squad", "s", 3, 100)));
    }

    #[test]
    fn test_wound_fills_in_order_and_stops() {
        let mut health = UnitHealth::for_unit(&tough_model(2));
        assert!(health.wound());
        assert_eq!(
            health,
            UnitHealth::Wounds {
                wounds: vec![true, false]
            }
        );
        assert!(health.wound());
        assert!(!health.wound());
        assert!(health.is_destroyed());
    }

    #[test]
    fn test_heal_clears_last_filled() {
        let mut health = UnitHealth::Wounds {
            wounds: vec![true, false, true],
        };
        assert!(health.heal());
        assert_eq!(
            health,
            UnitHealth::Wounds {
                wounds: vec![true, false, false]
            }
        );
        assert!(health.heal());
        assert!(!health.heal());
    }

    #[test]
    fn test_half_strength_tough_four() {
        let mut health = UnitHealth::for_unit(&tough_model(4));
        health.wound();
        assert!(!health.is_below_half_strength());
        health.wound();
        assert!(health.is_below_half_strength());
    }

    #[test]
    fn test_half_strength_rounds_up() {
        let mut health = UnitHealth::Models {
            models: vec![true; 5],
        };
        health.kill_model();
        health.kill_model();
        assert!(!health.is_below_half_strength());
        health.kill_model();
        assert!(health.is_below_half_strength());
    }

    #[test]
    fn test_kill_from_end_revive_from_start() {
        let mut health = UnitHealth::Models {
            models: vec![true; 3],
        };
        health.toggle_model(0).unwrap();
        assert!(health.kill_model());
        assert_eq!(
            health,
            UnitHealth::Models {
                models: vec![false, true, false]
            }
        );
        assert!(health.revive_model());
        assert_eq!(
            health,
            UnitHealth::Models {
                models: vec![true, true, false]
            }
        );
    }

    #[test]
    fn test_single_model() {
        let mut health = UnitHealth::Single { alive: true };
        assert!(!health.is_below_half_strength());
        assert!(health.wound());
        assert!(!health.wound());
        assert!(health.is_below_half_strength());
        assert!(health.heal());
        assert_eq!(health.toggle_model(0), Ok(false));
        assert_eq!(
            health.toggle_model(1),
            Err(Rejection::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn test_toggle_shape_checks() {
        let mut health = UnitHealth::for_unit(&tough_model(2));
        assert!(matches!(
            health.toggle_model(0),
            Err(Rejection::WrongHealthShape { .. })
        ));
        assert_eq!(health.toggle_wound(1), Ok(true));
        assert_eq!(
            health.toggle_wound(2),
            Err(Rejection::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_tough_kill_and_revive() {
        let mut health = UnitHealth::for_unit(&tough_model(3));
        assert!(health.kill_model());
        assert!(health.is_destroyed());
        assert!(!health.kill_model());
        assert!(health.revive_model());
        assert_eq!(health.remaining(), 3);
    }

    #[test]
    fn test_persisted_shapes() {
        let models: UnitHealth = serde_json::from_str(r#"{"models":[true,false]}"#).unwrap();
        assert!(matches!(models, UnitHealth::Models { .. }));
        let wounds: UnitHealth = serde_json::from_str(r#"{"wounds":[false]}"#).unwrap();
        assert!(matches!(wounds, UnitHealth::Wounds { .. }));
        let single: UnitHealth = serde_json::from_str(r#"{"alive":false}"#).unwrap();
        assert_eq!(single, UnitHealth::Single { alive: false });
    }
}
