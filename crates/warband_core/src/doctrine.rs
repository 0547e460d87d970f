//! Doctrines, stratagems and doctrine selection.
//!
//! The doctrine list is an external document. The only mutable piece is
//! which doctrines an army has selected.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Rejection, Result, TrackerError};

/// Doctrine every army always has.
pub const UNIVERSAL: &str = "universal";

/// A special action bought with command points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratagem {
    /// Stratagem name.
    pub name: String,
    /// Command point cost.
    pub cost: u32,
    /// Rules text.
    #[serde(default)]
    pub description: String,
}

/// A selectable rules package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctrine {
    /// Doctrine id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Stratagems granted.
    #[serde(default)]
    pub stratagems: Vec<Stratagem>,
}

impl Doctrine {
    /// Find a stratagem by name.
    #[must_use]
    pub fn stratagem(&self, name: &str) -> Option<&Stratagem> {
        self.stratagems.iter().find(|s| s.name == name)
    }
}

/// The doctrine document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctrineBook {
    /// Doctrines in document order.
    pub doctrines: Vec<Doctrine>,
}

impl DoctrineBook {
    /// Parse a doctrine document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TrackerError::DataParse {
            what: "doctrines".to_string(),
            message: e.to_string(),
        })
    }

    /// Find a doctrine by id.
    pub fn get(&self, id: &str) -> Result<&Doctrine> {
        self.doctrines
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| TrackerError::UnknownDoctrine(id.to_string()))
    }

    /// Stratagems of the selected doctrines, in document order.
    pub fn available_stratagems<'a>(
        &'a self,
        selection: &'a DoctrineSelection,
    ) -> impl Iterator<Item = (&'a Doctrine, &'a Stratagem)> {
        self.doctrines
            .iter()
            .filter(|d| selection.contains(&d.id))
            .flat_map(|d| d.stratagems.iter().map(move |s| (d, s)))
    }

    /// Look up a stratagem the selection grants.
    pub fn selected_stratagem(
        &self,
        selection: &DoctrineSelection,
        doctrine_id: &str,
        name: &str,
    ) -> Result<&Stratagem> {
        let doctrine = self.get(doctrine_id)?;
        if !selection.contains(doctrine_id) {
            return Err(Rejection::DoctrineNotSelected(doctrine_id.to_string()).into());
        }
        doctrine
            .stratagem(name)
            .ok_or_else(|| Rejection::UnknownStratagem(name.to_string()).into())
    }
}

/// The set of doctrines an army has selected; always contains `universal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeSet<String>", into = "BTreeSet<String>")]
pub struct DoctrineSelection {
    selected: BTreeSet<String>,
}

impl Default for DoctrineSelection {
    fn default() -> Self {
        Self::from(BTreeSet::new())
    }
}

impl From<BTreeSet<String>> for DoctrineSelection {
    fn from(mut selected: BTreeSet<String>) -> Self {
        selected.insert(UNIVERSAL.to_string());
        Self { selected }
    }
}

impl From<DoctrineSelection> for BTreeSet<String> {
    fn from(selection: DoctrineSelection) -> Self {
        selection.selected
    }
}

impl DoctrineSelection {
    /// Whether the doctrine is selected.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Select or deselect a doctrine. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> std::result::Result<bool, Rejection> {
        if id == UNIVERSAL {
            return Err(Rejection::UniversalDoctrine);
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.to_string());
            Ok(true)
        }
    }
}
