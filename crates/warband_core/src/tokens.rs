//! Spellcaster tokens.
//!
//! A `Caster(N)` unit gets N tokens per round. Tokens never carry over:
//! every round starts with all of them unspent.

use serde::{Deserialize, Serialize};

use crate::error::Rejection;

/// Spent/unspent flags of a caster's tokens, persisted as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellTokens {
    spent: Vec<bool>,
}

impl SpellTokens {
    /// `count` unspent tokens.
    #[must_use]
    pub fn new(count: u32) -> Self {
        Self {
            spent: vec![false; count as usize],
        }
    }

    /// Total tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    /// Whether the caster has no tokens at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// Tokens still available this round.
    #[must_use]
    pub fn unspent(&self) -> usize {
        self.spent.iter().filter(|&&s| !s).count()
    }

    /// Whether token `index` is spent.
    #[must_use]
    pub fn is_spent(&self, index: usize) -> bool {
        self.spent.get(index).copied().unwrap_or(false)
    }

    /// Spend the first unspent token, returning its index.
    pub fn spend(&mut self) -> Result<usize, Rejection> {
        let index = self
            .spent
            .iter()
            .position(|&s| !s)
            .ok_or(Rejection::NoTokensLeft)?;
        self.spent[index] = true;
        Ok(index)
    }

    /// Flip one token. Returns whether it is now spent.
    pub fn toggle(&mut self, index: usize) -> Result<bool, Rejection> {
        let len = self.spent.len();
        let slot = self
            .spent
            .get_mut(index)
            .ok_or(Rejection::IndexOutOfRange { index, len })?;
        *slot = !*slot;
        Ok(*slot)
    }

    /// Mark every token unspent.
    pub fn reset(&mut self) {
        self.spent.fill(false);
    }
}
