//! The army state engine.
//!
//! [`ArmySession`] is the single entry point the presentation layer talks
//! to. It holds the roster being viewed and an injected [`KvStore`], and
//! exposes every state operation by unit selection id. Each mutation is
//! persisted immediately and recorded as a [`TrackerEvent`] for the
//! renderer to observe; nothing here touches presentation.
//!
//! Reads always go back to the store, so two sessions over the same store
//! never disagree.

use serde::{Deserialize, Serialize};

use crate::campaign::ResourcePools;
use crate::combine::merge_combined_units;
use crate::doctrine::{DoctrineBook, DoctrineSelection};
use crate::error::{Rejection, Result, TrackerError};
use crate::health::UnitHealth;
use crate::roster::{compute_roster_points, Roster, Unit};
use crate::status::{Action, MoraleOutcome, StatusFlag, UnitStatus};
use crate::store::{load_json, save_json, KvStore, StoreKey};
use crate::tokens::SpellTokens;

/// First round of a game.
pub const FIRST_ROUND: u32 = 1;

/// Something the renderer should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerEvent {
    /// A unit's status flags changed.
    StatusChanged {
        /// Unit selection id.
        unit: String,
        /// New status.
        status: UnitStatus,
    },
    /// A unit's health changed.
    HealthChanged {
        /// Unit selection id.
        unit: String,
        /// New health.
        health: UnitHealth,
    },
    /// A caster's tokens changed.
    TokensChanged {
        /// Unit selection id.
        unit: String,
        /// Tokens left this round.
        unspent: usize,
    },
    /// A model was renamed.
    ModelRenamed {
        /// Unit selection id.
        unit: String,
        /// Model index.
        index: usize,
    },
    /// A morale test was resolved.
    MoraleResolved {
        /// Unit selection id.
        unit: String,
        /// Outcome.
        outcome: MoraleOutcome,
    },
    /// A new round began.
    RoundStarted {
        /// The new round number.
        round: u32,
    },
    /// Command or underdog points changed.
    PoolsChanged {
        /// Command points left.
        command_points: u32,
        /// Underdog points left.
        underdog_points: u32,
    },
    /// A doctrine was selected or deselected.
    DoctrineToggled {
        /// Doctrine id.
        doctrine: String,
        /// Whether it is now selected.
        selected: bool,
    },
    /// A stratagem was paid for.
    StratagemUsed {
        /// Stratagem name.
        name: String,
        /// Command points spent.
        cost: u32,
    },
    /// All unit state was cleared for a new game.
    GameReset,
}

/// What a morale test needs from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoraleTest {
    /// The unit was already shaken, so the test failed without a roll.
    AutoFailed(MoraleOutcome),
    /// Roll a die; the test passes on `quality` or better.
    RollRequired {
        /// Target number.
        quality: u32,
    },
}

/// One army's live game state over an injected store.
#[derive(Debug)]
pub struct ArmySession<S: KvStore> {
    army_id: String,
    roster: Roster,
    view: Roster,
    store: S,
    events: Vec<TrackerEvent>,
}

impl<S: KvStore> ArmySession<S> {
    /// Open a session for an army.
    ///
    /// Combined units are merged into the working view; state for a combined
    /// group is keyed by its first member.
    pub fn new(army_id: impl Into<String>, roster: Roster, store: S) -> Self {
        let army_id = army_id.into();
        for issue in roster.validate() {
            tracing::warn!("Roster {army_id}: {issue}");
        }
        let view = merge_combined_units(&roster);
        Self {
            army_id,
            roster,
            view,
            store,
            events: Vec::new(),
        }
    }

    /// Army id used in store keys.
    pub fn army_id(&self) -> &str {
        &self.army_id
    }

    /// The source roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The roster with combined units merged.
    pub fn view(&self) -> &Roster {
        &self.view
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the backing store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Take every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<TrackerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Point total of the source roster.
    pub fn roster_points(&self) -> i32 {
        compute_roster_points(&self.roster)
    }

    /// Resolve a selection id to a unit of the working view.
    ///
    /// Ids of secondary members of a combined group resolve to the group.
    pub fn unit(&self, selection_id: &str) -> Result<&Unit> {
        self.view
            .get(selection_id)
            .or_else(|| {
                self.view
                    .units
                    .iter()
                    .find(|u| u.combined_members.iter().any(|m| m == selection_id))
            })
            .ok_or_else(|| TrackerError::UnknownUnit(selection_id.to_string()))
    }

    fn unit_owned(&self, selection_id: &str) -> Result<Unit> {
        self.unit(selection_id).cloned()
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Status of a unit, created with all flags clear on first read.
    pub fn get_unit_status(&mut self, selection_id: &str) -> Result<UnitStatus> {
        let unit = self.unit_owned(selection_id)?;
        Ok(self.load_status(&unit.selection_id))
    }

    fn load_status(&mut self, unit: &str) -> UnitStatus {
        let key = StoreKey::UnitStatus {
            army: &self.army_id,
            unit,
        };
        if let Some(status) = load_json(&self.store, key) {
            return status;
        }
        let status = UnitStatus::default();
        save_json(&mut self.store, key, &status);
        status
    }

    fn update_status<T>(
        &mut self,
        selection_id: &str,
        change: impl FnOnce(&mut UnitStatus) -> std::result::Result<T, Rejection>,
    ) -> Result<T> {
        let unit = self.unit_owned(selection_id)?;
        let mut status = self.load_status(&unit.selection_id);
        let value = change(&mut status).map_err(|rejection| {
            tracing::debug!("{} ({}): {rejection}", unit.display_name(), unit.selection_id);
            rejection
        })?;
        self.save_status(&unit.selection_id, status);
        Ok(value)
    }

    fn save_status(&mut self, unit: &str, status: UnitStatus) {
        save_json(
            &mut self.store,
            StoreKey::UnitStatus {
                army: &self.army_id,
                unit,
            },
            &status,
        );
        self.events.push(TrackerEvent::StatusChanged {
            unit: unit.to_string(),
            status,
        });
    }

    /// Flip a status flag. Returns the flag's new value.
    pub fn toggle_unit_status(&mut self, selection_id: &str, flag: StatusFlag) -> Result<bool> {
        let value = self.update_status(selection_id, |s| s.toggle(flag))?;
        tracing::debug!("{selection_id}: {flag} -> {value}");
        Ok(value)
    }

    /// Activate a unit with an action. Clears Shaken.
    pub fn activate_unit(&mut self, selection_id: &str, action: Action) -> Result<()> {
        self.update_status(selection_id, |s| s.activate(action))?;
        tracing::debug!("{selection_id}: activated ({action})");
        Ok(())
    }

    /// Record that a unit fought in melee.
    pub fn fight_in_melee(&mut self, selection_id: &str) -> Result<()> {
        self.update_status(selection_id, UnitStatus::fight_in_melee)
    }

    /// Record that a unit struck back against a charge.
    pub fn strike_back(&mut self, selection_id: &str) -> Result<()> {
        self.update_status(selection_id, UnitStatus::strike_back)
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Health of a unit, created undamaged on first read.
    ///
    /// Stored health whose shape no longer fits the unit is discarded.
    pub fn get_unit_health(&mut self, selection_id: &str) -> Result<UnitHealth> {
        let unit = self.unit_owned(selection_id)?;
        Ok(self.load_health(&unit))
    }

    fn load_health(&mut self, unit: &Unit) -> UnitHealth {
        let key = StoreKey::UnitHealth {
            army: &self.army_id,
            unit: &unit.selection_id,
        };
        match load_json::<UnitHealth>(&self.store, key) {
            Some(health) if health.matches_unit(unit) => return health,
            Some(_) => tracing::warn!(
                "Stored health for {} does not fit the unit; resetting",
                unit.selection_id
            ),
            None => {}
        }
        let health = UnitHealth::for_unit(unit);
        save_json(&mut self.store, key, &health);
        health
    }

    fn update_health<T>(
        &mut self,
        selection_id: &str,
        change: impl FnOnce(&mut UnitHealth) -> std::result::Result<T, Rejection>,
    ) -> Result<T> {
        let unit = self.unit_owned(selection_id)?;
        let before = self.load_health(&unit);
        let mut health = before.clone();
        let value = change(&mut health)?;
        if health != before {
            save_json(
                &mut self.store,
                StoreKey::UnitHealth {
                    army: &self.army_id,
                    unit: &unit.selection_id,
                },
                &health,
            );
            tracing::debug!(
                "{}: {}/{} remaining",
                unit.selection_id,
                health.remaining(),
                health.capacity()
            );
            self.events.push(TrackerEvent::HealthChanged {
                unit: unit.selection_id.clone(),
                health,
            });
        }
        Ok(value)
    }

    /// Apply one wound. Returns `false` if nothing was left to wound.
    pub fn wound(&mut self, selection_id: &str) -> Result<bool> {
        self.update_health(selection_id, |h| Ok(h.wound()))
    }

    /// Heal one wound. Returns `false` if already at full health.
    pub fn heal(&mut self, selection_id: &str) -> Result<bool> {
        self.update_health(selection_id, |h| Ok(h.heal()))
    }

    /// Remove the last living model.
    pub fn kill_model(&mut self, selection_id: &str) -> Result<bool> {
        self.update_health(selection_id, |h| Ok(h.kill_model()))
    }

    /// Return the first dead model.
    pub fn revive_model(&mut self, selection_id: &str) -> Result<bool> {
        self.update_health(selection_id, |h| Ok(h.revive_model()))
    }

    /// Flip one model's alive flag. Returns the new value.
    pub fn toggle_model(&mut self, selection_id: &str, index: usize) -> Result<bool> {
        self.update_health(selection_id, |h| h.toggle_model(index))
    }

    /// Flip one wound slot of a Tough model. Returns the new value.
    pub fn toggle_wound(&mut self, selection_id: &str, index: usize) -> Result<bool> {
        self.update_health(selection_id, |h| h.toggle_wound(index))
    }

    /// Whether the unit has lost half or more of its wounds or models.
    pub fn is_below_half_strength(&mut self, selection_id: &str) -> Result<bool> {
        Ok(self.get_unit_health(selection_id)?.is_below_half_strength())
    }

    // ------------------------------------------------------------------
    // Morale
    // ------------------------------------------------------------------

    /// Start a morale test.
    ///
    /// Shaken units fail automatically and the failure is applied at once;
    /// otherwise the caller rolls and reports through
    /// [`Self::handle_morale_result`].
    pub fn take_morale_test(&mut self, selection_id: &str) -> Result<MoraleTest> {
        let unit = self.unit_owned(selection_id)?;
        if self.load_status(&unit.selection_id).shaken {
            let outcome = self.handle_morale_result(selection_id, false)?;
            return Ok(MoraleTest::AutoFailed(outcome));
        }
        Ok(MoraleTest::RollRequired {
            quality: unit.quality,
        })
    }

    /// Record the declared result of a morale test.
    ///
    /// A declared pass on a shaken unit still fails.
    pub fn handle_morale_result(
        &mut self,
        selection_id: &str,
        passed: bool,
    ) -> Result<MoraleOutcome> {
        let unit = self.unit_owned(selection_id)?;
        let below_half = self.load_health(&unit).is_below_half_strength();
        let mut status = self.load_status(&unit.selection_id);
        let outcome = status.apply_morale_result(passed, below_half);
        if outcome != MoraleOutcome::Passed {
            self.save_status(&unit.selection_id, status);
        }
        tracing::debug!("{}: morale {outcome:?}", unit.selection_id);
        self.events.push(TrackerEvent::MoraleResolved {
            unit: unit.selection_id,
            outcome,
        });
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Spell tokens
    // ------------------------------------------------------------------

    /// Tokens of a caster, created unspent on first read.
    pub fn get_tokens(&mut self, selection_id: &str) -> Result<SpellTokens> {
        let unit = self.unit_owned(selection_id)?;
        self.load_tokens(&unit)
    }

    fn load_tokens(&mut self, unit: &Unit) -> Result<SpellTokens> {
        let count = unit.caster().ok_or(Rejection::NotACaster)?;
        let key = StoreKey::UnitTokens {
            army: &self.army_id,
            unit: &unit.selection_id,
        };
        match load_json::<SpellTokens>(&self.store, key) {
            Some(tokens) if tokens.len() == count as usize => return Ok(tokens),
            Some(_) => tracing::warn!(
                "Stored tokens for {} do not match Caster({count}); resetting",
                unit.selection_id
            ),
            None => {}
        }
        let tokens = SpellTokens::new(count);
        save_json(&mut self.store, key, &tokens);
        Ok(tokens)
    }

    fn update_tokens<T>(
        &mut self,
        selection_id: &str,
        change: impl FnOnce(&mut SpellTokens) -> std::result::Result<T, Rejection>,
    ) -> Result<T> {
        let unit = self.unit_owned(selection_id)?;
        let mut tokens = self.load_tokens(&unit)?;
        let value = change(&mut tokens)?;
        self.save_tokens(&unit.selection_id, &tokens);
        Ok(value)
    }

    fn save_tokens(&mut self, unit: &str, tokens: &SpellTokens) {
        save_json(
            &mut self.store,
            StoreKey::UnitTokens {
                army: &self.army_id,
                unit,
            },
            tokens,
        );
        self.events.push(TrackerEvent::TokensChanged {
            unit: unit.to_string(),
            unspent: tokens.unspent(),
        });
    }

    /// Spend the next token. Returns its index.
    pub fn spend_token(&mut self, selection_id: &str) -> Result<usize> {
        self.update_tokens(selection_id, SpellTokens::spend)
    }

    /// Flip one token. Returns whether it is now spent.
    pub fn toggle_token(&mut self, selection_id: &str, index: usize) -> Result<bool> {
        self.update_tokens(selection_id, |t| t.toggle(index))
    }

    /// Mark all of a caster's tokens unspent.
    pub fn reset_tokens(&mut self, selection_id: &str) -> Result<()> {
        self.update_tokens(selection_id, |t| {
            t.reset();
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Model names
    // ------------------------------------------------------------------

    /// Custom names of a unit's models, one slot per model.
    pub fn model_names(&self, selection_id: &str) -> Result<Vec<Option<String>>> {
        let unit = self.unit(selection_id)?;
        let mut names: Vec<Option<String>> = load_json(
            &self.store,
            StoreKey::ModelNames {
                army: &self.army_id,
                unit: &unit.selection_id,
            },
        )
        .unwrap_or_default();
        names.resize(unit.size as usize, None);
        Ok(names)
    }

    /// Name one model; an empty name clears it.
    pub fn set_model_name(&mut self, selection_id: &str, index: usize, name: &str) -> Result<()> {
        let mut names = self.model_names(selection_id)?;
        let len = names.len();
        let slot = names
            .get_mut(index)
            .ok_or(Rejection::IndexOutOfRange { index, len })?;
        let name = name.trim();
        *slot = (!name.is_empty()).then(|| name.to_string());

        let unit = self.unit(selection_id)?.selection_id.clone();
        save_json(
            &mut self.store,
            StoreKey::ModelNames {
                army: &self.army_id,
                unit: &unit,
            },
            &names,
        );
        self.events
            .push(TrackerEvent::ModelRenamed { unit, index });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Round and resources
    // ------------------------------------------------------------------

    /// Current round number.
    pub fn current_round(&self) -> u32 {
        load_json::<u32>(&self.store, StoreKey::CurrentRound(&self.army_id))
            .unwrap_or(FIRST_ROUND)
            .max(FIRST_ROUND)
    }

    /// Command points left.
    pub fn command_points(&self) -> u32 {
        load_json(&self.store, StoreKey::CommandPoints(&self.army_id)).unwrap_or(0)
    }

    /// Underdog points left.
    pub fn underdog_points(&self) -> u32 {
        load_json(&self.store, StoreKey::UnderdogPoints(&self.army_id)).unwrap_or(0)
    }

    /// Selected doctrines.
    pub fn selected_doctrines(&self) -> DoctrineSelection {
        load_json(&self.store, StoreKey::Doctrines(&self.army_id)).unwrap_or_default()
    }

    fn set_pools(&mut self, command_points: u32, underdog_points: u32) {
        save_json(
            &mut self.store,
            StoreKey::CommandPoints(&self.army_id),
            &command_points,
        );
        save_json(
            &mut self.store,
            StoreKey::UnderdogPoints(&self.army_id),
            &underdog_points,
        );
        self.events.push(TrackerEvent::PoolsChanged {
            command_points,
            underdog_points,
        });
    }

    /// Fill both pools from campaign-derived values.
    pub fn initialize_pools(&mut self, pools: ResourcePools) {
        tracing::debug!(
            "{}: pools set to {} CP, {} UP",
            self.army_id,
            pools.command_points,
            pools.underdog_points
        );
        self.set_pools(pools.command_points, pools.underdog_points);
    }

    /// Spend command points. Returns what is left.
    pub fn spend_command_points(&mut self, amount: u32) -> Result<u32> {
        let available = self.command_points();
        let left = available
            .checked_sub(amount)
            .ok_or(Rejection::InsufficientPoints {
                pool: "command points",
                required: amount,
                available,
            })?;
        let underdog = self.underdog_points();
        self.set_pools(left, underdog);
        Ok(left)
    }

    /// Spend underdog points. Returns what is left.
    pub fn spend_underdog_points(&mut self, amount: u32) -> Result<u32> {
        let available = self.underdog_points();
        let left = available
            .checked_sub(amount)
            .ok_or(Rejection::InsufficientPoints {
                pool: "underdog points",
                required: amount,
                available,
            })?;
        let command = self.command_points();
        self.set_pools(command, left);
        Ok(left)
    }

    /// Pay for a stratagem of a selected doctrine. Returns command points left.
    pub fn use_stratagem(
        &mut self,
        book: &DoctrineBook,
        doctrine_id: &str,
        name: &str,
    ) -> Result<u32> {
        let selection = self.selected_doctrines();
        let stratagem = book.selected_stratagem(&selection, doctrine_id, name)?;
        let left = self.spend_command_points(stratagem.cost)?;
        tracing::debug!("{}: used {} for {} CP", self.army_id, stratagem.name, stratagem.cost);
        self.events.push(TrackerEvent::StratagemUsed {
            name: stratagem.name.clone(),
            cost: stratagem.cost,
        });
        Ok(left)
    }

    /// Select or deselect a doctrine. Returns whether it is now selected.
    pub fn toggle_doctrine(&mut self, book: &DoctrineBook, doctrine_id: &str) -> Result<bool> {
        book.get(doctrine_id)?;
        let mut selection = self.selected_doctrines();
        let selected = selection.toggle(doctrine_id)?;
        save_json(
            &mut self.store,
            StoreKey::Doctrines(&self.army_id),
            &selection,
        );
        self.events.push(TrackerEvent::DoctrineToggled {
            doctrine: doctrine_id.to_string(),
            selected,
        });
        Ok(selected)
    }

    /// Roll over to the next round.
    ///
    /// Clears every unit's per-round flags and refreshes every caster's
    /// tokens. Shaken, fatigued and routed carry over. Returns the new
    /// round number.
    pub fn start_new_round(&mut self) -> u32 {
        let units = self.view.units.clone();
        for unit in &units {
            let mut status = self.load_status(&unit.selection_id);
            status.start_round();
            self.save_status(&unit.selection_id, status);

            if let Ok(mut tokens) = self.load_tokens(unit) {
                tokens.reset();
                self.save_tokens(&unit.selection_id, &tokens);
            }
        }

        let round = self.current_round() + 1;
        save_json(&mut self.store, StoreKey::CurrentRound(&self.army_id), &round);
        tracing::info!("{}: round {round} begins", self.army_id);
        self.events.push(TrackerEvent::RoundStarted { round });
        round
    }

    /// Start a fresh game: clear every unit's status, health and tokens,
    /// go back to round one and refill the pools. Model names are kept.
    pub fn new_game(&mut self, pools: ResourcePools) {
        for unit in &self.view.units {
            let army = self.army_id.as_str();
            let unit = unit.selection_id.as_str();
            for key in [
                StoreKey::UnitStatus { army, unit },
                StoreKey::UnitHealth { army, unit },
                StoreKey::UnitTokens { army, unit },
            ] {
                self.store.remove(&key.to_string());
            }
        }
        save_json(
            &mut self.store,
            StoreKey::CurrentRound(&self.army_id),
            &FIRST_ROUND,
        );
        self.initialize_pools(pools);
        tracing::info!("{}: new game", self.army_id);
        self.events.push(TrackerEvent::GameReset);
    }
}
