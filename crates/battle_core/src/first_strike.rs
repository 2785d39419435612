//! First-strike (sneak attack) phase and its casualty-clearing companion.
//!
//! One [`FirstStrikeStep`] is built per side per round. Its
//! [`FirstStrikeDetermination`] is frozen at construction from the battle
//! snapshot and never re-evaluated during the round:
//!
//! 1. No first-strike unit on the side: `NotApplicable`.
//! 2. Alternate combat sequence in force: `FirstStrike`.
//! 3. No destroyer on the opposing side (and, for the defender, defending
//!    sneak attacks are allowed): `FirstStrike`.
//! 4. Otherwise `Regular`: the first-strike units fire after their side's
//!    general fire.
//!
//! [`ClearFirstStrikeCasualties`] then decides, from both determinations,
//! which sides' casualties leave the board before regular fire.

use serde::{Deserialize, Serialize};

use crate::battle::{BattleDelta, BattleState, Side};
use crate::data::BattleRules;
use crate::error::{BattleError, Result};
use crate::firing::general::{self, FireCategory};
use crate::firing::{resolve_fire, FireResolver, FiringGroup, ReturnFire};
use crate::registry::UnitRegistry;
use crate::steps::StepOrder;

/// Display name for first-strike firing groups.
pub const FIRST_STRIKE_UNITS: &str = "first strike units";

/// Step name of the casualty-clearing companion.
pub const REMOVE_SNEAK_ATTACK_CASUALTIES: &str = "remove sneak attack casualties";

/// How a side's first-strike units take part in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirstStrikeDetermination {
    /// The side has no first-strike units.
    NotApplicable,
    /// First-strike units fire with the regular combat order.
    Regular,
    /// First-strike units fire in a dedicated early phase.
    FirstStrike,
}

/// Work out a side's determination from the current snapshot.
#[must_use]
pub fn determine(
    side: Side,
    state: &BattleState,
    registry: &UnitRegistry,
    rules: &BattleRules,
) -> FirstStrikeDetermination {
    let has_first_strike = state
        .active_units(side)
        .iter()
        .any(|u| registry.is_first_strike_for(side, &u.unit_type, rules));
    if !has_first_strike {
        return FirstStrikeDetermination::NotApplicable;
    }
    if rules.alternate_combat_sequence {
        return FirstStrikeDetermination::FirstStrike;
    }
    let sneak_allowed = !side.is_defense() || rules.defending_sneak_attack;
    if sneak_allowed && !state.has_destroyer(side.opposite(), registry) {
        return FirstStrikeDetermination::FirstStrike;
    }
    FirstStrikeDetermination::Regular
}

/// One side's first-strike fire for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstStrikeStep {
    side: Side,
    determination: FirstStrikeDetermination,
    return_fire: ReturnFire,
}

impl FirstStrikeStep {
    /// Freeze the determination for `side` and derive its return-fire
    /// policy from both sides' determinations.
    #[must_use]
    pub fn new(side: Side, state: &BattleState, registry: &UnitRegistry, rules: &BattleRules) -> Self {
        let determination = determine(side, state, registry, rules);
        let return_fire = match determination {
            FirstStrikeDetermination::FirstStrike => {
                let opponent = determine(side.opposite(), state, registry, rules);
                if rules.alternate_combat_sequence
                    || opponent == FirstStrikeDetermination::FirstStrike
                {
                    ReturnFire::FirstStrikeOnly
                } else {
                    ReturnFire::None
                }
            }
            FirstStrikeDetermination::Regular | FirstStrikeDetermination::NotApplicable => {
                ReturnFire::All
            }
        };
        tracing::debug!(
            side = ?side,
            determination = ?determination,
            return_fire = ?return_fire,
            "Froze first strike determination"
        );
        Self {
            side,
            determination,
            return_fire,
        }
    }

    /// Rebuild a sneak-attack step from persisted state without looking at
    /// the battle again.
    #[must_use]
    pub const fn restore(side: Side, return_fire: ReturnFire) -> Self {
        Self {
            side,
            determination: FirstStrikeDetermination::FirstStrike,
            return_fire,
        }
    }

    /// Side whose first-strike units fire.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Frozen determination.
    #[must_use]
    pub const fn determination(&self) -> FirstStrikeDetermination {
        self.determination
    }

    /// What happens to the units this step kills.
    #[must_use]
    pub const fn return_fire(&self) -> ReturnFire {
        self.return_fire
    }

    /// Whether this step does anything this round.
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        self.determination != FirstStrikeDetermination::NotApplicable
    }

    /// Step names shown in the round sequence; empty when not applicable.
    #[must_use]
    pub fn names(&self, state: &BattleState) -> Vec<String> {
        if !self.is_applicable() {
            return Vec::new();
        }
        vec![
            format!("{} first strike units fire", state.player(self.side)),
            format!(
                "{} select first strike casualties",
                state.player(self.side.opposite())
            ),
        ]
    }

    /// Where this step runs in the round.
    #[must_use]
    pub fn order(&self) -> StepOrder {
        let sneak = self.determination == FirstStrikeDetermination::FirstStrike;
        match (self.side, sneak) {
            (Side::Offense, true) => StepOrder::FirstStrikeOffensive,
            (Side::Offense, false) => StepOrder::FirstStrikeOffensiveRegular,
            (Side::Defense, true) => StepOrder::FirstStrikeDefensive,
            (Side::Defense, false) => StepOrder::FirstStrikeDefensiveRegular,
        }
    }

    /// Firing groups for this side's first-strike units.
    #[must_use]
    pub fn firing_groups(
        &self,
        state: &BattleState,
        registry: &UnitRegistry,
        rules: &BattleRules,
    ) -> Vec<FiringGroup> {
        if !self.is_applicable() {
            return Vec::new();
        }
        general::firing_groups(
            self.side,
            FireCategory::FirstStrike,
            FIRST_STRIKE_UNITS,
            state,
            registry,
            rules,
        )
    }

    /// Fire and return the casualties as a delta for the opposing side.
    pub fn fire<R: FireResolver + ?Sized>(
        &self,
        state: &BattleState,
        registry: &UnitRegistry,
        rules: &BattleRules,
        resolver: &mut R,
    ) -> BattleDelta {
        let groups = self.firing_groups(state, registry, rules);
        resolve_fire(self.side, &groups, self.return_fire, state, registry, rules, resolver)
    }

    /// Encode for a save file.
    ///
    /// # Errors
    /// Returns [`BattleError::Persistence`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| BattleError::Persistence(format!("Failed to serialize first strike step: {e}")))
    }

    /// Decode from a save file.
    ///
    /// # Errors
    /// Returns [`BattleError::Persistence`] if the bytes are not a valid step.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| {
            BattleError::Persistence(format!("Failed to deserialize first strike step: {e}"))
        })
    }
}

/// Removes first-strike casualties before regular fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearFirstStrikeCasualties {
    active: bool,
    clear_offense: bool,
    clear_defense: bool,
}

impl ClearFirstStrikeCasualties {
    /// Decide from both sides' determinations.
    ///
    /// Both sides are cleared unless the alternate combat sequence is in
    /// force and exactly one side sneak attacked; that side's own
    /// casualties stay on the board for its regular fire.
    #[must_use]
    pub fn new(
        offense: FirstStrikeDetermination,
        defense: FirstStrikeDetermination,
        rules: &BattleRules,
    ) -> Self {
        let offense_sneaks = offense == FirstStrikeDetermination::FirstStrike;
        let defense_sneaks = defense == FirstStrikeDetermination::FirstStrike;
        let lone_sneak = rules.alternate_combat_sequence && offense_sneaks != defense_sneaks;

        let step = Self {
            active: offense_sneaks || defense_sneaks,
            clear_offense: !(lone_sneak && offense_sneaks),
            clear_defense: !(lone_sneak && defense_sneaks),
        };
        tracing::debug!(
            active = step.active,
            clear_offense = step.clear_offense,
            clear_defense = step.clear_defense,
            "Decided first strike casualty clearing"
        );
        step
    }

    /// Build from the two sides' first-strike steps.
    #[must_use]
    pub fn from_steps(offense: &FirstStrikeStep, defense: &FirstStrikeStep, rules: &BattleRules) -> Self {
        Self::new(offense.determination(), defense.determination(), rules)
    }

    /// Whether the step runs at all this round.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Sides whose waiting-to-die units are removed, offense first.
    #[must_use]
    pub fn sides_to_clear(&self) -> Vec<Side> {
        if !self.active {
            return Vec::new();
        }
        let mut sides = Vec::new();
        if self.clear_offense {
            sides.push(Side::Offense);
        }
        if self.clear_defense {
            sides.push(Side::Defense);
        }
        sides
    }

    /// Step names; empty when the step is a no-op.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        if self.active {
            vec![REMOVE_SNEAK_ATTACK_CASUALTIES.to_string()]
        } else {
            Vec::new()
        }
    }

    /// Delta emptying the waiting-to-die list of each cleared side that has
    /// casualties.
    #[must_use]
    pub fn apply(&self, state: &BattleState) -> BattleDelta {
        let mut delta = BattleDelta::default();
        for side in self.sides_to_clear() {
            if !state.waiting_to_die(side).is_empty() {
                delta.side_mut(side).clear_waiting = true;
            }
        }
        delta
    }
}
