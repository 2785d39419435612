//! Power aggregation and the battle odds summary used by AI planning.
//!
//! Power follows the exact resolver's rules: each unit's per-roll power,
//! adjusted by territory effects for its type, is capped at the dice size
//! and multiplied by its roll count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::battle::Side;
use crate::data::BattleRules;
use crate::error::{BattleError, Result};
use crate::units::{Unit, UnitTypeId};

/// Terrain or territory modifier to unit power.
///
/// # Example RON
///
/// ```ron
/// TerritoryEffect(
///     name: "Mountains",
///     defense_modifiers: { UnitTypeId("infantry"): 1 },
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryEffect {
    /// Effect name.
    pub name: String,
    /// Power change per unit type when attacking.
    #[serde(default)]
    pub offense_modifiers: BTreeMap<UnitTypeId, i32>,
    /// Power change per unit type when defending.
    #[serde(default)]
    pub defense_modifiers: BTreeMap<UnitTypeId, i32>,
}

impl TerritoryEffect {
    /// Create an effect with no modifiers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a modifier for a type on one side.
    #[must_use]
    pub fn with_modifier(mut self, side: Side, unit_type: impl Into<UnitTypeId>, delta: i32) -> Self {
        let modifiers = match side {
            Side::Offense => &mut self.offense_modifiers,
            Side::Defense => &mut self.defense_modifiers,
        };
        modifiers.insert(unit_type.into(), delta);
        self
    }

    /// Modifier for a type on one side; zero when unlisted.
    #[must_use]
    pub fn modifier(&self, side: Side, unit_type: &UnitTypeId) -> i32 {
        let modifiers = match side {
            Side::Offense => &self.offense_modifiers,
            Side::Defense => &self.defense_modifiers,
        };
        modifiers.get(unit_type).copied().unwrap_or(0)
    }

    /// Parse a RON list of effects.
    ///
    /// # Errors
    /// Returns [`BattleError::DataParseError`] on malformed RON.
    pub fn list_from_ron(source_name: &str, text: &str) -> Result<Vec<Self>> {
        ron::from_str(text).map_err(|e| BattleError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Per-roll power of a unit after territory effects, capped at the dice size.
#[must_use]
pub fn unit_power(unit: &Unit, side: Side, effects: &[TerritoryEffect], rules: &BattleRules) -> u32 {
    let modifier: i64 = effects
        .iter()
        .map(|e| i64::from(e.modifier(side, &unit.unit_type)))
        .sum();
    let adjusted = i64::from(unit.power) + modifier;
    adjusted.clamp(0, i64::from(rules.dice_sides)) as u32
}

/// Total power and rolls of one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerAndRolls {
    /// Sum of capped power times rolls.
    pub power: u64,
    /// Sum of rolls.
    pub rolls: u64,
}

impl PowerAndRolls {
    /// Aggregate a side's units.
    #[must_use]
    pub fn of_side(units: &[Unit], side: Side, effects: &[TerritoryEffect], rules: &BattleRules) -> Self {
        units.iter().fold(Self::default(), |total, unit| {
            let rolls = u64::from(unit.rolls);
            Self {
                power: total.power + u64::from(unit_power(unit, side, effects, rules)) * rolls,
                rolls: total.rolls + rolls,
            }
        })
    }
}

/// Signed power balance of a prospective battle.
///
/// Positive values favour the defender.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleOddsSummary {
    offense_units: Vec<Unit>,
    defense_units: Vec<Unit>,
    effects: Vec<TerritoryEffect>,
    value: f64,
}

impl BattleOddsSummary {
    /// Compute the balance of two forces under the given effects.
    #[must_use]
    pub fn new(
        offense_units: Vec<Unit>,
        defense_units: Vec<Unit>,
        effects: Vec<TerritoryEffect>,
        rules: &BattleRules,
    ) -> Self {
        let offense = PowerAndRolls::of_side(&offense_units, Side::Offense, &effects, rules);
        let defense = PowerAndRolls::of_side(&defense_units, Side::Defense, &effects, rules);
        let value = defense.power as f64 - offense.power as f64;
        tracing::trace!(offense = offense.power, defense = defense.power, value, "Computed battle odds");
        Self {
            offense_units,
            defense_units,
            effects,
            value,
        }
    }

    /// The summary of no battle at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            offense_units: Vec::new(),
            defense_units: Vec::new(),
            effects: Vec::new(),
            value: 0.0,
        }
    }

    /// Whether both forces are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offense_units.is_empty() && self.defense_units.is_empty()
    }

    /// Defense power minus offense power.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Attacking units the summary was computed from.
    #[must_use]
    pub fn offense_units(&self) -> &[Unit] {
        &self.offense_units
    }

    /// Defending units the summary was computed from.
    #[must_use]
    pub fn defense_units(&self) -> &[Unit] {
        &self.defense_units
    }

    /// Territory effects applied.
    #[must_use]
    pub fn effects(&self) -> &[TerritoryEffect] {
        &self.effects
    }
}

impl Default for BattleOddsSummary {
    fn default() -> Self {
        Self::empty()
    }
}
