//! Closed-form battle estimate for AI planning.
//!
//! Lanchester's power law: a side's strength is its average per-unit power
//! times its unit count raised to the attrition exponent. The larger
//! strength wins and keeps `((winner - loser) / winner_avg_power)^(1/exponent)`
//! units. This is a single-shot estimate; AA fire, first-strike timing and
//! per-round attrition are not modelled.

use crate::battle::Side;
use crate::data::{BattleRules, DEFAULT_ATTRITION_EXPONENT};
use crate::error::{BattleError, Result};
use crate::registry::UnitRegistry;
use crate::units::Unit;

/// A unit as seen by the estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveUnit {
    /// Strength of each roll.
    pub power: f64,
    /// Total hit points of the unit's type.
    pub hit_points: u32,
    /// Hits already taken.
    pub hits_taken: u32,
}

impl ActiveUnit {
    /// Create an active unit.
    #[must_use]
    pub const fn new(power: f64, hit_points: u32, hits_taken: u32) -> Self {
        Self {
            power,
            hit_points,
            hits_taken,
        }
    }

    /// Take power and damage from a battle unit, hit points from its type.
    #[must_use]
    pub fn from_unit(unit: &Unit, registry: &UnitRegistry) -> Self {
        Self::new(
            f64::from(unit.power),
            registry.hit_points(&unit.unit_type),
            unit.hits,
        )
    }

    /// Power scaled by the hit points left.
    #[must_use]
    pub fn effective_power(&self) -> f64 {
        self.power * f64::from(self.hit_points.saturating_sub(self.hits_taken))
    }
}

/// Outcome of an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanchesterResult {
    /// Side expected to hold the field. Ties go to the defense.
    pub winning_side: Side,
    /// Units the winner is expected to keep.
    pub remaining_units: u32,
}

/// Lanchester estimator with a fixed attrition exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanchesterCalculator {
    attrition_exponent: f64,
}

impl Default for LanchesterCalculator {
    fn default() -> Self {
        Self {
            attrition_exponent: DEFAULT_ATTRITION_EXPONENT,
        }
    }
}

impl LanchesterCalculator {
    /// Create a calculator.
    ///
    /// # Errors
    /// Returns [`BattleError::InvalidArgument`] unless the exponent is
    /// finite and positive.
    pub fn new(attrition_exponent: f64) -> Result<Self> {
        if !attrition_exponent.is_finite() || attrition_exponent <= 0.0 {
            return Err(BattleError::InvalidArgument(format!(
                "attrition exponent must be finite and positive, got {attrition_exponent}"
            )));
        }
        Ok(Self { attrition_exponent })
    }

    /// Create a calculator using the ruleset's attrition exponent.
    ///
    /// # Errors
    /// Returns [`BattleError::InvalidArgument`] if the ruleset's exponent is
    /// not finite and positive.
    pub fn from_rules(rules: &BattleRules) -> Result<Self> {
        Self::new(rules.attrition_exponent)
    }

    /// Exponent in use.
    #[must_use]
    pub const fn attrition_exponent(&self) -> f64 {
        self.attrition_exponent
    }

    /// Estimate who wins and how many units survive.
    #[must_use]
    pub fn estimate(&self, offense: &[ActiveUnit], defense: &[ActiveUnit]) -> LanchesterResult {
        let offense_power = average_power(offense);
        let defense_power = average_power(defense);
        let initial_offense = self.initial_strength(offense_power, offense.len());
        let initial_defense = self.initial_strength(defense_power, defense.len());

        let (winning_side, surplus, winner_power) = if initial_offense > initial_defense {
            (Side::Offense, initial_offense - initial_defense, offense_power)
        } else {
            (Side::Defense, initial_defense - initial_offense, defense_power)
        };

        LanchesterResult {
            winning_side,
            remaining_units: self.survivors(surplus, winner_power),
        }
    }

    fn initial_strength(&self, average_power: f64, count: usize) -> f64 {
        average_power * (count as f64).powf(self.attrition_exponent)
    }

    fn survivors(&self, surplus: f64, winner_power: f64) -> u32 {
        if winner_power <= 0.0 {
            return 0;
        }
        let remaining = (surplus / winner_power).powf(self.attrition_exponent.recip());
        if remaining.is_finite() {
            remaining.round() as u32
        } else {
            0
        }
    }
}

fn average_power(units: &[ActiveUnit]) -> f64 {
    if units.is_empty() {
        return 0.0;
    }
    units.iter().map(ActiveUnit::effective_power).sum::<f64>() / units.len() as f64
}
