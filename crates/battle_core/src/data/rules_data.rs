//! Ruleset flags consumed by combat resolution.

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

/// Sides on the standard die.
pub const DEFAULT_DICE_SIDES: u32 = 6;

/// Attrition exponent used by the Lanchester estimate.
pub const DEFAULT_ATTRITION_EXPONENT: f64 = 1.45;

/// Global rule flags for one game.
///
/// # Example RON
///
/// ```ron
/// BattleRules(
///     alternate_combat_sequence: true,
///     defending_sneak_attack: false,
///     dice_sides: 6,
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BattleRules {
    /// Alternate combat sequence: first-strike units always sneak attack.
    #[serde(default)]
    pub alternate_combat_sequence: bool,

    /// Defending first-strike units may sneak attack.
    #[serde(default)]
    pub defending_sneak_attack: bool,

    /// Suicide-on-defense units lose their sneak attack when defending.
    #[serde(default)]
    pub defending_suicide_and_munition_units_do_not_fire: bool,

    /// Allied air units attacking alongside the attacker may fire.
    #[serde(default = "default_true")]
    pub allied_air_independent: bool,

    /// Units killed by naval bombardment may still fire back.
    #[serde(default = "default_true")]
    pub naval_bombard_casualties_return_fire: bool,

    /// Number of sides on a die; per-roll power is capped at this.
    #[serde(default = "default_dice_sides")]
    pub dice_sides: u32,

    /// Exponent controlling how force concentration scales strength.
    #[serde(default = "default_attrition_exponent")]
    pub attrition_exponent: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_dice_sides() -> u32 {
    DEFAULT_DICE_SIDES
}

const fn default_attrition_exponent() -> f64 {
    DEFAULT_ATTRITION_EXPONENT
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            alternate_combat_sequence: false,
            defending_sneak_attack: false,
            defending_suicide_and_munition_units_do_not_fire: false,
            allied_air_independent: default_true(),
            naval_bombard_casualties_return_fire: default_true(),
            dice_sides: DEFAULT_DICE_SIDES,
            attrition_exponent: DEFAULT_ATTRITION_EXPONENT,
        }
    }
}

impl BattleRules {
    /// Parse and validate rules from RON text.
    ///
    /// # Errors
    /// Returns [`BattleError::DataParseError`] on malformed RON and
    /// [`BattleError::InvalidArgument`] when a value is out of range.
    pub fn from_ron(source_name: &str, text: &str) -> Result<Self> {
        let rules: Self = ron::from_str(text).map_err(|e| BattleError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check that numeric settings are usable.
    ///
    /// # Errors
    /// Returns [`BattleError::InvalidArgument`] for a zero-sided die or an
    /// attrition exponent that is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if self.dice_sides == 0 {
            return Err(BattleError::InvalidArgument(
                "dice_sides must be at least 1".to_string(),
            ));
        }
        if !self.attrition_exponent.is_finite() || self.attrition_exponent <= 0.0 {
            return Err(BattleError::InvalidArgument(format!(
                "attrition_exponent must be positive and finite, got {}",
                self.attrition_exponent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = BattleRules::default();
        assert_eq!(rules.dice_sides, 6);
        assert!((rules.attrition_exponent - 1.45).abs() < f64::EPSILON);
        assert!(rules.allied_air_independent);
        assert!(!rules.alternate_combat_sequence);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_from_ron_fills_defaults() {
        let rules =
            BattleRules::from_ron("rules.ron", "BattleRules(alternate_combat_sequence: true)")
                .unwrap();
        assert!(rules.alternate_combat_sequence);
        assert_eq!(rules.dice_sides, 6);
    }

    #[test]
    fn test_from_ron_rejects_zero_dice() {
        let err = BattleRules::from_ron("rules.ron", "BattleRules(dice_sides: 0)").unwrap_err();
        assert!(matches!(err, BattleError::InvalidArgument(_)));
    }

    #[test]
    fn test_from_ron_reports_parse_errors() {
        let err = BattleRules::from_ron("broken.ron", "BattleRules(dice_sides: )").unwrap_err();
        match err {
            BattleError::DataParseError { source_name, .. } => assert_eq!(source_name, "broken.ron"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_exponent() {
        let rules = BattleRules {
            attrition_exponent: f64::NAN,
            ..BattleRules::default()
        };
        assert!(rules.validate().is_err());
    }
}
