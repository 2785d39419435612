//! Unit type combat attributes for data-driven unit definitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::rules_data::BattleRules;
use crate::units::UnitTypeId;

/// Anti-air capability of a unit type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AaData {
    /// Name of the AA category this unit fires as (e.g. "AA Gun").
    pub type_aa: String,

    /// Unit types this AA fire may target.
    #[serde(default)]
    pub targets: BTreeSet<UnitTypeId>,
}

/// Immutable combat attribute bundle for one unit type.
///
/// # Example RON
///
/// ```ron
/// UnitTypeData(
///     id: UnitTypeId("submarine"),
///     is_first_strike: true,
///     can_not_target: [UnitTypeId("fighter"), UnitTypeId("bomber")],
///     can_not_be_targeted_by: [UnitTypeId("fighter"), UnitTypeId("bomber")],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitTypeData {
    /// Unit type this bundle describes.
    pub id: UnitTypeId,

    /// Removed outright when it scores a hit; resolves in isolation per type.
    #[serde(default)]
    pub is_suicide_on_hit: bool,

    /// Dies after attacking; never a valid target for defending fire.
    #[serde(default)]
    pub is_suicide_on_attack: bool,

    /// Dies after defending; never a valid target for attacking fire.
    #[serde(default)]
    pub is_suicide_on_defense: bool,

    /// Fires in the sneak-attack phase when allowed.
    #[serde(default)]
    pub is_first_strike: bool,

    /// Cancels the opposing side's targeting immunities and sneak attacks.
    #[serde(default)]
    pub is_destroyer: bool,

    /// Air unit.
    #[serde(default)]
    pub is_air: bool,

    /// Infrastructure is never targeted by general fire.
    #[serde(default)]
    pub is_infrastructure: bool,

    /// May bombard a land battle from an adjacent sea zone.
    #[serde(default)]
    pub can_bombard: bool,

    /// Enemy types this unit may never fire at.
    #[serde(default)]
    pub can_not_target: BTreeSet<UnitTypeId>,

    /// Enemy types that may not fire at this unit unless they bring a destroyer.
    #[serde(default)]
    pub can_not_be_targeted_by: BTreeSet<UnitTypeId>,

    /// Anti-air capability, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aa: Option<AaData>,

    /// Hits this unit can absorb before dying.
    #[serde(default = "default_hit_points")]
    pub hit_points: u32,
}

/// Default hit points for units without an explicit value.
const fn default_hit_points() -> u32 {
    1
}

impl UnitTypeData {
    /// Create an attribute bundle with every flag off and one hit point.
    #[must_use]
    pub fn new(id: impl Into<UnitTypeId>) -> Self {
        Self {
            id: id.into(),
            is_suicide_on_hit: false,
            is_suicide_on_attack: false,
            is_suicide_on_defense: false,
            is_first_strike: false,
            is_destroyer: false,
            is_air: false,
            is_infrastructure: false,
            can_bombard: false,
            can_not_target: BTreeSet::new(),
            can_not_be_targeted_by: BTreeSet::new(),
            aa: None,
            hit_points: default_hit_points(),
        }
    }

    /// First-strike eligibility when this type is defending.
    ///
    /// Suicide-on-defense units lose their sneak attack on defense when the
    /// ruleset says defending suicide and munition units do not fire.
    #[must_use]
    pub fn is_first_strike_on_defense(&self, rules: &BattleRules) -> bool {
        self.is_first_strike
            && !(rules.defending_suicide_and_munition_units_do_not_fire
                && self.is_suicide_on_defense)
    }

    /// Whether this type fires as AA of the given category.
    #[must_use]
    pub fn is_aa_of_type(&self, type_aa: &str) -> bool {
        self.aa.as_ref().is_some_and(|aa| aa.type_aa == type_aa)
    }

    /// Unit types this type may hit when firing as AA of `type_aa`.
    ///
    /// Empty when the type is not AA of that category.
    #[must_use]
    pub fn targets_aa(&self, type_aa: &str) -> BTreeSet<UnitTypeId> {
        match &self.aa {
            Some(aa) if aa.type_aa == type_aa => aa.targets.clone(),
            _ => BTreeSet::new(),
        }
    }
}
