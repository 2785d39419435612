//! Read-only unit attribute registry.
//!
//! Every component that needs combat attributes receives a
//! [`UnitRegistry`] reference explicitly. There is no global lookup, so
//! tests can build whatever fixture registry they need.

use std::collections::{BTreeSet, HashMap};

use crate::battle::Side;
use crate::data::{BattleRules, UnitTypeData};
use crate::error::{BattleError, Result};
use crate::units::{PlayerId, Unit, UnitTypeId};

/// Registry of unit type attribute bundles.
///
/// Lookups for an unregistered type answer as if every flag were off;
/// [`UnitRegistry::validate_units`] is the place that rejects unknown types.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    /// Attribute bundles indexed by type.
    types: HashMap<UnitTypeId, UnitTypeData>,
    /// Per player and AA category, the types hittable while airborne.
    airborne_targets: HashMap<(PlayerId, String), BTreeSet<UnitTypeId>>,
}

impl UnitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            airborne_targets: HashMap::new(),
        }
    }

    /// Build a registry from a list of bundles.
    ///
    /// # Errors
    /// Returns [`BattleError::InvalidArgument`] if a type is listed twice or
    /// declares zero hit points.
    pub fn from_data(data: Vec<UnitTypeData>) -> Result<Self> {
        let mut registry = Self::new();
        for bundle in data {
            if bundle.hit_points == 0 {
                return Err(BattleError::InvalidArgument(format!(
                    "unit type '{}' has zero hit points",
                    bundle.id
                )));
            }
            if registry.types.contains_key(&bundle.id) {
                return Err(BattleError::InvalidArgument(format!(
                    "unit type '{}' registered twice",
                    bundle.id
                )));
            }
            registry.register(bundle);
        }
        Ok(registry)
    }

    /// Parse a RON list of [`UnitTypeData`] and build a registry from it.
    ///
    /// # Errors
    /// Returns [`BattleError::DataParseError`] on malformed RON, or any
    /// error from [`UnitRegistry::from_data`].
    pub fn from_ron(source_name: &str, text: &str) -> Result<Self> {
        let data: Vec<UnitTypeData> =
            ron::from_str(text).map_err(|e| BattleError::DataParseError {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        Self::from_data(data)
    }

    /// Register a unit type, replacing any previous bundle for it.
    pub fn register(&mut self, data: UnitTypeData) {
        self.types.insert(data.id.clone(), data);
    }

    /// Declare which types `player`'s AA of category `type_aa` may hit while
    /// they are airborne over a defended territory.
    pub fn set_airborne_targeted_by_aa(
        &mut self,
        player: PlayerId,
        type_aa: impl Into<String>,
        targets: BTreeSet<UnitTypeId>,
    ) {
        self.airborne_targets.insert((player, type_aa.into()), targets);
    }

    /// Get a unit type bundle.
    #[must_use]
    pub fn get(&self, id: &UnitTypeId) -> Option<&UnitTypeData> {
        self.types.get(id)
    }

    /// Get the bundle for a unit's type.
    #[must_use]
    pub fn of(&self, unit: &Unit) -> Option<&UnitTypeData> {
        self.types.get(&unit.unit_type)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Check that every unit's type is registered.
    ///
    /// # Errors
    /// Returns [`BattleError::UnknownUnitType`] for the first unknown type.
    pub fn validate_units<'a>(&self, units: impl IntoIterator<Item = &'a Unit>) -> Result<()> {
        for unit in units {
            if !self.types.contains_key(&unit.unit_type) {
                return Err(BattleError::UnknownUnitType(unit.unit_type.to_string()));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Attribute lookups
    // ========================================================================

    /// Whether the type is removed outright when it scores a hit.
    #[must_use]
    pub fn is_suicide_on_hit(&self, id: &UnitTypeId) -> bool {
        self.get(id).is_some_and(|t| t.is_suicide_on_hit)
    }

    /// Whether the type dies after attacking.
    #[must_use]
    pub fn is_suicide_on_attack(&self, id: &UnitTypeId) -> bool {
        self.get(id).is_some_and(|t| t.is_suicide_on_attack)
    }

    /// Whether the type dies after defending.
    #[must_use]
    pub fn is_suicide_on_defense(&self, id: &UnitTypeId) -> bool {
        self.get(id).is_some_and(|t| t.is_suicide_on_defense)
    }

    /// Whether the type has the first-strike attribute.
    #[must_use]
    pub fn is_first_strike(&self, id: &UnitTypeId) -> bool {
        self.get(id).is_some_and(|t| t.is_first_strike)
    }

    /// Whether the type has the first-strike attribute while defending.
    #[must_use]
    pub fn is_first_strike_on_defense(&self, id: &UnitTypeId, rules: &BattleRules) -> bool {
        self.get(id)
            .is_some_and(|t| t.is_first_strike_on_defense(rules))
    }

    /// First-strike eligibility of the type for the side it fights on.
    #[must_use]
    pub fn is_first_strike_for(&self, side: Side, id: &UnitTypeId, rules: &BattleRules) -> bool {
        match side {
            Side::Offense => self.is_first_strike(id),
            Side::Defense => self.is_first_strike_on_defense(id, rules),
        }
    }

    /// Whether the type is a destroyer.
    #[must_use]
    pub fn is_destroyer(&self, id: &UnitTypeId) -> bool {
        self.get(id).is_some_and(|t| t.is_destroyer)
    }

    /// Whether the type is an air unit.
    #[must_use]
    pub fn is_air(&self, id: &UnitTypeId) -> bool {
        self.get(id).is_some_and(|t| t.is_air)
    }

    /// Whether the type is infrastructure.
    #[must_use]
    pub fn is_infrastructure(&self, id: &UnitTypeId) -> bool {
        self.get(id).is_some_and(|t| t.is_infrastructure)
    }

    /// Hit points of the type (1 for unknown types).
    #[must_use]
    pub fn hit_points(&self, id: &UnitTypeId) -> u32 {
        self.get(id).map_or(1, |t| t.hit_points)
    }

    /// Whether `firing` may never target `target`.
    #[must_use]
    pub fn can_not_target(&self, firing: &UnitTypeId, target: &UnitTypeId) -> bool {
        self.get(firing)
            .is_some_and(|t| t.can_not_target.contains(target))
    }

    /// Whether `target` is immune to `firing` unless a destroyer is present.
    #[must_use]
    pub fn can_not_be_targeted_by(&self, target: &UnitTypeId, firing: &UnitTypeId) -> bool {
        self.get(target)
            .is_some_and(|t| t.can_not_be_targeted_by.contains(firing))
    }

    /// Types `firing` may hit when firing as AA of `type_aa`.
    #[must_use]
    pub fn targets_aa(&self, firing: &UnitTypeId, type_aa: &str) -> BTreeSet<UnitTypeId> {
        self.get(firing)
            .map(|t| t.targets_aa(type_aa))
            .unwrap_or_default()
    }

    /// Types `player`'s AA of `type_aa` may hit while airborne.
    #[must_use]
    pub fn airborne_targeted_by_aa(&self, player: PlayerId, type_aa: &str) -> BTreeSet<UnitTypeId> {
        self.airborne_targets
            .get(&(player, type_aa.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Distinct AA categories among `units`, in first-seen order.
    #[must_use]
    pub fn aa_types_of<'a>(&self, units: impl IntoIterator<Item = &'a Unit>) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for unit in units {
            if let Some(aa) = self.of(unit).and_then(|t| t.aa.as_ref()) {
                if !types.contains(&aa.type_aa) {
                    types.push(aa.type_aa.clone());
                }
            }
        }
        types
    }
}
