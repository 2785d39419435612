//! Unit identity and per-instance combat data.
//!
//! A [`Unit`] is one combatant in a battle. Its static attributes live in
//! the [`UnitRegistry`](crate::registry::UnitRegistry) keyed by
//! [`UnitTypeId`]; the unit itself only carries what changes per instance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for unit types.
///
/// Ordered so that sets of types iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTypeId(pub String);

impl UnitTypeId {
    /// Create a new unit type ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitTypeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// Unique identifier for unit instances.
pub type UnitId = u64;

/// A single combatant.
///
/// `power` and `rolls` are computed by the power collaborator before the
/// battle core sees the unit; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Instance identifier, unique within a battle.
    pub id: UnitId,
    /// Type of this unit.
    pub unit_type: UnitTypeId,
    /// Owning player.
    pub owner: PlayerId,
    /// Hits already taken.
    #[serde(default)]
    pub hits: u32,
    /// Strength of each roll.
    #[serde(default)]
    pub power: u32,
    /// Number of rolls this unit makes.
    #[serde(default = "default_rolls")]
    pub rolls: u32,
    /// Whether the unit is in the air over the battle site.
    #[serde(default)]
    pub airborne: bool,
}

/// Default roll count for units without an explicit value.
const fn default_rolls() -> u32 {
    1
}

impl Unit {
    /// Create a unit with no damage, zero power and one roll.
    #[must_use]
    pub fn new(id: UnitId, unit_type: impl Into<UnitTypeId>, owner: PlayerId) -> Self {
        Self {
            id,
            unit_type: unit_type.into(),
            owner,
            hits: 0,
            power: 0,
            rolls: default_rolls(),
            airborne: false,
        }
    }

    /// Builder method to set power and rolls.
    #[must_use]
    pub fn with_power(mut self, power: u32, rolls: u32) -> Self {
        self.power = power;
        self.rolls = rolls;
        self
    }

    /// Builder method to set hits already taken.
    #[must_use]
    pub fn with_hits(mut self, hits: u32) -> Self {
        self.hits = hits;
        self
    }

    /// Builder method to mark the unit airborne.
    #[must_use]
    pub fn airborne(mut self) -> Self {
        self.airborne = true;
        self
    }
}

/// Collect the distinct unit types of `units` in first-seen order.
#[must_use]
pub fn distinct_types<'a>(units: impl IntoIterator<Item = &'a Unit>) -> Vec<UnitTypeId> {
    let mut types: Vec<UnitTypeId> = Vec::new();
    for unit in units {
        if !types.contains(&unit.unit_type) {
            types.push(unit.unit_type.clone());
        }
    }
    types
}
