//! Firing groups and the partitioner shared by every fire category.
//!
//! A [`FiringGroup`] is one batch of units rolled together against one set
//! of valid targets. Suicide-on-hit unit types are always split into their
//! own group per type so the dice/casualty collaborator can resolve them in
//! isolation; every other unit shares one group that comes last.
//!
//! # Submodules
//!
//! - [`general`] - regular and first-strike fire
//! - [`bombard`] - naval bombardment of an amphibious assault
//! - [`aa`] - anti-air fire

pub mod aa;
pub mod bombard;
pub mod general;

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::battle::{BattleDelta, BattleState, Side};
use crate::data::BattleRules;
use crate::error::{BattleError, Result};
use crate::registry::UnitRegistry;
use crate::units::{Unit, UnitId, UnitTypeId};

/// Display name for air units firing while enemy submarines are immune.
pub const AIR_FIRE_NON_SUBS: &str = "air fire non subs";

/// Display name for naval bombardment.
pub const NAVAL_BOMBARDMENT: &str = "naval bombardment";

/// What happens to units killed by a volley before they can fire back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnFire {
    /// Killed units are removed at once and never fire back.
    None,
    /// Only killed first-strike units wait to die; the rest are removed.
    FirstStrikeOnly,
    /// All killed units wait to die and still fire this round.
    All,
}

/// Units rolling together against one set of valid targets.
///
/// Both unit lists are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiringGroup {
    display_name: String,
    group_name: String,
    firing_units: Vec<Unit>,
    target_units: Vec<Unit>,
    suicide_on_hit: bool,
}

impl FiringGroup {
    /// Create a group.
    ///
    /// # Errors
    /// Returns [`BattleError::InvalidArgument`] if either unit list is empty.
    pub fn new(
        display_name: impl Into<String>,
        group_name: impl Into<String>,
        firing_units: Vec<Unit>,
        target_units: Vec<Unit>,
        suicide_on_hit: bool,
    ) -> Result<Self> {
        if firing_units.is_empty() {
            return Err(BattleError::InvalidArgument(
                "firing group needs at least one firing unit".to_string(),
            ));
        }
        if target_units.is_empty() {
            return Err(BattleError::InvalidArgument(
                "firing group needs at least one target".to_string(),
            ));
        }
        Ok(Self {
            display_name: display_name.into(),
            group_name: group_name.into(),
            firing_units,
            target_units,
            suicide_on_hit,
        })
    }

    /// Split `firing_units` into one group per suicide-on-hit type, then
    /// one group for everything else.
    ///
    /// `targets_for` receives each bucket's units and returns that bucket's
    /// valid targets. Buckets with no units or no targets are dropped
    /// silently. Suicide buckets come out in first-seen order, the shared
    /// bucket last.
    pub fn group_by_suicide_on_hit<F>(
        display_name: &str,
        group_name: &str,
        firing_units: &[Unit],
        targets_for: F,
        registry: &UnitRegistry,
    ) -> Vec<FiringGroup>
    where
        F: Fn(&[Unit]) -> Vec<Unit>,
    {
        let mut suicide_buckets: Vec<(UnitTypeId, Vec<Unit>)> = Vec::new();
        let mut shared = Vec::new();
        for unit in firing_units {
            if !registry.is_suicide_on_hit(&unit.unit_type) {
                shared.push(unit.clone());
                continue;
            }
            match suicide_buckets
                .iter_mut()
                .find(|(unit_type, _)| *unit_type == unit.unit_type)
            {
                Some((_, bucket)) => bucket.push(unit.clone()),
                None => suicide_buckets.push((unit.unit_type.clone(), vec![unit.clone()])),
            }
        }

        let buckets = suicide_buckets
            .into_iter()
            .map(|(_, bucket)| (bucket, true))
            .chain(std::iter::once((shared, false)));

        let mut groups = Vec::new();
        for (bucket, suicide_on_hit) in buckets {
            if bucket.is_empty() {
                continue;
            }
            let targets = targets_for(&bucket);
            if targets.is_empty() {
                continue;
            }
            groups.push(FiringGroup {
                display_name: display_name.to_string(),
                group_name: group_name.to_string(),
                firing_units: bucket,
                target_units: targets,
                suicide_on_hit,
            });
        }

        tracing::trace!(display_name, group_name, groups = groups.len(), "Partitioned firing units");
        groups
    }

    /// Name shown for this group's fire step.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Category tag; empty for ordinary combat, the AA type for AA fire.
    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Units rolling in this group.
    #[must_use]
    pub fn firing_units(&self) -> &[Unit] {
        &self.firing_units
    }

    /// Units this group may hit.
    #[must_use]
    pub fn target_units(&self) -> &[Unit] {
        &self.target_units
    }

    /// Whether every firing unit is a single suicide-on-hit type.
    #[must_use]
    pub const fn is_suicide_on_hit(&self) -> bool {
        self.suicide_on_hit
    }

    /// This group minus targets already killed, or `None` if none are left.
    fn without_targets(&self, killed: &BTreeSet<UnitId>) -> Option<Cow<'_, FiringGroup>> {
        if !self.target_units.iter().any(|u| killed.contains(&u.id)) {
            return Some(Cow::Borrowed(self));
        }
        let target_units: Vec<Unit> = self
            .target_units
            .iter()
            .filter(|u| !killed.contains(&u.id))
            .cloned()
            .collect();
        if target_units.is_empty() {
            return None;
        }
        Some(Cow::Owned(FiringGroup {
            display_name: self.display_name.clone(),
            group_name: self.group_name.clone(),
            firing_units: self.firing_units.clone(),
            target_units,
            suicide_on_hit: self.suicide_on_hit,
        }))
    }
}

/// Result of rolling one firing group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireOutcome {
    /// Number of hits scored.
    pub hits: u32,
    /// Target units chosen as casualties.
    pub killed: Vec<UnitId>,
}

/// Dice rolling and casualty selection, supplied by the caller.
///
/// The battle core never rolls dice or chooses among equally valid
/// casualties; it hands each group to this collaborator in order.
pub trait FireResolver {
    /// Roll for `group` and choose casualties among its targets.
    fn fire(&mut self, group: &FiringGroup, state: &BattleState) -> FireOutcome;
}

/// Fire every group for `firing_side` and fold the casualties into a delta.
///
/// Casualties land on the opposing side according to `return_fire`.
/// A unit killed by one group is no longer a target for later groups in
/// the same volley; a group left with no targets does not fire.
/// Suicide-on-hit groups lose as many of their own firing units as they
/// scored hits, taken in group order.
pub fn resolve_fire<R: FireResolver + ?Sized>(
    firing_side: Side,
    groups: &[FiringGroup],
    return_fire: ReturnFire,
    state: &BattleState,
    registry: &UnitRegistry,
    rules: &BattleRules,
    resolver: &mut R,
) -> BattleDelta {
    let target_side = firing_side.opposite();
    let mut delta = BattleDelta::default();
    let mut killed: BTreeSet<UnitId> = BTreeSet::new();

    for group in groups {
        let group = match group.without_targets(&killed) {
            Some(group) => group,
            None => {
                tracing::trace!(display_name = group.display_name(), "No targets left for group");
                continue;
            }
        };
        let outcome = resolver.fire(&group, state);

        for id in outcome.killed {
            let Some(unit) = group.target_units().iter().find(|u| u.id == id) else {
                tracing::warn!(unit = id, "Casualty is not a target of its firing group");
                continue;
            };
            if !killed.insert(id) {
                tracing::warn!(unit = id, "Casualty chosen twice in one volley");
                continue;
            }
            let waits = match return_fire {
                ReturnFire::All => true,
                ReturnFire::FirstStrikeOnly => {
                    registry.is_first_strike_for(target_side, &unit.unit_type, rules)
                }
                ReturnFire::None => false,
            };
            let changes = delta.side_mut(target_side);
            if waits {
                changes.to_waiting.push(id);
            } else {
                changes.removed.push(id);
            }
        }

        if group.is_suicide_on_hit() && outcome.hits > 0 {
            let spent = group
                .firing_units()
                .iter()
                .take(outcome.hits as usize)
                .map(|u| u.id);
            delta.side_mut(firing_side).removed.extend(spent);
        }
    }

    delta
}
