//! Naval bombardment in support of an amphibious assault.

use crate::battle::{BattleState, Side};
use crate::data::BattleRules;
use crate::firing::{FiringGroup, ReturnFire, NAVAL_BOMBARDMENT};
use crate::registry::UnitRegistry;
use crate::targeting::TargetGroup;
use crate::units::Unit;

/// Whether bombardment happens at all this round.
///
/// Only on the first round of an amphibious assault on land.
#[must_use]
pub fn bombardment_applies(state: &BattleState) -> bool {
    let status = state.status();
    status.is_first_round() && status.is_amphibious && !state.site().is_water
}

/// Firing groups for the attacker's bombarding ships.
///
/// Ships without the bombard ability sit out. Defending infrastructure is
/// never a target.
#[must_use]
pub fn bombardment_firing_groups(state: &BattleState, registry: &UnitRegistry) -> Vec<FiringGroup> {
    if !bombardment_applies(state) {
        return Vec::new();
    }

    let bombarding: Vec<Unit> = state
        .bombarding_units()
        .iter()
        .filter(|u| registry.get(&u.unit_type).is_some_and(|t| t.can_bombard))
        .cloned()
        .collect();
    let enemies: Vec<Unit> = state
        .active_units(Side::Defense)
        .iter()
        .filter(|u| !registry.is_infrastructure(&u.unit_type))
        .cloned()
        .collect();

    TargetGroup::new_target_groups(&bombarding, &enemies, registry)
        .iter()
        .flat_map(|target_group| {
            FiringGroup::group_by_suicide_on_hit(
                NAVAL_BOMBARDMENT,
                "",
                &target_group.firing_units(&bombarding),
                |_| target_group.target_units(&enemies),
                registry,
            )
        })
        .collect()
}

/// Whether units killed by bombardment still fire back this round.
#[must_use]
pub const fn bombardment_return_fire(rules: &BattleRules) -> ReturnFire {
    if rules.naval_bombard_casualties_return_fire {
        ReturnFire::All
    } else {
        ReturnFire::None
    }
}
