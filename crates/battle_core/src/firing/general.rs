//! Firing groups for regular and first-strike fire.

use crate::battle::{BattleState, Side, UnitFilter};
use crate::data::BattleRules;
use crate::firing::{FiringGroup, AIR_FIRE_NON_SUBS};
use crate::registry::UnitRegistry;
use crate::targeting::TargetGroup;
use crate::units::Unit;

/// Which of a side's units a fire step rolls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireCategory {
    /// Everything except first-strike units.
    Normal,
    /// First-strike units only.
    FirstStrike,
}

impl FireCategory {
    fn includes(self, side: Side, unit: &Unit, registry: &UnitRegistry, rules: &BattleRules) -> bool {
        let first_strike = registry.is_first_strike_for(side, &unit.unit_type, rules);
        match self {
            FireCategory::Normal => !first_strike,
            FireCategory::FirstStrike => first_strike,
        }
    }
}

/// Units of `side` that fire in `category`.
///
/// Casualties still waiting to die fire alongside active units. On offense,
/// allied units only fire when `allied_air_independent` is set.
#[must_use]
pub fn firing_units(
    side: Side,
    category: FireCategory,
    state: &BattleState,
    registry: &UnitRegistry,
    rules: &BattleRules,
) -> Vec<Unit> {
    let attacker = state.attacker();
    state
        .filter_units(UnitFilter::ActiveOrCasualty, side)
        .into_iter()
        .filter(|u| category.includes(side, u, registry, rules))
        .filter(|u| side.is_defense() || rules.allied_air_independent || u.owner == attacker)
        .collect()
}

/// Enemy units `side` may fire at.
///
/// Infrastructure never counts as a target, nor do enemy units that die on
/// their own at the end of the round (suicide on defense when attacking,
/// suicide on attack when defending).
#[must_use]
pub fn target_units(side: Side, state: &BattleState, registry: &UnitRegistry) -> Vec<Unit> {
    state
        .active_units(side.opposite())
        .iter()
        .filter(|u| !registry.is_infrastructure(&u.unit_type))
        .filter(|u| match side {
            Side::Offense => !registry.is_suicide_on_defense(&u.unit_type),
            Side::Defense => !registry.is_suicide_on_attack(&u.unit_type),
        })
        .cloned()
        .collect()
}

/// Build the firing groups for one side and fire category.
///
/// Each target group is split by the suicide partitioner. Air units that
/// can not reach some enemy type because of its targeting immunity are
/// named [`AIR_FIRE_NON_SUBS`]; other target groups use `base_name`, with
/// the first firing type appended when there is more than one of them.
#[must_use]
pub fn firing_groups(
    side: Side,
    category: FireCategory,
    base_name: &str,
    state: &BattleState,
    registry: &UnitRegistry,
    rules: &BattleRules,
) -> Vec<FiringGroup> {
    let firing = firing_units(side, category, state, registry, rules);
    let enemies = target_units(side, state, registry);
    let target_groups = TargetGroup::new_target_groups(&firing, &enemies, registry);

    let air_blocked: Vec<bool> = target_groups
        .iter()
        .map(|group| is_air_blocked(group, &enemies, registry))
        .collect();
    let single = air_blocked.iter().filter(|blocked| !**blocked).count() == 1;

    let mut groups = Vec::new();
    for (target_group, blocked) in target_groups.iter().zip(air_blocked) {
        let name = if blocked {
            AIR_FIRE_NON_SUBS.to_string()
        } else {
            match target_group.firing_unit_types().first() {
                Some(first) if !single => format!("{base_name} {first}"),
                _ => base_name.to_string(),
            }
        };
        groups.extend(FiringGroup::group_by_suicide_on_hit(
            &name,
            "",
            &target_group.firing_units(&firing),
            |_| target_group.target_units(&enemies),
            registry,
        ));
    }

    tracing::trace!(side = ?side, category = ?category, groups = groups.len(), "Built firing groups");
    groups
}

/// All firing types are air and some enemy type is out of reach only
/// because it can not be targeted by one of them.
fn is_air_blocked(group: &TargetGroup, enemies: &[Unit], registry: &UnitRegistry) -> bool {
    let firing_types = group.firing_unit_types();
    if !firing_types.iter().all(|t| registry.is_air(t)) {
        return false;
    }
    enemies
        .iter()
        .filter(|enemy| !group.target_unit_types().contains(&enemy.unit_type))
        .any(|enemy| {
            firing_types
                .iter()
                .any(|f| registry.can_not_be_targeted_by(&enemy.unit_type, f))
        })
}
