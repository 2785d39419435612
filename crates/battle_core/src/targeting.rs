//! Target group resolution.
//!
//! Firing unit types that can hit exactly the same set of enemy types
//! share a [`TargetGroup`]. A destroyer on the firing side cancels the
//! enemy's `can_not_be_targeted_by` immunities.
//!
//! Groups come out sorted by how many enemy types they can hit, fewest
//! first. The sort is stable so ties keep first-encountered order; replay
//! depends on this ordering.

use std::collections::BTreeSet;

use crate::registry::UnitRegistry;
use crate::units::{distinct_types, Unit, UnitTypeId};

/// Firing unit types sharing one valid-target set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    firing_unit_types: Vec<UnitTypeId>,
    target_unit_types: BTreeSet<UnitTypeId>,
}

impl TargetGroup {
    /// Partition `units` by the enemy types each can hit.
    ///
    /// Types with no valid target are left out. Empty inputs give an
    /// empty list.
    #[must_use]
    pub fn new_target_groups(
        units: &[Unit],
        enemy_units: &[Unit],
        registry: &UnitRegistry,
    ) -> Vec<TargetGroup> {
        let destroyer_present = units.iter().any(|u| registry.is_destroyer(&u.unit_type));
        let enemy_types: BTreeSet<UnitTypeId> = distinct_types(enemy_units).into_iter().collect();

        let mut groups: Vec<TargetGroup> = Vec::new();
        for unit_type in distinct_types(units) {
            let targets: BTreeSet<UnitTypeId> = enemy_types
                .iter()
                .filter(|target| !registry.can_not_target(&unit_type, target))
                .filter(|target| {
                    destroyer_present || !registry.can_not_be_targeted_by(target, &unit_type)
                })
                .cloned()
                .collect();
            if targets.is_empty() {
                continue;
            }

            match groups.iter_mut().find(|g| g.target_unit_types == targets) {
                Some(group) => group.firing_unit_types.push(unit_type),
                None => groups.push(TargetGroup {
                    firing_unit_types: vec![unit_type],
                    target_unit_types: targets,
                }),
            }
        }

        groups.sort_by_key(|g| g.target_unit_types.len());
        tracing::trace!(groups = groups.len(), destroyer_present, "Resolved target groups");
        groups
    }

    /// Firing types in this group, first-encountered order.
    #[must_use]
    pub fn firing_unit_types(&self) -> &[UnitTypeId] {
        &self.firing_unit_types
    }

    /// Enemy types this group may hit.
    #[must_use]
    pub fn target_unit_types(&self) -> &BTreeSet<UnitTypeId> {
        &self.target_unit_types
    }

    /// Units of `units` belonging to this group, in input order.
    #[must_use]
    pub fn firing_units(&self, units: &[Unit]) -> Vec<Unit> {
        units
            .iter()
            .filter(|u| self.firing_unit_types.contains(&u.unit_type))
            .cloned()
            .collect()
    }

    /// Units of `enemy_units` this group may hit, in input order.
    #[must_use]
    pub fn target_units(&self, enemy_units: &[Unit]) -> Vec<Unit> {
        enemy_units
            .iter()
            .filter(|u| self.target_unit_types.contains(&u.unit_type))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitTypeData;
    use crate::units::PlayerId;

    const ATTACKER: PlayerId = PlayerId(1);
    const DEFENDER: PlayerId = PlayerId(2);

    fn registry() -> UnitRegistry {
        let mut sub = UnitTypeData::new("submarine");
        sub.is_first_strike = true;
        sub.can_not_target.insert(UnitTypeId::from("fighter"));
        sub.can_not_be_targeted_by.insert(UnitTypeId::from("fighter"));
        let mut fighter = UnitTypeData::new("fighter");
        fighter.is_air = true;
        let mut destroyer = UnitTypeData::new("destroyer");
        destroyer.is_destroyer = true;
        UnitRegistry::from_data(vec![
            sub,
            fighter,
            destroyer,
            UnitTypeData::new("cruiser"),
            UnitTypeData::new("battleship"),
        ])
        .unwrap()
    }

    fn attackers(types: &[&str]) -> Vec<Unit> {
        types
            .iter()
            .zip(1..)
            .map(|(t, id)| Unit::new(id, *t, ATTACKER))
            .collect()
    }

    fn defenders(types: &[&str]) -> Vec<Unit> {
        types
            .iter()
            .zip(100..)
            .map(|(t, id)| Unit::new(id, *t, DEFENDER))
            .collect()
    }

    #[test]
    fn test_empty_inputs_give_no_groups() {
        let registry = registry();
        let enemies = defenders(&["cruiser"]);
        assert!(TargetGroup::new_target_groups(&[], &enemies, &registry).is_empty());
        let firing = attackers(&["cruiser"]);
        assert!(TargetGroup::new_target_groups(&firing, &[], &registry).is_empty());
    }

    #[test]
    fn test_identical_targets_merge() {
        let groups = TargetGroup::new_target_groups(
            &attackers(&["cruiser", "battleship", "cruiser"]),
            &defenders(&["cruiser"]),
            &registry(),
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].firing_unit_types(),
            &[UnitTypeId::from("cruiser"), UnitTypeId::from("battleship")]
        );
    }

    #[test]
    fn test_air_cannot_hit_sub_without_destroyer() {
        let groups = TargetGroup::new_target_groups(
            &attackers(&["fighter", "cruiser"]),
            &defenders(&["submarine", "cruiser"]),
            &registry(),
        );

        assert_eq!(groups.len(), 2);
        // Most restricted group first.
        assert_eq!(groups[0].firing_unit_types(), &[UnitTypeId::from("fighter")]);
        assert_eq!(
            groups[0].target_unit_types(),
            &BTreeSet::from([UnitTypeId::from("cruiser")])
        );
        assert_eq!(groups[1].target_unit_types().len(), 2);
    }

    #[test]
    fn test_destroyer_cancels_immunity() {
        let groups = TargetGroup::new_target_groups(
            &attackers(&["fighter", "destroyer"]),
            &defenders(&["submarine", "cruiser"]),
            &registry(),
        );

        assert_eq!(groups.len(), 1);
        assert!(groups[0]
            .target_unit_types()
            .contains(&UnitTypeId::from("submarine")));
        assert_eq!(groups[0].firing_unit_types().len(), 2);
    }

    #[test]
    fn test_can_not_target_is_not_cancelled_by_destroyer() {
        let groups = TargetGroup::new_target_groups(
            &attackers(&["submarine", "destroyer"]),
            &defenders(&["fighter"]),
            &registry(),
        );

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].firing_unit_types(), &[UnitTypeId::from("destroyer")]);
    }

    #[test]
    fn test_type_with_no_targets_is_omitted() {
        let groups = TargetGroup::new_target_groups(
            &attackers(&["submarine"]),
            &defenders(&["fighter"]),
            &registry(),
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn test_firing_and_target_units_filter_in_order() {
        let firing = attackers(&["fighter", "cruiser", "fighter"]);
        let enemies = defenders(&["submarine", "cruiser"]);
        let groups = TargetGroup::new_target_groups(&firing, &enemies, &registry());

        let air = &groups[0];
        let ids: Vec<u64> = air.firing_units(&firing).iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3]);
        let targets: Vec<u64> = air.target_units(&enemies).iter().map(|u| u.id).collect();
        assert_eq!(targets, vec![101]);
    }
}
