//! Anti-air firing groups.
//!
//! Every AA category present among the firing units gets its own pass.
//! Groups come out AA category first, then in partitioner order within the
//! category. The category name doubles as display name and group tag.

use std::collections::BTreeSet;

use crate::battle::{BattleState, Side};
use crate::firing::FiringGroup;
use crate::registry::UnitRegistry;
use crate::units::{PlayerId, Unit, UnitTypeId};

/// Build AA firing groups.
///
/// `hit_player` owns the units being shot at. Airborne units are only
/// valid targets for a defending AA unit, and only for the types the
/// player's airborne rules list for that category.
#[must_use]
pub fn aa_firing_groups(
    firing_units: &[Unit],
    aa_types: &[String],
    hit_player: PlayerId,
    attackable_units: &[Unit],
    defending: bool,
    registry: &UnitRegistry,
) -> Vec<FiringGroup> {
    let mut groups = Vec::new();
    for type_aa in aa_types {
        let aa_units: Vec<Unit> = firing_units
            .iter()
            .filter(|u| registry.of(u).is_some_and(|t| t.is_aa_of_type(type_aa)))
            .cloned()
            .collect();
        if aa_units.is_empty() {
            continue;
        }

        let airborne_types = if defending {
            registry.airborne_targeted_by_aa(hit_player, type_aa)
        } else {
            BTreeSet::new()
        };
        let targets_for = |bucket: &[Unit]| {
            let target_types: BTreeSet<UnitTypeId> = bucket
                .iter()
                .flat_map(|u| registry.targets_aa(&u.unit_type, type_aa))
                .collect();
            attackable_units
                .iter()
                .filter(|u| {
                    target_types.contains(&u.unit_type)
                        || (u.airborne && airborne_types.contains(&u.unit_type))
                })
                .cloned()
                .collect()
        };

        groups.extend(FiringGroup::group_by_suicide_on_hit(
            type_aa,
            type_aa,
            &aa_units,
            targets_for,
            registry,
        ));
    }
    groups
}

/// AA firing groups for `side` against the opposing side's active units.
#[must_use]
pub fn side_aa_firing_groups(
    side: Side,
    state: &BattleState,
    registry: &UnitRegistry,
) -> Vec<FiringGroup> {
    let firing = state.active_units(side);
    let aa_types = registry.aa_types_of(firing);
    if aa_types.is_empty() {
        return Vec::new();
    }
    let groups = aa_firing_groups(
        firing,
        &aa_types,
        state.player(side.opposite()),
        state.active_units(side.opposite()),
        side.is_defense(),
        registry,
    );
    tracing::trace!(side = ?side, aa_types = aa_types.len(), groups = groups.len(), "Built AA firing groups");
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BattleSetup;
    use crate::data::{AaData, UnitTypeData};

    const ATTACKER: PlayerId = PlayerId::new(1);
    const DEFENDER: PlayerId = PlayerId::new(2);

    fn aa(type_aa: &str, targets: &[&str]) -> Option<AaData> {
        Some(AaData {
            type_aa: type_aa.to_string(),
            targets: targets.iter().map(|t| UnitTypeId::from(*t)).collect(),
        })
    }

    fn registry() -> UnitRegistry {
        let mut gun = UnitTypeData::new("aa_gun");
        gun.aa = aa("AA Gun", &["fighter", "bomber"]);
        let mut radar = UnitTypeData::new("radar_gun");
        radar.aa = aa("Radar", &["bomber"]);
        let mut flak = UnitTypeData::new("flak");
        flak.aa = aa("AA Gun", &["fighter"]);
        flak.is_suicide_on_hit = true;
        let mut fighter = UnitTypeData::new("fighter");
        fighter.is_air = true;
        let mut bomber = UnitTypeData::new("bomber");
        bomber.is_air = true;
        let mut registry = UnitRegistry::from_data(vec![
            gun,
            radar,
            flak,
            fighter,
            bomber,
            UnitTypeData::new("infantry"),
            UnitTypeData::new("paratrooper"),
        ])
        .unwrap();
        registry.set_airborne_targeted_by_aa(
            ATTACKER,
            "AA Gun",
            [UnitTypeId::from("paratrooper")].into_iter().collect(),
        );
        registry
    }

    fn attackers() -> Vec<Unit> {
        vec![
            Unit::new(1, "fighter", ATTACKER),
            Unit::new(2, "bomber", ATTACKER),
            Unit::new(3, "infantry", ATTACKER),
            Unit::new(4, "paratrooper", ATTACKER).airborne(),
        ]
    }

    fn ids(units: &[Unit]) -> Vec<u64> {
        units.iter().map(|u| u.id).collect()
    }

    #[test]
    fn test_groups_per_aa_type_in_given_order() {
        let defenders = vec![Unit::new(10, "aa_gun", DEFENDER), Unit::new(11, "radar_gun", DEFENDER)];
        let aa_types = vec!["Radar".to_string(), "AA Gun".to_string()];
        let groups = aa_firing_groups(&defenders, &aa_types, ATTACKER, &attackers(), true, &registry());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_name(), "Radar");
        assert_eq!(ids(groups[0].target_units()), vec![2]);
        assert_eq!(groups[1].group_name(), "AA Gun");
        assert_eq!(groups[1].display_name(), "AA Gun");
        assert_eq!(ids(groups[1].target_units()), vec![1, 2, 4]);
    }

    #[test]
    fn test_airborne_targets_only_when_defending() {
        let firing = vec![Unit::new(10, "aa_gun", DEFENDER)];
        let aa_types = vec!["AA Gun".to_string()];
        let groups = aa_firing_groups(&firing, &aa_types, ATTACKER, &attackers(), false, &registry());

        assert_eq!(groups.len(), 1);
        assert_eq!(ids(groups[0].target_units()), vec![1, 2]);
    }

    #[test]
    fn test_aa_type_without_units_contributes_nothing() {
        let firing = vec![Unit::new(10, "aa_gun", DEFENDER)];
        let aa_types = vec!["Radar".to_string()];
        let groups = aa_firing_groups(&firing, &aa_types, ATTACKER, &attackers(), true, &registry());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_aa_type_without_targets_contributes_nothing() {
        let firing = vec![Unit::new(10, "radar_gun", DEFENDER)];
        let aa_types = vec!["Radar".to_string()];
        let targets = vec![Unit::new(1, "fighter", ATTACKER)];
        let groups = aa_firing_groups(&firing, &aa_types, ATTACKER, &targets, true, &registry());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_suicide_aa_split_within_type() {
        let firing = vec![Unit::new(10, "aa_gun", DEFENDER), Unit::new(11, "flak", DEFENDER)];
        let aa_types = vec!["AA Gun".to_string()];
        let groups = aa_firing_groups(&firing, &aa_types, ATTACKER, &attackers(), false, &registry());

        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_suicide_on_hit());
        assert_eq!(ids(groups[0].firing_units()), vec![11]);
        assert_eq!(ids(groups[0].target_units()), vec![1]);
        assert!(!groups[1].is_suicide_on_hit());
        assert_eq!(ids(groups[1].target_units()), vec![1, 2]);
    }

    #[test]
    fn test_side_helper_uses_opposing_units() {
        let mut setup = BattleSetup::new(ATTACKER, DEFENDER);
        setup.attacking_units = attackers();
        setup.defending_units = vec![Unit::new(10, "aa_gun", DEFENDER)];
        let state = BattleState::new(setup, &registry()).unwrap();

        let groups = side_aa_firing_groups(Side::Defense, &state, &registry());
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(groups[0].target_units()), vec![1, 2, 4]);
        assert!(side_aa_firing_groups(Side::Offense, &state, &registry()).is_empty());
    }
}
