//! Round step sequencing.
//!
//! Every phase of a combat round is a [`BattleStep`] variant carrying only
//! the data it needs. Steps read a [`BattleState`] snapshot and return a
//! [`BattleDelta`]; the orchestrator applies each delta before running the
//! next step.

use serde::{Deserialize, Serialize};

use crate::battle::{BattleDelta, BattleState, Side};
use crate::data::BattleRules;
use crate::first_strike::{ClearFirstStrikeCasualties, FirstStrikeStep};
use crate::firing::aa::side_aa_firing_groups;
use crate::firing::bombard::{
    bombardment_applies, bombardment_firing_groups, bombardment_return_fire,
};
use crate::firing::general::{self, FireCategory};
use crate::firing::{resolve_fire, FireResolver, ReturnFire, NAVAL_BOMBARDMENT};
use crate::registry::UnitRegistry;
use crate::units::Unit;

/// Display name for general fire groups.
pub const GENERAL_FIRE: &str = "units";

/// Position of a step within a round. Steps run in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StepOrder {
    /// Attacker's anti-air fire.
    AaOffensive,
    /// Defender's anti-air fire.
    AaDefensive,
    /// Bombardment of an amphibious landing.
    NavalBombardment,
    /// Defender's sneak attack.
    FirstStrikeDefensive,
    /// Attacker's sneak attack.
    FirstStrikeOffensive,
    /// Removal of sneak attack casualties.
    ClearFirstStrikeCasualties,
    /// Attacker's regular fire.
    GeneralOffensive,
    /// Attacker's first-strike units when they fire with regular combat.
    FirstStrikeOffensiveRegular,
    /// Defender's regular fire.
    GeneralDefensive,
    /// Defender's first-strike units when they fire with regular combat.
    FirstStrikeDefensiveRegular,
}

/// One phase of a combat round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleStep {
    /// Anti-air fire by one side.
    AaFire(Side),
    /// Attacker's bombarding ships fire.
    NavalBombardment,
    /// First-strike units of one side fire.
    FirstStrikeFire(FirstStrikeStep),
    /// Sneak attack casualties leave the board.
    ClearFirstStrikeCasualties(ClearFirstStrikeCasualties),
    /// Regular fire by one side.
    GeneralFire(Side),
}

impl BattleStep {
    /// Scheduling token for this step.
    #[must_use]
    pub fn order(&self) -> StepOrder {
        match self {
            BattleStep::AaFire(Side::Offense) => StepOrder::AaOffensive,
            BattleStep::AaFire(Side::Defense) => StepOrder::AaDefensive,
            BattleStep::NavalBombardment => StepOrder::NavalBombardment,
            BattleStep::FirstStrikeFire(step) => step.order(),
            BattleStep::ClearFirstStrikeCasualties(_) => StepOrder::ClearFirstStrikeCasualties,
            BattleStep::GeneralFire(Side::Offense) => StepOrder::GeneralOffensive,
            BattleStep::GeneralFire(Side::Defense) => StepOrder::GeneralDefensive,
        }
    }

    /// Names shown in the round sequence.
    #[must_use]
    pub fn names(&self, state: &BattleState) -> Vec<String> {
        match self {
            BattleStep::AaFire(side) => vec![
                format!("{} anti air fire", state.player(*side)),
                format!("{} select anti air casualties", state.player(side.opposite())),
            ],
            BattleStep::NavalBombardment => vec![
                NAVAL_BOMBARDMENT.to_string(),
                format!("{} select bombardment casualties", state.defender()),
            ],
            BattleStep::FirstStrikeFire(step) => step.names(state),
            BattleStep::ClearFirstStrikeCasualties(step) => step.names(),
            BattleStep::GeneralFire(side) => vec![
                format!("{} fire", state.player(*side)),
                format!("{} select casualties", state.player(side.opposite())),
            ],
        }
    }

    /// Run the step against a snapshot.
    pub fn apply<R: FireResolver + ?Sized>(
        &self,
        state: &BattleState,
        registry: &UnitRegistry,
        rules: &BattleRules,
        resolver: &mut R,
    ) -> BattleDelta {
        match self {
            BattleStep::AaFire(side) => {
                let groups = side_aa_firing_groups(*side, state, registry);
                resolve_fire(*side, &groups, ReturnFire::None, state, registry, rules, resolver)
            }
            BattleStep::NavalBombardment => {
                let groups = bombardment_firing_groups(state, registry);
                let return_fire = bombardment_return_fire(rules);
                resolve_fire(Side::Offense, &groups, return_fire, state, registry, rules, resolver)
            }
            BattleStep::FirstStrikeFire(step) => step.fire(state, registry, rules, resolver),
            BattleStep::ClearFirstStrikeCasualties(step) => step.apply(state),
            BattleStep::GeneralFire(side) => {
                let groups = general::firing_groups(
                    *side,
                    FireCategory::Normal,
                    GENERAL_FIRE,
                    state,
                    registry,
                    rules,
                );
                resolve_fire(*side, &groups, ReturnFire::All, state, registry, rules, resolver)
            }
        }
    }
}

/// First-strike steps for the round, in run order.
///
/// Sides without first-strike units contribute nothing, and the clearing
/// step only appears when some side sneak attacks.
#[must_use]
pub fn first_strike_steps(
    state: &BattleState,
    registry: &UnitRegistry,
    rules: &BattleRules,
) -> Vec<BattleStep> {
    let offense = FirstStrikeStep::new(Side::Offense, state, registry, rules);
    let defense = FirstStrikeStep::new(Side::Defense, state, registry, rules);
    let clear = ClearFirstStrikeCasualties::from_steps(&offense, &defense, rules);

    let mut steps: Vec<BattleStep> = [offense, defense]
        .into_iter()
        .filter(FirstStrikeStep::is_applicable)
        .map(BattleStep::FirstStrikeFire)
        .collect();
    if clear.is_active() {
        steps.push(BattleStep::ClearFirstStrikeCasualties(clear));
    }
    steps.sort_by_key(BattleStep::order);
    steps
}

/// Every step of the round, in run order.
#[must_use]
pub fn round_steps(state: &BattleState, registry: &UnitRegistry, rules: &BattleRules) -> Vec<BattleStep> {
    let mut steps = Vec::new();
    for side in [Side::Offense, Side::Defense] {
        if !registry.aa_types_of(state.active_units(side)).is_empty() {
            steps.push(BattleStep::AaFire(side));
        }
    }
    if bombardment_applies(state) && !state.bombarding_units().is_empty() {
        steps.push(BattleStep::NavalBombardment);
    }
    steps.extend(first_strike_steps(state, registry, rules));
    steps.push(BattleStep::GeneralFire(Side::Offense));
    steps.push(BattleStep::GeneralFire(Side::Defense));
    steps.sort_by_key(BattleStep::order);
    steps
}

/// Run a list of steps in order, applying each delta before the next step.
///
/// Returns every unit that left the battle.
pub fn run_steps<R: FireResolver + ?Sized>(
    steps: &[BattleStep],
    state: &mut BattleState,
    registry: &UnitRegistry,
    rules: &BattleRules,
    resolver: &mut R,
) -> Vec<Unit> {
    let mut dead = Vec::new();
    for step in steps {
        let delta = step.apply(state, registry, rules, resolver);
        tracing::debug!(order = ?step.order(), empty = delta.is_empty(), "Ran battle step");
        dead.extend(state.apply(&delta));
    }
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{BattleSetup, BattleSite, BattleStatus};
    use crate::data::{AaData, UnitTypeData};
    use crate::first_strike::FirstStrikeDetermination;
    use crate::firing::{FireOutcome, FiringGroup};
    use crate::units::{PlayerId, UnitId, UnitTypeId};

    const ATTACKER: PlayerId = PlayerId::new(1);
    const DEFENDER: PlayerId = PlayerId::new(2);

    fn registry() -> UnitRegistry {
        let mut submarine = UnitTypeData::new("submarine");
        submarine.is_first_strike = true;
        let mut destroyer = UnitTypeData::new("destroyer");
        destroyer.is_destroyer = true;
        let mut battleship = UnitTypeData::new("battleship");
        battleship.can_bombard = true;
        let mut aa_gun = UnitTypeData::new("aa_gun");
        aa_gun.aa = Some(AaData {
            type_aa: "AA Gun".to_string(),
            targets: [UnitTypeId::from("fighter")].into_iter().collect(),
        });
        let mut fighter = UnitTypeData::new("fighter");
        fighter.is_air = true;
        UnitRegistry::from_data(vec![
            submarine,
            destroyer,
            battleship,
            aa_gun,
            fighter,
            UnitTypeData::new("cruiser"),
            UnitTypeData::new("infantry"),
        ])
        .unwrap()
    }

    fn units(owner: PlayerId, list: &[(UnitId, &str)]) -> Vec<Unit> {
        list.iter().map(|(id, t)| Unit::new(*id, *t, owner)).collect()
    }

    fn state(attacking: &[(UnitId, &str)], defending: &[(UnitId, &str)]) -> BattleState {
        let mut setup = BattleSetup::new(ATTACKER, DEFENDER);
        setup.site = BattleSite::sea("North Sea");
        setup.attacking_units = units(ATTACKER, attacking);
        setup.defending_units = units(DEFENDER, defending);
        BattleState::new(setup, &registry()).unwrap()
    }

    struct KillFirst;

    impl FireResolver for KillFirst {
        fn fire(&mut self, group: &FiringGroup, _state: &BattleState) -> FireOutcome {
            FireOutcome {
                hits: 1,
                killed: group.target_units().iter().take(1).map(|u| u.id).collect(),
            }
        }
    }

    #[test]
    fn test_step_order_is_total() {
        assert!(StepOrder::AaOffensive < StepOrder::AaDefensive);
        assert!(StepOrder::AaDefensive < StepOrder::NavalBombardment);
        assert!(StepOrder::NavalBombardment < StepOrder::FirstStrikeDefensive);
        assert!(StepOrder::FirstStrikeDefensive < StepOrder::FirstStrikeOffensive);
        assert!(StepOrder::FirstStrikeOffensive < StepOrder::ClearFirstStrikeCasualties);
        assert!(StepOrder::ClearFirstStrikeCasualties < StepOrder::GeneralOffensive);
        assert!(StepOrder::GeneralOffensive < StepOrder::FirstStrikeOffensiveRegular);
        assert!(StepOrder::FirstStrikeOffensiveRegular < StepOrder::GeneralDefensive);
        assert!(StepOrder::GeneralDefensive < StepOrder::FirstStrikeDefensiveRegular);
    }

    #[test]
    fn test_no_first_strike_steps_without_first_strike_units() {
        let state = state(&[(1, "cruiser")], &[(10, "cruiser")]);
        assert!(first_strike_steps(&state, &registry(), &BattleRules::default()).is_empty());
    }

    #[test]
    fn test_sneak_attack_adds_clearing_step() {
        let state = state(&[(1, "submarine")], &[(10, "cruiser")]);
        let steps = first_strike_steps(&state, &registry(), &BattleRules::default());
        let orders: Vec<StepOrder> = steps.iter().map(BattleStep::order).collect();

        assert_eq!(
            orders,
            vec![StepOrder::FirstStrikeOffensive, StepOrder::ClearFirstStrikeCasualties]
        );
    }

    #[test]
    fn test_regular_first_strike_has_no_clearing_step() {
        let state = state(&[(1, "submarine")], &[(10, "destroyer")]);
        let steps = first_strike_steps(&state, &registry(), &BattleRules::default());

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].order(), StepOrder::FirstStrikeOffensiveRegular);
    }

    #[test]
    fn test_round_steps_sorted() {
        let state = state(&[(1, "submarine"), (2, "fighter")], &[(10, "cruiser"), (11, "aa_gun")]);
        let steps = round_steps(&state, &registry(), &BattleRules::default());
        let orders: Vec<StepOrder> = steps.iter().map(BattleStep::order).collect();

        assert_eq!(
            orders,
            vec![
                StepOrder::AaDefensive,
                StepOrder::FirstStrikeOffensive,
                StepOrder::ClearFirstStrikeCasualties,
                StepOrder::GeneralOffensive,
                StepOrder::GeneralDefensive,
            ]
        );
    }

    #[test]
    fn test_bombardment_step_on_landing() {
        let mut setup = BattleSetup::new(ATTACKER, DEFENDER);
        setup.site = BattleSite::land("Beach");
        setup.status = BattleStatus {
            is_amphibious: true,
            ..BattleStatus::default()
        };
        setup.attacking_units = units(ATTACKER, &[(1, "infantry")]);
        setup.bombarding_units = units(ATTACKER, &[(2, "battleship")]);
        setup.defending_units = units(DEFENDER, &[(10, "infantry")]);
        let state = BattleState::new(setup, &registry()).unwrap();

        let steps = round_steps(&state, &registry(), &BattleRules::default());
        assert_eq!(steps[0], BattleStep::NavalBombardment);
        assert_eq!(
            steps[0].names(&state),
            vec![
                NAVAL_BOMBARDMENT.to_string(),
                "player 2 select bombardment casualties".to_string()
            ]
        );
    }

    #[test]
    fn test_sneak_attack_victims_never_fire_back() {
        let mut state = state(&[(1, "submarine")], &[(10, "cruiser")]);
        let rules = BattleRules::default();
        let steps = round_steps(&state, &registry(), &rules);
        let dead = run_steps(&steps, &mut state, &registry(), &rules, &mut KillFirst);

        let dead_ids: Vec<UnitId> = dead.iter().map(|u| u.id).collect();
        assert_eq!(dead_ids, vec![10]);
        assert_eq!(state.active_units(Side::Offense).len(), 1);
        assert!(state.active_units(Side::Defense).is_empty());
    }

    #[test]
    fn test_regular_round_casualties_still_fire() {
        let mut state = state(&[(1, "cruiser")], &[(10, "cruiser")]);
        let rules = BattleRules::default();
        let steps = round_steps(&state, &registry(), &rules);
        let dead = run_steps(&steps, &mut state, &registry(), &rules, &mut KillFirst);

        assert!(dead.is_empty());
        assert_eq!(state.waiting_to_die(Side::Defense).len(), 1);
        assert_eq!(state.waiting_to_die(Side::Offense).len(), 1);
    }

    #[test]
    fn test_restored_step_keeps_its_order() {
        let step = BattleStep::FirstStrikeFire(FirstStrikeStep::restore(Side::Defense, ReturnFire::None));
        assert_eq!(step.order(), StepOrder::FirstStrikeDefensive);
        match step {
            BattleStep::FirstStrikeFire(inner) => {
                assert_eq!(inner.determination(), FirstStrikeDetermination::FirstStrike);
            }
            _ => panic!("expected first strike step"),
        }
    }
}
