//! Determinism testing utilities.
//!
//! Battle steps feed save-game replay: the same battle, rules and resolver
//! must always yield the same groups, casualties and step order.
//!
//! Sources of non-determinism to guard against:
//!
//! - **HashMap iteration order**: target sets are `BTreeSet`s and firing
//!   types keep first-seen order, so nothing depends on hashing.
//! - **Unstable sorts**: target groups and steps use stable sorts.
//! - **Randomness**: dice come from the caller's resolver only.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use battle_core::battle::{BattleState, Side};
use battle_core::data::BattleRules;
use battle_core::firing::FireResolver;
use battle_core::registry::UnitRegistry;
use battle_core::steps::{round_steps, run_steps};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Fingerprints from each run.
    pub hashes: Vec<u64>,
    /// Number of rounds fought per run.
    pub rounds: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic resolution).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different fingerprints.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle resolution is non-deterministic!\n\
                 Runs: {}\n\
                 Rounds: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.rounds,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Fingerprint of a battle: every unit id and type per list, in list order.
#[must_use]
pub fn state_fingerprint(state: &BattleState) -> u64 {
    let mut hasher = DefaultHasher::new();
    for side in [Side::Offense, Side::Defense] {
        for list in [state.active_units(side), state.waiting_to_die(side)] {
            list.len().hash(&mut hasher);
            for unit in list {
                unit.id.hash(&mut hasher);
                unit.unit_type.hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

/// Fight `rounds` rounds of the same battle `runs` times and compare the
/// final fingerprints.
///
/// Each run gets a fresh state from `setup` and a fresh resolver from
/// `resolver`. Steps are rebuilt every round from the current state and
/// casualties are removed at the end of each round.
pub fn verify_battle_determinism<Setup, MakeResolver, R>(
    runs: usize,
    rounds: u32,
    registry: &UnitRegistry,
    rules: &BattleRules,
    setup: Setup,
    resolver: MakeResolver,
) -> DeterminismResult
where
    Setup: Fn() -> BattleState,
    MakeResolver: Fn() -> R,
    R: FireResolver,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        let mut resolver = resolver();

        for _ in 0..rounds {
            if state.status().is_over {
                break;
            }
            let steps = round_steps(&state, registry, rules);
            run_steps(&steps, &mut state, registry, rules, &mut resolver);
            state.end_round();
        }

        hashes.push(state_fingerprint(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(runs, rounds, "Battle runs diverged");
    }

    DeterminismResult {
        is_deterministic,
        hashes,
        rounds,
    }
}

/// Proptest strategies for combat inputs.
///
/// These strategies generate random but reproducible unit lists and rule
/// sets drawn from the fixture roster.
pub mod strategies {
    use battle_core::data::BattleRules;
    use battle_core::units::{PlayerId, Unit, UnitId};
    use proptest::prelude::*;

    use crate::fixtures::FIXTURE_TYPES;

    /// Pick a fixture unit type.
    pub fn arb_unit_type() -> impl Strategy<Value = &'static str> {
        prop::sample::select(FIXTURE_TYPES)
    }

    /// Up to `max` units for `owner` with ids counting up from `first_id`.
    pub fn arb_units(owner: PlayerId, first_id: UnitId, max: usize) -> impl Strategy<Value = Vec<Unit>> {
        prop::collection::vec((arb_unit_type(), 0u32..7, 1u32..3), 0..max).prop_map(move |specs| {
            specs
                .into_iter()
                .zip(first_id..)
                .map(|((unit_type, power, rolls), id)| {
                    Unit::new(id, unit_type, owner).with_power(power, rolls)
                })
                .collect()
        })
    }

    /// Any combination of the boolean ruleset flags, default dice and
    /// exponent.
    pub fn arb_rules() -> impl Strategy<Value = BattleRules> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(alternate, defending_sneak, suicide_do_not_fire, allied_air, bombard_return)| {
                BattleRules {
                    alternate_combat_sequence: alternate,
                    defending_sneak_attack: defending_sneak,
                    defending_suicide_and_munition_units_do_not_fire: suicide_do_not_fire,
                    allied_air_independent: allied_air,
                    naval_bombard_casualties_return_fire: bombard_return,
                    ..BattleRules::default()
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{fixture_registry, naval_battle, OneHitPerUnit};

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1u64, "submarine")), compute_hash(&(1u64, "submarine")));
    }

    #[test]
    fn test_fingerprint_tracks_unit_lists() {
        let registry = fixture_registry();
        let a = naval_battle(&registry, 5, 5);
        let b = naval_battle(&registry, 5, 4);
        assert_eq!(state_fingerprint(&a), state_fingerprint(&a.clone()));
        assert_ne!(state_fingerprint(&a), state_fingerprint(&b));
    }

    #[test]
    fn test_naval_battle_is_deterministic() {
        let registry = fixture_registry();
        let rules = BattleRules::default();
        let result = verify_battle_determinism(
            4,
            3,
            &registry,
            &rules,
            || naval_battle(&registry, 12, 9),
            || OneHitPerUnit,
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }
}
