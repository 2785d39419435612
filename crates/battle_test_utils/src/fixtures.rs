//! Test fixtures and helpers.
//!
//! A small naval/land unit roster, battle builders and scripted fire
//! resolvers for consistent testing.

use battle_core::battle::{BattleSetup, BattleSite, BattleState, BattleStatus};
use battle_core::firing::{FireOutcome, FireResolver, FiringGroup};
use battle_core::registry::UnitRegistry;
use battle_core::units::{PlayerId, Unit, UnitId};

/// Attacking player in fixtures.
pub const ATTACKER: PlayerId = PlayerId::new(1);

/// Defending player in fixtures.
pub const DEFENDER: PlayerId = PlayerId::new(2);

/// Ally of the attacker, for allied-air tests.
pub const ATTACKER_ALLY: PlayerId = PlayerId::new(3);

/// Fixture roster as loaded from a data file.
pub const FIXTURE_UNITS_RON: &str = r#"[
    (id: UnitTypeId("infantry")),
    (id: UnitTypeId("tank")),
    (id: UnitTypeId("fighter"), is_air: true),
    (id: UnitTypeId("bomber"), is_air: true),
    (
        id: UnitTypeId("submarine"),
        is_first_strike: true,
        can_not_target: [UnitTypeId("fighter"), UnitTypeId("bomber"), UnitTypeId("kamikaze")],
        can_not_be_targeted_by: [UnitTypeId("fighter"), UnitTypeId("bomber"), UnitTypeId("kamikaze")],
    ),
    (id: UnitTypeId("destroyer"), is_destroyer: true),
    (id: UnitTypeId("cruiser"), can_bombard: true),
    (id: UnitTypeId("battleship"), can_bombard: true, hit_points: 2),
    (id: UnitTypeId("kamikaze"), is_air: true, is_suicide_on_hit: true),
    (id: UnitTypeId("torpedo_boat"), is_suicide_on_hit: true),
    (id: UnitTypeId("sea_mine"), is_first_strike: true, is_suicide_on_defense: true),
    (
        id: UnitTypeId("aa_gun"),
        aa: Some((
            type_aa: "AA Gun",
            targets: [UnitTypeId("fighter"), UnitTypeId("bomber"), UnitTypeId("kamikaze")],
        )),
    ),
    (id: UnitTypeId("factory"), is_infrastructure: true),
]"#;

/// Every type in the fixture roster.
pub const FIXTURE_TYPES: &[&str] = &[
    "infantry",
    "tank",
    "fighter",
    "bomber",
    "submarine",
    "destroyer",
    "cruiser",
    "battleship",
    "kamikaze",
    "torpedo_boat",
    "sea_mine",
    "aa_gun",
    "factory",
];

/// Sea-going types used by [`naval_battle`].
pub const NAVAL_TYPES: &[&str] = &[
    "submarine",
    "destroyer",
    "cruiser",
    "battleship",
    "fighter",
    "kamikaze",
    "torpedo_boat",
];

/// Load the fixture roster.
///
/// # Panics
///
/// Panics if [`FIXTURE_UNITS_RON`] fails to parse.
#[must_use]
pub fn fixture_registry() -> UnitRegistry {
    UnitRegistry::from_ron("fixture_units.ron", FIXTURE_UNITS_RON).expect("fixture roster parses")
}

/// Units of the given types with consecutive ids starting at `first_id`.
#[must_use]
pub fn units(owner: PlayerId, first_id: UnitId, types: &[&str]) -> Vec<Unit> {
    types
        .iter()
        .zip(first_id..)
        .map(|(unit_type, id)| Unit::new(id, *unit_type, owner))
        .collect()
}

/// Builder for battle states with automatic unit ids.
#[derive(Debug, Clone)]
pub struct BattleBuilder {
    setup: BattleSetup,
    next_id: UnitId,
}

impl Default for BattleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleBuilder {
    /// First-round sea battle between [`ATTACKER`] and [`DEFENDER`].
    #[must_use]
    pub fn new() -> Self {
        let mut setup = BattleSetup::new(ATTACKER, DEFENDER);
        setup.site = BattleSite::sea("Sea Zone 1");
        Self { setup, next_id: 1 }
    }

    /// Fight on land instead.
    #[must_use]
    pub fn on_land(mut self, name: &str) -> Self {
        self.setup.site = BattleSite::land(name);
        self
    }

    /// Replace the round bookkeeping.
    #[must_use]
    pub fn with_status(mut self, status: BattleStatus) -> Self {
        self.setup.status = status;
        self
    }

    /// Mark the battle as an amphibious assault.
    #[must_use]
    pub fn amphibious(mut self) -> Self {
        self.setup.status.is_amphibious = true;
        self
    }

    /// Add attacking units.
    #[must_use]
    pub fn attacking(mut self, types: &[&str]) -> Self {
        let new = self.take_units(ATTACKER, types);
        self.setup.attacking_units.extend(new);
        self
    }

    /// Add attacking units owned by an ally.
    #[must_use]
    pub fn allied_attacking(mut self, types: &[&str]) -> Self {
        let new = self.take_units(ATTACKER_ALLY, types);
        self.setup.attacking_units.extend(new);
        self
    }

    /// Add defending units.
    #[must_use]
    pub fn defending(mut self, types: &[&str]) -> Self {
        let new = self.take_units(DEFENDER, types);
        self.setup.defending_units.extend(new);
        self
    }

    /// Add attacking casualties that have not been removed yet.
    #[must_use]
    pub fn attacking_waiting(mut self, types: &[&str]) -> Self {
        let new = self.take_units(ATTACKER, types);
        self.setup.attacking_waiting_to_die.extend(new);
        self
    }

    /// Add defending casualties that have not been removed yet.
    #[must_use]
    pub fn defending_waiting(mut self, types: &[&str]) -> Self {
        let new = self.take_units(DEFENDER, types);
        self.setup.defending_waiting_to_die.extend(new);
        self
    }

    /// Add attacking ships bombarding from an adjacent sea zone.
    #[must_use]
    pub fn bombarding(mut self, types: &[&str]) -> Self {
        let new = self.take_units(ATTACKER, types);
        self.setup.bombarding_units.extend(new);
        self
    }

    /// The setup built so far.
    #[must_use]
    pub fn setup(&self) -> &BattleSetup {
        &self.setup
    }

    /// Build the state.
    ///
    /// # Panics
    ///
    /// Panics if the setup is invalid for `registry`.
    #[must_use]
    pub fn build(self, registry: &UnitRegistry) -> BattleState {
        BattleState::new(self.setup, registry).expect("fixture battle is valid")
    }

    fn take_units(&mut self, owner: PlayerId, types: &[&str]) -> Vec<Unit> {
        let new = units(owner, self.next_id, types);
        self.next_id += types.len() as UnitId;
        new
    }
}

/// Sea battle with `attackers` and `defenders` units cycling through
/// [`NAVAL_TYPES`].
#[must_use]
pub fn naval_battle(registry: &UnitRegistry, attackers: usize, defenders: usize) -> BattleState {
    let attacking: Vec<&str> = NAVAL_TYPES.iter().copied().cycle().take(attackers).collect();
    let defending: Vec<&str> = NAVAL_TYPES.iter().copied().cycle().skip(3).take(defenders).collect();
    BattleBuilder::new()
        .attacking(&attacking)
        .defending(&defending)
        .build(registry)
}

/// Every shot hits; all targets die.
#[derive(Debug, Clone, Copy, Default)]
pub struct KillAll;

impl FireResolver for KillAll {
    fn fire(&mut self, group: &FiringGroup, _state: &BattleState) -> FireOutcome {
        FireOutcome {
            hits: group.target_units().len() as u32,
            killed: group.target_units().iter().map(|u| u.id).collect(),
        }
    }
}

/// One hit per firing unit, casualties taken in target order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneHitPerUnit;

impl FireResolver for OneHitPerUnit {
    fn fire(&mut self, group: &FiringGroup, _state: &BattleState) -> FireOutcome {
        let hits = group.firing_units().len().min(group.target_units().len());
        FireOutcome {
            hits: hits as u32,
            killed: group.target_units().iter().take(hits).map(|u| u.id).collect(),
        }
    }
}

/// Every shot misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissAll;

impl FireResolver for MissAll {
    fn fire(&mut self, _group: &FiringGroup, _state: &BattleState) -> FireOutcome {
        FireOutcome::default()
    }
}

/// Wraps a resolver and records every group it is asked to fire.
#[derive(Debug, Clone, Default)]
pub struct RecordingResolver<R> {
    inner: R,
    /// Groups fired so far, in order.
    pub groups: Vec<FiringGroup>,
}

impl<R: FireResolver> RecordingResolver<R> {
    /// Record around `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            groups: Vec::new(),
        }
    }

    /// Display names of the recorded groups.
    #[must_use]
    pub fn display_names(&self) -> Vec<&str> {
        self.groups.iter().map(FiringGroup::display_name).collect()
    }
}

impl<R: FireResolver> FireResolver for RecordingResolver<R> {
    fn fire(&mut self, group: &FiringGroup, state: &BattleState) -> FireOutcome {
        self.groups.push(group.clone());
        self.inner.fire(group, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_registry_loads_all_types() {
        let registry = fixture_registry();
        assert_eq!(registry.len(), FIXTURE_TYPES.len());
        for unit_type in FIXTURE_TYPES {
            assert!(registry.get(&(*unit_type).into()).is_some(), "missing {unit_type}");
        }
    }

    #[test]
    fn test_builder_assigns_unique_ids() {
        let registry = fixture_registry();
        let state = BattleBuilder::new()
            .attacking(&["submarine", "destroyer"])
            .defending(&["cruiser"])
            .defending_waiting(&["cruiser"])
            .build(&registry);

        let mut ids: Vec<UnitId> = state
            .active_units(battle_core::battle::Side::Offense)
            .iter()
            .chain(state.active_units(battle_core::battle::Side::Defense))
            .chain(state.waiting_to_die(battle_core::battle::Side::Defense))
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_naval_battle_sizes() {
        let registry = fixture_registry();
        let state = naval_battle(&registry, 9, 4);
        assert_eq!(state.active_units(battle_core::battle::Side::Offense).len(), 9);
        assert_eq!(state.active_units(battle_core::battle::Side::Defense).len(), 4);
    }
}
