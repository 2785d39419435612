//! Battle state owned by the orchestrator for one contested location.
//!
//! Phases never mutate [`BattleState`] directly. They read a snapshot and
//! return a [`BattleDelta`]; the orchestrator applies it with
//! [`BattleState::apply`]. This keeps every phase testable with plain
//! input/output assertions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};
use crate::registry::UnitRegistry;
use crate::units::{PlayerId, Unit, UnitId};

/// One of the two sides in a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The attacking side.
    Offense,
    /// The defending side.
    Defense,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Offense => Side::Defense,
            Side::Defense => Side::Offense,
        }
    }

    /// Whether this is the defending side.
    #[must_use]
    pub const fn is_defense(self) -> bool {
        matches!(self, Side::Defense)
    }
}

/// Which of a side's units to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFilter {
    /// Units still actively fighting.
    Active,
    /// Units marked as casualties but not yet removed.
    Casualty,
    /// Both of the above.
    ActiveOrCasualty,
}

/// Where the battle takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSite {
    /// Territory name.
    pub name: String,
    /// Sea zone rather than land.
    pub is_water: bool,
}

impl BattleSite {
    /// A land territory.
    #[must_use]
    pub fn land(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_water: false,
        }
    }

    /// A sea zone.
    #[must_use]
    pub fn sea(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_water: true,
        }
    }
}

/// Round bookkeeping for a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStatus {
    /// Current round, starting at 1.
    pub round: u32,
    /// Round limit; 0 means unlimited.
    pub max_rounds: u32,
    /// The attacker landed from the sea this turn.
    pub is_amphibious: bool,
    /// Strategic bombing raid rather than a regular battle.
    pub is_bombing_run: bool,
    /// Battle has ended.
    pub is_over: bool,
}

impl BattleStatus {
    /// Status for the given round with no special conditions.
    #[must_use]
    pub const fn new(round: u32, max_rounds: u32) -> Self {
        Self {
            round,
            max_rounds,
            is_amphibious: false,
            is_bombing_run: false,
            is_over: false,
        }
    }

    /// Whether this is the opening round.
    #[must_use]
    pub const fn is_first_round(&self) -> bool {
        self.round <= 1
    }

    /// Whether no further round will be fought after this one.
    #[must_use]
    pub const fn is_last_round(&self) -> bool {
        self.max_rounds > 0 && self.round >= self.max_rounds
    }
}

impl Default for BattleStatus {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

/// Everything needed to construct a [`BattleState`].
#[derive(Debug, Clone)]
pub struct BattleSetup {
    /// Attacking player.
    pub attacker: PlayerId,
    /// Defending player.
    pub defender: PlayerId,
    /// Battle location.
    pub site: BattleSite,
    /// Round bookkeeping.
    pub status: BattleStatus,
    /// Attacking units still fighting.
    pub attacking_units: Vec<Unit>,
    /// Defending units still fighting.
    pub defending_units: Vec<Unit>,
    /// Attacking casualties not yet removed.
    pub attacking_waiting_to_die: Vec<Unit>,
    /// Defending casualties not yet removed.
    pub defending_waiting_to_die: Vec<Unit>,
    /// Attacker's sea units bombarding from an adjacent sea zone.
    pub bombarding_units: Vec<Unit>,
}

impl BattleSetup {
    /// Empty first-round land battle between two players.
    #[must_use]
    pub fn new(attacker: PlayerId, defender: PlayerId) -> Self {
        Self {
            attacker,
            defender,
            site: BattleSite::land("battle site"),
            status: BattleStatus::default(),
            attacking_units: Vec::new(),
            defending_units: Vec::new(),
            attacking_waiting_to_die: Vec::new(),
            defending_waiting_to_die: Vec::new(),
            bombarding_units: Vec::new(),
        }
    }
}

/// Units entering and leaving lists for one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideDelta {
    /// Active units moved into the waiting-to-die list.
    pub to_waiting: Vec<UnitId>,
    /// Units removed from the battle entirely (active or waiting).
    pub removed: Vec<UnitId>,
    /// Empty this side's waiting-to-die list.
    pub clear_waiting: bool,
}

impl SideDelta {
    /// Whether applying this delta would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_waiting.is_empty() && self.removed.is_empty() && !self.clear_waiting
    }

    fn merge(&mut self, other: SideDelta) {
        self.to_waiting.extend(other.to_waiting);
        self.removed.extend(other.removed);
        self.clear_waiting |= other.clear_waiting;
    }
}

/// Diff produced by a phase, applied by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleDelta {
    /// Changes to the attacking side.
    pub offense: SideDelta,
    /// Changes to the defending side.
    pub defense: SideDelta,
}

impl BattleDelta {
    /// Changes for one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &SideDelta {
        match side {
            Side::Offense => &self.offense,
            Side::Defense => &self.defense,
        }
    }

    /// Mutable changes for one side.
    pub fn side_mut(&mut self, side: Side) -> &mut SideDelta {
        match side {
            Side::Offense => &mut self.offense,
            Side::Defense => &mut self.defense,
        }
    }

    /// Fold another delta into this one.
    pub fn merge(&mut self, other: BattleDelta) {
        self.offense.merge(other.offense);
        self.defense.merge(other.defense);
    }

    /// Whether applying this delta would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offense.is_empty() && self.defense.is_empty()
    }
}

/// Authoritative state of one battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleState {
    attacker: PlayerId,
    defender: PlayerId,
    site: BattleSite,
    status: BattleStatus,
    attacking_units: Vec<Unit>,
    defending_units: Vec<Unit>,
    attacking_waiting_to_die: Vec<Unit>,
    defending_waiting_to_die: Vec<Unit>,
    bombarding_units: Vec<Unit>,
}

impl BattleState {
    /// Validate a setup and build the state.
    ///
    /// # Errors
    /// - [`BattleError::InvalidArgument`] when attacker and defender are the
    ///   same player or the round counters are inconsistent.
    /// - [`BattleError::DuplicateUnit`] when a unit id appears twice.
    /// - [`BattleError::UnknownUnitType`] when a unit's type is unregistered.
    pub fn new(setup: BattleSetup, registry: &UnitRegistry) -> Result<Self> {
        if setup.attacker == setup.defender {
            return Err(BattleError::InvalidArgument(format!(
                "attacker and defender are the same player ({:?})",
                setup.attacker
            )));
        }
        if setup.status.round == 0 {
            return Err(BattleError::InvalidArgument(
                "battle round starts at 1".to_string(),
            ));
        }
        if setup.status.max_rounds > 0 && setup.status.round > setup.status.max_rounds {
            return Err(BattleError::InvalidArgument(format!(
                "round {} exceeds max rounds {}",
                setup.status.round, setup.status.max_rounds
            )));
        }

        let all_units = setup
            .attacking_units
            .iter()
            .chain(&setup.defending_units)
            .chain(&setup.attacking_waiting_to_die)
            .chain(&setup.defending_waiting_to_die)
            .chain(&setup.bombarding_units);
        let mut seen = HashSet::new();
        for unit in all_units.clone() {
            if !seen.insert(unit.id) {
                return Err(BattleError::DuplicateUnit(unit.id));
            }
        }
        registry.validate_units(all_units)?;

        Ok(Self {
            attacker: setup.attacker,
            defender: setup.defender,
            site: setup.site,
            status: setup.status,
            attacking_units: setup.attacking_units,
            defending_units: setup.defending_units,
            attacking_waiting_to_die: setup.attacking_waiting_to_die,
            defending_waiting_to_die: setup.defending_waiting_to_die,
            bombarding_units: setup.bombarding_units,
        })
    }

    /// Attacking player.
    #[must_use]
    pub const fn attacker(&self) -> PlayerId {
        self.attacker
    }

    /// Defending player.
    #[must_use]
    pub const fn defender(&self) -> PlayerId {
        self.defender
    }

    /// Player controlling a side.
    #[must_use]
    pub const fn player(&self, side: Side) -> PlayerId {
        match side {
            Side::Offense => self.attacker,
            Side::Defense => self.defender,
        }
    }

    /// Battle location.
    #[must_use]
    pub fn site(&self) -> &BattleSite {
        &self.site
    }

    /// Round bookkeeping.
    #[must_use]
    pub const fn status(&self) -> &BattleStatus {
        &self.status
    }

    /// Units of a side that are still fighting.
    #[must_use]
    pub fn active_units(&self, side: Side) -> &[Unit] {
        match side {
            Side::Offense => &self.attacking_units,
            Side::Defense => &self.defending_units,
        }
    }

    /// Casualties of a side that have not yet been removed.
    #[must_use]
    pub fn waiting_to_die(&self, side: Side) -> &[Unit] {
        match side {
            Side::Offense => &self.attacking_waiting_to_die,
            Side::Defense => &self.defending_waiting_to_die,
        }
    }

    /// Attacker's bombarding units.
    #[must_use]
    pub fn bombarding_units(&self) -> &[Unit] {
        &self.bombarding_units
    }

    /// Collect a side's units matching the filter, active units first.
    #[must_use]
    pub fn filter_units(&self, filter: UnitFilter, side: Side) -> Vec<Unit> {
        match filter {
            UnitFilter::Active => self.active_units(side).to_vec(),
            UnitFilter::Casualty => self.waiting_to_die(side).to_vec(),
            UnitFilter::ActiveOrCasualty => self
                .active_units(side)
                .iter()
                .chain(self.waiting_to_die(side))
                .cloned()
                .collect(),
        }
    }

    /// Whether any active unit of the side is a destroyer.
    #[must_use]
    pub fn has_destroyer(&self, side: Side, registry: &UnitRegistry) -> bool {
        self.active_units(side)
            .iter()
            .any(|u| registry.is_destroyer(&u.unit_type))
    }

    /// Apply a phase's diff and return the units that left the battle.
    ///
    /// Removed units come first, followed by units cleared out of the
    /// waiting-to-die lists; offense before defense.
    pub fn apply(&mut self, delta: &BattleDelta) -> Vec<Unit> {
        let mut dead = Vec::new();
        for side in [Side::Offense, Side::Defense] {
            let changes = delta.side(side);
            if changes.is_empty() {
                continue;
            }
            let (active, waiting) = match side {
                Side::Offense => (&mut self.attacking_units, &mut self.attacking_waiting_to_die),
                Side::Defense => (&mut self.defending_units, &mut self.defending_waiting_to_die),
            };

            let (moving, staying): (Vec<Unit>, Vec<Unit>) = std::mem::take(active)
                .into_iter()
                .partition(|u| changes.to_waiting.contains(&u.id));
            *active = staying;
            waiting.extend(moving);

            let (gone, kept): (Vec<Unit>, Vec<Unit>) = std::mem::take(active)
                .into_iter()
                .partition(|u| changes.removed.contains(&u.id));
            *active = kept;
            dead.extend(gone);
            let (gone, kept): (Vec<Unit>, Vec<Unit>) = std::mem::take(waiting)
                .into_iter()
                .partition(|u| changes.removed.contains(&u.id));
            *waiting = kept;
            dead.extend(gone);

            if changes.clear_waiting {
                dead.append(waiting);
            }

            tracing::debug!(
                ?side,
                active = active.len(),
                waiting = waiting.len(),
                "Applied battle delta"
            );
        }

        #[cfg(feature = "debug-validation")]
        self.assert_disjoint();

        dead
    }

    /// Remove all remaining casualties and move on to the next round.
    ///
    /// The battle is over once either side has no active units left or the
    /// round limit has been reached. Returns the removed casualties,
    /// offense first.
    pub fn end_round(&mut self) -> Vec<Unit> {
        let mut dead = std::mem::take(&mut self.attacking_waiting_to_die);
        dead.append(&mut self.defending_waiting_to_die);

        let exhausted = self.attacking_units.is_empty() || self.defending_units.is_empty();
        if exhausted || self.status.is_last_round() {
            self.status.is_over = true;
        } else {
            self.status.round += 1;
        }
        tracing::debug!(
            round = self.status.round,
            over = self.status.is_over,
            removed = dead.len(),
            "Ended battle round"
        );
        dead
    }

    #[cfg(feature = "debug-validation")]
    fn assert_disjoint(&self) {
        let mut seen = HashSet::new();
        for unit in self
            .attacking_units
            .iter()
            .chain(&self.defending_units)
            .chain(&self.attacking_waiting_to_die)
            .chain(&self.defending_waiting_to_die)
        {
            assert!(seen.insert(unit.id), "unit {} appears twice", unit.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitTypeData;

    fn registry() -> UnitRegistry {
        let mut destroyer = UnitTypeData::new("destroyer");
        destroyer.is_destroyer = true;
        UnitRegistry::from_data(vec![UnitTypeData::new("infantry"), destroyer]).unwrap()
    }

    fn setup() -> BattleSetup {
        let mut setup = BattleSetup::new(PlayerId::new(1), PlayerId::new(2));
        setup.attacking_units = vec![
            Unit::new(1, "infantry", PlayerId::new(1)),
            Unit::new(2, "infantry", PlayerId::new(1)),
        ];
        setup.defending_units = vec![
            Unit::new(3, "infantry", PlayerId::new(2)),
            Unit::new(4, "destroyer", PlayerId::new(2)),
        ];
        setup
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Offense.opposite(), Side::Defense);
        assert_eq!(Side::Defense.opposite(), Side::Offense);
        assert!(Side::Defense.is_defense());
    }

    #[test]
    fn test_new_rejects_same_player() {
        let setup = BattleSetup::new(PlayerId::new(1), PlayerId::new(1));
        let err = BattleState::new(setup, &registry()).unwrap_err();
        assert!(matches!(err, BattleError::InvalidArgument(_)));
    }

    #[test]
    fn test_new_rejects_round_zero() {
        let mut setup = setup();
        setup.status.round = 0;
        assert!(BattleState::new(setup, &registry()).is_err());
    }

    #[test]
    fn test_new_rejects_round_past_limit() {
        let mut setup = setup();
        setup.status = BattleStatus::new(4, 3);
        assert!(BattleState::new(setup, &registry()).is_err());
    }

    #[test]
    fn test_new_rejects_duplicate_unit() {
        let mut setup = setup();
        setup
            .defending_waiting_to_die
            .push(Unit::new(1, "infantry", PlayerId::new(2)));
        let err = BattleState::new(setup, &registry()).unwrap_err();
        assert!(matches!(err, BattleError::DuplicateUnit(1)));
    }

    #[test]
    fn test_new_rejects_unknown_type() {
        let mut setup = setup();
        setup
            .attacking_units
            .push(Unit::new(9, "zeppelin", PlayerId::new(1)));
        let err = BattleState::new(setup, &registry()).unwrap_err();
        assert!(matches!(err, BattleError::UnknownUnitType(_)));
    }

    #[test]
    fn test_has_destroyer() {
        let state = BattleState::new(setup(), &registry()).unwrap();
        assert!(state.has_destroyer(Side::Defense, &registry()));
        assert!(!state.has_destroyer(Side::Offense, &registry()));
    }

    #[test]
    fn test_apply_moves_to_waiting_then_clears() {
        let mut state = BattleState::new(setup(), &registry()).unwrap();

        let mut delta = BattleDelta::default();
        delta.defense.to_waiting.push(3);
        let dead = state.apply(&delta);
        assert!(dead.is_empty());
        assert_eq!(state.active_units(Side::Defense).len(), 1);
        assert_eq!(state.waiting_to_die(Side::Defense)[0].id, 3);

        let mut clear = BattleDelta::default();
        clear.defense.clear_waiting = true;
        let dead = state.apply(&clear);
        assert_eq!(dead.len(), 1);
        assert!(state.waiting_to_die(Side::Defense).is_empty());
    }

    #[test]
    fn test_apply_removes_from_active_and_waiting() {
        let mut setup = setup();
        setup
            .attacking_waiting_to_die
            .push(Unit::new(5, "infantry", PlayerId::new(1)));
        let mut state = BattleState::new(setup, &registry()).unwrap();

        let mut delta = BattleDelta::default();
        delta.offense.removed = vec![1, 5];
        let dead = state.apply(&delta);

        let ids: Vec<UnitId> = dead.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(state.active_units(Side::Offense).len(), 1);
        assert!(state.waiting_to_die(Side::Offense).is_empty());
    }

    #[test]
    fn test_apply_empty_delta_is_noop() {
        let mut state = BattleState::new(setup(), &registry()).unwrap();
        let before = state.clone();
        assert!(state.apply(&BattleDelta::default()).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_filter_units() {
        let mut setup = setup();
        setup
            .defending_waiting_to_die
            .push(Unit::new(6, "infantry", PlayerId::new(2)));
        let state = BattleState::new(setup, &registry()).unwrap();

        assert_eq!(state.filter_units(UnitFilter::Active, Side::Defense).len(), 2);
        assert_eq!(state.filter_units(UnitFilter::Casualty, Side::Defense).len(), 1);
        assert_eq!(
            state
                .filter_units(UnitFilter::ActiveOrCasualty, Side::Defense)
                .len(),
            3
        );
    }

    #[test]
    fn test_end_round_removes_casualties_and_advances() {
        let mut setup = setup();
        setup.status = BattleStatus::new(1, 3);
        setup
            .defending_waiting_to_die
            .push(Unit::new(7, "infantry", PlayerId::new(2)));
        let mut state = BattleState::new(setup, &registry()).unwrap();

        let dead = state.end_round();
        assert_eq!(dead.len(), 1);
        assert!(state.waiting_to_die(Side::Defense).is_empty());
        assert_eq!(state.status().round, 2);
        assert!(!state.status().is_over);
    }

    #[test]
    fn test_end_round_finishes_exhausted_battle() {
        let mut setup = setup();
        setup.defending_units.clear();
        let mut state = BattleState::new(setup, &registry()).unwrap();

        state.end_round();
        assert!(state.status().is_over);
        assert_eq!(state.status().round, 1);
    }

    #[test]
    fn test_end_round_finishes_at_round_limit() {
        let mut setup = setup();
        setup.status = BattleStatus::new(2, 2);
        let mut state = BattleState::new(setup, &registry()).unwrap();

        state.end_round();
        assert!(state.status().is_over);
    }

    #[test]
    fn test_status_rounds() {
        let status = BattleStatus::new(3, 3);
        assert!(status.is_last_round());
        assert!(!status.is_first_round());
        assert!(!BattleStatus::new(3, 0).is_last_round());
    }
}
