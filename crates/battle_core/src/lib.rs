//! # Battle Core
//!
//! Deterministic combat resolution core for a turn-based wargame.
//!
//! This crate decides who may fire at whom and in what order; it never
//! rolls dice or picks casualties among equally valid candidates. Those
//! decisions come from a caller-supplied [`firing::FireResolver`].
//!
//! - No IO (data loaders take `&str`)
//! - No randomness
//! - No global registries; the [`registry::UnitRegistry`] is passed in
//!
//! ## Crate Structure
//!
//! - [`targeting`] - Which unit types can hit which enemy types
//! - [`firing`] - Firing groups for general, bombardment and AA fire
//! - [`first_strike`] - Sneak attack phase and casualty clearing
//! - [`steps`] - Round step ordering and execution
//! - [`battle`] - Battle state and the deltas phases produce
//! - [`lanchester`] - Closed-form outcome estimate for AI planning
//! - [`odds`] - Power aggregation and odds summary

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battle;
pub mod data;
pub mod error;
pub mod first_strike;
pub mod firing;
pub mod lanchester;
pub mod odds;
pub mod registry;
pub mod steps;
pub mod targeting;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battle::{
        BattleDelta, BattleSetup, BattleSite, BattleState, BattleStatus, Side, SideDelta,
        UnitFilter,
    };
    pub use crate::data::{AaData, BattleRules, UnitTypeData};
    pub use crate::error::{BattleError, Result};
    pub use crate::first_strike::{
        ClearFirstStrikeCasualties, FirstStrikeDetermination, FirstStrikeStep,
    };
    pub use crate::firing::general::FireCategory;
    pub use crate::firing::{FireOutcome, FireResolver, FiringGroup, ReturnFire};
    pub use crate::lanchester::{ActiveUnit, LanchesterCalculator, LanchesterResult};
    pub use crate::odds::{BattleOddsSummary, PowerAndRolls, TerritoryEffect};
    pub use crate::registry::UnitRegistry;
    pub use crate::steps::{BattleStep, StepOrder};
    pub use crate::targeting::TargetGroup;
    pub use crate::units::{PlayerId, Unit, UnitId, UnitTypeId};
}
