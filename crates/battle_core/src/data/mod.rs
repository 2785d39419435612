//! Data structures for combat configuration.
//!
//! This module contains pure data structures that define unit combat
//! attributes and ruleset flags. All structs are designed to be
//! deserialized from RON.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! Callers hand over file contents as strings.

mod rules_data;
mod unit_data;

pub use rules_data::{BattleRules, DEFAULT_ATTRITION_EXPONENT, DEFAULT_DICE_SIDES};
pub use unit_data::{AaData, UnitTypeData};
