//! Error types for the combat resolution core.

use thiserror::Error;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for all combat resolution errors.
///
/// Empty firing or target collections are never errors; they simply
/// produce no groups. Errors here are caller bugs or bad data.
#[derive(Debug, Error)]
pub enum BattleError {
    /// A constructor precondition was violated.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A unit references a type the registry does not know.
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    /// The same unit identifier appears twice in one battle.
    #[error("Duplicate unit ID in battle: {0}")]
    DuplicateUnit(u64),

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the data source that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Persisted step state could not be written or read back.
    #[error("Persistence error: {0}")]
    Persistence(String),
}
