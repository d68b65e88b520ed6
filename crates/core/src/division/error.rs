//! Division taxonomy errors.

use thiserror::Error;

/// Errors raised while building or querying a [`super::DivisionTaxonomy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DivisionError {
    /// Code does not start with a two-character group.
    #[error("Invalid division code: {0:?}")]
    InvalidCode(String),

    /// No division matches the code's two-character group.
    #[error("Unknown division: {0}")]
    Unknown(String),

    /// Two taxonomy entries share the same group.
    #[error("Duplicate division group: {0}")]
    DuplicateGroup(String),

    /// Taxonomy entry has an empty name.
    #[error("Division {0} has no name")]
    EmptyName(String),

    /// Taxonomy document could not be parsed.
    #[error("Malformed division taxonomy: {0}")]
    Malformed(String),
}
