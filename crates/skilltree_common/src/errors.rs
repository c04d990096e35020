//! Error taxonomy for skill tree operations
//!
//! Three caller-visible failure classes. Write-write conflicts are retried
//! inside the store layer and only surface as `StorageUnavailable` once the
//! retry budget is exhausted, so they carry no variant of their own.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SkillTreeError>;

#[derive(Debug, Error)]
pub enum SkillTreeError {
    /// The named skill does not exist in the store.
    #[error("unknown skill: {0}")]
    NotFound(String),

    /// Rejected before any write (non-positive XP delta, malformed catalog).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The store is missing, unreachable, or stayed contended past the
    /// retry budget. Fatal for the invoking command.
    #[error("skill database unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<rusqlite::Error> for SkillTreeError {
    fn from(err: rusqlite::Error) -> Self {
        SkillTreeError::StorageUnavailable(err.to_string())
    }
}
