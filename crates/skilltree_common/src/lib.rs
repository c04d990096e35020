//! Skill Tree Common - Shared progression engine and storage
//!
//! Tracks usage of named skills grouped into contexts, accumulates XP,
//! derives levels, and unlocks specializations at level thresholds.
//! The read side aggregates the same store into statistics, a tree view,
//! and an unlocked-specialization digest.

pub mod catalog;
pub mod errors;
pub mod progression;
pub mod query;
pub mod store;

pub use catalog::SkillCatalog;
pub use errors::{Result, SkillTreeError};
pub use progression::{ProgressionEngine, UsageOutcome};
pub use query::{OverallStats, QueryEngine};
pub use store::{Skill, SkillStore, Specialization, UnlockedSpecialization};
