//! Read-only reporting façade
//!
//! Composes the store's aggregate queries into the three reporting shapes:
//! overall statistics, the unlocked-specialization digest, and the full
//! skill tree grouped by context. Nothing here mutates state.

use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::store::{AggregateStats, Skill, SkillStore, UnlockedSpecialization};

/// How many skills the statistics report ranks.
pub const TOP_SKILLS_LIMIT: usize = 5;

/// How many unlocks the specialization digest shows by default.
pub const SPECIALIZATION_DIGEST_LIMIT: usize = 5;

/// Activity window for the "recent uses" statistic.
pub const RECENT_ACTIVITY_HOURS: i64 = 24;

/// Overall statistics: aggregates, the top skills by XP, and activity
/// within the last 24 hours.
#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub skill_count: i64,
    pub total_xp: i64,
    pub total_usage: i64,
    pub average_level: f64,
    pub top_skills: Vec<Skill>,
    pub recent_activity: i64,
}

#[derive(Clone)]
pub struct QueryEngine {
    store: SkillStore,
}

impl QueryEngine {
    pub fn new(store: SkillStore) -> Self {
        Self { store }
    }

    pub fn overall_stats(&self) -> Result<OverallStats> {
        let AggregateStats {
            skill_count,
            total_xp,
            total_usage,
            average_level,
        } = self.store.aggregate_stats()?;
        let top_skills = self.store.top_skills(TOP_SKILLS_LIMIT)?;
        let recent_activity = self
            .store
            .recent_activity_count(Duration::hours(RECENT_ACTIVITY_HOURS))?;

        Ok(OverallStats {
            skill_count,
            total_xp,
            total_usage,
            average_level,
            top_skills,
            recent_activity,
        })
    }

    /// The most recently unlocked specializations, capped at the digest
    /// limit.
    pub fn specialization_digest(&self) -> Result<Vec<UnlockedSpecialization>> {
        let mut unlocked = self.store.unlocked_specializations()?;
        unlocked.truncate(SPECIALIZATION_DIGEST_LIMIT);
        Ok(unlocked)
    }

    /// Every unlocked specialization, most recent first.
    pub fn all_unlocked_specializations(&self) -> Result<Vec<UnlockedSpecialization>> {
        self.store.unlocked_specializations()
    }

    /// The full tree: context code to skills, skills sorted by name.
    pub fn skill_tree(&self) -> Result<BTreeMap<String, Vec<Skill>>> {
        self.store.skills_by_context()
    }
}
