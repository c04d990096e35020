//! Progression engine
//!
//! Single entry point for recording a usage event against a skill. XP only
//! ever increases; the level is derived from total XP and never stored
//! independently of it. A usage event and any unlocks it triggers commit as
//! one transaction in the store layer.

use serde::Serialize;

use crate::errors::{Result, SkillTreeError};
use crate::store::{Skill, SkillStore, Specialization};

/// XP required per level. Flat threshold, no cap, no diminishing returns.
pub const XP_PER_LEVEL: i64 = 100;

/// Derive a level from accumulated XP.
///
/// Kept as the single place the formula lives so a future per-skill
/// threshold or curve is a local change.
pub fn level_for_xp(total_xp: i64) -> i64 {
    total_xp / XP_PER_LEVEL
}

/// Progress within the current level, in `0.0..1.0`.
pub fn level_progress(total_xp: i64) -> f64 {
    (total_xp % XP_PER_LEVEL) as f64 / XP_PER_LEVEL as f64
}

/// Result of one recorded usage event.
#[derive(Debug, Clone, Serialize)]
pub struct UsageOutcome {
    /// Skill state after the event.
    pub skill: Skill,
    pub previous_level: i64,
    pub new_level: i64,
    /// Specializations unlocked by this event, oldest threshold first.
    pub newly_unlocked: Vec<Specialization>,
}

impl UsageOutcome {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}

/// Records usage events. Holds the store handle; cheap to clone.
#[derive(Clone)]
pub struct ProgressionEngine {
    store: SkillStore,
}

impl ProgressionEngine {
    pub fn new(store: SkillStore) -> Self {
        Self { store }
    }

    /// Record one usage event: add `xp_delta` XP, bump the usage count,
    /// recompute the level, and unlock any specializations the new level
    /// makes eligible. All of it commits atomically or not at all.
    pub fn record_usage(&self, skill_name: &str, xp_delta: i64) -> Result<UsageOutcome> {
        if xp_delta <= 0 {
            return Err(SkillTreeError::InvalidInput(format!(
                "XP amount must be positive, got {xp_delta}"
            )));
        }

        let skill = self.store.get_skill_by_name(skill_name)?;
        let (applied, newly_unlocked) = self.store.apply_usage(skill.id, xp_delta)?;

        Ok(UsageOutcome {
            previous_level: applied.previous_level,
            new_level: applied.skill.current_level,
            skill: applied.skill,
            newly_unlocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SkillCatalog;
    use tempfile::TempDir;

    fn test_engine() -> (ProgressionEngine, SkillStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SkillStore::open_or_create(&dir.path().join("skill_tree.db")).unwrap();
        store.seed_catalog(&SkillCatalog::builtin()).unwrap();
        (ProgressionEngine::new(store.clone()), store, dir)
    }

    #[test]
    fn level_formula() {
        assert_eq!(level_for_xp(0), 0);
        assert_eq!(level_for_xp(99), 0);
        assert_eq!(level_for_xp(100), 1);
        assert_eq!(level_for_xp(250), 2);
    }

    #[test]
    fn progress_within_level() {
        assert_eq!(level_progress(0), 0.0);
        assert_eq!(level_progress(150), 0.5);
        assert_eq!(level_progress(300), 0.0);
    }

    #[test]
    fn record_usage_accumulates() {
        let (engine, _store, _dir) = test_engine();

        let outcome = engine.record_usage("web_search", 40).unwrap();
        assert_eq!(outcome.skill.total_xp, 40);
        assert_eq!(outcome.skill.usage_count, 1);
        assert_eq!(outcome.new_level, 0);
        assert!(!outcome.leveled_up());
        assert!(outcome.newly_unlocked.is_empty());

        let outcome = engine.record_usage("web_search", 70).unwrap();
        assert_eq!(outcome.skill.total_xp, 110);
        assert_eq!(outcome.previous_level, 0);
        assert_eq!(outcome.new_level, 1);
        assert!(outcome.leveled_up());
        // Builtin tiers start at level 5, so nothing unlocks yet
        assert!(outcome.newly_unlocked.is_empty());
    }

    #[test]
    fn level_derivation_holds_after_every_call() {
        let (engine, _store, _dir) = test_engine();
        for delta in [10, 95, 1, 250, 44] {
            let outcome = engine.record_usage("reasoning", delta).unwrap();
            assert_eq!(
                outcome.skill.current_level,
                level_for_xp(outcome.skill.total_xp)
            );
        }
    }

    #[test]
    fn unlock_reported_once() {
        let (engine, _store, _dir) = test_engine();

        // 520 XP puts the skill at level 5: Basic Specialization unlocks
        let outcome = engine.record_usage("web_search", 520).unwrap();
        assert_eq!(outcome.new_level, 5);
        assert_eq!(outcome.newly_unlocked.len(), 1);
        assert_eq!(outcome.newly_unlocked[0].specialization_name, "Basic Specialization");
        assert!(outcome.newly_unlocked[0].unlocked);
        assert!(outcome.newly_unlocked[0].unlock_date.is_some());

        // Further usage at the same level reports nothing new
        let outcome = engine.record_usage("web_search", 10).unwrap();
        assert!(!outcome.leveled_up());
        assert!(outcome.newly_unlocked.is_empty());
    }

    #[test]
    fn crossing_multiple_thresholds_unlocks_all() {
        let (engine, _store, _dir) = test_engine();

        let outcome = engine.record_usage("reasoning", 1500).unwrap();
        assert_eq!(outcome.new_level, 15);
        let names: Vec<&str> = outcome
            .newly_unlocked
            .iter()
            .map(|s| s.specialization_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Basic Specialization",
                "Advanced Specialization",
                "Master Specialization"
            ]
        );
    }

    #[test]
    fn unknown_skill_is_not_found() {
        let (engine, _store, _dir) = test_engine();
        let err = engine.record_usage("no_such_skill", 10).unwrap_err();
        assert!(matches!(err, SkillTreeError::NotFound(_)));
    }

    #[test]
    fn non_positive_delta_rejected_without_writes() {
        let (engine, store, _dir) = test_engine();
        engine.record_usage("web_search", 30).unwrap();

        for bad in [0, -5] {
            let err = engine.record_usage("web_search", bad).unwrap_err();
            assert!(matches!(err, SkillTreeError::InvalidInput(_)));
        }

        let skill = store.get_skill_by_name("web_search").unwrap();
        assert_eq!(skill.total_xp, 30);
        assert_eq!(skill.usage_count, 1);
    }
}
