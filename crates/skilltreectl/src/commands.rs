//! Command handlers for skilltreectl
//!
//! Each command opens the store itself and maps library failures to the
//! process contract: message on stderr, exit code 1. An absent store is
//! reported with its expected location and never created here.

use anyhow::{Context, Result};
use std::path::PathBuf;

use skilltree_common::store::default_db_path;
use skilltree_common::{ProgressionEngine, QueryEngine, SkillStore};
use tracing::debug;

use crate::display;

/// Environment override for the database location; the `--db` flag wins.
pub const DB_ENV_VAR: &str = "SKILLTREE_DB";

/// Resolve the database path: `--db` flag, then `SKILLTREE_DB`, then the
/// XDG default.
pub fn resolve_db_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Ok(env_path) = std::env::var(DB_ENV_VAR) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    Ok(default_db_path()?)
}

fn open_store(db: Option<PathBuf>) -> Result<SkillStore> {
    let path = resolve_db_path(db)?;
    debug!(path = %path.display(), "opening skill store");
    SkillStore::open(&path)
        .context("run the installer first to initialize the skill database")
}

pub fn stats(db: Option<PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db)?;
    print_stats(&store, json)
}

pub fn tree(db: Option<PathBuf>) -> Result<()> {
    let store = open_store(db)?;
    print_tree(&store)
}

/// Bare invocation: statistics followed by the full tree.
pub fn overview(db: Option<PathBuf>) -> Result<()> {
    let store = open_store(db)?;
    print_stats(&store, false)?;
    print_tree(&store)
}

pub fn add_xp(db: Option<PathBuf>, skill: &str, amount: u32) -> Result<()> {
    let store = open_store(db)?;
    let engine = ProgressionEngine::new(store);
    let outcome = engine.record_usage(skill, i64::from(amount))?;
    print!("{}", display::render_outcome(&outcome, amount));
    Ok(())
}

pub fn reset(db: Option<PathBuf>, skill: &str) -> Result<()> {
    let store = open_store(db)?;
    let skill = store.reset_skill(skill)?;
    println!("Reset {} to level 0", skill.skill_name);
    Ok(())
}

fn print_stats(store: &SkillStore, json: bool) -> Result<()> {
    let query = QueryEngine::new(store.clone());
    let stats = query.overall_stats()?;
    let recent_unlocks = query.specialization_digest()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "stats": stats,
                "recent_specializations": recent_unlocks,
            }))?
        );
    } else {
        print!("{}", display::render_stats(&stats, &recent_unlocks));
    }
    Ok(())
}

fn print_tree(store: &SkillStore) -> Result<()> {
    let tree = QueryEngine::new(store.clone()).skill_tree()?;
    print!("{}", display::render_tree(&tree));
    Ok(())
}
