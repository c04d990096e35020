//! Skill Tree Control - administrative CLI for the skill tree store
//!
//! Read-side reporting (stats, tree) and the two administrative writes
//! (add-xp, reset). The store itself is created by the installer; this tool
//! refuses to create one.

pub mod commands;
pub mod display;
