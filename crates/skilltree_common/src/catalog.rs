//! Skill catalog definitions
//!
//! The catalog is external configuration: which contexts exist, which skills
//! they contain, and which specializations each skill can unlock. It is
//! loaded from TOML by the installer and seeded into the store exactly once;
//! the core never generates or mutates catalog content.
//!
//! ```toml
//! [[contexts]]
//! code = "w"
//! name = "World Knowledge"
//!
//! [[contexts.skills]]
//! name = "web_search"
//!
//! [[contexts.skills.specializations]]
//! name = "Basic Specialization"
//! description = "Unlocked at level 5"
//! level_required = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{Result, SkillTreeError};

/// Full catalog: every context with its skills and their unlockables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub contexts: Vec<ContextDef>,
}

/// One context grouping. `name` is display flavor carried through
/// configuration; only `code` is persisted with each skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDef {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub skills: Vec<SkillDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    #[serde(default)]
    pub specializations: Vec<SpecializationDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecializationDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub level_required: i64,
}

/// Default specialization tiers applied to every builtin skill.
const DEFAULT_TIERS: &[(&str, i64)] = &[
    ("Basic Specialization", 5),
    ("Advanced Specialization", 10),
    ("Master Specialization", 15),
];

/// Builtin context/skill seed set.
const BUILTIN_CONTEXTS: &[(&str, &str, &[&str])] = &[
    (
        "ontology",
        "Meta-Cognitive",
        &["self_awareness", "capability_discovery", "limitation_override"],
    ),
    (
        "u",
        "User Context",
        &["profile_management", "preference_tracking", "adhd_optimization"],
    ),
    (
        "ut",
        "User Tools",
        &["mcp_management", "tool_discovery", "capability_mapping"],
    ),
    (
        "s",
        "Session State",
        &["context_awareness", "memory_management", "state_persistence"],
    ),
    (
        "w",
        "World Knowledge",
        &["web_search", "information_synthesis", "fact_verification"],
    ),
    (
        "st",
        "System State",
        &["filesystem_navigation", "process_monitoring", "resource_management"],
    ),
    (
        "c",
        "Conversation",
        &["history_retrieval", "pattern_recognition", "context_linking"],
    ),
    (
        "co",
        "Code Context",
        &["syntax_assistance", "implementation_help", "debugging_support"],
    ),
    (
        "cr",
        "Creative",
        &["worldbuilding", "character_development", "narrative_construction"],
    ),
    ("g", "General", &["knowledge_base", "reasoning", "problem_solving"]),
];

impl SkillCatalog {
    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let catalog: SkillCatalog = toml::from_str(text)
            .map_err(|e| SkillTreeError::InvalidInput(format!("catalog parse error: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SkillTreeError::StorageUnavailable(format!(
                "cannot read catalog at {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// The default catalog: ten contexts with three skills each, every skill
    /// carrying the Basic/Advanced/Master tiers at levels 5/10/15.
    pub fn builtin() -> Self {
        let contexts = BUILTIN_CONTEXTS
            .iter()
            .map(|(code, name, skills)| ContextDef {
                code: (*code).to_string(),
                name: (*name).to_string(),
                skills: skills
                    .iter()
                    .map(|skill| SkillDef {
                        name: (*skill).to_string(),
                        specializations: DEFAULT_TIERS
                            .iter()
                            .map(|(tier, level)| SpecializationDef {
                                name: (*tier).to_string(),
                                description: format!("Unlocked at level {level}"),
                                level_required: *level,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { contexts }
    }

    /// Total number of skills across all contexts.
    pub fn skill_count(&self) -> usize {
        self.contexts.iter().map(|c| c.skills.len()).sum()
    }

    fn validate(&self) -> Result<()> {
        for context in &self.contexts {
            if context.code.is_empty() {
                return Err(SkillTreeError::InvalidInput(
                    "catalog context with empty code".to_string(),
                ));
            }
            for skill in &context.skills {
                if skill.name.is_empty() {
                    return Err(SkillTreeError::InvalidInput(format!(
                        "catalog context '{}' has a skill with an empty name",
                        context.code
                    )));
                }
                for spec in &skill.specializations {
                    if spec.level_required < 0 {
                        return Err(SkillTreeError::InvalidInput(format!(
                            "specialization '{}' on '{}' has negative level_required",
                            spec.name, skill.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
