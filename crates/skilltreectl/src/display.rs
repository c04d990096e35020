//! Terminal rendering for skilltreectl
//!
//! Presentation only. Context display names live here as a pure lookup
//! table; the store and engines never see them.

use owo_colors::OwoColorize;
use std::collections::BTreeMap;

use skilltree_common::query::OverallStats;
use skilltree_common::{Skill, UnlockedSpecialization, UsageOutcome};

const HEADER_WIDTH: usize = 50;
const BAR_WIDTH: usize = 20;

/// Display names for the context codes. Unknown codes fall back to the raw
/// code so new catalog contexts render without a code change here.
const CONTEXT_NAMES: &[(&str, &str)] = &[
    ("u", "User Context"),
    ("ut", "User Tools"),
    ("s", "Session State"),
    ("w", "World Knowledge"),
    ("st", "System State"),
    ("c", "Conversation"),
    ("co", "Code Context"),
    ("cr", "Creative"),
    ("g", "General"),
    ("ontology", "Meta-Cognitive"),
];

pub fn context_display_name(code: &str) -> &str {
    CONTEXT_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Fixed-width progress bar over `0.0..1.0`, clamped.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let clamped = progress.clamp(0.0, 1.0);
    let filled = (clamped * width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn banner(title: &str) -> String {
    let rule = "=".repeat(HEADER_WIDTH);
    let centered = format!("{title:^HEADER_WIDTH$}");
    format!("\n{}\n{}\n{}\n", rule.cyan(), centered.bold(), rule.cyan())
}

pub fn render_stats(stats: &OverallStats, recent_unlocks: &[UnlockedSpecialization]) -> String {
    let mut out = banner("SKILL TREE - STATISTICS");

    out.push_str(&format!("\n{}\n", "Overall Stats:".bold()));
    out.push_str(&format!("  Total Skills: {}\n", stats.skill_count));
    out.push_str(&format!("  Total XP: {}\n", stats.total_xp));
    out.push_str(&format!("  Total Usage: {}\n", stats.total_usage));
    out.push_str(&format!("  Average Level: {:.1}\n", stats.average_level));
    out.push_str(&format!(
        "  Recent Activity (24h): {} uses\n",
        stats.recent_activity
    ));

    if !stats.top_skills.is_empty() {
        out.push_str(&format!("\n{}\n", "Top Skills:".bold()));
        for skill in &stats.top_skills {
            out.push_str(&format!(
                "  * {}: Level {} ({} XP)\n",
                skill.skill_name, skill.current_level, skill.total_xp
            ));
        }
    }

    if !recent_unlocks.is_empty() {
        out.push_str(&format!("\n{}\n", "Unlocked Specializations:".bold()));
        for spec in recent_unlocks {
            out.push_str(&format!(
                "  * {} ({}) - {}\n",
                spec.specialization_name.green(),
                spec.skill_name,
                spec.unlock_date.format("%Y-%m-%d")
            ));
            if !spec.description.is_empty() {
                out.push_str(&format!("    {}\n", spec.description.dimmed()));
            }
        }
    }

    out
}

pub fn render_tree(tree: &BTreeMap<String, Vec<Skill>>) -> String {
    let mut out = banner("SKILL TREE");

    for (code, skills) in tree {
        out.push_str(&format!(
            "\n[{}] {}\n{}\n",
            code,
            context_display_name(code).bold(),
            "-".repeat(40).dimmed()
        ));
        for skill in skills {
            let bar = progress_bar(skill.level_progress(), BAR_WIDTH);
            out.push_str(&format!(
                "  {:<25} Lv.{:2} [{}] {} XP\n",
                skill.skill_name, skill.current_level, bar, skill.total_xp
            ));
        }
    }

    out
}

pub fn render_outcome(outcome: &UsageOutcome, amount: u32) -> String {
    let skill = &outcome.skill;
    let mut out = format!(
        "+{} XP to {}   Total XP: {}   Level: {}\n",
        amount,
        skill.skill_name.bold(),
        skill.total_xp,
        skill.current_level
    );

    if outcome.leveled_up() {
        out.push_str(&format!(
            "{} {} -> {}\n",
            "LEVEL UP!".yellow().bold(),
            outcome.previous_level,
            outcome.new_level
        ));
    }
    for spec in &outcome.newly_unlocked {
        out.push_str(&format!(
            "{} {}",
            "Unlocked:".green().bold(),
            spec.specialization_name
        ));
        if !spec.description.is_empty() {
            out.push_str(&format!(" ({})", spec.description));
        }
        out.push('\n');
    }

    out
}

pub fn render_error(err: &anyhow::Error) -> String {
    format!("{} {:#}", "✗".red(), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_names_cover_codes_and_fall_back() {
        assert_eq!(context_display_name("w"), "World Knowledge");
        assert_eq!(context_display_name("ontology"), "Meta-Cognitive");
        assert_eq!(context_display_name("brand_new"), "brand_new");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 20), "░".repeat(20));
        assert_eq!(progress_bar(0.5, 20), format!("{}{}", "█".repeat(10), "░".repeat(10)));
        // 99% of 20 chars rounds down; the bar only fills at 100%
        assert_eq!(progress_bar(0.99, 20), format!("{}{}", "█".repeat(19), "░".repeat(1)));
        assert_eq!(progress_bar(1.0, 20), "█".repeat(20));
    }

    #[test]
    fn progress_bar_clamps_out_of_range() {
        assert_eq!(progress_bar(-0.3, 10), "░".repeat(10));
        assert_eq!(progress_bar(4.2, 10), "█".repeat(10));
    }
}
