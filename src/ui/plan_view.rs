use crate::assembler::Assembly;
use crate::classifier::Rule;
use colored::*;

const MAX_LISTED_FILES: usize = 8;

/// Human-readable grouping, one block per group.
pub fn render_plan(assembly: &Assembly) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} file(s) in {} project(s)\n",
        "Plan:".bold().blue(),
        assembly.total_files(),
        assembly.groups.len()
    ));

    for group in &assembly.groups {
        out.push_str(&format!(
            "\n{} {} ({}, {} file(s), confidence {:.2})\n",
            "▸".cyan(),
            group.name.bold(),
            group.language,
            group.files.len(),
            group.confidence
        ));
        out.push_str(&format!("  {}\n", group.description.dimmed()));

        for file in group.files.iter().take(MAX_LISTED_FILES) {
            out.push_str(&format!("    {}\n", file.relative_path.display()));
        }
        if group.files.len() > MAX_LISTED_FILES {
            out.push_str(&format!(
                "    {}\n",
                format!("... and {} more", group.files.len() - MAX_LISTED_FILES).dimmed()
            ));
        }
    }

    if !assembly.merged_into_misc.is_empty() {
        out.push_str(&format!(
            "\n{} {}\n",
            "Merged into misc (below threshold):".yellow(),
            assembly.merged_into_misc.join(", ")
        ));
    }

    if !assembly.duplicates.is_empty() {
        out.push_str(&format!("\n{}\n", "Skipped duplicates:".yellow()));
        for dup in &assembly.duplicates {
            out.push_str(&format!(
                "    {} (same as {})\n",
                dup.entry.relative_path.display(),
                dup.original.display()
            ));
        }
    }

    out
}

/// The effective rule list in precedence order.
pub fn render_rules(rules: &[Rule], generic_dirs: &[String]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Classification rules (first match wins)".bold().blue()));
    for rule in rules {
        out.push_str(&format!(
            "{:>3}. {:<40} -> {:<20} {:.2}\n",
            rule.index + 1,
            rule.description,
            rule.target,
            rule.confidence
        ));
    }
    if rules.is_empty() {
        out.push_str(&format!("     {}\n", "(none: every file goes to misc)".dimmed()));
    }

    if !generic_dirs.is_empty() {
        out.push_str(&format!("\nIgnored for {{dir}}: {}\n", generic_dirs.join(", ")));
    }

    out
}
