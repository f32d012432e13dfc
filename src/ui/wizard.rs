use crate::assembler::Assembly;
use anyhow::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect};

/// Interactive review before anything leaves the machine.
pub struct PublishWizard {
    theme: ColorfulTheme,
}

impl PublishWizard {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Lets the user untick groups, then confirm. Returns false when nothing should be published.
    pub fn review(&self, assembly: &mut Assembly, destination: &str) -> Result<bool> {
        println!("\n{}", "Review projects".bold().blue());
        println!("{}", "===============".blue());

        if assembly.groups.is_empty() {
            println!("{}", "Nothing to publish.".yellow());
            return Ok(false);
        }

        let labels: Vec<String> = assembly
            .groups
            .iter()
            .map(|g| format!("{} ({} file(s), {})", g.name, g.files.len(), g.language))
            .collect();
        let defaults = vec![true; labels.len()];

        let keep = MultiSelect::with_theme(&self.theme)
            .with_prompt("Projects to publish (space toggles)")
            .items(&labels)
            .defaults(&defaults)
            .interact()?;

        retain_selected(assembly, &keep);
        if assembly.groups.is_empty() {
            println!("{}", "No projects selected.".yellow());
            return Ok(false);
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!(
                "Publish {} project(s) to {}?",
                assembly.groups.len(),
                destination
            ))
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

impl Default for PublishWizard {
    fn default() -> Self {
        Self::new()
    }
}

fn retain_selected(assembly: &mut Assembly, keep: &[usize]) {
    let mut index = 0;
    assembly.groups.retain(|_| {
        let kept = keep.contains(&index);
        index += 1;
        kept
    });
}
