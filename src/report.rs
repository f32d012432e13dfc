use crate::publisher::PublishResult;
use colored::*;
use serde::Serialize;
use std::path::PathBuf;

/// Everything that happened during one publish run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublishReport {
    pub results: Vec<PublishResult>,
    /// Groups with no files; never handed to the publisher
    pub skipped_empty: Vec<String>,
    pub staging_root: Option<PathBuf>,
    pub backend: Option<String>,
}

impl PublishReport {
    pub fn record(&mut self, result: PublishResult) {
        self.results.push(result);
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &PublishResult> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &PublishResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    /// 0 only when every project published.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn print(&self) {
        println!("\n{}", "Publish summary".bold().blue());
        println!("{}", "===============".blue());

        if let Some(backend) = &self.backend {
            println!("Backend: {}", backend);
        }
        if let Some(root) = &self.staging_root {
            println!("Staged in: {}", root.display());
        }

        let succeeded: Vec<_> = self.succeeded().collect();
        let failed: Vec<_> = self.failed().collect();

        if !succeeded.is_empty() {
            println!("\n{} {} project(s):", "✓".green(), succeeded.len());
            for result in succeeded {
                match &result.remote {
                    Some(remote) => println!(
                        "  - {} {}",
                        result.project.green(),
                        format!("https://github.com/{}", remote).dimmed()
                    ),
                    None => println!("  - {} {}", result.project.green(), "(local only)".dimmed()),
                }
            }
        }

        if !failed.is_empty() {
            println!("\n{} {} project(s):", "✗".red(), failed.len());
            for result in failed {
                println!(
                    "  - {}: {}",
                    result.project.red(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        if !self.skipped_empty.is_empty() {
            println!(
                "\nSkipped empty: {}",
                self.skipped_empty.join(", ").dimmed()
            );
        }
    }
}
