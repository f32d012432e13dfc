use crate::assembler::{prepare_staging_root, Assembly, ProjectAssembler, ProjectGroup, StageFailure};
use crate::classifier::{normalize_name, FileClassifier};
use crate::config::Config;
use crate::error::{ConfigError, ScanError, StagingError};
use crate::generator::describe_directory;
use crate::publisher::{PublishResult, Publisher};
use crate::report::PublishReport;
use crate::scanner::{FileEntry, Scanner};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Runs scan, classify, assemble, stage and publish in sequence.
pub struct Organizer {
    config: Config,
    classifier: FileClassifier,
    progress: bool,
}

impl Organizer {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = FileClassifier::new(&config.classify, config.scan.max_content_bytes)?;

        Ok(Self {
            config,
            classifier,
            progress: false,
        })
    }

    /// Show a progress bar while publishing.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &FileClassifier {
        &self.classifier
    }

    /// Scan, classify and assemble without touching the filesystem.
    pub fn plan(&self, input: &Path) -> Result<Assembly, ScanError> {
        let scanner = Scanner::new(&self.config.scan)
            .with_hashing(self.config.assemble.dedup)
            .excluding(self.config.staging.root.clone());

        let entries = scanner.scan(input)?;
        let classified = self.classifier.classify_all(entries);

        let ambiguous = classified.iter().filter(|(_, c)| c.ambiguity > 0).count();
        if ambiguous > 0 {
            info!("{} file(s) matched several rules; resolved by precedence", ambiguous);
        }

        Ok(ProjectAssembler::new(&self.config.assemble)
            .with_content_limit(self.config.scan.max_content_bytes)
            .assemble(classified))
    }

    /// Copy every group into the staging root. Returns the root actually used.
    pub fn stage(&self, assembly: &mut Assembly) -> Result<(PathBuf, Vec<StageFailure>), StagingError> {
        let root = prepare_staging_root(&self.config.staging.root, self.config.staging.clean)?;
        info!("Creating project structure in: {}", root.display());
        let failures = assembly.stage(&root);
        Ok((root, failures))
    }

    /// Publish each non-empty group once. Failures are recorded and never stop the run.
    pub fn publish_all(
        &self,
        assembly: &Assembly,
        stage_failures: &[StageFailure],
        publisher: &mut dyn Publisher,
    ) -> PublishReport {
        let mut report = PublishReport {
            backend: Some(publisher.name().to_string()),
            ..Default::default()
        };

        let bar = self.progress_bar(assembly.groups.len() as u64);

        for group in &assembly.groups {
            bar.set_message(group.name.clone());

            if group.is_empty() {
                report.skipped_empty.push(group.name.clone());
                bar.inc(1);
                continue;
            }

            let result = match stage_failures.iter().find(|f| f.group == group.name) {
                Some(failure) => PublishResult::failed(&group.name, &failure.error),
                None => publisher.publish(group),
            };

            if result.success {
                info!("Published {}", group.name);
            } else {
                warn!(
                    "Failed to publish {}: {}",
                    group.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            report.record(result);
            bar.inc(1);
        }

        bar.finish_and_clear();
        report
    }

    /// Full pipeline: plan, stage, publish.
    pub fn run(&self, input: &Path, publisher: &mut dyn Publisher) -> anyhow::Result<(Assembly, PublishReport)> {
        let mut assembly = self.plan(input)?;
        let (root, failures) = self.stage(&mut assembly)?;
        let mut report = self.publish_all(&assembly, &failures, publisher);
        report.staging_root = Some(root);
        Ok((assembly, report))
    }

    /// Publish every subdirectory of an already organized directory as its own project.
    pub fn publish_staged(
        &self,
        dir: &Path,
        publisher: &mut dyn Publisher,
    ) -> Result<PublishReport, ScanError> {
        let groups = self.staged_groups(dir)?;
        let assembly = Assembly {
            groups,
            ..Default::default()
        };

        let mut report = self.publish_all(&assembly, &[], publisher);
        report.staging_root = Some(dir.to_path_buf());
        Ok(report)
    }

    /// One group per visible subdirectory that looks like a project, in name order,
    /// files as they are on disk. Names that collide after normalization get a `_2`,
    /// `_3`... suffix. Empty subdirectories come back as empty groups.
    pub fn staged_groups(&self, dir: &Path) -> Result<Vec<ProjectGroup>, ScanError> {
        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|source| ScanError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| {
                !p.file_name()
                    .map(|n| n.to_string_lossy().starts_with('.'))
                    .unwrap_or(true)
            })
            .collect();
        subdirs.sort();

        let scanner = Scanner::new(&self.config.scan);
        let mut taken: HashSet<String> = HashSet::new();
        let mut groups = Vec::new();

        for subdir in subdirs {
            let raw = subdir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let normalized = match normalize_name(&raw) {
                Some(name) => name,
                None => {
                    warn!("Skipping {}: not usable as a repository name", subdir.display());
                    continue;
                }
            };

            let files = scanner.scan(&subdir)?;
            if !files.is_empty() && !looks_like_project(&files) {
                info!("Skipping {}: no code and fewer than {} files", subdir.display(), MIN_LOOSE_FILES);
                continue;
            }

            let name = unique_name(&normalized, &mut taken);
            if name != normalized {
                warn!("{} also normalizes to {}; publishing it as {}", raw, normalized, name);
            }

            let description = describe_directory(&subdir, &name, &files);
            let mut group = if files.is_empty() {
                ProjectGroup {
                    name,
                    files,
                    confidence: 1.0,
                    language: String::new(),
                    description,
                    staging_path: None,
                    staged_files: Vec::new(),
                }
            } else {
                ProjectGroup {
                    description,
                    ..ProjectGroup::new(name, files, 1.0)
                }
            };
            group.staging_path = Some(subdir);
            groups.push(group);
        }

        Ok(groups)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar
    }
}

/// Fewer files than this, none of them code, is not worth a repository.
const MIN_LOOSE_FILES: usize = 3;

fn looks_like_project(files: &[FileEntry]) -> bool {
    files.iter().any(FileEntry::is_code) || files.len() >= MIN_LOOSE_FILES
}

fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{}_{}", name, counter);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
