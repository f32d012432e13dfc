use super::rules::Rule;
use crate::config::ClassifyConfig;
use crate::error::ConfigError;
use crate::scanner::FileEntry;
use log::debug;
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Candidate {
    /// Belongs to the named project group
    Group(String),
    /// No rule matched; lands in the misc group
    Unclassified,
}

impl Candidate {
    pub fn group_name(&self) -> Option<&str> {
        match self {
            Candidate::Group(name) => Some(name),
            Candidate::Unclassified => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub candidate: Candidate,
    /// Index of the winning rule
    pub rule: Option<usize>,
    pub confidence: f32,
    /// Lower-precedence rules that matched with a different target
    pub ambiguity: usize,
    pub reason: String,
}

impl Classification {
    fn unclassified() -> Self {
        Self {
            candidate: Candidate::Unclassified,
            rule: None,
            confidence: 0.0,
            ambiguity: 0,
            reason: "No rule matched".to_string(),
        }
    }
}

pub struct FileClassifier {
    rules: Vec<Rule>,
    generic_dirs: Vec<String>,
    max_content_bytes: u64,
}

impl FileClassifier {
    pub fn new(config: &ClassifyConfig, max_content_bytes: u64) -> Result<Self, ConfigError> {
        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(index, spec)| Rule::compile(index, spec))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            generic_dirs: config.generic_dir_names.clone(),
            max_content_bytes,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify a single entry. `{main}` can only see the entry itself here, so it resolves
    /// to the entry's own stem when the entry is a code file.
    pub fn classify(&self, entry: &FileEntry) -> Classification {
        let main = if entry.is_code() { Some(entry.stem()) } else { None };
        self.classify_with_main(entry, main)
    }

    fn classify_with_main(&self, entry: &FileEntry, main: Option<&str>) -> Classification {
        let content: OnceCell<Option<String>> = OnceCell::new();
        let load = || {
            content
                .get_or_init(|| entry.read_prefix(self.max_content_bytes))
                .clone()
        };

        let mut winner: Option<(&Rule, String)> = None;
        let mut ambiguity = 0;

        for rule in &self.rules {
            if !rule.matcher.matches(entry, &load) {
                continue;
            }
            let target = match rule.resolve_target(entry, &self.generic_dirs, main) {
                Some(target) => target,
                None => continue,
            };

            match &winner {
                None => winner = Some((rule, target)),
                Some((_, chosen)) if *chosen != target => ambiguity += 1,
                Some(_) => {}
            }
        }

        match winner {
            Some((rule, target)) => {
                if ambiguity > 0 {
                    debug!(
                        "{} matched {} other rule(s); rule {} wins by precedence",
                        entry.relative_path.display(),
                        ambiguity,
                        rule.index
                    );
                }
                Classification {
                    reason: format!("Rule {} ({})", rule.index, rule.description),
                    candidate: Candidate::Group(target),
                    rule: Some(rule.index),
                    confidence: rule.confidence,
                    ambiguity,
                }
            }
            None => Classification::unclassified(),
        }
    }

    /// Classify a whole scan. `{main}` resolves to the largest code file of each directory.
    pub fn classify_all(&self, entries: Vec<FileEntry>) -> Vec<(FileEntry, Classification)> {
        let mains = main_files(&entries);

        entries
            .into_iter()
            .map(|entry| {
                let main = mains.get(&entry.directory()).map(String::as_str);
                let classification = self.classify_with_main(&entry, main);
                (entry, classification)
            })
            .collect()
    }
}

/// Stem of the largest code file per directory. Ties go to the file discovered first.
fn main_files(entries: &[FileEntry]) -> HashMap<PathBuf, String> {
    let mut largest: HashMap<PathBuf, &FileEntry> = HashMap::new();

    for entry in entries.iter().filter(|e| e.is_code()) {
        largest
            .entry(entry.directory())
            .and_modify(|current| {
                if entry.size > current.size {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }

    largest
        .into_iter()
        .map(|(dir, entry)| (dir, entry.stem().to_string()))
        .collect()
}
