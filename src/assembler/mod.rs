pub mod cohesion;
pub mod staging;

use crate::classifier::{dominant_language, Candidate, Classification};
use crate::classifier::language::MIXED;
use crate::config::AssembleConfig;
use crate::scanner::FileEntry;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

pub use staging::{is_timestamped_sibling, prepare_staging_root, StageFailure};

/// Confidence given to a file that joined a group through its directory siblings.
const SIBLING_CONFIDENCE: f32 = 0.3;

const DEFAULT_CONTENT_LIMIT: u64 = 64 * 1024;

/// A named cluster of files that will be published as one repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectGroup {
    pub name: String,
    /// Discovery order
    pub files: Vec<FileEntry>,
    pub confidence: f32,
    pub language: String,
    pub description: String,
    pub staging_path: Option<PathBuf>,
    /// Names of the copied files inside `staging_path`; empty for directories that
    /// were not staged by this crate
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub staged_files: Vec<PathBuf>,
}

impl ProjectGroup {
    /// Derives language and description from the files.
    pub fn new(name: String, files: Vec<FileEntry>, confidence: f32) -> Self {
        let language = dominant_language(&files).to_string();
        let description = if files.len() == 1 {
            format!("Single-file project: {}", files[0].name)
        } else {
            format!("Multi-file {} project", language)
        };

        Self {
            name,
            files,
            confidence,
            language,
            description,
            staging_path: None,
            staged_files: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn code_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(|f| f.is_code())
    }

    pub fn data_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(|f| f.is_data())
    }
}

/// A file dropped by dedup because an earlier file had the same content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Duplicate {
    pub entry: FileEntry,
    pub original: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assembly {
    /// Order of first discovery, misc last
    pub groups: Vec<ProjectGroup>,
    pub duplicates: Vec<Duplicate>,
    /// Groups folded into misc for being under the size threshold
    pub merged_into_misc: Vec<String>,
}

impl Assembly {
    pub fn group(&self, name: &str) -> Option<&ProjectGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }
}

struct Member {
    order: usize,
    entry: FileEntry,
    confidence: f32,
}

pub struct ProjectAssembler {
    min_group_size: usize,
    misc_name: String,
    dedup: bool,
    attach_siblings: bool,
    split_incohesive: bool,
    content_limit: u64,
}

impl ProjectAssembler {
    pub fn new(config: &AssembleConfig) -> Self {
        Self {
            min_group_size: config.min_group_size.max(1),
            misc_name: config.misc_name.clone(),
            dedup: config.dedup,
            attach_siblings: config.attach_siblings,
            split_incohesive: config.split_incohesive,
            content_limit: DEFAULT_CONTENT_LIMIT,
        }
    }

    /// Bytes read from each code file when checking whether a group hangs together.
    pub fn with_content_limit(mut self, limit: u64) -> Self {
        self.content_limit = limit;
        self
    }

    pub fn assemble(&self, classified: Vec<(FileEntry, Classification)>) -> Assembly {
        let mut assembly = Assembly::default();

        let classified = if self.dedup {
            self.remove_duplicates(classified, &mut assembly.duplicates)
        } else {
            classified
        };

        let sibling_groups = if self.attach_siblings {
            directory_groups(&classified)
        } else {
            HashMap::new()
        };

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut grouped: Vec<(String, Vec<Member>)> = Vec::new();
        let mut misc: Vec<Member> = Vec::new();

        for (order, (entry, classification)) in classified.into_iter().enumerate() {
            let (name, confidence) = match classification.candidate {
                Candidate::Group(name) => (Some(name), classification.confidence),
                Candidate::Unclassified => match sibling_groups.get(&entry.directory()) {
                    Some(Some(name)) => {
                        debug!("{} follows its siblings into {}", entry.relative_path.display(), name);
                        (Some(name.clone()), SIBLING_CONFIDENCE)
                    }
                    _ => (None, 0.0),
                },
            };

            let member = Member { order, entry, confidence };

            match name {
                Some(name) if name != self.misc_name => {
                    let slot = *index.entry(name.clone()).or_insert_with(|| {
                        grouped.push((name, Vec::new()));
                        grouped.len() - 1
                    });
                    grouped[slot].1.push(member);
                }
                _ => misc.push(member),
            }
        }

        let grouped = if self.split_incohesive {
            self.split_incohesive_groups(grouped)
        } else {
            grouped
        };

        for (name, members) in grouped {
            if name == self.misc_name {
                misc.extend(members);
            } else if members.len() < self.min_group_size {
                debug!(
                    "{} has {} file(s), below the minimum of {}; merging into {}",
                    name,
                    members.len(),
                    self.min_group_size,
                    self.misc_name
                );
                assembly.merged_into_misc.push(name);
                misc.extend(members);
            } else {
                assembly.groups.push(build_group(name, members, false));
            }
        }

        if !misc.is_empty() {
            misc.sort_by_key(|m| m.order);
            assembly.groups.push(build_group(self.misc_name.clone(), misc, true));
        }

        info!(
            "Assembled {} project(s) from {} file(s)",
            assembly.groups.len(),
            assembly.total_files()
        );
        assembly
    }

    /// Replace groups whose code files don't belong together with one group per code
    /// file. A split part that shares a name with another group joins it.
    fn split_incohesive_groups(&self, grouped: Vec<(String, Vec<Member>)>) -> Vec<(String, Vec<Member>)> {
        let mut result: Vec<(String, Vec<Member>)> = Vec::new();

        for (name, members) in grouped {
            let code: Vec<&FileEntry> = members
                .iter()
                .map(|m| &m.entry)
                .filter(|e| e.is_code())
                .collect();

            let parts = if cohesion::is_cohesive(&code, |f| f.read_prefix(self.content_limit)) {
                vec![(name, members)]
            } else {
                info!("{} mixes unrelated code files; splitting by file", name);
                cohesion::split_members(&name, members)
            };

            for (part, mut list) in parts {
                match result.iter_mut().find(|(n, _)| *n == part) {
                    Some((_, existing)) => {
                        existing.append(&mut list);
                        existing.sort_by_key(|m| m.order);
                    }
                    None => result.push((part, list)),
                }
            }
        }

        result
    }

    fn remove_duplicates(
        &self,
        classified: Vec<(FileEntry, Classification)>,
        duplicates: &mut Vec<Duplicate>,
    ) -> Vec<(FileEntry, Classification)> {
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut kept = Vec::with_capacity(classified.len());

        for (entry, classification) in classified {
            if let Some(hash) = entry.content_hash.clone() {
                if let Some(original) = seen.get(&hash) {
                    debug!(
                        "{} duplicates {}",
                        entry.relative_path.display(),
                        original.display()
                    );
                    duplicates.push(Duplicate {
                        original: original.clone(),
                        entry,
                    });
                    continue;
                }
                seen.insert(hash, entry.relative_path.clone());
            }
            kept.push((entry, classification));
        }

        kept
    }
}

/// For each directory: `Some(name)` when every classified file in it shares one group,
/// `None` when classified files disagree.
fn directory_groups(
    classified: &[(FileEntry, Classification)],
) -> HashMap<PathBuf, Option<String>> {
    let mut groups: HashMap<PathBuf, Option<String>> = HashMap::new();

    for (entry, classification) in classified {
        let name = match classification.candidate.group_name() {
            Some(name) => name,
            None => continue,
        };
        groups
            .entry(entry.directory())
            .and_modify(|current| {
                if current.as_deref() != Some(name) {
                    *current = None;
                }
            })
            .or_insert_with(|| Some(name.to_string()));
    }

    groups
}

fn build_group(name: String, members: Vec<Member>, is_misc: bool) -> ProjectGroup {
    let confidence = if members.is_empty() {
        0.0
    } else {
        members.iter().map(|m| m.confidence).sum::<f32>() / members.len() as f32
    };
    let files: Vec<FileEntry> = members.into_iter().map(|m| m.entry).collect();

    if is_misc {
        ProjectGroup {
            name,
            files,
            confidence,
            language: MIXED.to_string(),
            description: "Miscellaneous files that don't belong to specific projects".to_string(),
            staging_path: None,
            staged_files: Vec::new(),
        }
    } else {
        ProjectGroup::new(name, files, confidence)
    }
}
