pub mod description;
pub mod gitignore;
pub mod readme;

use crate::assembler::ProjectGroup;
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use description::{describe_directory, readme_description, summarize_files};
pub use gitignore::generate_gitignore;
pub use readme::generate_readme;

/// Files written into a staged project before its first commit.
#[derive(Debug, Clone, Default)]
pub struct ProjectFiles {
    pub files: BTreeMap<PathBuf, String>,
}

impl ProjectFiles {
    pub fn for_group(group: &ProjectGroup, owner: &str) -> Self {
        let mut files = BTreeMap::new();
        files.insert(PathBuf::from("README.md"), generate_readme(group, owner));
        files.insert(PathBuf::from(".gitignore"), generate_gitignore(&group.language));
        Self { files }
    }

    /// Write every file under `dir`. Files already present are left alone.
    /// Returns the paths that were written.
    pub fn write_to_disk(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (relative, content) in &self.files {
            let path = dir.join(relative);
            if path.exists() || (relative == Path::new("README.md") && has_readme(dir)) {
                debug!("Keeping existing {}", path.display());
                continue;
            }
            fs::write(&path, content)?;
            written.push(relative.clone());
        }

        Ok(written)
    }
}

fn has_readme(dir: &Path) -> bool {
    description::README_NAMES
        .iter()
        .any(|name| dir.join(name).exists())
}
