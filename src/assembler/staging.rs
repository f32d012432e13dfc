use super::{Assembly, ProjectGroup};
use crate::error::StagingError;
use chrono::Local;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A group whose files could not all be copied; it is not published.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub group: String,
    pub error: String,
}

/// Pick the directory to stage into.
///
/// A missing or empty `root` is used as is. A non-empty one is wiped when `clean` is set,
/// otherwise a timestamped sibling (`<root>_YYYYmmdd_HHMMSS`) is created next to it.
pub fn prepare_staging_root(root: &Path, clean: bool) -> Result<PathBuf, StagingError> {
    let prepare_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| StagingError::Prepare { path, source }
    };

    if root.exists() {
        let occupied = fs::read_dir(root)
            .map_err(prepare_err(root))?
            .next()
            .is_some();

        if occupied {
            if clean {
                info!("Removing existing staging directory: {}", root.display());
                fs::remove_dir_all(root).map_err(prepare_err(root))?;
            } else {
                let stamped = timestamped_sibling(root);
                warn!(
                    "Staging directory {} is not empty, using {}",
                    root.display(),
                    stamped.display()
                );
                fs::create_dir_all(&stamped).map_err(prepare_err(&stamped))?;
                return Ok(stamped);
            }
        }
    }

    fs::create_dir_all(root).map_err(prepare_err(root))?;
    Ok(root.to_path_buf())
}

fn timestamped_sibling(root: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "organized_projects".to_string());

    let stamped = root.with_file_name(format!("{}_{}", name, stamp));
    if !stamped.exists() {
        return stamped;
    }

    // Same second as an earlier run
    let mut counter = 2;
    loop {
        let candidate = root.with_file_name(format!("{}_{}_{}", name, stamp, counter));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Whether `name` is a sibling [`prepare_staging_root`] could have created for a root
/// named `base`: `<base>_YYYYmmdd_HHMMSS`, optionally followed by `_<n>`.
pub fn is_timestamped_sibling(name: &str, base: &str) -> bool {
    let stamp = match name
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('_'))
    {
        Some(stamp) => stamp,
        None => return false,
    };

    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    let mut parts = stamp.split('_');

    let date = parts.next().map_or(false, |p| digits(p, 8));
    let time = parts.next().map_or(false, |p| digits(p, 6));
    let counter = match parts.next() {
        None => true,
        Some(p) => !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()),
    };

    date && time && counter && parts.next().is_none()
}

impl Assembly {
    /// Copy every group's files under `root/<group>/`. The originals are never touched.
    ///
    /// A group with a failed copy has its partial directory removed and is reported
    /// back instead of being staged.
    pub fn stage(&mut self, root: &Path) -> Vec<StageFailure> {
        let mut failures = Vec::new();

        for group in &mut self.groups {
            if group.is_empty() {
                continue;
            }

            let dir = root.join(&group.name);
            match stage_group(group, &dir) {
                Ok(staged) => {
                    info!("Staged {} file(s) for {}", group.files.len(), group.name);
                    group.staging_path = Some(dir);
                    group.staged_files = staged;
                }
                Err(e) => {
                    warn!("Could not stage {}: {}", group.name, e);
                    if dir.exists() {
                        let _ = fs::remove_dir_all(&dir);
                    }
                    group.staging_path = None;
                    group.staged_files.clear();
                    failures.push(StageFailure {
                        group: group.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        failures
    }
}

/// Returns the names the files were copied under.
fn stage_group(group: &ProjectGroup, dir: &Path) -> Result<Vec<PathBuf>, StagingError> {
    fs::create_dir_all(dir).map_err(|source| StagingError::Prepare {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut taken: HashSet<String> = HashSet::new();
    let mut staged = Vec::with_capacity(group.files.len());

    for file in &group.files {
        let name = staged_name(&file.name, &file.relative_path, &mut taken);
        let target = dir.join(&name);

        debug!("Copying {} -> {}", file.path.display(), target.display());
        fs::copy(&file.path, &target).map_err(|source| StagingError::Copy {
            from: file.path.clone(),
            to: target.clone(),
            source,
        })?;
        staged.push(PathBuf::from(name));
    }

    Ok(staged)
}

/// Flat file name, or the relative path flattened with `_` when the name is already used.
fn staged_name(name: &str, relative: &Path, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let flattened = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("_");
    if taken.insert(flattened.clone()) {
        return flattened;
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{}_{}", counter, flattened);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::ProjectGroup;
    use crate::scanner::FileEntry;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> FileEntry {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        FileEntry::new(root, &path, content.len() as u64)
    }

    fn group(name: &str, files: Vec<FileEntry>) -> ProjectGroup {
        ProjectGroup {
            name: name.into(),
            files,
            confidence: 1.0,
            language: "Python".into(),
            description: String::new(),
            staging_path: None,
            staged_files: Vec::new(),
        }
    }

    #[test]
    fn test_stage_copies_and_keeps_originals() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let a = write(input.path(), "a.py", "print('a')");
        let b = write(input.path(), "sub/b.py", "print('b')");

        let mut assembly = Assembly {
            groups: vec![group("scripts", vec![a.clone(), b.clone()])],
            ..Default::default()
        };
        let failures = assembly.stage(output.path());

        assert!(failures.is_empty());
        let staged = assembly.groups[0].staging_path.clone().unwrap();
        assert_eq!(staged, output.path().join("scripts"));
        assert_eq!(fs::read_to_string(staged.join("a.py")).unwrap(), "print('a')");
        assert_eq!(fs::read_to_string(staged.join("b.py")).unwrap(), "print('b')");
        assert!(a.path.exists());
        assert!(b.path.exists());
        assert_eq!(
            assembly.groups[0].staged_files,
            vec![PathBuf::from("a.py"), PathBuf::from("b.py")]
        );
    }

    #[test]
    fn test_name_collisions_are_flattened() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let first = write(input.path(), "one/main.py", "1");
        let second = write(input.path(), "two/main.py", "2");

        let mut assembly = Assembly {
            groups: vec![group("mains", vec![first, second])],
            ..Default::default()
        };
        assembly.stage(output.path());

        let dir = output.path().join("mains");
        assert_eq!(fs::read_to_string(dir.join("main.py")).unwrap(), "1");
        assert_eq!(fs::read_to_string(dir.join("two_main.py")).unwrap(), "2");
    }

    #[test]
    fn test_missing_source_fails_only_that_group() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let good = write(input.path(), "good.py", "ok");
        let ghost = FileEntry::new(input.path(), &input.path().join("ghost.py"), 0);

        let mut assembly = Assembly {
            groups: vec![group("broken", vec![ghost]), group("fine", vec![good])],
            ..Default::default()
        };
        let failures = assembly.stage(output.path());

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].group, "broken");
        assert!(assembly.groups[0].staging_path.is_none());
        assert!(!output.path().join("broken").exists());
        assert!(assembly.groups[1].staging_path.is_some());
    }

    #[test]
    fn test_prepare_root_uses_sibling_when_occupied() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("organized_projects");
        fs::create_dir_all(root.join("old")).unwrap();

        let chosen = prepare_staging_root(&root, false).unwrap();
        assert_ne!(chosen, root);
        assert!(chosen.exists());
        assert!(root.join("old").exists());

        let cleaned = prepare_staging_root(&root, true).unwrap();
        assert_eq!(cleaned, root);
        assert!(!root.join("old").exists());
    }

    #[test]
    fn test_repeated_runs_get_distinct_siblings() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("staged");
        fs::create_dir_all(root.join("old")).unwrap();

        let first = prepare_staging_root(&root, false).unwrap();
        fs::write(first.join("marker"), "1").unwrap();
        let second = prepare_staging_root(&root, false).unwrap();

        assert_ne!(first, second);
        for dir in [&first, &second] {
            let name = dir.file_name().unwrap().to_string_lossy().into_owned();
            assert!(is_timestamped_sibling(&name, "staged"), "{}", name);
        }
    }

    #[test]
    fn test_timestamped_sibling_names() {
        assert!(is_timestamped_sibling("out_20240131_235959", "out"));
        assert!(is_timestamped_sibling("out_20240131_235959_3", "out"));
        assert!(!is_timestamped_sibling("out", "out"));
        assert!(!is_timestamped_sibling("out_backup", "out"));
        assert!(!is_timestamped_sibling("out_2024_235959", "out"));
        assert!(!is_timestamped_sibling("output_20240131_235959", "out"));
        assert!(!is_timestamped_sibling("out_20240131_235959_", "out"));
    }

    #[test]
    fn test_prepare_root_creates_missing() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("fresh");
        assert_eq!(prepare_staging_root(&root, false).unwrap(), root);
        assert!(root.is_dir());
    }
}
