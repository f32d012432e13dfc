use crate::assembler::is_timestamped_sibling;
use crate::config::{ScanConfig, CODE_EXTENSIONS, DATA_EXTENSIONS};
use crate::error::ScanError;
use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A scanned file. Immutable once produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub name: String,
    /// Lower-case, without the leading dot; empty when the file has none
    pub extension: String,
    pub size: u64,
    pub content_hash: Option<String>,
}

impl FileEntry {
    pub fn new(root: &Path, path: &Path, size: u64) -> Self {
        let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            relative_path,
            name,
            extension,
            size,
            content_hash: None,
        }
    }

    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    /// Directory names between the scan root and the file, outermost first.
    pub fn ancestors(&self) -> Vec<String> {
        self.relative_path
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn directory(&self) -> PathBuf {
        self.relative_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    pub fn is_code(&self) -> bool {
        CODE_EXTENSIONS.contains(&self.extension.as_str())
    }

    pub fn is_data(&self) -> bool {
        DATA_EXTENSIONS.contains(&self.extension.as_str())
    }

    /// Up to `limit` bytes of the file, lossily decoded. `None` when it can't be read.
    pub fn read_prefix(&self, limit: u64) -> Option<String> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                debug!("Could not read {}: {}", self.path.display(), e);
                return None;
            }
        };

        let mut buffer = Vec::new();
        if let Err(e) = file.take(limit).read_to_end(&mut buffer) {
            debug!("Could not read {}: {}", self.path.display(), e);
            return None;
        }

        Some(String::from_utf8_lossy(&buffer).into_owned())
    }
}

pub struct Scanner {
    skip_dirs: Vec<String>,
    include_hidden: bool,
    hash_contents: bool,
    exclude: Option<PathBuf>,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            skip_dirs: config.skip_dirs.clone(),
            include_hidden: config.include_hidden,
            hash_contents: false,
            exclude: None,
        }
    }

    /// Compute a SHA-256 content hash for every entry.
    pub fn with_hashing(mut self, enabled: bool) -> Self {
        self.hash_contents = enabled;
        self
    }

    /// Prune the staging root from the walk, along with the timestamped siblings
    /// earlier runs staged beside it.
    pub fn excluding(mut self, path: PathBuf) -> Self {
        self.exclude = Some(path);
        self
    }

    pub fn scan(&self, root: &Path) -> Result<Vec<FileEntry>, ScanError> {
        if !root.exists() {
            return Err(ScanError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        info!("Scanning directory: {}", root.display());

        let exclude = self.exclude.as_deref().and_then(StagingExclusion::resolve);

        let mut entries = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.keep(e, exclude.as_ref()));

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    // Unreadable subtrees are skipped, the root itself is fatal
                    if e.depth() == 0 {
                        return Err(ScanError::Walk {
                            path: root.to_path_buf(),
                            source: e,
                        });
                    }
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    warn!("Could not stat {}: {}", entry.path().display(), e);
                    0
                }
            };

            let mut file = FileEntry::new(root, entry.path(), size);

            if self.hash_contents {
                match hash_file(entry.path()) {
                    Ok(hash) => file.content_hash = Some(hash),
                    Err(e) => warn!("Could not hash {}: {}", entry.path().display(), e),
                }
            }

            debug!("Found {}", file.relative_path.display());
            entries.push(file);
        }

        info!("Total files found: {}", entries.len());
        Ok(entries)
    }

    fn keep(&self, entry: &DirEntry, exclude: Option<&StagingExclusion>) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let name = entry.file_name().to_string_lossy();

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        if entry.file_type().is_dir() {
            if self.skip_dirs.iter().any(|d| d == name.as_ref()) {
                return false;
            }
            if let Some(excluded) = exclude {
                if excluded.covers(entry.path(), &name) {
                    debug!("Skipping staging directory {}", entry.path().display());
                    return false;
                }
            }
        }

        true
    }
}

/// The staging root, by canonical parent and name. The root itself may not exist yet.
struct StagingExclusion {
    parent: PathBuf,
    name: String,
}

impl StagingExclusion {
    fn resolve(root: &Path) -> Option<Self> {
        let name = root.file_name()?.to_string_lossy().into_owned();
        let parent = match root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Some(Self {
            parent: parent.canonicalize().ok()?,
            name,
        })
    }

    fn covers(&self, dir: &Path, name: &str) -> bool {
        if name != self.name && !is_timestamped_sibling(name, &self.name) {
            return false;
        }

        dir.parent()
            .and_then(|p| p.canonicalize().ok())
            .map_or(false, |p| p == self.parent)
    }
}

/// SHA-256 of the file contents as lower-case hex.
pub fn hash_file(path: &Path) -> Result<String, ScanError> {
    let io_err = |source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = file.read(&mut buffer).map_err(io_err)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
