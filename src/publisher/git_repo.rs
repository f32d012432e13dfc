use crate::error::{PublishError, PublishOutcome};
use git2::{Branch, Commit, IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_BRANCH: &str = "main";

/// A git working copy for one staged project.
pub struct LocalRepository {
    repo: Repository,
    path: PathBuf,
}

impl LocalRepository {
    /// Open the repository at `path`, or create one with `main` as its initial branch.
    pub fn init_or_open(path: &Path) -> PublishOutcome<Self> {
        let repo = match Repository::open(path) {
            Ok(repo) => {
                debug!("Reusing existing repository at {}", path.display());
                repo
            }
            Err(_) => {
                let mut opts = RepositoryInitOptions::new();
                opts.initial_head(DEFAULT_BRANCH);
                let repo = Repository::init_opts(path, &opts)?;
                info!("Initialized git repository in {}", path.display());
                repo
            }
        };

        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stage everything not ignored, plus every path in `required` even when a
    /// .gitignore matches it, and commit. Returns `None` when the tree is unchanged.
    pub fn commit_all(&self, message: &str, required: &[PathBuf]) -> PublishOutcome<Option<Oid>> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;

        for path in required {
            // add_path ignores .gitignore
            index.add_path(path)?;
            if index.get_path(path, 0).is_none() {
                return Err(PublishError::NotCommitted(self.path.join(path)));
            }
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent: Option<Commit> = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };

        if let Some(parent) = &parent {
            if parent.tree_id() == tree_id {
                debug!("Nothing to commit in {}", self.path.display());
                return Ok(None);
            }
        }

        let signature = self.signature()?;
        let parents: Vec<&Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

        info!("Committed {} in {}", oid, self.path.display());
        Ok(Some(oid))
    }

    /// Rename the current branch to `main` if it is called something else.
    pub fn ensure_main_branch(&self) -> PublishOutcome<()> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(_) => return Ok(()),
        };

        if head.is_branch() && head.shorthand() != Some(DEFAULT_BRANCH) {
            let mut branch = Branch::wrap(head);
            branch.rename(DEFAULT_BRANCH, true)?;
            debug!("Renamed branch to {}", DEFAULT_BRANCH);
        }

        Ok(())
    }

    pub fn current_branch(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(str::to_string))
    }

    /// Add `origin`, or repoint it when it already exists with another URL.
    pub fn set_origin(&self, url: &str) -> PublishOutcome<()> {
        match self.repo.find_remote("origin") {
            Ok(remote) => {
                if remote.url() != Some(url) {
                    self.repo.remote_set_url("origin", url)?;
                    info!("Updated origin to {}", url);
                }
            }
            Err(_) => {
                self.repo.remote("origin", url)?;
                info!("Added origin {}", url);
            }
        }
        Ok(())
    }

    pub fn origin_url(&self) -> Option<String> {
        self.repo
            .find_remote("origin")
            .ok()
            .and_then(|r| r.url().map(str::to_string))
    }

    /// Push `main` to `origin` with the system git so credential helpers apply.
    pub fn push(&self, force: bool) -> PublishOutcome<()> {
        let mut args = vec!["push", "-u", "origin", DEFAULT_BRANCH];
        if force {
            args.push("--force");
        }
        run_git(&self.path, &args)
    }

    fn signature(&self) -> PublishOutcome<Signature<'static>> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Ok(Signature::now("dir2gh", "dir2gh@users.noreply.github.com")?),
        }
    }
}

pub fn run_git(dir: &Path, args: &[&str]) -> PublishOutcome<()> {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(|source| PublishError::Spawn {
            program: "git".into(),
            source,
        })?;

    if !output.status.success() {
        return Err(PublishError::Command {
            program: "git".into(),
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// `git --version` succeeds.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_init_commit_and_recommit() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "print(1)").unwrap();

        let repo = LocalRepository::init_or_open(dir.path()).unwrap();
        assert!(repo.commit_all("first", &[]).unwrap().is_some());
        assert_eq!(repo.current_branch().as_deref(), Some("main"));

        // unchanged tree
        assert!(repo.commit_all("again", &[]).unwrap().is_none());

        fs::write(dir.path().join("b.py"), "print(2)").unwrap();
        let reopened = LocalRepository::init_or_open(dir.path()).unwrap();
        assert!(reopened.commit_all("second", &[]).unwrap().is_some());
    }

    #[test]
    fn test_gitignored_files_are_not_committed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(dir.path().join("app.py"), "").unwrap();
        fs::write(dir.path().join("debug.log"), "noise").unwrap();

        let repo = LocalRepository::init_or_open(dir.path()).unwrap();
        let oid = repo.commit_all("init", &[]).unwrap().unwrap();

        let raw = Repository::open(dir.path()).unwrap();
        let tree = raw.find_commit(oid).unwrap().tree().unwrap();
        assert!(tree.get_name("app.py").is_some());
        assert!(tree.get_name(".gitignore").is_some());
        assert!(tree.get_name("debug.log").is_none());
    }

    #[test]
    fn test_required_files_are_committed_despite_gitignore() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log
*.env
").unwrap();
        fs::write(dir.path().join("app.py"), "").unwrap();
        fs::write(dir.path().join("debug.log"), "part of the project").unwrap();
        fs::write(dir.path().join("stray.log"), "noise").unwrap();

        let repo = LocalRepository::init_or_open(dir.path()).unwrap();
        let required = vec![PathBuf::from("app.py"), PathBuf::from("debug.log")];
        let oid = repo.commit_all("init", &required).unwrap().unwrap();

        let raw = Repository::open(dir.path()).unwrap();
        let tree = raw.find_commit(oid).unwrap().tree().unwrap();
        assert!(tree.get_name("debug.log").is_some());
        assert!(tree.get_name("stray.log").is_none());
    }

    #[test]
    fn test_missing_required_file_fails_the_commit() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "").unwrap();

        let repo = LocalRepository::init_or_open(dir.path()).unwrap();
        let err = repo
            .commit_all("init", &[PathBuf::from("gone.csv")])
            .unwrap_err();
        assert!(matches!(err, PublishError::NotCommitted(_) | PublishError::Git(_)));
    }

    #[test]
    fn test_set_origin_adds_then_updates() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::init_or_open(dir.path()).unwrap();

        repo.set_origin("https://github.com/a/x.git").unwrap();
        assert_eq!(repo.origin_url().as_deref(), Some("https://github.com/a/x.git"));

        repo.set_origin("https://github.com/b/x.git").unwrap();
        assert_eq!(repo.origin_url().as_deref(), Some("https://github.com/b/x.git"));
    }

    #[test]
    fn test_existing_branch_renamed_to_main() {
        let dir = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        Repository::init_opts(dir.path(), &opts).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let repo = LocalRepository::init_or_open(dir.path()).unwrap();
        repo.commit_all("init", &[]).unwrap();
        assert_eq!(repo.current_branch().as_deref(), Some("master"));

        repo.ensure_main_branch().unwrap();
        assert_eq!(repo.current_branch().as_deref(), Some("main"));
    }
}
