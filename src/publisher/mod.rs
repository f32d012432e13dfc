pub mod git_repo;
pub mod host;
pub mod retry;

use crate::assembler::ProjectGroup;
use crate::config::{Backend, PublishConfig};
use crate::error::{PublishError, PublishOutcome};
use crate::generator::ProjectFiles;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub use git_repo::{git_available, LocalRepository};
pub use host::{GhCliHost, GitHubApiHost, RemoteHost, RemoteRepo, RepoSpec};
pub use retry::{with_retry, RetryPolicy};

/// Outcome of publishing one project group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub project: String,
    /// `owner/name` on the remote, if one was involved
    pub remote: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl PublishResult {
    pub fn succeeded(project: &str, remote: Option<String>) -> Self {
        Self {
            project: project.to_string(),
            remote,
            success: true,
            error: None,
        }
    }

    pub fn failed(project: &str, error: impl ToString) -> Self {
        Self {
            project: project.to_string(),
            remote: None,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// The boundary to wherever projects end up. Called once per non-empty group.
pub trait Publisher {
    fn name(&self) -> &str;

    fn publish(&mut self, group: &ProjectGroup) -> PublishResult;
}

/// Git init, README/.gitignore and the initial commit inside the staged directory.
pub fn prepare_local_repository(
    dir: &Path,
    group: &ProjectGroup,
    owner: &str,
    commit_message: &str,
) -> PublishOutcome<LocalRepository> {
    let repo = LocalRepository::init_or_open(dir)?;

    let written = ProjectFiles::for_group(group, owner).write_to_disk(dir)?;
    for file in &written {
        info!("Created {} for {}", file.display(), group.name);
    }

    repo.commit_all(commit_message, &group.staged_files)?;
    repo.ensure_main_branch()?;
    Ok(repo)
}

fn staged_dir(group: &ProjectGroup) -> PublishOutcome<&Path> {
    group
        .staging_path
        .as_deref()
        .ok_or_else(|| PublishError::NotStaged(group.name.clone()))
}

/// Creates local repositories only. Used when no remote host is available.
pub struct LocalPublisher {
    owner: String,
    commit_message: String,
}

impl LocalPublisher {
    pub fn new(owner: impl Into<String>, commit_message: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            commit_message: commit_message.into(),
        }
    }
}

impl Publisher for LocalPublisher {
    fn name(&self) -> &str {
        "local"
    }

    fn publish(&mut self, group: &ProjectGroup) -> PublishResult {
        let outcome = staged_dir(group).and_then(|dir| {
            prepare_local_repository(dir, group, &self.owner, &self.commit_message)
        });

        match outcome {
            Ok(_) => PublishResult::succeeded(&group.name, None),
            Err(e) => PublishResult::failed(&group.name, e),
        }
    }
}

/// Local repository, remote repository through `H`, then a push of `main`.
pub struct GitHubPublisher<H: RemoteHost> {
    host: H,
    owner: String,
    private: bool,
    force_push: bool,
    retry: RetryPolicy,
    commit_message: String,
}

impl<H: RemoteHost> GitHubPublisher<H> {
    pub fn new(host: H, owner: impl Into<String>, config: &PublishConfig) -> Self {
        Self {
            host,
            owner: owner.into(),
            private: config.private,
            force_push: config.force_push,
            retry: RetryPolicy {
                retries: config.retries,
                delay: Duration::from_millis(config.retry_delay_ms),
            },
            commit_message: config.commit_message.clone(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn try_publish(&mut self, group: &ProjectGroup) -> PublishOutcome<String> {
        let dir = staged_dir(group)?;
        let repo = prepare_local_repository(dir, group, &self.owner, &self.commit_message)?;

        let spec = RepoSpec {
            owner: &self.owner,
            name: &group.name,
            description: &group.description,
            private: self.private,
        };
        let host = &mut self.host;
        let remote = with_retry("create repository", &self.retry, || host.ensure_repository(&spec))?;

        repo.set_origin(&remote.clone_url)?;

        let force_push = self.force_push;
        with_retry("push", &self.retry, || match repo.push(false) {
            Ok(()) => Ok(()),
            Err(e) if force_push => {
                warn!("Push to {} rejected ({}), forcing", remote.full_name, e);
                repo.push(true)
            }
            Err(e) => Err(e),
        })?;

        info!("Pushed {} to {}", group.name, remote.full_name);
        Ok(remote.full_name)
    }
}

impl<H: RemoteHost> Publisher for GitHubPublisher<H> {
    fn name(&self) -> &str {
        self.host.name()
    }

    fn publish(&mut self, group: &ProjectGroup) -> PublishResult {
        match self.try_publish(group) {
            Ok(remote) => PublishResult::succeeded(&group.name, Some(remote)),
            Err(e) => PublishResult::failed(&group.name, e),
        }
    }
}

/// Pick a backend from the config. With an empty `owner` the host is asked who it is
/// logged in as.
pub fn build_publisher(config: &PublishConfig) -> PublishOutcome<Box<dyn Publisher>> {
    if !git_available() {
        return Err(PublishError::Spawn {
            program: "git".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "git is not installed"),
        });
    }

    match config.backend {
        Backend::Local => Ok(Box::new(LocalPublisher::new(
            config.owner.clone(),
            config.commit_message.clone(),
        ))),
        Backend::Gh => {
            let host = GhCliHost::detect(&config.gh_command).ok_or_else(|| PublishError::Command {
                program: config.gh_command.clone(),
                args: "auth status".into(),
                stderr: "GitHub CLI is not installed or not authenticated".into(),
            })?;
            remote_publisher(host, config)
        }
        Backend::Api => {
            let host = GitHubApiHost::from_env(&config.api_base, &config.token_env)?;
            remote_publisher(host, config)
        }
        Backend::Auto => match GhCliHost::detect(&config.gh_command) {
            Some(host) => remote_publisher(host, config),
            None => {
                warn!("GitHub CLI not found. Will create local repos only.");
                Ok(Box::new(LocalPublisher::new(
                    config.owner.clone(),
                    config.commit_message.clone(),
                )))
            }
        },
    }
}

fn remote_publisher<H: RemoteHost + 'static>(
    mut host: H,
    config: &PublishConfig,
) -> PublishOutcome<Box<dyn Publisher>> {
    let owner = if config.owner.is_empty() {
        let owner = host.authenticated_owner()?;
        info!("Publishing as {}", owner);
        owner
    } else {
        config.owner.clone()
    };

    Ok(Box::new(GitHubPublisher::new(host, owner, config)))
}
