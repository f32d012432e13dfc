use crate::error::{PublishError, PublishOutcome};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::process::{Command, Output};

/// GitHub rejects longer repository descriptions.
const MAX_DESCRIPTION_CHARS: usize = 100;

/// What to create on the remote side.
#[derive(Debug, Clone)]
pub struct RepoSpec<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub private: bool,
}

impl RepoSpec<'_> {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn short_description(&self) -> String {
        self.description.chars().take(MAX_DESCRIPTION_CHARS).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    /// `owner/name`
    pub full_name: String,
    pub clone_url: String,
    pub created: bool,
}

impl RemoteRepo {
    pub fn github(owner: &str, name: &str, created: bool) -> Self {
        Self {
            full_name: format!("{}/{}", owner, name),
            clone_url: format!("https://github.com/{}/{}.git", owner, name),
            created,
        }
    }
}

/// Repository creation on a hosting service. Authentication is the host's own business.
pub trait RemoteHost {
    fn name(&self) -> &'static str;

    /// Login of the account the host is authenticated as.
    fn authenticated_owner(&mut self) -> PublishOutcome<String>;

    /// Make sure the repository exists, creating it if needed.
    fn ensure_repository(&mut self, spec: &RepoSpec) -> PublishOutcome<RemoteRepo>;
}

/// Drives the `gh` command line client.
pub struct GhCliHost {
    command: String,
}

impl GhCliHost {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// `Some` when `gh auth status` succeeds.
    pub fn detect(command: &str) -> Option<Self> {
        let host = Self::new(command);
        match host.run(&["auth", "status"]) {
            Ok(output) if output.status.success() => {
                info!("GitHub CLI is installed and authenticated");
                Some(host)
            }
            Ok(_) => {
                debug!("{} is installed but not authenticated", command);
                None
            }
            Err(e) => {
                debug!("{} not usable: {}", command, e);
                None
            }
        }
    }

    fn run(&self, args: &[&str]) -> PublishOutcome<Output> {
        debug!("Running {} {}", self.command, args.join(" "));
        Command::new(&self.command)
            .args(args)
            .output()
            .map_err(|source| PublishError::Spawn {
                program: self.command.clone(),
                source,
            })
    }

    fn failure(&self, args: &[&str], output: &Output) -> PublishError {
        PublishError::Command {
            program: self.command.clone(),
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl RemoteHost for GhCliHost {
    fn name(&self) -> &'static str {
        "gh"
    }

    fn authenticated_owner(&mut self) -> PublishOutcome<String> {
        let args = ["api", "user", "--jq", ".login"];
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(self.failure(&args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn ensure_repository(&mut self, spec: &RepoSpec) -> PublishOutcome<RemoteRepo> {
        let full_name = spec.full_name();

        let view = self.run(&["repo", "view", full_name.as_str()])?;
        if view.status.success() {
            info!("Repository {} already exists, pushing to it", full_name);
            return Ok(RemoteRepo::github(spec.owner, spec.name, false));
        }

        let description = spec.short_description();
        let visibility = if spec.private { "--private" } else { "--public" };
        let args = [
            "repo",
            "create",
            full_name.as_str(),
            visibility,
            "--description",
            description.as_str(),
        ];
        let output = self.run(&args)?;

        if output.status.success() {
            info!("Created repository {}", full_name);
            return Ok(RemoteRepo::github(spec.owner, spec.name, true));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        if stderr.contains("already exists") {
            info!("Repository {} already exists, pushing to it", full_name);
            return Ok(RemoteRepo::github(spec.owner, spec.name, false));
        }

        Err(self.failure(&args, &output))
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    full_name: String,
    clone_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Talks to the GitHub REST API with a token taken from the environment.
pub struct GitHubApiHost {
    client: Client,
    base: String,
    token: String,
    login: Option<String>,
}

impl GitHubApiHost {
    pub fn from_env(base: &str, token_env: &str) -> PublishOutcome<Self> {
        let token = std::env::var(token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PublishError::MissingToken(token_env.to_string()))?;
        Self::new(base, token)
    }

    pub fn new(base: &str, token: String) -> PublishOutcome<Self> {
        let client = Client::builder()
            .user_agent(concat!("dir2gh/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            token,
            login: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get(&self, path: &str) -> PublishOutcome<reqwest::blocking::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()?)
    }

    fn api_error(response: reqwest::blocking::Response) -> PublishError {
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorResponse>()
            .map(|e| e.message)
            .unwrap_or_else(|_| "no message".to_string());
        PublishError::Api { status, message }
    }

    fn login(&mut self) -> PublishOutcome<String> {
        if let Some(login) = &self.login {
            return Ok(login.clone());
        }

        let response = self.get("/user")?;
        if !response.status().is_success() {
            return Err(Self::api_error(response));
        }
        let user: UserResponse = response.json()?;
        self.login = Some(user.login.clone());
        Ok(user.login)
    }

    /// Personal repositories go to `/user/repos`, anything else is treated as an organization.
    fn create_path(&mut self, owner: &str) -> PublishOutcome<String> {
        let login = self.login()?;
        if login.eq_ignore_ascii_case(owner) {
            Ok("/user/repos".to_string())
        } else {
            Ok(format!("/orgs/{}/repos", owner))
        }
    }
}

impl RemoteHost for GitHubApiHost {
    fn name(&self) -> &'static str {
        "api"
    }

    fn authenticated_owner(&mut self) -> PublishOutcome<String> {
        self.login()
    }

    fn ensure_repository(&mut self, spec: &RepoSpec) -> PublishOutcome<RemoteRepo> {
        let existing = self.get(&format!("/repos/{}/{}", spec.owner, spec.name))?;
        match existing.status() {
            status if status.is_success() => {
                let repo: RepoResponse = existing.json()?;
                info!("Repository {} already exists, pushing to it", repo.full_name);
                return Ok(RemoteRepo {
                    full_name: repo.full_name,
                    clone_url: repo.clone_url,
                    created: false,
                });
            }
            StatusCode::NOT_FOUND => {}
            _ => return Err(Self::api_error(existing)),
        }

        let path = self.create_path(spec.owner)?;
        let body = json!({
            "name": spec.name,
            "description": spec.short_description(),
            "private": spec.private,
        });

        let response = self
            .client
            .post(self.url(&path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()?;

        match response.status() {
            status if status.is_success() => {
                let repo: RepoResponse = response.json()?;
                info!("Created repository {}", repo.full_name);
                Ok(RemoteRepo {
                    full_name: repo.full_name,
                    clone_url: repo.clone_url,
                    created: true,
                })
            }
            // name already taken, usually a race with another run
            StatusCode::UNPROCESSABLE_ENTITY => {
                Ok(RemoteRepo::github(spec.owner, spec.name, false))
            }
            _ => Err(Self::api_error(response)),
        }
    }
}
