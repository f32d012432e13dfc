use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Rule {index}: invalid glob '{pattern}': {source}")]
    InvalidGlob {
        index: usize,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Rule {index}: invalid regex '{pattern}': {source}")]
    InvalidRegex {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule {index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("min_group_size must be at least 1")]
    InvalidThreshold,

    #[error("misc_name '{0}' is not a valid project name (use lower-case letters, digits, '.', '_' or '-')")]
    InvalidMiscName(String),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Project '{0}' has not been staged")]
    NotStaged(String),

    #[error("{0} could not be added to the commit")]
    NotCommitted(PathBuf),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("'{program} {args}' failed: {stderr}")]
    Command {
        program: String,
        args: String,
        stderr: String,
    },

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Environment variable {0} is not set")]
    MissingToken(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PublishOutcome<T> = std::result::Result<T, PublishError>;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to prepare staging directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
