use crate::classifier::normalize_name;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration, loaded from TOML or built from defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub classify: ClassifyConfig,
    pub assemble: AssembleConfig,
    pub staging: StagingConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names pruned from the walk
    pub skip_dirs: Vec<String>,
    pub include_hidden: bool,
    /// Upper bound on bytes read for content rules
    pub max_content_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_dirs: [
                ".git", "__pycache__", "node_modules", ".venv", "venv", "env",
                ".pytest_cache", "dist", "build", "target", ".idea", ".vscode",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            include_hidden: false,
            max_content_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Directory names too vague to name a project after; `{dir}` skips past them
    pub generic_dir_names: Vec<String>,
    /// Evaluated in order, first match wins
    pub rules: Vec<RuleSpec>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        let code: Vec<String> = CODE_EXTENSIONS.iter().map(|s| s.to_string()).collect();

        Self {
            generic_dir_names: vec!["src".into(), "code".into(), "files".into()],
            rules: vec![
                RuleSpec {
                    matcher: MatcherSpec::Extension { extensions: code.clone() },
                    target: "{dir}".into(),
                    confidence: Some(0.8),
                },
                RuleSpec {
                    matcher: MatcherSpec::Extension { extensions: code },
                    target: "{main}_project".into(),
                    confidence: Some(0.5),
                },
            ],
        }
    }
}

/// One entry of the precedence-ordered rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(rename = "match")]
    pub matcher: MatcherSpec,
    /// Group name template; may contain `{dir}` and `{stem}`
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatcherSpec {
    /// Glob tested against every ancestor directory name
    Directory { name: String },
    /// Glob tested against the path relative to the scan root
    Glob { pattern: String },
    Extension { extensions: Vec<String> },
    /// Regex tested against the file name
    Keyword { pattern: String },
    /// Regex tested against the leading bytes of the file
    Content { pattern: String },
}

impl MatcherSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            MatcherSpec::Directory { .. } => "directory",
            MatcherSpec::Glob { .. } => "glob",
            MatcherSpec::Extension { .. } => "extension",
            MatcherSpec::Keyword { .. } => "keyword",
            MatcherSpec::Content { .. } => "content",
        }
    }

    pub fn default_confidence(&self) -> f32 {
        match self {
            MatcherSpec::Directory { .. } => 0.9,
            MatcherSpec::Glob { .. } => 0.85,
            MatcherSpec::Extension { .. } => 0.7,
            MatcherSpec::Content { .. } => 0.6,
            MatcherSpec::Keyword { .. } => 0.5,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MatcherSpec::Directory { name } => format!("directory {}", name),
            MatcherSpec::Glob { pattern } => format!("path {}", pattern),
            MatcherSpec::Extension { extensions } => format!("extension {}", extensions.join(",")),
            MatcherSpec::Keyword { pattern } => format!("name /{}/", pattern),
            MatcherSpec::Content { pattern } => format!("content /{}/", pattern),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssembleConfig {
    /// Groups smaller than this are folded into the misc group
    pub min_group_size: usize,
    /// Used verbatim as a directory and repository name
    pub misc_name: String,
    /// Skip files whose content hash was already seen
    pub dedup: bool,
    /// Unclassified files follow their directory's sole group
    pub attach_siblings: bool,
    /// Split groups of many code files in several languages that never reference each other
    pub split_incohesive: bool,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            min_group_size: 2,
            misc_name: "misc".into(),
            dedup: false,
            attach_siblings: true,
            split_incohesive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub root: PathBuf,
    /// Remove a non-empty staging root instead of picking a timestamped sibling
    pub clean: bool,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("organized_projects"),
            clean: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// `gh` when it is installed and authenticated, otherwise local only
    Auto,
    Gh,
    Api,
    Local,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Auto
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Account that owns created repositories; looked up from the backend when empty
    pub owner: String,
    pub private: bool,
    pub backend: Backend,
    pub gh_command: String,
    pub token_env: String,
    pub api_base: String,
    pub force_push: bool,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub commit_message: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            private: false,
            backend: Backend::Auto,
            gh_command: "gh".into(),
            token_env: "GITHUB_TOKEN".into(),
            api_base: "https://api.github.com".into(),
            force_push: true,
            retries: 2,
            retry_delay_ms: 1000,
            commit_message: "Initial commit: Organized project with documentation".into(),
        }
    }
}

/// Extensions the default rules treat as project material.
pub const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "java", "cpp", "c", "cs", "php", "rb", "go",
    "rs", "swift", "kt", "scala", "r", "m", "pl", "sh", "sql",
    "html", "css", "xml", "json", "yaml", "yml", "md", "txt", "ipynb",
];

pub const DATA_EXTENSIONS: &[&str] = &[
    "csv", "xlsx", "pdf", "docx", "pptx", "png", "jpg", "jpeg",
    "gif", "svg", "zip", "tar", "gz",
];

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks policy values; rule patterns are checked when the classifier is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assemble.min_group_size == 0 {
            return Err(ConfigError::InvalidThreshold);
        }

        let misc = &self.assemble.misc_name;
        if normalize_name(misc).as_deref() != Some(misc.as_str()) {
            return Err(ConfigError::InvalidMiscName(misc.clone()));
        }

        for (index, rule) in self.classify.rules.iter().enumerate() {
            if rule.target.trim().is_empty() {
                return Err(ConfigError::InvalidRule {
                    index,
                    reason: "target is empty".into(),
                });
            }
            if let Some(confidence) = rule.confidence {
                if !(0.0..=1.0).contains(&confidence) {
                    return Err(ConfigError::InvalidRule {
                        index,
                        reason: format!("confidence {} is outside 0..=1", confidence),
                    });
                }
            }
        }

        Ok(())
    }
}
