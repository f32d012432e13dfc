use crate::config::{MatcherSpec, RuleSpec};
use crate::error::ConfigError;
use crate::scanner::FileEntry;
use glob::{MatchOptions, Pattern};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static INVALID_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9._-]").unwrap());

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled form of a [`MatcherSpec`].
#[derive(Debug, Clone)]
pub enum Matcher {
    Directory(Pattern),
    Glob(Pattern),
    Extension(HashSet<String>),
    Keyword(Regex),
    Content(Regex),
}

impl Matcher {
    pub fn compile(index: usize, spec: &MatcherSpec) -> Result<Self, ConfigError> {
        let glob = |pattern: &str| {
            Pattern::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                index,
                pattern: pattern.to_string(),
                source,
            })
        };
        let regex = |pattern: &str| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
                index,
                pattern: pattern.to_string(),
                source,
            })
        };

        Ok(match spec {
            MatcherSpec::Directory { name } => Matcher::Directory(glob(name)?),
            MatcherSpec::Glob { pattern } => Matcher::Glob(glob(pattern)?),
            MatcherSpec::Extension { extensions } => {
                if extensions.is_empty() {
                    return Err(ConfigError::InvalidRule {
                        index,
                        reason: "extension list is empty".into(),
                    });
                }
                Matcher::Extension(
                    extensions
                        .iter()
                        .map(|e| e.trim_start_matches('.').to_lowercase())
                        .collect(),
                )
            }
            MatcherSpec::Keyword { pattern } => Matcher::Keyword(regex(pattern)?),
            MatcherSpec::Content { pattern } => Matcher::Content(regex(pattern)?),
        })
    }

    /// `content` is only consulted by content matchers and is loaded on demand.
    pub fn matches<F>(&self, entry: &FileEntry, content: F) -> bool
    where
        F: FnOnce() -> Option<String>,
    {
        match self {
            Matcher::Directory(pattern) => entry
                .ancestors()
                .iter()
                .any(|dir| pattern.matches_with(dir, GLOB_OPTIONS)),
            Matcher::Glob(pattern) => {
                let rel = entry.relative_path.to_string_lossy().replace('\\', "/");
                pattern.matches_with(&rel, GLOB_OPTIONS)
            }
            Matcher::Extension(set) => set.contains(&entry.extension),
            Matcher::Keyword(regex) => regex.is_match(&entry.name),
            Matcher::Content(regex) => content().map_or(false, |text| regex.is_match(&text)),
        }
    }
}

/// One rule of the precedence list: a matcher, the group it points at and how sure it is.
#[derive(Debug, Clone)]
pub struct Rule {
    pub index: usize,
    pub matcher: Matcher,
    pub target: String,
    pub confidence: f32,
    pub description: String,
}

impl Rule {
    pub fn compile(index: usize, spec: &RuleSpec) -> Result<Self, ConfigError> {
        Ok(Self {
            index,
            matcher: Matcher::compile(index, &spec.matcher)?,
            target: spec.target.clone(),
            confidence: spec
                .confidence
                .unwrap_or_else(|| spec.matcher.default_confidence()),
            description: spec.matcher.describe(),
        })
    }

    /// Expand `{dir}`, `{stem}` and `{main}` for this entry. `None` when a placeholder has
    /// no value or the result normalizes to nothing.
    ///
    /// `main` is the stem of the largest code file in the entry's directory.
    pub fn resolve_target(
        &self,
        entry: &FileEntry,
        generic_dirs: &[String],
        main: Option<&str>,
    ) -> Option<String> {
        let mut name = self.target.clone();

        if name.contains("{dir}") {
            let dir = entry
                .ancestors()
                .into_iter()
                .rev()
                .find(|d| !generic_dirs.iter().any(|g| g.eq_ignore_ascii_case(d)))?;
            name = name.replace("{dir}", &dir);
        }

        if name.contains("{stem}") {
            name = name.replace("{stem}", entry.stem());
        }

        if name.contains("{main}") {
            name = name.replace("{main}", main?);
        }

        normalize_name(&name)
    }
}

/// Lower-case, whitespace to `_`, drop anything a repository name can't hold.
pub fn normalize_name(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let underscored = WHITESPACE_REGEX.replace_all(&lowered, "_");
    let cleaned = INVALID_NAME_CHARS.replace_all(&underscored, "");
    let trimmed = cleaned.trim_matches('.');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
