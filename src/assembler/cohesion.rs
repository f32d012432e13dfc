use super::Member;
use crate::classifier::language_for_extension;
use crate::classifier::normalize_name;
use crate::scanner::FileEntry;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IMPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)import\s+([^\s]+)"#,
        r#"(?i)from\s+([^\s]+)\s+import"#,
        r#"(?i)require\(['"]([^'"]+)['"]\)"#,
        r#"(?i)#include\s*[<"]([^>"]+)[>"]"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static DEFINITION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)def\s+([a-zA-Z_][a-zA-Z0-9_]*)",
        r"(?i)function\s+([a-zA-Z_][a-zA-Z0-9_]*)",
        r"(?i)class\s+([a-zA-Z_][a-zA-Z0-9_]*)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static FILE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([^'"\s]*\.[a-zA-Z0-9]+)['"]"#).unwrap());

/// Code groups this small always stay together.
const SMALL_GROUP: usize = 3;

/// Up to this many languages count as one project.
const MAX_LANGUAGES: usize = 2;

/// What a source file pulls in, defines and mentions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentSummary {
    pub imports: Vec<String>,
    pub definitions: Vec<String>,
    /// Quoted strings that look like file names
    pub references: Vec<String>,
}

impl ContentSummary {
    fn mentions(&self, stem: &str) -> bool {
        self.imports
            .iter()
            .chain(self.references.iter())
            .any(|s| s.contains(stem))
    }
}

pub fn analyze_content(text: &str) -> ContentSummary {
    let captures = |patterns: &[Regex]| -> Vec<String> {
        patterns
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    };

    ContentSummary {
        imports: captures(IMPORT_PATTERNS.as_slice()),
        definitions: captures(DEFINITION_PATTERNS.as_slice()),
        references: captures(std::slice::from_ref(&*FILE_REFERENCE)),
    }
}

/// Whether `code` files belong in one project: a handful of files, at most two
/// languages, or one file importing or naming another.
pub fn is_cohesive<F>(code: &[&FileEntry], mut content: F) -> bool
where
    F: FnMut(&FileEntry) -> Option<String>,
{
    if code.len() <= SMALL_GROUP {
        return true;
    }

    let languages: HashSet<&str> = code
        .iter()
        .map(|f| language_for_extension(&f.extension))
        .collect();
    if languages.len() <= MAX_LANGUAGES {
        return true;
    }

    let stems: Vec<&str> = code.iter().map(|f| f.stem()).collect();
    code.iter().any(|file| {
        let summary = match content(file) {
            Some(text) => analyze_content(&text),
            None => return false,
        };
        stems
            .iter()
            .filter(|stem| **stem != file.stem())
            .any(|stem| summary.mentions(stem))
    })
}

/// Break an incohesive group into one `<stem>_project` per code file. Other files go
/// with the code file whose stem prefixes their name, longest stem first. Files no
/// code file claims keep the original name.
pub(super) fn split_members(name: &str, members: Vec<Member>) -> Vec<(String, Vec<Member>)> {
    let mut stems: Vec<String> = members
        .iter()
        .filter(|m| m.entry.is_code())
        .map(|m| m.entry.stem().to_string())
        .collect();
    stems.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut parts: Vec<(String, Vec<Member>)> = Vec::new();
    let mut rest = Vec::new();

    for member in members {
        let stem = if member.entry.is_code() {
            Some(member.entry.stem().to_string())
        } else {
            stems
                .iter()
                .find(|s| member.entry.name.starts_with(s.as_str()))
                .cloned()
        };

        match stem.and_then(|s| normalize_name(&format!("{}_project", s))) {
            Some(target) => match parts.iter_mut().find(|(n, _)| *n == target) {
                Some((_, list)) => list.push(member),
                None => parts.push((target, vec![member])),
            },
            None => rest.push(member),
        }
    }

    debug!("Split {} into {} project(s)", name, parts.len());
    if !rest.is_empty() {
        parts.push((name.to_string(), rest));
    }
    parts
}
