use crate::scanner::FileEntry;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const README_NAMES: &[&str] = &["README.md", "README.txt", "readme.md", "README"];

/// Bytes of a README looked at for a description.
const README_PREFIX: usize = 500;

const MAX_DESCRIPTION: usize = 100;

/// Lines this short are headings or noise, not descriptions.
const MIN_LINE: usize = 10;

/// Description for an existing project directory: its README when it has a usable
/// line, otherwise a summary of the languages and manifests at its top level.
pub fn describe_directory(dir: &Path, name: &str, files: &[FileEntry]) -> String {
    README_NAMES
        .iter()
        .filter_map(|readme| fs::read_to_string(dir.join(readme)).ok())
        .find_map(|text| readme_description(&text))
        .unwrap_or_else(|| summarize_files(name, files))
}

/// The paragraph under `## Description`, else the first line that is not a heading and
/// longer than a few words. Long lines are cut to 100 characters.
pub fn readme_description(text: &str) -> Option<String> {
    let mut lines = text.lines().map(str::trim);
    let section = lines
        .by_ref()
        .position(|l| l.starts_with("## Description"))
        .and_then(|_| lines.find(|l| !l.is_empty()))
        .filter(|l| !l.starts_with('#'));

    let line = match section {
        Some(line) => line,
        None => {
            let head: String = text.chars().take(README_PREFIX).collect();
            let found = head
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty() && !l.starts_with('#') && l.chars().count() > MIN_LINE)?
                .to_string();
            return Some(truncate(&found));
        }
    };

    Some(truncate(line))
}

fn truncate(line: &str) -> String {
    if line.chars().count() > MAX_DESCRIPTION {
        let cut: String = line.chars().take(MAX_DESCRIPTION).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

fn summary_language(extension: &str) -> Option<&'static str> {
    match extension {
        "py" => Some("Python"),
        "js" => Some("JavaScript"),
        "ts" => Some("TypeScript"),
        "java" => Some("Java"),
        "cpp" => Some("C++"),
        "c" => Some("C"),
        "cs" => Some("C#"),
        "ipynb" => Some("Jupyter Notebook"),
        "r" => Some("R"),
        "sql" => Some("SQL"),
        "html" | "css" => Some("Web"),
        "php" => Some("PHP"),
        _ => None,
    }
}

/// `"Python project with Python dependencies: name"` and the like, from the files
/// directly inside the project directory.
pub fn summarize_files(name: &str, files: &[FileEntry]) -> String {
    let top_level: Vec<&FileEntry> = files
        .iter()
        .filter(|f| f.relative_path.components().count() == 1)
        .collect();

    let languages: BTreeSet<&str> = top_level
        .iter()
        .filter_map(|f| summary_language(&f.extension))
        .collect();
    let has = |manifest: &str| {
        top_level
            .iter()
            .any(|f| f.name.eq_ignore_ascii_case(manifest))
    };

    let mut description = match languages.len() {
        0 => "Code project".to_string(),
        1 => format!("{} project", languages.iter().next().unwrap_or(&"Code")),
        _ => format!(
            "Multi-language project ({})",
            languages.iter().copied().collect::<Vec<_>>().join(", ")
        ),
    };

    if has("requirements.txt") {
        description.push_str(" with Python dependencies");
    } else if has("package.json") {
        description.push_str(" with Node.js dependencies");
    } else if has("makefile") || has("dockerfile") {
        description.push_str(" with build configuration");
    }

    format!("{}: {}", description, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files(names: &[&str]) -> Vec<FileEntry> {
        names
            .iter()
            .map(|n| FileEntry::new(Path::new("/p"), &Path::new("/p").join(n), 1))
            .collect()
    }

    #[test]
    fn test_description_section_wins() {
        let text = "# Weather\n\n## Description\n\nForecasts for the week\n\n## Usage\n";
        assert_eq!(readme_description(text).as_deref(), Some("Forecasts for the week"));
    }

    #[test]
    fn test_first_meaningful_line() {
        let text = "# Title\n\nshort\nA tool that renames photos by date\n";
        assert_eq!(
            readme_description(text).as_deref(),
            Some("A tool that renames photos by date")
        );
        assert_eq!(readme_description("# Only\n\nhi\n"), None);
    }

    #[test]
    fn test_long_lines_are_cut() {
        let line = "x".repeat(150);
        let description = readme_description(&line).unwrap();
        assert_eq!(description.len(), 103);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_summary_from_languages_and_manifests() {
        assert_eq!(
            summarize_files("bot", &files(&["bot.py", "requirements.txt"])),
            "Python project with Python dependencies: bot"
        );
        assert_eq!(
            summarize_files("site", &files(&["index.html", "app.js", "package.json"])),
            "Multi-language project (JavaScript, Web) with Node.js dependencies: site"
        );
        assert_eq!(
            summarize_files("tools", &files(&["Makefile", "notes.md", "nested/deep.py"])),
            "Code project with build configuration: tools"
        );
    }

    #[test]
    fn test_readme_in_directory_is_preferred() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.txt"), "Scrapes prices from three shops\n").unwrap();

        let description = describe_directory(dir.path(), "prices", &files(&["scrape.py"]));
        assert_eq!(description, "Scrapes prices from three shops");

        let empty = TempDir::new().unwrap();
        assert_eq!(
            describe_directory(empty.path(), "prices", &files(&["scrape.py"])),
            "Python project: prices"
        );
    }
}
