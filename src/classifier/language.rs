use crate::scanner::FileEntry;
use std::collections::HashMap;

pub const UNKNOWN: &str = "Unknown";
pub const MIXED: &str = "mixed";

/// Human-readable language for a lower-case extension without the dot.
pub fn language_for_extension(extension: &str) -> &'static str {
    match extension {
        "py" => "Python",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "java" => "Java",
        "cpp" => "C++",
        "c" => "C",
        "cs" => "C#",
        "php" => "PHP",
        "rb" => "Ruby",
        "go" => "Go",
        "rs" => "Rust",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "scala" => "Scala",
        "r" => "R",
        "m" => "MATLAB",
        "pl" => "Perl",
        "sh" => "Shell",
        "sql" => "SQL",
        "html" => "HTML",
        "css" => "CSS",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "ipynb" => "Jupyter Notebook",
        _ => UNKNOWN,
    }
}

/// Most common known language among `files`. Ties go to the language seen first.
/// Falls back to [`MIXED`] when no file has a known language.
pub fn dominant_language<'a, I>(files: I) -> &'static str
where
    I: IntoIterator<Item = &'a FileEntry>,
{
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    let mut order: Vec<&'static str> = Vec::new();

    for file in files {
        let language = language_for_extension(&file.extension);
        if language == UNKNOWN {
            continue;
        }
        let count = counts.entry(language).or_insert(0);
        if *count == 0 {
            order.push(language);
        }
        *count += 1;
    }

    let mut best = MIXED;
    let mut best_count = 0;
    for language in order {
        let count = counts[language];
        if count > best_count {
            best = language;
            best_count = count;
        }
    }
    best
}
