use crate::assembler::ProjectGroup;
use crate::classifier::language_for_extension;

/// Turn `weather_app` into `Weather App`.
pub fn title_case(name: &str) -> String {
    name.split(|c| c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn generate_readme(group: &ProjectGroup, owner: &str) -> String {
    let code_files: Vec<_> = group.code_files().collect();
    let data_files: Vec<_> = group.data_files().collect();
    let language = group.language.as_str();
    let name = group.name.as_str();

    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", title_case(name)));
    out.push_str(&format!("## Description\n{}\n\n", group.description));
    out.push_str("## Project Details\n");
    out.push_str(&format!("- **Primary Language**: {}\n", language));
    out.push_str(&format!("- **Total Files**: {}\n", group.files.len()));
    out.push_str(&format!("- **Code Files**: {}\n", code_files.len()));
    out.push_str(&format!("- **Data Files**: {}\n\n", data_files.len()));
    out.push_str("## Files in this Project\n");

    if !code_files.is_empty() {
        out.push_str("\n### Code Files\n");
        for file in &code_files {
            out.push_str(&format!(
                "- `{}` - {} file\n",
                file.name,
                language_for_extension(&file.extension)
            ));
        }
    }

    if !data_files.is_empty() {
        out.push_str("\n### Data Files\n");
        for file in &data_files {
            out.push_str(&format!("- `{}` - Data file (.{})\n", file.name, file.extension));
        }
    }

    let clone = if owner.is_empty() {
        format!("git clone <repository-url> {}", name)
    } else {
        format!("git clone https://github.com/{}/{}.git", owner, name)
    };

    out.push_str("\n## Getting Started\n\n### Prerequisites\n");
    out.push_str(&format!("- {} runtime environment\n", language));

    match language {
        "Python" => {
            out.push_str("- Python 3.7 or higher\n- pip for package management\n\n");
            out.push_str(&format!(
                "### Installation\n```bash\n{}\ncd {}\n\n# Install dependencies (if requirements.txt exists)\npip install -r requirements.txt\n```\n\n",
                clone, name
            ));
            out.push_str("### Usage\n```bash\npython main.py  # Adjust filename as needed\n```\n");
        }
        "JavaScript" => {
            out.push_str("- Node.js and npm\n\n");
            out.push_str(&format!(
                "### Installation\n```bash\n{}\ncd {}\n\n# Install dependencies\nnpm install\n```\n\n",
                clone, name
            ));
            out.push_str("### Usage\n```bash\nnode index.js  # Adjust filename as needed\n```\n");
        }
        _ => {
            out.push_str(&format!("\n### Installation\n```bash\n{}\ncd {}\n```\n\n", clone, name));
            out.push_str(&format!(
                "### Usage\nRefer to the specific {} documentation for running instructions.\n",
                language
            ));
        }
    }

    out.push_str(
        "\n## Contributing\n\
         1. Fork the repository\n\
         2. Create a feature branch (`git checkout -b feature/amazing-feature`)\n\
         3. Commit your changes (`git commit -m 'Add some amazing feature'`)\n\
         4. Push to the branch (`git push origin feature/amazing-feature`)\n\
         5. Open a Pull Request\n\n\
         ## License\nThis project is licensed under the MIT License.\n",
    );

    if !owner.is_empty() {
        out.push_str(&format!(
            "\n## Author\n**{owner}**\n- GitHub: [@{owner}](https://github.com/{owner})\n",
            owner = owner
        ));
    }

    out.push_str("\n---\n*Organized and published with dir2gh*\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileEntry;
    use std::path::Path;

    fn group(language: &str, files: &[&str]) -> ProjectGroup {
        ProjectGroup {
            name: "weather_app".into(),
            files: files
                .iter()
                .map(|f| FileEntry::new(Path::new("/"), &Path::new("/").join(f), 1))
                .collect(),
            confidence: 0.8,
            language: language.into(),
            description: "Multi-file Python project".into(),
            staging_path: None,
            staged_files: Vec::new(),
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("weather_app"), "Weather App");
        assert_eq!(title_case("data-viz"), "Data Viz");
        assert_eq!(title_case("misc"), "Misc");
    }

    #[test]
    fn test_python_readme() {
        let readme = generate_readme(&group("Python", &["main.py", "data.csv"]), "octocat");

        assert!(readme.starts_with("# Weather App\n"));
        assert!(readme.contains("- **Total Files**: 2"));
        assert!(readme.contains("- `main.py` - Python file"));
        assert!(readme.contains("- `data.csv` - Data file (.csv)"));
        assert!(readme.contains("git clone https://github.com/octocat/weather_app.git"));
        assert!(readme.contains("pip install -r requirements.txt"));
        assert!(readme.contains("[@octocat]"));
    }

    #[test]
    fn test_generic_readme_without_owner() {
        let readme = generate_readme(&group("Go", &["main.go"]), "");

        assert!(readme.contains("Refer to the specific Go documentation"));
        assert!(readme.contains("git clone <repository-url> weather_app"));
        assert!(!readme.contains("## Author"));
    }
}
