const BASE: &str = "# OS generated files
.DS_Store
.DS_Store?
._*
.Spotlight-V100
.Trashes
ehthumbs.db
Thumbs.db

# Editor files
*.swp
*.swo
*~
.vscode/
.idea/

# Logs
*.log

# Environment variables
.env
.env.local
.env.*.local
";

const PYTHON: &str = "
# Python
__pycache__/
*.py[cod]
*$py.class
*.so
.Python
build/
develop-eggs/
dist/
downloads/
eggs/
.eggs/
lib/
lib64/
parts/
sdist/
var/
wheels/
*.egg-info/
.installed.cfg
*.egg
MANIFEST
.pytest_cache/
.coverage
htmlcov/
.tox/
.venv/
venv/
env/
ENV/
.ipynb_checkpoints
";

const JAVASCRIPT: &str = "
# Node.js
node_modules/
npm-debug.log*
yarn-debug.log*
yarn-error.log*
.npm
.eslintcache
dist/
build/
";

const JAVA: &str = "
# Java
*.class
*.jar
*.war
*.ear
target/
.gradle/
build/
";

const RUST: &str = "
# Rust
/target/
**/*.rs.bk
";

/// Base ignore list plus a block for the project's language, if one is known.
pub fn generate_gitignore(language: &str) -> String {
    let extra = match language {
        "Python" | "Jupyter Notebook" => PYTHON,
        "JavaScript" | "TypeScript" => JAVASCRIPT,
        "Java" | "Kotlin" | "Scala" => JAVA,
        "Rust" => RUST,
        _ => "",
    };

    format!("{}{}", BASE, extra)
}
