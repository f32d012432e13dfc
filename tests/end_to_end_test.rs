use dir2gh::config::{Backend, Config, MatcherSpec, RuleSpec};
use dir2gh::publisher::{LocalPublisher, Publisher};
use dir2gh::{Organizer, ProjectGroup, PublishResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_tree(root: &Path) {
    write(root, "weather/app.py", "import requests\n");
    write(root, "weather/data.csv", "city,temp\n");
    write(root, "weather/notes.txt", "weather notes\n");
    write(root, "games/snake/main.js", "console.log('snake')\n");
    write(root, "games/snake/style.css", "body {}\n");
    write(root, "games/tiny/one.py", "print(1)\n");
    write(root, "lonely.py", "print('alone')\n");
    write(root, "todo.txt", "buy milk\n");
    write(root, "node_modules/pkg/index.js", "module.exports = 1\n");
}

struct Nothing;

impl Publisher for Nothing {
    fn name(&self) -> &str {
        "nothing"
    }

    fn publish(&mut self, group: &ProjectGroup) -> PublishResult {
        PublishResult::succeeded(&group.name, None)
    }
}

fn config_for(output: &Path) -> Config {
    let mut config = Config::default();
    config.staging.root = output.to_path_buf();
    config.publish.backend = Backend::Local;
    config
}

#[test]
fn test_no_file_is_lost() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_tree(input.path());

    let organizer = Organizer::new(config_for(&out.path().join("staged"))).unwrap();
    let assembly = organizer.plan(input.path()).unwrap();

    let grouped: HashSet<PathBuf> = assembly
        .groups
        .iter()
        .flat_map(|g| g.files.iter().map(|f| f.relative_path.clone()))
        .collect();
    let expected: HashSet<PathBuf> = [
        "weather/app.py",
        "weather/data.csv",
        "weather/notes.txt",
        "games/snake/main.js",
        "games/snake/style.css",
        "games/tiny/one.py",
        "lonely.py",
        "todo.txt",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();

    assert_eq!(grouped, expected);
    assert_eq!(assembly.total_files(), expected.len());
}

#[test]
fn test_small_groups_fold_into_misc_last() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_tree(input.path());

    let organizer = Organizer::new(config_for(&out.path().join("staged"))).unwrap();
    let assembly = organizer.plan(input.path()).unwrap();
    let min = organizer.config().assemble.min_group_size;

    assert_eq!(assembly.groups.last().unwrap().name, "misc");
    for group in &assembly.groups {
        if group.name != "misc" {
            assert!(group.files.len() >= min, "{} is below the threshold", group.name);
        }
    }
    assert!(assembly.merged_into_misc.contains(&"tiny".to_string()));
}

#[test]
fn test_loose_root_files_follow_the_largest_script() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_tree(input.path());

    let organizer = Organizer::new(config_for(&out.path().join("staged"))).unwrap();
    let assembly = organizer.plan(input.path()).unwrap();

    let lonely = assembly.group("lonely_project").unwrap();
    let names: Vec<&str> = lonely.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["lonely.py", "todo.txt"]);
    assert!(assembly.group("todo_project").is_none());
}

#[test]
fn test_scripts_scenario() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    for name in ["a.py", "b.py", "c.md"] {
        write(input.path(), name, name);
    }

    let mut config = config_for(&out.path().join("staged"));
    config.classify.rules = vec![RuleSpec {
        matcher: MatcherSpec::Glob { pattern: "*.py".into() },
        target: "scripts".into(),
        confidence: None,
    }];
    config.assemble.attach_siblings = false;

    let organizer = Organizer::new(config).unwrap();
    let assembly = organizer.plan(input.path()).unwrap();

    let names = |group: &ProjectGroup| -> Vec<String> {
        group.files.iter().map(|f| f.name.clone()).collect()
    };
    assert_eq!(assembly.group_names(), vec!["scripts", "misc"]);
    assert_eq!(names(assembly.group("scripts").unwrap()), vec!["a.py", "b.py"]);
    assert_eq!(names(assembly.group("misc").unwrap()), vec!["c.md"]);
}

#[test]
fn test_organize_creates_local_repositories() {
    if !dir2gh::publisher::git_available() {
        return;
    }
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_tree(input.path());
    let staged = out.path().join("staged");

    let organizer = Organizer::new(config_for(&staged)).unwrap();
    let mut publisher = LocalPublisher::new("octocat", "Initial commit");
    let (assembly, report) = organizer.run(input.path(), &mut publisher).unwrap();

    assert_eq!(report.exit_code(), 0, "{:?}", report.failed().collect::<Vec<_>>());
    assert_eq!(report.staging_root.as_deref(), Some(staged.as_path()));

    for group in &assembly.groups {
        let dir = staged.join(&group.name);
        assert!(dir.join(".git").is_dir(), "{} has no repository", group.name);
        assert!(dir.join("README.md").is_file());
        assert!(dir.join(".gitignore").is_file());
    }

    // Copies, not moves
    assert!(input.path().join("weather/app.py").exists());
    assert!(staged.join("weather/app.py").exists());
}

#[test]
fn test_second_run_stages_beside_the_first() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_tree(input.path());
    let staged = out.path().join("staged");

    let organizer = Organizer::new(config_for(&staged)).unwrap();
    let (first, _) = organizer.run(input.path(), &mut Nothing).unwrap();
    let (second, report) = organizer.run(input.path(), &mut Nothing).unwrap();

    assert_eq!(first.group_names(), second.group_names());
    let root = report.staging_root.unwrap();
    assert_ne!(root, staged);
    assert!(root
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("staged_"));
}

#[test]
fn test_staging_inside_input_is_not_rescanned() {
    let input = TempDir::new().unwrap();
    sample_tree(input.path());
    write(input.path(), "organized/old/leftover.py", "x\n");

    let organizer = Organizer::new(config_for(&input.path().join("organized"))).unwrap();
    let assembly = organizer.plan(input.path()).unwrap();

    assert!(assembly
        .groups
        .iter()
        .flat_map(|g| g.files.iter())
        .all(|f| !f.relative_path.starts_with("organized")));
}

#[test]
fn test_repeated_runs_inside_input_never_rescan_staged_copies() {
    let input = TempDir::new().unwrap();
    sample_tree(input.path());

    let organizer = Organizer::new(config_for(&input.path().join("organized"))).unwrap();
    let before = organizer.plan(input.path()).unwrap().total_files();

    let mut roots = Vec::new();
    for _ in 0..3 {
        let (assembly, report) = organizer.run(input.path(), &mut Nothing).unwrap();
        assert_eq!(assembly.total_files(), before);
        roots.push(report.staging_root.unwrap());
    }

    roots.dedup();
    assert_eq!(roots.len(), 3, "each run stages into its own directory");

    let after = organizer.plan(input.path()).unwrap();
    assert_eq!(after.total_files(), before);
    assert!(after
        .groups
        .iter()
        .flat_map(|g| g.files.iter())
        .all(|f| !f.relative_path.starts_with("organized")
            && !f.relative_path.to_string_lossy().starts_with("organized_")));
}

#[test]
fn test_dedup_isolates_duplicates() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(input.path(), "a/one.py", "same\n");
    write(input.path(), "b/two.py", "same\n");
    write(input.path(), "b/three.py", "different\n");

    let mut config = config_for(&out.path().join("staged"));
    config.assemble.dedup = true;
    let organizer = Organizer::new(config).unwrap();
    let assembly = organizer.plan(input.path()).unwrap();

    assert_eq!(assembly.duplicates.len(), 1);
    assert_eq!(assembly.duplicates[0].entry.relative_path, PathBuf::from("b/two.py"));
    assert_eq!(assembly.total_files() + assembly.duplicates.len(), 3);
}
