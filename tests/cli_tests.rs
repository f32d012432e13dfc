use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn dir2gh() -> Command {
    let mut cmd = Command::cargo_bin("dir2gh").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("DIR2GH_CONFIG")
        .env_remove("DIR2GH_OWNER");
    cmd
}

fn sample_input() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("weather")).unwrap();
    fs::write(tmp.path().join("weather/app.py"), "print(1)\n").unwrap();
    fs::write(tmp.path().join("weather/util.py"), "x = 1\n").unwrap();
    fs::write(tmp.path().join("stray.png"), [0u8; 4]).unwrap();
    tmp
}

#[test]
fn test_plan_prints_groups_and_writes_nothing() {
    let input = sample_input();
    let out = TempDir::new().unwrap();
    let staged = out.path().join("staged");

    dir2gh()
        .arg("plan")
        .arg(input.path())
        .arg("--output")
        .arg(&staged)
        .assert()
        .success()
        .stdout(predicate::str::contains("weather"))
        .stdout(predicate::str::contains("misc"));

    assert!(!staged.exists());
}

#[test]
fn test_plan_json() {
    let input = sample_input();

    let output = dir2gh()
        .args(["plan", "--json", "-q"])
        .arg(input.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["groups"][0]["name"], "weather");
    assert_eq!(plan["groups"][0]["files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_input_fails() {
    dir2gh()
        .args(["plan", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to scan"));
}

#[test]
fn test_empty_input_fails() {
    let input = TempDir::new().unwrap();
    dir2gh()
        .arg("plan")
        .arg(input.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files found"));
}

#[test]
fn test_rules_lists_defaults() {
    dir2gh()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("{dir}"))
        .stdout(predicate::str::contains("{main}_project"));
}

#[test]
fn test_init_config_round_trips() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("dir2gh.toml");

    dir2gh().arg("init-config").arg(&path).assert().success();
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("[assemble]"));
    assert!(written.contains("min_group_size = 2"));

    dir2gh()
        .arg("rules")
        .arg("--config")
        .arg(&path)
        .assert()
        .success();

    // Refuses to overwrite
    dir2gh().arg("init-config").arg(&path).assert().failure();
}

#[test]
fn test_bad_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.toml");
    fs::write(&path, "[assemble]\nmin_group_size = 0\n").unwrap();

    dir2gh()
        .args(["rules", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_organize_stages_local_repositories() {
    let input = sample_input();
    let out = TempDir::new().unwrap();
    let staged = out.path().join("staged");

    let git = std::process::Command::new("git").arg("--version").output();
    if git.map(|o| !o.status.success()).unwrap_or(true) {
        return;
    }

    dir2gh()
        .arg("organize")
        .arg(input.path())
        .arg("--output")
        .arg(&staged)
        .assert()
        .success()
        .stdout(predicate::str::contains("Publish summary"));

    assert!(staged.join("weather/.git").is_dir());
    assert!(staged.join("weather/README.md").is_file());
    assert!(staged.join("misc/stray.png").is_file());
}

#[cfg(unix)]
#[test]
fn test_failed_publish_exits_non_zero() {
    use std::os::unix::fs::PermissionsExt;

    let git = std::process::Command::new("git").arg("--version").output();
    if git.map(|o| !o.status.success()).unwrap_or(true) {
        return;
    }

    let input = sample_input();
    let tmp = TempDir::new().unwrap();

    // Logged in, no repositories, creation always fails
    let gh = tmp.path().join("gh");
    fs::write(
        &gh,
        "#!/bin/sh\n\
         [ \"$1 $2\" = \"auth status\" ] && exit 0\n\
         echo 'HTTP 500: server error' >&2\n\
         exit 1\n",
    )
    .unwrap();
    fs::set_permissions(&gh, fs::Permissions::from_mode(0o755)).unwrap();

    let config = tmp.path().join("dir2gh.toml");
    fs::write(
        &config,
        format!(
            "[publish]\nbackend = \"gh\"\ngh_command = \"{}\"\nretries = 0\nretry_delay_ms = 0\n",
            gh.display()
        ),
    )
    .unwrap();

    dir2gh()
        .arg("publish")
        .arg(input.path())
        .arg("--yes")
        .args(["--owner", "tester", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(tmp.path().join("staged"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Publish summary"));
}
