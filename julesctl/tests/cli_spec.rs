#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const JULES_ENV: [&str; 6] = [
    "JULES_CONFIG",
    "JULES_UDOCKER_BIN",
    "JULES_EXE",
    "JULES_IMAGE",
    "JULES_CONTAINER",
    "JULES_MOUNT_POINT",
];

fn julesctl() -> Command {
    let mut cmd = Command::cargo_bin("julesctl").unwrap();
    for key in JULES_ENV {
        cmd.env_remove(key);
    }
    cmd
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn fake_jules(dir: &Path, exit_code: i32) -> PathBuf {
    let exe = dir.join("jules.exe");
    write_script(
        &exe,
        &format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > jules.log\nexit {}\n",
            exit_code
        ),
    );
    exe
}

fn fake_udocker(dir: &Path) -> (PathBuf, PathBuf) {
    let log = dir.join("udocker.log");
    let bin = dir.join("udocker");
    write_script(
        &bin,
        &format!(
            r#"#!/bin/sh
printf '%s\n' "$*" >> '{log}'
case "$1" in
  inspect)
    if [ "$2" = "JULES" ] || [ "$2" = "jules" ]; then
      exit 0
    fi
    printf 'no such container' >&2
    exit 1
    ;;
  ps)
    echo "CONTAINER ID   P M NAMES     IMAGE"
    ;;
esac
exit 0
"#,
            log = log.display()
        ),
    );
    (bin, log)
}

fn experiment(temp: &TempDir) -> (PathBuf, PathBuf) {
    let run_dir = temp.path().join("exp1");
    let site = run_dir.join("site_a");
    fs::create_dir_all(&site).unwrap();
    (run_dir, site)
}

fn log_lines(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn help_lists_subcommands() {
    julesctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("udocker"));
}

#[test]
fn version_prints_package_version() {
    julesctl()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn check_prints_relative_namelists_path() {
    let temp = TempDir::new().unwrap();
    let (run_dir, site) = experiment(&temp);

    julesctl()
        .args(["check", "--namelists-dir"])
        .arg(&site)
        .arg("--run-dir")
        .arg(&run_dir)
        .assert()
        .success()
        .stdout("site_a\n");
}

#[test]
fn check_json_reports_resolved_paths() {
    let temp = TempDir::new().unwrap();
    let (run_dir, site) = experiment(&temp);

    let output = julesctl()
        .args(["check", "--json", "--namelists-dir"])
        .arg(&site)
        .arg("--run-dir")
        .arg(&run_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["relativeNamelists"], "site_a");
    assert_eq!(
        value["runDir"],
        fs::canonicalize(&run_dir).unwrap().display().to_string()
    );
}

#[test]
fn check_rejects_namelists_outside_run_dir() {
    let temp = TempDir::new().unwrap();
    let (run_dir, _) = experiment(&temp);
    let other = temp.path().join("exp2");
    fs::create_dir_all(&other).unwrap();

    julesctl()
        .args(["check", "--namelists-dir"])
        .arg(&other)
        .arg("--run-dir")
        .arg(&run_dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Invalid path"));

    julesctl()
        .args(["check", "--json", "--namelists-dir"])
        .arg(&other)
        .arg("--run-dir")
        .arg(&run_dir)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""kind": "invalid_path""#));
}

#[test]
fn check_ignores_unreadable_config() {
    let temp = TempDir::new().unwrap();
    let (run_dir, site) = experiment(&temp);
    let config = temp.path().join("broken.yaml");
    fs::write(&config, "mountPoint: [1, 2]\n").unwrap();

    julesctl()
        .arg("--config")
        .arg(&config)
        .args(["check", "--namelists-dir"])
        .arg(&site)
        .arg("--run-dir")
        .arg(&run_dir)
        .assert()
        .success()
        .stdout("site_a\n");

    julesctl()
        .arg("--config")
        .arg(&config)
        .args(["run", "--namelists-dir"])
        .arg(&site)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn run_launches_model_in_run_dir() {
    let temp = TempDir::new().unwrap();
    let exe = fake_jules(temp.path(), 0);
    let (run_dir, site) = experiment(&temp);

    julesctl()
        .args(["run", "--namelists-dir"])
        .arg(&site)
        .arg("--run-dir")
        .arg(&run_dir)
        .arg("--jules-exe")
        .arg(&exe)
        .assert()
        .success();

    let lines = log_lines(&run_dir.join("jules.log"));
    assert_eq!(lines.first().map(String::as_str), Some("-d"));
    assert_eq!(lines.last().map(String::as_str), Some("site_a"));
}

#[test]
fn run_propagates_model_exit_code() {
    let temp = TempDir::new().unwrap();
    let exe = fake_jules(temp.path(), 3);
    let (run_dir, site) = experiment(&temp);

    julesctl()
        .env("JULES_EXE", &exe)
        .args(["run", "--namelists-dir"])
        .arg(&site)
        .arg("--run-dir")
        .arg(&run_dir)
        .assert()
        .code(3);
}

#[test]
fn run_rejects_non_executable_model() {
    let temp = TempDir::new().unwrap();
    let exe = fake_jules(temp.path(), 0);
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o644)).unwrap();
    let (_, site) = experiment(&temp);

    julesctl()
        .args(["run", "--namelists-dir"])
        .arg(&site)
        .arg("--jules-exe")
        .arg(&exe)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Permission denied"));
}

#[test]
fn run_without_model_on_path_fails() {
    let temp = TempDir::new().unwrap();
    let empty = temp.path().join("bin");
    fs::create_dir_all(&empty).unwrap();
    let (_, site) = experiment(&temp);

    julesctl()
        .env("PATH", &empty)
        .args(["run", "--namelists-dir"])
        .arg(&site)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Executable not found"));
}

#[test]
fn udocker_run_mounts_run_dir() {
    let temp = TempDir::new().unwrap();
    let (udocker, log) = fake_udocker(temp.path());
    let (run_dir, site) = experiment(&temp);

    julesctl()
        .args(["udocker", "--udocker-bin"])
        .arg(&udocker)
        .args(["run", "--namelists-dir"])
        .arg(&site)
        .arg("--run-dir")
        .arg(&run_dir)
        .assert()
        .success();

    let canonical_run = fs::canonicalize(&run_dir).unwrap();
    assert_eq!(
        log_lines(&log),
        vec![
            "inspect jules".to_string(),
            format!(
                "run -v {}:/root/run jules -d /root/run /root/run/site_a",
                canonical_run.display()
            ),
        ]
    );
}

#[test]
fn udocker_run_reports_unknown_container() {
    let temp = TempDir::new().unwrap();
    let (udocker, log) = fake_udocker(temp.path());
    let (_, site) = experiment(&temp);

    julesctl()
        .env("JULES_UDOCKER_BIN", &udocker)
        .args(["udocker", "run", "--container-name", "ghost", "--namelists-dir"])
        .arg(&site)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no such container"));

    assert_eq!(log_lines(&log), vec!["inspect ghost", "ps"]);
}

#[test]
fn udocker_run_rejects_relative_mount_point() {
    let temp = TempDir::new().unwrap();
    let (udocker, log) = fake_udocker(temp.path());
    let (_, site) = experiment(&temp);

    julesctl()
        .args(["udocker", "--udocker-bin"])
        .arg(&udocker)
        .args(["run", "--mount-point", "root/run", "--namelists-dir"])
        .arg(&site)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be an absolute path"));

    assert!(log_lines(&log).is_empty());
}

#[test]
fn udocker_setup_runs_three_steps() {
    let temp = TempDir::new().unwrap();
    let (udocker, log) = fake_udocker(temp.path());
    let archive = temp.path().join("jules.tar");
    fs::write(&archive, b"tar").unwrap();

    julesctl()
        .args(["udocker", "--udocker-bin"])
        .arg(&udocker)
        .args(["setup", "--image-file"])
        .arg(&archive)
        .assert()
        .success();

    assert_eq!(
        log_lines(&log),
        vec![
            "-D install".to_string(),
            format!("--allow-root load -i {} JULES", archive.display()),
            "verify JULES".to_string(),
        ]
    );
}

#[test]
fn udocker_create_container_reads_names_from_config() {
    let temp = TempDir::new().unwrap();
    let (udocker, log) = fake_udocker(temp.path());
    let config = temp.path().join("jules.yaml");
    fs::write(
        &config,
        format!(
            "udockerBin: {}\nimageName: JULES\ncontainerName: loobos\n",
            udocker.display()
        ),
    )
    .unwrap();

    julesctl()
        .arg("--config")
        .arg(&config)
        .args(["udocker", "create-container"])
        .assert()
        .success()
        .stdout("loobos\n");

    assert_eq!(
        log_lines(&log),
        vec!["inspect JULES", "create --name=loobos JULES"]
    );
}
