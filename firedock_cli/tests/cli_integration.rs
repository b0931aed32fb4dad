use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config with a fast manual policy for tests
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[policy]
mode = "manual"
cooldown_ms = 1000
saved_revert_ms = 500
error_revert_ms = 500

[scale]
poll_hz = 50

[reconcile]
near_expiry_days = 5
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_seed_csv(dir: &tempfile::TempDir) -> PathBuf {
    let csv = "name,location,expires_in_days\n\
               Dock A-1,Building A - Floor 1,365\n\
               Dock B-2,Building B - Floor 2,3\n";
    let path = dir.path().join("seed.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["init-scale"], 0, "status ready", "stdout")]
#[case(&["list"], 0, "no docks", "stdout")]
#[case(&["weigh"], 2, "required", "stderr")]
#[case(&["weigh", "--dock", "dock-9999", "--max-run-ms", "2000"], 4, "does not exist", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("firedock_cli").unwrap();
    // Always include a valid config to avoid relying on the default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn list_shows_seeded_docks_with_badges() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let seed = write_seed_csv(&dir);

    let mut cmd = Command::cargo_bin("firedock_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--seed")
        .arg(&seed)
        .arg("list");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Dock A-1"))
        .stdout(predicate::str::contains("never weighed"))
        .stdout(predicate::str::contains("needs-reweigh"));
}

#[rstest]
fn list_json_is_parseable_and_badged() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let seed = write_seed_csv(&dir);

    let mut cmd = Command::cargo_bin("firedock_cli").unwrap();
    let out = cmd
        .arg("--config")
        .arg(&cfg)
        .arg("--seed")
        .arg(&seed)
        .arg("--json")
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let rows: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Soonest expiry sorts first.
    assert_eq!(rows[0]["name"], "Dock B-2");
    assert_eq!(rows[0]["weight_badge"], "unknown");
    assert_eq!(rows[0]["expiry_badge"], "soon");
    assert_eq!(rows[1]["expiry_badge"], "ok");
}

#[rstest]
fn import_rejects_bad_headers() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let bad = dir.path().join("bad.csv");
    fs::write(&bad, "name,site,expires_in_days\nDock,Here,3\n").unwrap();

    let mut cmd = Command::cargo_bin("firedock_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("import")
        .arg("--file")
        .arg(&bad);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn reconcile_reports_patched_docks() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let seed = write_seed_csv(&dir);

    let mut cmd = Command::cargo_bin("firedock_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--seed")
        .arg(&seed)
        .arg("reconcile");

    // Dock B-2 expires in 3 days and should gain near_expiry.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("reconciled 2 docks, patched 1"));
}

#[rstest]
fn weigh_saves_the_settled_weight() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let seed = write_seed_csv(&dir);

    let mut cmd = Command::cargo_bin("firedock_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--seed")
        .arg(&seed)
        .arg("weigh")
        .arg("--dock")
        .arg("dock-0001")
        .arg("--target-kg")
        .arg("5.5")
        .arg("--max-run-ms")
        .arg("20000");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Saved 5.50 kg to dock-0001"));
}

#[rstest]
fn invalid_config_is_rejected_with_hint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "[policy]\ncooldown_ms = 0\n").unwrap();

    let mut cmd = Command::cargo_bin("firedock_cli").unwrap();
    cmd.arg("--config").arg(&path).arg("self-check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cooldown_ms"));
}
