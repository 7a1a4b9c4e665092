//! CLI integration tests
//!
//! Drive the `cf` binary end to end against a temporary project using the
//! file row source.

use std::path::Path;
use std::process::Command;

fn cf() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cf"))
}

fn write_project(root: &Path) {
    std::fs::write(
        root.join("churnflow.yml"),
        "name: itest\nfetch:\n  kind: file\n  path: customers.csv\n",
    )
    .unwrap();
    std::fs::write(
        root.join("customers.csv"),
        "customer_id,age,tenure_months,monthly_spend,churn\n\
         1,34,24,50.25,0\n\
         2,34,18,61.5,1\n\
         3,45,18,50.25,0\n\
         4,52,6,80.0,1\n\
         5,45,30,61.5,0\n\
         6,29,24,80.0,1\n",
    )
    .unwrap();
}

#[test]
fn test_init_scaffolds_project() {
    let dir = tempfile::tempdir().unwrap();
    let output = cf()
        .args(["-p", dir.path().to_str().unwrap(), "init"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("churnflow.yml").exists());
    assert!(dir.path().join("data").join("raw").is_dir());

    // refuses to clobber without --force
    let second = cf()
        .args(["-p", dir.path().to_str().unwrap(), "init"])
        .output()
        .unwrap();
    assert!(!second.status.success());
}

#[test]
fn test_run_full_chain_and_inspect() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let project = dir.path().to_str().unwrap();

    let run = cf()
        .args(["-p", project, "run", "--key", "2024-01-01"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&run.stdout);
    assert!(run.status.success(), "run failed: {}", stdout);
    assert!(stdout.contains("train"));
    assert!(dir
        .path()
        .join("data/transformed/2024-01-01/customer_churn_transformed.csv")
        .exists());
    assert!(dir
        .path()
        .join("data/models/2024-01-01/churn_model.json")
        .exists());

    let ls = cf().args(["-p", project, "ls"]).output().unwrap();
    assert!(ls.status.success());
    let ls_out = String::from_utf8_lossy(&ls.stdout);
    assert!(ls_out.contains("2024-01-01"));
    assert!(ls_out.contains("complete"));

    let features = cf().args(["-p", project, "features"]).output().unwrap();
    assert!(features.status.success());
    assert!(String::from_utf8_lossy(&features.stdout).contains("tenure_years"));

    let status = cf().args(["-p", project, "status"]).output().unwrap();
    assert!(status.status.success());
    let status_out = String::from_utf8_lossy(&status.stdout);
    assert!(status_out.contains("succeeded"));
    assert!(status_out.contains("completed"));
}

#[test]
fn test_run_single_stage_fails_without_upstream() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let project = dir.path().to_str().unwrap();

    // prepare has no raw partition to read: exit non-zero, readable reason
    let run = cf()
        .args(["-p", project, "run", "--only", "prepare"])
        .output()
        .unwrap();
    assert!(!run.status.success());
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&run.stdout),
        String::from_utf8_lossy(&run.stderr)
    );
    assert!(combined.contains("prepare"));
}

#[test]
fn test_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let run = cf()
        .args(["-p", dir.path().to_str().unwrap(), "ls"])
        .output()
        .unwrap();
    assert!(!run.status.success());
    assert!(String::from_utf8_lossy(&run.stderr).contains("churnflow.yml"));
}
