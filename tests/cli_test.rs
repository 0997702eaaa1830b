use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Run against a throwaway home so real user data is never scanned
fn spacesweep(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("spacesweep").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

fn seed_cache(home: &TempDir) -> std::path::PathBuf {
    let cache = home.path().join(".cache");
    std::fs::create_dir_all(&cache).unwrap();
    let junk = cache.join("junk.bin");
    std::fs::write(&junk, vec![0u8; 4096]).unwrap();
    junk
}

// ─── Help & version ──────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    spacesweep(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    spacesweep(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spacesweep"));
}

#[test]
fn test_unknown_category_rejected() {
    let home = TempDir::new().unwrap();
    spacesweep(&home)
        .args(["scan", "--categories", "photos"])
        .assert()
        .failure();
}

// ─── Scan command ────────────────────────────────────────────────────────────

#[test]
fn test_scan_quiet_mode() {
    let home = TempDir::new().unwrap();
    spacesweep(&home).args(["scan", "--quiet"]).assert().success();
}

#[test]
fn test_scan_json_restricted_hides_items() {
    let home = TempDir::new().unwrap();
    seed_cache(&home);
    let output = spacesweep(&home)
        .args(["scan", "--format", "json", "--categories", "cache"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["tier"], "restricted");
    assert_eq!(json["categories"][0]["id"], "cache");
    assert!(json["categories"][0]["items"].as_array().unwrap().is_empty());
    assert!(json["totalSpace"].as_u64().unwrap() > 0);
}

#[test]
fn test_scan_json_full_lists_items() {
    let home = TempDir::new().unwrap();
    let junk = seed_cache(&home);
    let output = spacesweep(&home)
        .args(["scan", "--tier", "full", "--format", "json", "--categories", "cache"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = json["categories"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["path"], junk.display().to_string());
    assert_eq!(items[0]["size"], 4096);
    assert_eq!(items[0]["canDelete"], true);
}

#[test]
fn test_scan_human_output() {
    let home = TempDir::new().unwrap();
    seed_cache(&home);
    spacesweep(&home)
        .args(["scan", "--tier", "full", "--detailed", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User Cache"))
        .stdout(predicate::str::contains("junk.bin"));
}

// ─── Clean command ───────────────────────────────────────────────────────────

#[test]
fn test_clean_dry_run_json() {
    let home = TempDir::new().unwrap();
    let junk = seed_cache(&home);
    spacesweep(&home)
        .args(["clean", "--dry-run", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("totalSizeFreed"))
        .stdout(predicate::str::contains("\"dryRun\": true"));
    assert!(junk.exists());
}

#[test]
fn test_clean_yes_deletes_selected_category() {
    let home = TempDir::new().unwrap();
    let junk = seed_cache(&home);
    let trash = home.path().join(".local/share/Trash/files");
    std::fs::create_dir_all(&trash).unwrap();
    std::fs::write(trash.join("keep.txt"), b"keep").unwrap();

    spacesweep(&home)
        .args(["clean", "--yes", "--categories", "cache", "--format", "quiet"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4096  1  0"));

    assert!(!junk.exists());
    assert!(home.path().join(".cache").exists());
    assert!(trash.join("keep.txt").exists());
}

#[test]
fn test_clean_without_confirmation_keeps_files() {
    let home = TempDir::new().unwrap();
    let junk = seed_cache(&home);
    spacesweep(&home)
        .args(["clean", "--no-color"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
    assert!(junk.exists());
}

// ─── Info & config ───────────────────────────────────────────────────────────

#[test]
fn test_info_json() {
    let home = TempDir::new().unwrap();
    let output = spacesweep(&home).args(["info", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["system"]["platform"], std::env::consts::OS);
    assert!(json["system"]["cpuCount"].is_u64());
    assert!(json["disk"]["total"].is_u64());
}

#[test]
fn test_config_path_under_home() {
    let home = TempDir::new().unwrap();
    spacesweep(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".spacesweep"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_reset_then_show() {
    let home = TempDir::new().unwrap();
    spacesweep(&home).args(["config", "reset"]).assert().success();
    assert!(home.path().join(".spacesweep/config.toml").exists());

    spacesweep(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[restricted]"))
        .stdout(predicate::str::contains("item_cap = 100"));
}

#[test]
fn test_invalid_config_fails_scan() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".spacesweep");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[full]\nphase_weights = [1, 2]\n").unwrap();

    spacesweep(&home).args(["scan", "--quiet"]).assert().failure();
    spacesweep(&home).args(["config", "path"]).assert().success();
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    spacesweep(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spacesweep"));
}
