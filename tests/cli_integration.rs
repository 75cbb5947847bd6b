//! Integration tests for the metalens CLI.
//!
//! These tests run the real binary against config files in temp dirs.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use metalens_mask::layout::JsonLayout;

/// A small lens that generates in well under a second.
const SMALL_LENS: &str = "\
[lens]
focal_length = 800.0
wavelength = 1.0
period = 1.0
array_size = 60

[tiling]
inner_radius = 20.0
";

/// Get a command for running metalens, isolated from the user's config.
fn metalens(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("metalens").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("METALENS_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_flag_works() {
    let dir = TempDir::new().unwrap();
    metalens(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("metalens"));
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    metalens(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn generate_writes_layout() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml").write_str(SMALL_LENS).unwrap();

    metalens(&dir)
        .args(["generate", "-o", "mask.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote mask.json"))
        .stdout(predicate::str::contains("x 36 copies"));

    let out = dir.child("mask.json");
    out.assert(predicate::path::is_file());
    let envelope = JsonLayout::read(out.path()).unwrap();
    let top = envelope.document.top.unwrap();
    assert_eq!(envelope.document.group(top).unwrap().name, "aperture");
    assert_eq!(envelope.document.group(top).unwrap().instances.len(), 36);
}

#[test]
fn gds_extension_selects_gds() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml").write_str(SMALL_LENS).unwrap();

    metalens(&dir)
        .args(["generate", "-o", "mask.gds"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote mask.gds (gds)"));

    let library = gds21::GdsLibrary::load(dir.child("mask.gds").path()).unwrap();
    assert!(library.structs.iter().any(|s| s.name == "sector"));

    metalens(&dir)
        .args(["inspect", "--layout", "mask.gds"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gdsii"))
        .stdout(predicate::str::contains("sector, aperture"));
}

#[test]
fn format_flag_picks_default_name() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml").write_str(SMALL_LENS).unwrap();

    metalens(&dir)
        .args(["generate", "--format", "gds"])
        .assert()
        .success();

    dir.child("metalens_mask.gds")
        .assert(predicate::path::is_file());
    dir.child("metalens_mask.json")
        .assert(predicate::path::missing());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml").write_str(SMALL_LENS).unwrap();

    metalens(&dir)
        .args(["generate", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    dir.child("metalens_mask.json")
        .assert(predicate::path::missing());
}

#[test]
fn quiet_generate_prints_nothing() {
    let dir = TempDir::new().unwrap();
    dir.child("lens.toml").write_str(SMALL_LENS).unwrap();

    metalens(&dir)
        .args(["--config", "lens.toml", "-q", "generate", "--threads", "2"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    dir.child("metalens_mask.json")
        .assert(predicate::path::is_file());
}

#[test]
fn flags_override_config() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml").write_str(SMALL_LENS).unwrap();

    metalens(&dir)
        .args(["inspect", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"array_size\": 60"));

    // An inner radius past the rim is rejected.
    metalens(&dir)
        .args(["generate", "--dry-run", "--inner-radius", "75"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml")
        .write_str("[lens]\nperiod = -2.0\n")
        .unwrap();

    metalens(&dir)
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lens.period"));
}

#[test]
fn mismatched_phase_table_fails() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml")
        .write_str(&format!("{}phase_table_resolution = 12\n", SMALL_LENS))
        .unwrap();

    metalens(&dir)
        .args(["generate", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("phase table resolution"));
}

#[test]
fn inspect_reference_plan() {
    let dir = TempDir::new().unwrap();
    metalens(&dir)
        .args(["inspect", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sector_rings\": 1301"))
        .stdout(predicate::str::contains("\"full_disk_rings\": 200"));
}

#[test]
fn inspect_written_layout() {
    let dir = TempDir::new().unwrap();
    dir.child("metalens.toml").write_str(SMALL_LENS).unwrap();
    metalens(&dir).arg("generate").assert().success();

    metalens(&dir)
        .args(["inspect", "--layout", "metalens_mask.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("metalens-layout/1"))
        .stdout(predicate::str::contains("sector, aperture"));
}

#[test]
fn init_then_config_roundtrip() {
    let dir = TempDir::new().unwrap();

    metalens(&dir).arg("init").assert().success();
    dir.child("metalens.toml").assert(predicate::path::is_file());

    metalens(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    metalens(&dir)
        .args(["config", "set", "lens.array_size", "120"])
        .assert()
        .success();

    metalens(&dir)
        .args(["config", "get", "lens.array_size"])
        .assert()
        .success()
        .stdout("120\n");

    metalens(&dir)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tiling.sector_count = 36"));
}

#[test]
fn global_config_is_layered_under_project() {
    let dir = TempDir::new().unwrap();
    dir.child("global.toml")
        .write_str("[lens]\nwavelength = 4.0\nperiod = 3.0\n")
        .unwrap();
    dir.child("metalens.toml")
        .write_str("[lens]\nperiod = 1.5\n")
        .unwrap();

    let mut cmd = metalens(&dir);
    cmd.env("METALENS_CONFIG", dir.child("global.toml").path());
    cmd.args(["inspect", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"wavelength\": 4.0"))
        .stdout(predicate::str::contains("\"period\": 1.5"));
}

#[test]
fn completion_script_generated() {
    let dir = TempDir::new().unwrap();
    metalens(&dir)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("metalens"));
}
