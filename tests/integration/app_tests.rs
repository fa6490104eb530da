use clap::Parser;
use dupsweep::cli::Cli;
use dupsweep::error::ExitCode;
use dupsweep::run_app;
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Scan directory with an old and a new copy of the same content, plus an
/// empty config file so no user configuration leaks into the run.
fn fixture() -> (TempDir, PathBuf, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();

    let old = data.join("a.txt");
    let new = data.join("b.txt");
    fs::write(&old, "X").unwrap();
    fs::write(&new, "X").unwrap();
    set_file_mtime(&old, FileTime::from_unix_time(1_000_000, 0)).unwrap();
    set_file_mtime(&new, FileTime::from_unix_time(2_000_000, 0)).unwrap();

    let config = dir.path().join("dupsweep.toml");
    fs::write(&config, "").unwrap();

    (dir, old, new, config)
}

fn cli(data: &Path, config: &Path, extra: &[&str]) -> Cli {
    let mut args = vec![
        "dupsweep".to_string(),
        "-q".to_string(),
        "-p".to_string(),
        data.display().to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_dry_run_is_the_default() {
    let (dir, old, new, config) = fixture();

    let code = run_app(cli(&dir.path().join("data"), &config, &[])).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(old.exists());
    assert!(new.exists());
}

#[test]
fn test_apply_removes_newer_copy() {
    let (dir, old, new, config) = fixture();

    let code = run_app(cli(&dir.path().join("data"), &config, &["--dry", "false", "-c", "4"]))
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(old.exists());
    assert!(!new.exists());
}

#[test]
fn test_config_file_can_disable_dry_run() {
    let (dir, old, new, config) = fixture();
    fs::write(&config, "dry_run = false\nworker_count = 2\n").unwrap();

    run_app(cli(&dir.path().join("data"), &config, &[])).unwrap();

    assert!(old.exists());
    assert!(!new.exists());
}

#[test]
fn test_cli_dry_overrides_config_file() {
    let (dir, old, new, config) = fixture();
    fs::write(&config, "dry_run = false\n").unwrap();

    run_app(cli(&dir.path().join("data"), &config, &["--dry", "true"])).unwrap();

    assert!(old.exists());
    assert!(new.exists());
}

#[test]
fn test_print_config_does_not_scan() {
    let (dir, old, new, config) = fixture();

    let code = run_app(cli(
        &dir.path().join("data"),
        &config,
        &["--dry", "false", "--print-config"],
    ))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(old.exists());
    assert!(new.exists());
}

#[test]
fn test_missing_root_is_general_error() {
    let (dir, _, _, config) = fixture();

    let err = run_app(cli(&dir.path().join("missing"), &config, &[])).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("Path not found"));
}

#[test]
fn test_zero_workers_rejected() {
    let (dir, old, new, config) = fixture();

    let err = run_app(cli(&dir.path().join("data"), &config, &["--dry", "false", "-c", "0"]))
        .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(old.exists());
    assert!(new.exists());
}

#[test]
fn test_missing_config_file_is_error() {
    let (dir, _, _, _) = fixture();
    let missing = dir.path().join("nope.toml");

    let err = run_app(cli(&dir.path().join("data"), &missing, &[])).unwrap_err();

    assert!(format!("{err:#}").contains("config file not found"));
}
