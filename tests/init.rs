use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_deltacov"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "deltacov init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".deltacov.toml");
    assert!(config_path.exists(), ".deltacov.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[repository]"));
    assert!(content.contains("[diff]"));
    assert!(content.contains("[exclude]"));

    let config = deltacov_core::DeltacovConfig::from_toml(&content).unwrap();
    assert_eq!(config.diff.chunk_size, 100);
    assert_eq!(config.repository.remote, "origin");
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".deltacov.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_deltacov"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".deltacov.toml")).unwrap();
    assert_eq!(content, "# existing");
}
