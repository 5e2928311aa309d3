use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["serve", "migrate", "config"] {
        assert!(stdout.contains(subcommand), "missing {subcommand} in:\n{stdout}");
    }
}

#[test]
fn config_prints_resolved_settings() {
    let dir = std::env::temp_dir();
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .current_dir(&dir)
        .env("SHELF_ENV", "local")
        .env("SHELF_CONFIG_DIR", dir.join("shelf-cli-no-such-config"))
        .env("SHELF_SERVER__PORT", "9191")
        .arg("config")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"port\": 9191"), "unexpected output:\n{stdout}");
    assert!(stdout.contains("shelf_session"));
}
