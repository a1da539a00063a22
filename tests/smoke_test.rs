/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

fn ringviz(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ringviz"))
        .args(args)
        .output()
        .expect("Failed to execute ringviz")
}

#[test]
fn binary_shows_help() {
    let output = ringviz(&["--help"]);

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ringviz"), "Help output should mention ringviz");
    assert!(stdout.contains("snapshot"), "Help output should list snapshot");
}

#[test]
fn binary_shows_version() {
    let output = ringviz(&["--version"]);

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn invalid_subcommand_fails_gracefully() {
    let output = ringviz(&["nonexistent-command"]);

    assert!(
        !output.status.success(),
        "Invalid subcommand should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("panicked at"),
        "Invalid subcommand should not cause panic"
    );
}

#[test]
fn snapshot_renders_headless() {
    let out = std::env::temp_dir().join(format!("ringviz-smoke-{}.png", std::process::id()));
    let output = ringviz(&[
        "snapshot",
        "-o",
        out.to_str().unwrap(),
        "-W",
        "160",
        "-H",
        "120",
        "-t",
        "5",
        "--tone",
        "220",
        "--logo",
        "/nonexistent/logo.png",
    ]);

    assert!(
        output.status.success(),
        "snapshot failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(out.exists(), "snapshot should write the image");
    let _ = std::fs::remove_file(&out);
}
