#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("twextender-{prefix}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn launcher_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_twextender-launch"))
}

/// Stand-in interpreter that records its working directory and arguments
fn fake_interpreter(dir: &Path) -> PathBuf {
    let path = dir.join("fake-python");
    fs::write(
        &path,
        "#!/bin/sh\npwd > \"$FAKE_OUT\"\nfor arg in \"$@\"; do echo \"$arg\" >> \"$FAKE_OUT\"; done\nexit \"${FAKE_CODE:-0}\"\n",
    )
    .expect("write fake interpreter");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn write_config(dir: &Path, interpreter: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(
        &path,
        format!(
            "[launch]\ninterpreter = \"{interpreter}\"\ntweets_dir = \"/data/tweets\"\n"
        ),
    )
    .expect("write config");
    path
}

fn launch(config: &Path, fake_out: &Path, fake_code: i32) -> Option<i32> {
    Command::new(launcher_bin())
        .env("TWEXTENDER_CONFIG", config)
        .env("FAKE_OUT", fake_out)
        .env("FAKE_CODE", fake_code.to_string())
        .status()
        .expect("run launcher")
        .code()
}

#[test]
fn runs_program_with_fixed_arguments_from_launcher_dir() {
    let root = unique_temp_dir("launch");
    let interpreter = fake_interpreter(&root);
    let config = write_config(&root, &interpreter.to_string_lossy());
    let fake_out = root.join("out.txt");

    assert_eq!(launch(&config, &fake_out, 0), Some(0));

    let recorded = fs::read_to_string(&fake_out).expect("fake interpreter ran");
    let lines: Vec<&str> = recorded.lines().collect();
    let expected_dir = launcher_bin()
        .parent()
        .expect("launcher dir")
        .canonicalize()
        .expect("canonical launcher dir");
    assert_eq!(
        Path::new(lines[0]).canonicalize().expect("canonical cwd"),
        expected_dir
    );
    assert_eq!(
        &lines[1..],
        &[
            "main.py",
            "-d",
            "2016-07-01",
            "-p",
            "/Users/bryanfeeney/opt-hillary/twextender.journal",
            "-t",
            "/data/tweets",
        ]
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn child_exit_status_is_forwarded() {
    let root = unique_temp_dir("launch-status");
    let interpreter = fake_interpreter(&root);
    let config = write_config(&root, &interpreter.to_string_lossy());
    let fake_out = root.join("out.txt");

    assert_eq!(launch(&config, &fake_out, 1), Some(1));
    assert_eq!(launch(&config, &fake_out, 42), Some(42));

    // A child exiting 127 is forwarded as is, not mistaken for a missing interpreter
    fs::remove_file(&fake_out).expect("reset output");
    assert_eq!(launch(&config, &fake_out, 127), Some(127));
    let recorded = fs::read_to_string(&fake_out).expect("fake interpreter ran");
    assert!(recorded.lines().any(|l| l == "main.py"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn missing_interpreter_exits_127_without_spawning() {
    let root = unique_temp_dir("launch-missing");
    let config = write_config(&root, "twextender-no-such-interpreter");
    let fake_out = root.join("out.txt");

    let output = Command::new(launcher_bin())
        .env("TWEXTENDER_CONFIG", &config)
        .env("FAKE_OUT", &fake_out)
        .output()
        .expect("run launcher");
    assert_eq!(output.status.code(), Some(127));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr).trim(),
        "twextender-no-such-interpreter: command not found"
    );
    assert!(!fake_out.exists());

    let _ = fs::remove_dir_all(&root);
}
