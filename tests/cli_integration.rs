use serde_json::Value;
use std::fs;
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

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

fn tweet_line(user: &str, id: i64, utc: &str) -> String {
    format!("{utc}\t{utc}\t{user}\t{id}\ttext {id}\tnone\tnone\n")
}

struct Output {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

fn run_twextender(args: &[&str], home: &Path) -> Output {
    let bin = std::env::var("CARGO_BIN_EXE_twextender").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("twextender.exe");
        } else {
            path.push("twextender");
        }
        path.to_string_lossy().into_owned()
    });
    let output = Command::new(bin)
        .args(args)
        // Keep any real config out of the way
        .env("HOME", home)
        .env("TWEXTENDER_CONFIG", home.join("absent.toml"))
        .output()
        .expect("run twextender");
    Output {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

fn tweets_fixture(root: &Path) -> PathBuf {
    let tweets = root.join("tweets");
    write_file(
        &tweets.join("politics").join("alice.txt"),
        &(tweet_line("alice", 500, "2016-07-10T00:00:00") + &tweet_line("alice", 400, "2016-07-08T00:00:00")),
    );
    write_file(
        &tweets.join("news").join("bob.txt"),
        &tweet_line("bob", 90, "2016-06-01T12:30:00"),
    );
    write_file(&tweets.join("news").join(".DS_Store"), "junk");
    tweets
}

#[test]
fn create_then_list_json() {
    let root = unique_temp_dir("create");
    let tweets = tweets_fixture(&root);
    let journal = root.join("test.journal");
    let journal_str = journal.to_string_lossy().into_owned();
    let tweets_str = tweets.to_string_lossy().into_owned();

    let out = run_twextender(&["-q", "-c", &journal_str, "-t", &tweets_str], &root);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(
        out.stdout.trim(),
        format!("2 user-records written to journal at {journal_str}")
    );
    assert!(journal.join("alice.journal").is_file());
    assert!(journal.join("bob.journal").is_file());

    let out = run_twextender(&["-q", "-l", &journal_str, "--json"], &root);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    let json: Value = serde_json::from_str(&out.stdout).expect("json");
    let arr = json.as_array().expect("array output");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["user"].as_str(), Some("alice"));
    assert_eq!(arr[0]["state"].as_str(), Some("finished"));
    assert_eq!(arr[0]["max_id"].as_i64(), Some(400));
    assert_eq!(arr[1]["user"].as_str(), Some("bob"));
    assert_eq!(arr[1]["last_tweet_date"].as_str(), Some("2016-06-01T12:30:00"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn create_refuses_to_overwrite() {
    let root = unique_temp_dir("overwrite");
    let tweets = tweets_fixture(&root);
    let journal = root.join("existing.journal");
    fs::create_dir_all(&journal).expect("create journal dir");
    let journal_str = journal.to_string_lossy().into_owned();
    let tweets_str = tweets.to_string_lossy().into_owned();

    let out = run_twextender(&["-c", &journal_str, "-t", &tweets_str], &root);
    assert_eq!(out.code, Some(2));
    assert!(out
        .stderr
        .starts_with("A file at the given journal path already exists. Refusing to overwrite"));
    assert!(out.stderr.contains("Usage:"));
    assert!(out.stdout.is_empty());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn sanity_checks_exit_with_usage_status() {
    let root = unique_temp_dir("sanity");
    let cases: Vec<(Vec<&str>, &str)> = vec![
        (vec!["-c", "/nonexistent/out.journal"], "You must supply a path to a tweets directory"),
        (
            vec!["-c", "/nonexistent/out.journal", "-p", "/j", "-t", "/t"],
            "Cannot create and process a journal at the same time",
        ),
        (
            vec!["-c", "/nonexistent/out.journal", "-t", "/t", "-d", "2016-07-01"],
            "Target date is not to be used when creating a journal",
        ),
        (
            vec!["-p", "/j", "-t", "/t"],
            "A target date must be specified when processing a journal",
        ),
        (vec!["-p", "/j", "-t", "/t", "-d", "July"], r#"Invalid date "July""#),
        (vec![], "Need to specify either a --create-journal, --process-journal or --list-journal action"),
    ];

    for (args, message) in &cases {
        let out = run_twextender(args, &root);
        assert_eq!(out.code, Some(2), "args: {args:?}");
        assert!(
            out.stderr.starts_with(message),
            "args: {args:?}, stderr: {}",
            out.stderr
        );
    }

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn process_without_keys_fails_at_runtime() {
    let root = unique_temp_dir("nokeys");
    let tweets = tweets_fixture(&root);
    let journal = root.join("test.journal");
    let journal_str = journal.to_string_lossy().into_owned();
    let tweets_str = tweets.to_string_lossy().into_owned();

    let out = run_twextender(&["-q", "-c", &journal_str, "-t", &tweets_str], &root);
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    let keys = root.join("missing-keys.json").to_string_lossy().into_owned();
    let out = run_twextender(
        &["-q", "-p", &journal_str, "-t", &tweets_str, "-d", "20160701", "-k", &keys],
        &root,
    );
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.starts_with("Error: Failed to load keys from"), "stderr: {}", out.stderr);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn list_missing_journal_is_an_error() {
    let root = unique_temp_dir("list-missing");
    let missing = root.join("nope.journal").to_string_lossy().into_owned();
    let out = run_twextender(&["-l", &missing], &root);
    assert_ne!(out.code, Some(0));
    assert!(out.stderr.starts_with("No journal found at"), "stderr: {}", out.stderr);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn process_missing_journal_is_reported_before_keys() {
    let root = unique_temp_dir("process-missing");
    let tweets = tweets_fixture(&root);
    let tweets_str = tweets.to_string_lossy().into_owned();
    let missing = root.join("nope.journal").to_string_lossy().into_owned();
    let keys = root.join("missing-keys.json").to_string_lossy().into_owned();

    let out = run_twextender(
        &["-q", "-p", &missing, "-t", &tweets_str, "-d", "2016-07-01", "-k", &keys],
        &root,
    );
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.starts_with("No journal found at"), "stderr: {}", out.stderr);

    let _ = fs::remove_dir_all(&root);
}
