#![cfg(unix)]

//! Drives the `qbot` binary against a stub `filebot` that records its arguments.

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

struct Fixture {
    td: TempDir,
    stub: PathBuf,
    calls: PathBuf,
    config: PathBuf,
}

impl Fixture {
    fn new(exit_code: i32) -> Self {
        let td = TempDir::new().unwrap();
        let calls = td.path().join("calls.txt");
        let stub = td.path().join("bin").join("filebot");
        fs::create_dir_all(stub.parent().unwrap()).unwrap();
        fs::write(
            &stub,
            format!(
                "#!/bin/sh\nfor a in \"$@\"; do printf '%s\\n' \"$a\" >> '{}'; done\necho '--' >> '{}'\necho 'stub filebot ran'\nexit {}\n",
                calls.display(),
                calls.display(),
                exit_code
            ),
        )
        .unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        // Empty config file so the host's own config never leaks into the run.
        let config = td.path().join("config.xml");
        fs::write(&config, "<config></config>").unwrap();

        Fixture {
            td,
            stub,
            calls,
            config,
        }
    }

    fn path(&self) -> &Path {
        self.td.path()
    }

    fn staging(&self) -> PathBuf {
        self.path().join("staging")
    }

    fn cmd(&self, source: &Path, category: &str) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("qbot"));
        cmd.current_dir(self.path())
            .env("QBOT_CONFIG", &self.config)
            .arg(source)
            .arg(category)
            .arg("-d")
            .arg(self.path().join("plex"))
            .arg("--temp")
            .arg(self.staging())
            .arg("--filebot-bin")
            .arg(&self.stub);
        cmd
    }

    /// Recorded invocations, one Vec of arguments per call.
    fn calls(&self) -> Vec<Vec<String>> {
        let Ok(text) = fs::read_to_string(&self.calls) else {
            return Vec::new();
        };
        text.split("--\n")
            .filter(|c| !c.is_empty())
            .map(|c| c.lines().map(str::to_string).collect())
            .collect()
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn tv_show_run_stages_renames_and_cleans_up() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Show S01 [1080p]");
    src.child("Show.S01E01.mkv").write_str("e1").unwrap();
    src.child("Sub dir/Show.S01E02.MKV").write_str("e2").unwrap();
    src.child("Show.S01E01.srt").write_str("s1").unwrap();
    src.child("Sample/sample.mkv").write_str("s").unwrap();
    src.child("info.nfo").write_str("n").unwrap();

    fx.cmd(src.path(), "tv_show")
        .args(["-n", "Show S01", "-x", "Sample", "-e", "srt,mkv", "-t", "hd,filter:s == 1"])
        .assert()
        .success();

    let calls = fx.calls();
    assert_eq!(calls.len(), 2, "one call per extension group: {calls:?}");

    // Preference order: srt first, then mkv.
    let srt = &calls[0];
    assert_eq!(srt[0], "-rename");
    assert_eq!(srt[1], fx.staging().join("Show.S01E01.srt").display().to_string());
    assert_eq!(srt[2], "-r");

    let mkv = &calls[1];
    assert_eq!(mkv[1], fx.staging().join("Show.S01E01.mkv").display().to_string());
    assert_eq!(mkv[2], fx.staging().join("Show.S01E02.MKV").display().to_string());
    assert_eq!(value_after(mkv, "--db"), Some("TheMovieDB::TV"));
    assert_eq!(
        value_after(mkv, "--format"),
        Some("./{n}/Season {s}/{n} - {s00e00} - {t}")
    );
    assert_eq!(value_after(mkv, "--q"), Some("Show S01"));
    assert_eq!(value_after(mkv, "--action"), Some("move"));
    assert_eq!(value_after(mkv, "--conflict"), Some("skip"));
    assert_eq!(value_after(mkv, "--lang"), Some("en"));
    let expected_output = fx.path().join("plex").join("TV-Show/Real");
    assert_eq!(
        value_after(mkv, "--output"),
        Some(expected_output.display().to_string().as_str())
    );
    assert!(mkv.iter().any(|a| a == "-non-strict"));
    assert_eq!(value_after(mkv, "--filter"), Some("s == 1"));

    // Staging removed; excluded file never left the source.
    assert!(!fx.staging().exists());
    src.child("Sample/sample.mkv").assert("s");
    assert!(!src.child("Show.S01E01.mkv").path().exists());
}

#[test]
fn movie_without_name_omits_query() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Movie.2020.mkv");
    src.write_str("m").unwrap();

    fx.cmd(src.path(), "movie")
        .args(["-a", "copy", "-c", "auto", "-l", "de"])
        .assert()
        .success();

    let calls = fx.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert!(!call.iter().any(|a| a == "--q"));
    assert_eq!(value_after(call, "--db"), Some("TheMovieDB"));
    assert_eq!(value_after(call, "--format"), Some("./{ny}/{ny}"));
    assert_eq!(value_after(call, "--action"), Some("copy"));
    assert_eq!(value_after(call, "--conflict"), Some("auto"));
    assert_eq!(value_after(call, "--lang"), Some("de"));
    assert!(
        value_after(call, "--output")
            .is_some_and(|o| o.ends_with("plex/Movie"))
    );
}

#[test]
fn unsupported_category_fails_before_touching_files() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Album");
    src.child("track.mkv").write_str("t").unwrap();

    fx.cmd(src.path(), "music").assert().failure();

    src.child("track.mkv").assert("t");
    assert!(!fx.staging().exists());
    assert!(fx.calls().is_empty());
}

#[test]
fn invalid_conflict_fails_before_touching_files() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Show");
    src.child("e1.mkv").write_str("1").unwrap();

    fx.cmd(src.path(), "anime")
        .args(["-c", "overwrite"])
        .assert()
        .failure();

    src.child("e1.mkv").assert("1");
    assert!(!fx.staging().exists());
}

#[test]
fn staging_root_with_whitespace_is_rejected() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Show");
    src.child("e1.mkv").write_str("1").unwrap();

    fx.cmd(src.path(), "anime")
        .arg("--temp")
        .arg(fx.path().join("my staging"))
        .assert()
        .failure();

    src.child("e1.mkv").assert("1");
    assert!(!fx.path().join("my staging").exists());
}

#[test]
fn filebot_failure_keeps_staging_and_exits_non_zero() {
    let fx = Fixture::new(2);
    let src = fx.td.child("Show");
    src.child("e1.mkv").write_str("1").unwrap();

    fx.cmd(src.path(), "anime").assert().failure();

    assert_eq!(fx.calls().len(), 1);
    fx.td.child("staging/e1.mkv").assert("1");
}

#[test]
fn no_candidate_extension_skips_filebot() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Docs");
    src.child("readme.txt").write_str("r").unwrap();

    fx.cmd(src.path(), "movie").assert().success();

    assert!(fx.calls().is_empty());
    fx.td.child("staging/readme.txt").assert("r");
}

#[test]
fn dry_run_prints_plan_and_changes_nothing() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Show");
    src.child("e1.mkv").write_str("1").unwrap();
    src.child("e1.nfo").write_str("n").unwrap();

    let out = fx
        .cmd(src.path(), "tv_show")
        .arg("--dry-run")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);

    assert!(stdout.contains("would stage"), "{stdout}");
    assert!(stdout.contains("would run"), "{stdout}");
    assert!(stdout.contains("-rename"), "{stdout}");
    src.child("e1.mkv").assert("1");
    assert!(!fx.staging().exists());
    assert!(fx.calls().is_empty());
}

#[test]
fn log_file_receives_events() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Show");
    src.child("e1.mkv").write_str("1").unwrap();
    let log = fx.path().join("logs").join("qbot.log");

    fx.cmd(src.path(), "anime").arg("--log").arg(&log).assert().success();

    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("Post-processing completed"), "{text}");
    let mode = fs::metadata(&log).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

/// An interrupt during the first group stops the run before the second one, and the
/// interrupted event still reaches the log file.
#[test]
fn interrupt_between_groups_is_logged_to_file() {
    let fx = Fixture::new(0);
    fs::write(
        &fx.stub,
        format!(
            "#!/bin/sh\necho called >> '{}'\necho '--' >> '{}'\nkill -INT $PPID\nsleep 1\nexit 0\n",
            fx.calls.display(),
            fx.calls.display()
        ),
    )
    .unwrap();
    let src = fx.td.child("Show");
    src.child("e1.mkv").write_str("1").unwrap();
    src.child("e1.srt").write_str("s").unwrap();
    let log = fx.path().join("qbot.log");

    fx.cmd(src.path(), "tv_show")
        .args(["-e", "mkv,srt"])
        .arg("--log")
        .arg(&log)
        .assert()
        .failure();

    assert_eq!(fx.calls().len(), 1, "second group must not run");
    assert!(fx.staging().join("e1.srt").exists());
    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("Aborted by user"), "{text}");
    assert!(text.contains("interrupted"), "{text}");
}

#[test]
fn json_logs_are_parseable() {
    let fx = Fixture::new(0);
    let src = fx.td.child("Show");
    src.child("e1.mkv").write_str("1").unwrap();

    let out = fx
        .cmd(src.path(), "anime")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);

    let events: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(!events.is_empty(), "{stdout}");
    assert!(events.iter().all(|e| e.get("level").is_some()));
}

#[test]
fn print_config_reports_env_override() {
    let fx = Fixture::new(0);
    let out = Command::new(assert_cmd::cargo::cargo_bin!("qbot"))
        .env("QBOT_CONFIG", &fx.config)
        .arg("--print-config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    assert!(stdout.contains("QBOT_CONFIG"), "{stdout}");
}
