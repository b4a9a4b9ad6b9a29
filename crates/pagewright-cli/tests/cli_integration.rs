#![cfg(unix)]
//! CLI subprocess integration tests.
//!
//! These tests invoke the `pagewright` binary with the mock extractor and a
//! shell script standing in for the app build, and check exit codes, stdout
//! and the JSON report.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::time::{Duration, Instant};

const FIELD_VARS: [&str; 6] = [
    "INPUT_INPUT",
    "INPUT_OUTPUT",
    "INPUT_CACHE",
    "INPUT_CONFIGURATION",
    "INPUT_DEBUG",
    "INPUT_DEV",
];

fn pagewright_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pagewright"));
    for var in FIELD_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("PAGEWRIGHT_APP_DIR")
        .env_remove("PAGEWRIGHT_BUILD_TIMEOUT_SECS")
        .env_remove("PAGEWRIGHT_LOG")
        .env("PAGEWRIGHT_EXTRACTOR", "mock");
    cmd
}

struct Site {
    root: tempfile::TempDir,
}

impl Site {
    /// A docs tree, an output dir and an app dir whose build script records
    /// what it was given.
    fn new(script: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("docs/guide")).unwrap();
        std::fs::create_dir_all(root.path().join("out")).unwrap();
        std::fs::create_dir_all(root.path().join("app")).unwrap();
        std::fs::write(root.path().join("docs/index.md"), "# Home\n").unwrap();
        std::fs::write(root.path().join("docs/guide/setup.md"), "# Setup\n").unwrap();
        std::fs::write(root.path().join("app/build.sh"), script).unwrap();
        Self { root }
    }

    fn recording() -> Self {
        Self::new(
            "cp \"$PAGEWRIGHT_DATA_FILE_PATH\" \"$PAGEWRIGHT_OUTPUT_DIR_PATH/data.ttl\"\n\
             printf '%s' \"x${EDITOR}x\" > \"$PAGEWRIGHT_OUTPUT_DIR_PATH/editor\"\n",
        )
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn arg(&self, rel: &str) -> String {
        self.path(rel).to_string_lossy().into_owned()
    }

    fn command(&self) -> Command {
        let mut cmd = pagewright_bin();
        cmd.current_dir(self.root.path())
            .env("PAGEWRIGHT_APP_DIR", self.path("app"))
            .env("PAGEWRIGHT_BUILD_COMMAND", "sh build.sh");
        cmd
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout must be JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn cli_version_exits_zero() {
    let output = pagewright_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pagewright"));
}

#[test]
fn cli_help_lists_commands() {
    let output = pagewright_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["action", "build", "resolve", "completions", "man-pages"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn cli_build_runs_pipeline() {
    let site = Site::recording();
    let output = site
        .command()
        .args(["--json", "build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "build must exit 0. stderr: {}",
        stderr(&output)
    );
    let report = json(&output);
    assert_eq!(report["variant"], "build");
    assert_eq!(report["timed_out"], false);
    assert_eq!(report["states"].as_array().unwrap().last().unwrap(), "done");
    assert_eq!(
        std::fs::canonicalize(report["output_dir"].as_str().unwrap()).unwrap(),
        std::fs::canonicalize(site.path("out")).unwrap()
    );

    let ttl = read(&site.path("out/data.ttl"));
    assert!(ttl.contains("guide/setup.md"));
    assert!(ttl.contains("index.md"));
    assert_eq!(read(&site.path("out/editor")), "xx");
}

#[test]
fn cli_build_human_output() {
    let site = Site::recording();
    let output = site
        .command()
        .args(["build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("output:"));
    assert!(stdout.contains("data digest:"));
}

#[test]
fn cli_build_missing_input_is_config_error() {
    let site = Site::recording();
    let output = site
        .command()
        .args(["build", "--output", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("missing required field 'input'"), "{err}");
    assert!(err.contains("INPUT_INPUT"), "{err}");
    assert!(!site.path("out/data.ttl").exists());
}

#[test]
fn cli_build_malformed_debug_is_config_error() {
    let site = Site::recording();
    let output = site
        .command()
        .env("INPUT_DEBUG", "loudly")
        .args(["build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("debug"));
}

#[test]
fn cli_env_supplies_missing_fields() {
    let site = Site::recording();
    let output = site
        .command()
        .env("INPUT_INPUT", site.path("docs"))
        .env("INPUT_OUTPUT", site.path("out"))
        .arg("build")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(site.path("out/data.ttl").exists());
}

#[test]
fn cli_missing_app_dir_is_stage_error() {
    let site = Site::recording();
    let output = site
        .command()
        .env("PAGEWRIGHT_APP_DIR", site.path("no-such-app"))
        .args(["build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("app directory not found"), "{err}");
    assert!(err.contains("no-such-app"), "{err}");
    assert!(!site.path("out/data.ttl").exists());
}

#[test]
fn cli_build_timeout_still_succeeds() {
    let site = Site::new("exec sleep 10\n");
    let output = site
        .command()
        .env("PAGEWRIGHT_BUILD_TIMEOUT_SECS", "1")
        .args(["--json", "build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report = json(&output);
    assert_eq!(report["timed_out"], true);
    assert_eq!(report["warnings"].as_array().unwrap().len(), 1);
}

#[test]
fn cli_failing_build_is_stage_error() {
    let site = Site::new("exit 7\n");
    let output = site
        .command()
        .args(["build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("build failed"));
}

#[test]
fn cli_unknown_extractor_is_stage_error() {
    let site = Site::recording();
    let output = site
        .command()
        .env("PAGEWRIGHT_EXTRACTOR", "pagewright-no-such-extractor")
        .args(["build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("extraction failed"));
}

#[test]
fn cli_bad_timeout_setting_is_config_error() {
    let site = Site::recording();
    let output = site
        .command()
        .env("PAGEWRIGHT_BUILD_TIMEOUT_SECS", "forever")
        .args(["build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("PAGEWRIGHT_BUILD_TIMEOUT_SECS"));
}

#[test]
fn cli_action_forwards_to_build() {
    let site = Site::recording();
    let output = site
        .command()
        .env("INPUT_DEBUG", "true")
        .args(["--json", "action", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report = json(&output);
    assert_eq!(report["variant"], "build");
    assert!(site.path("out/data.ttl").exists());
    assert!(stderr(&output).contains("build --debug --input docs --output out"));
}

#[test]
fn cli_action_missing_output_is_config_error() {
    let site = Site::recording();
    let output = site
        .command()
        .args(["action", "--input", "docs"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("'output'"));
}

#[test]
fn cli_config_file_sits_below_flags() {
    let site = Site::recording();
    std::fs::write(
        site.path("pagewright.toml"),
        format!(
            "input = \"{}\"\noutput = \"{}\"\n",
            site.arg("docs"),
            site.arg("elsewhere")
        ),
    )
    .unwrap();
    let output = site
        .command()
        .args([
            "--json",
            "build",
            "-c",
            "pagewright.toml",
            "--output",
            "out",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(site.path("out/data.ttl").exists());
    assert!(!site.path("elsewhere").exists());
}

#[test]
fn cli_unreadable_config_file_is_config_error() {
    let site = Site::recording();
    let output = site
        .command()
        .args(["build", "-c", "missing.toml", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("missing.toml"));
}

#[test]
fn cli_resolve_reports_origins() {
    let output = pagewright_bin()
        .env("INPUT_OUTPUT", "/env/out")
        .args(["--json", "resolve", "build", "--input", "/cli/docs"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let config = json(&output);
    let values = &config["values"];
    assert_eq!(values["input"]["value"], "/cli/docs");
    assert_eq!(values["input"]["origin"], "cli");
    assert_eq!(values["output"]["value"], "/env/out");
    assert_eq!(values["output"]["origin"], "env");
    assert_eq!(values["cache"]["origin"], "default");
    assert_eq!(values["dev"]["value"], false);
}

#[test]
fn cli_resolve_ignores_dev_from_env() {
    let output = pagewright_bin()
        .env("INPUT_DEV", "true")
        .args(["--json", "resolve", "build", "--input", "a", "--output", "b"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(json(&output)["values"]["dev"]["value"], false);
}

#[test]
fn cli_resolve_action_rejects_dev() {
    let output = pagewright_bin()
        .args(["resolve", "action", "--dev", "--input", "a", "--output", "b"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("no dev flag"));
}

#[test]
fn cli_resolve_action_rejects_config_file() {
    let output = pagewright_bin()
        .args(["resolve", "action", "-c", "x.toml", "--input", "a", "--output", "b"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_completions_bash() {
    let output = pagewright_bin()
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pagewright"));
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let output = pagewright_bin()
        .arg("man-pages")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("pagewright.1").exists());
    assert!(dir.path().join("pagewright-build.1").exists());
}

#[test]
fn cli_build_passes_non_utf8_environment_through() {
    let site = Site::new("printf '%s' \"$SITE_RAW_LOCALE\" > \"$PAGEWRIGHT_OUTPUT_DIR_PATH/raw\"\n");
    let output = site
        .command()
        .env("SITE_RAW_LOCALE", OsStr::from_bytes(b"a\xffb"))
        .args(["build", "--input", "docs", "--output", "out"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(std::fs::read(site.path("out/raw")).unwrap(), b"a\xffb");
}

/// Start a build whose script announces itself and then sleeps, with the
/// scratch directory placed under the site's own `tmp`.
fn start_sleeping_build(site: &Site) -> Child {
    std::fs::create_dir_all(site.path("tmp")).unwrap();
    let child = site
        .command()
        .env("TMPDIR", site.path("tmp"))
        .args(["build", "--input", "docs", "--output", "out"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let started = site.path("out/started");
    let deadline = Instant::now() + Duration::from_secs(20);
    while !started.exists() {
        assert!(Instant::now() < deadline, "build script never started");
        std::thread::sleep(Duration::from_millis(50));
    }
    child
}

fn signal(child: &Child, sig: Signal) {
    kill(Pid::from_raw(i32::try_from(child.id()).unwrap()), sig).unwrap();
}

fn wait_bounded(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + Duration::from_secs(15);
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("pagewright did not exit after being signalled");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn tmp_entries(site: &Site) -> usize {
    std::fs::read_dir(site.path("tmp")).unwrap().count()
}

const SLEEPING_BUILD: &str = "touch \"$PAGEWRIGHT_OUTPUT_DIR_PATH/started\"\nsleep 30\n";

#[test]
fn cli_sigterm_removes_scratch() {
    let site = Site::new(SLEEPING_BUILD);
    let mut child = start_sleeping_build(&site);
    assert_eq!(tmp_entries(&site), 1, "scratch directory must exist mid-build");

    signal(&child, Signal::SIGTERM);
    let status = wait_bounded(&mut child);

    assert_eq!(status.code(), Some(3));
    assert_eq!(tmp_entries(&site), 0);
}

#[test]
fn cli_second_interrupt_removes_scratch() {
    let site = Site::new(SLEEPING_BUILD);
    let mut child = start_sleeping_build(&site);
    assert_eq!(tmp_entries(&site), 1, "scratch directory must exist mid-build");

    signal(&child, Signal::SIGINT);
    signal(&child, Signal::SIGINT);
    let status = wait_bounded(&mut child);

    assert!(matches!(status.code(), Some(3 | 130)), "{status}");
    assert_eq!(tmp_entries(&site), 0);
}
