//! The one way pagewright starts a child process.
//!
//! Callers hand over an argument vector, a complete environment and a working
//! directory; platform quirks (Windows command shims, Unix process groups)
//! are handled here and nowhere else. The child's stdout/stderr are inherited
//! so build tool output reaches the user unchanged.
//!
//! On Unix every child leads its own process group. Timeouts and shutdown
//! requests signal the whole group, so tools that fork helpers (`npm run`
//! starting `node`, a shell script starting a dev server) are stopped along
//! with their parent.

use crate::RuntimeError;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long a timed-out group gets between SIGTERM and SIGKILL.
#[cfg(unix)]
const KILL_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Complete child environment. Nothing is inherited implicitly, and
    /// values need not be valid UTF-8.
    pub env: BTreeMap<OsString, OsString>,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, env: BTreeMap<OsString, OsString>) -> Self {
        self.env = env;
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `program arg1 arg2`, for log lines.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub elapsed: Duration,
}

/// Run a process to completion.
///
/// Spawn failures, non-zero exits and timeouts are distinct error variants so
/// that callers can match on the one they are prepared to recover from. On
/// timeout the child's process group is stopped and the child reaped before
/// returning.
pub fn run(spec: &ProcessSpec) -> Result<ProcessOutput, RuntimeError> {
    let program = resolve_program(&spec.program, &spec.env);
    let mut cmd = Command::new(&program);
    cmd.args(&spec.args)
        .env_clear()
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    group::isolate(&mut cmd);

    debug!("spawning: {}", spec.command_line());
    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| RuntimeError::Spawn {
        program: spec.program.clone(),
        source,
    })?;
    group::track(&child);
    let waited = wait(spec, &mut child, started);
    group::untrack();
    let status = waited?;

    let elapsed = started.elapsed();
    debug!("'{}' finished with {status} in {elapsed:?}", spec.program);
    if !status.success() {
        return Err(RuntimeError::NonZeroExit {
            program: spec.program.clone(),
            status: status.to_string(),
        });
    }
    Ok(ProcessOutput { status, elapsed })
}

fn wait(
    spec: &ProcessSpec,
    child: &mut Child,
    started: Instant,
) -> Result<ExitStatus, RuntimeError> {
    let Some(limit) = spec.timeout else {
        return Ok(child.wait()?);
    };
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if started.elapsed() >= limit {
            warn!(
                "'{}' exceeded {}s, stopping process group {}",
                spec.program,
                limit.as_secs(),
                child.id()
            );
            group::stop(child);
            return Err(RuntimeError::Timeout {
                program: spec.program.clone(),
                after: limit,
            });
        }
        std::thread::sleep(POLL_INTERVAL.min(limit));
    }
}

/// Ask the process group of the child currently being run to terminate.
///
/// Meant for signal handlers: it only sends a signal and returns. Does
/// nothing when no child is running.
pub fn terminate_running() {
    group::signal_running(false);
}

/// Kill the process group of the child currently being run.
pub fn kill_running() {
    group::signal_running(true);
}

#[cfg(unix)]
mod group {
    use super::{Child, Command, Instant, KILL_GRACE, POLL_INTERVAL};
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    use std::os::unix::process::CommandExt;
    use std::sync::atomic::{AtomicI32, Ordering};

    /// Process group id of the child being waited on; 0 when there is none.
    static RUNNING: AtomicI32 = AtomicI32::new(0);

    pub(super) fn isolate(cmd: &mut Command) {
        cmd.process_group(0);
    }

    pub(super) fn track(child: &Child) {
        RUNNING.store(group_id(child), Ordering::SeqCst);
    }

    pub(super) fn untrack() {
        RUNNING.store(0, Ordering::SeqCst);
    }

    pub(super) fn signal_running(force: bool) {
        let pgid = RUNNING.load(Ordering::SeqCst);
        signal(pgid, if force { Signal::SIGKILL } else { Signal::SIGTERM });
    }

    /// SIGTERM the group, give it `KILL_GRACE` to exit, then SIGKILL whatever
    /// is left and reap the child.
    pub(super) fn stop(child: &mut Child) {
        let pgid = group_id(child);
        signal(pgid, Signal::SIGTERM);
        let deadline = Instant::now() + KILL_GRACE;
        while Instant::now() < deadline {
            if matches!(child.try_wait(), Ok(Some(_))) {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        signal(pgid, Signal::SIGKILL);
        let _ = child.kill();
        let _ = child.wait();
    }

    fn signal(pgid: i32, sig: Signal) {
        // 0 would address our own group.
        if pgid > 0 {
            let _ = killpg(Pid::from_raw(pgid), sig);
        }
    }

    fn group_id(child: &Child) -> i32 {
        i32::try_from(child.id()).unwrap_or(0)
    }
}

#[cfg(not(unix))]
mod group {
    use super::{Child, Command};

    pub(super) fn isolate(_cmd: &mut Command) {}

    pub(super) fn track(_child: &Child) {}

    pub(super) fn untrack() {}

    // Console Ctrl-C already reaches every process attached to the console.
    pub(super) fn signal_running(_force: bool) {}

    pub(super) fn stop(child: &mut Child) {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// On Windows, tools like `npm` are `.cmd` shims that `CreateProcess` will not
/// find by bare name. Look them up on the child's PATH.
#[cfg(windows)]
fn resolve_program(program: &str, env: &BTreeMap<OsString, OsString>) -> PathBuf {
    let bare = Path::new(program);
    if bare.extension().is_some() || bare.components().count() > 1 {
        return bare.to_path_buf();
    }
    let path_var = env
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("PATH"))
        .map(|(_, v)| v.as_os_str())
        .unwrap_or_default();
    for dir in std::env::split_paths(path_var) {
        for ext in ["exe", "cmd", "bat"] {
            let candidate = dir.join(program).with_extension(ext);
            if candidate.is_file() {
                return candidate;
            }
        }
    }
    bare.to_path_buf()
}

#[cfg(not(windows))]
fn resolve_program(program: &str, _env: &BTreeMap<OsString, OsString>) -> PathBuf {
    Path::new(program).to_path_buf()
}
