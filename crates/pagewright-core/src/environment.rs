//! Child-process environment for the app build stage.
//!
//! The derived environment is the ambient snapshot with a fixed set of keys
//! laid over it. It is handed to the child explicitly; the orchestrator's own
//! environment is never modified.

use pagewright_schema::{Environment, ResolvedConfig};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

/// Absolute path of the user's site configuration file, when one was given.
pub const CONFIGURATION_FILE_KEY: &str = "PAGEWRIGHT_CONFIGURATION_FILE_PATH";
/// Absolute path of the extracted intermediate artifact.
pub const DATA_FILE_KEY: &str = "PAGEWRIGHT_DATA_FILE_PATH";
/// Absolute path the app build writes its output to.
pub const OUTPUT_DIR_KEY: &str = "PAGEWRIGHT_OUTPUT_DIR_PATH";
/// Blanked so that dev servers never try to open an interactive editor.
pub const EDITOR_KEY: &str = "EDITOR";

/// Artifacts produced by earlier stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedEnvironment {
    vars: BTreeMap<OsString, OsString>,
}

impl DerivedEnvironment {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_os(key).and_then(OsStr::to_str)
    }

    pub fn get_os(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<OsString, OsString> {
        self.vars
    }
}

/// Compute the build stage's environment.
///
/// Relative paths are made absolute against `cwd`; nothing is read from disk,
/// so the result depends only on the arguments.
pub fn project(
    ambient: &Environment,
    config: &ResolvedConfig,
    artifacts: &Artifacts,
    cwd: &Path,
) -> DerivedEnvironment {
    let mut vars = ambient.to_map();

    match config.non_blank("configuration") {
        Some(file) => {
            vars.insert(
                CONFIGURATION_FILE_KEY.into(),
                absolutize(cwd, Path::new(file)),
            );
        }
        // An inherited value would point the app at a file nobody asked for.
        None => {
            vars.remove(OsStr::new(CONFIGURATION_FILE_KEY));
        }
    }
    vars.insert(DATA_FILE_KEY.into(), absolutize(cwd, &artifacts.data_file));
    vars.insert(EDITOR_KEY.into(), OsString::new());
    if let Some(output) = config.non_blank("output") {
        vars.insert(OUTPUT_DIR_KEY.into(), absolutize(cwd, Path::new(output)));
    }

    DerivedEnvironment { vars }
}

/// Lexically absolute form of `path`, resolving `.` and `..` without
/// touching the filesystem.
pub fn absolute_path(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn absolutize(cwd: &Path, path: &Path) -> OsString {
    absolute_path(cwd, path).into_os_string()
}
