//! Orchestrator settings.
//!
//! These are not configuration fields: they describe where the collaborators
//! live and how long the build may run, and come only from the environment.

use crate::CoreError;
use pagewright_schema::Environment;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXTRACTOR_VAR: &str = "PAGEWRIGHT_EXTRACTOR";
pub const APP_DIR_VAR: &str = "PAGEWRIGHT_APP_DIR";
pub const BUILD_TIMEOUT_VAR: &str = "PAGEWRIGHT_BUILD_TIMEOUT_SECS";
pub const BUILD_COMMAND_VAR: &str = "PAGEWRIGHT_BUILD_COMMAND";

pub const DEFAULT_EXTRACTOR: &str = "pagewright-extract";
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(1800);
const SYSTEM_APP_DIR: &str = "/usr/share/pagewright/app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Extractor program, or `mock`.
    pub extractor: String,
    /// Probed in order; the first existing directory hosts the app build.
    pub app_dir_candidates: Vec<PathBuf>,
    pub build_command: Vec<String>,
    pub dev_command: Vec<String>,
    /// `None` waits for the build indefinitely.
    pub build_timeout: Option<Duration>,
    /// Parent for scratch directories; the system temp dir when unset.
    pub scratch_root: Option<PathBuf>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            extractor: DEFAULT_EXTRACTOR.to_owned(),
            app_dir_candidates: default_app_dir_candidates(),
            build_command: words("npm run build"),
            dev_command: words("npm run dev"),
            build_timeout: Some(DEFAULT_BUILD_TIMEOUT),
            scratch_root: None,
        }
    }
}

impl RunnerSettings {
    pub fn from_env(env: &Environment) -> Result<Self, CoreError> {
        let mut settings = Self::default();

        if let Some(extractor) = non_blank(env, EXTRACTOR_VAR) {
            settings.extractor = extractor.to_owned();
        }
        if let Some(dir) = non_blank(env, APP_DIR_VAR) {
            settings.app_dir_candidates.insert(0, PathBuf::from(dir));
        }
        if let Some(secs) = non_blank(env, BUILD_TIMEOUT_VAR) {
            let secs: u64 = secs.parse().map_err(|_| {
                CoreError::Settings(format!(
                    "{BUILD_TIMEOUT_VAR} must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            settings.build_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(command) = non_blank(env, BUILD_COMMAND_VAR) {
            settings.build_command = words(command);
            settings.dev_command = settings.build_command.clone();
        }

        Ok(settings)
    }

    /// The app command for this invocation.
    pub fn command(&self, dev: bool) -> &[String] {
        if dev {
            &self.dev_command
        } else {
            &self.build_command
        }
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

/// `<exe dir>/../share/pagewright/app`, then the system-wide location.
pub fn default_app_dir_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(bin_dir) = std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
    {
        candidates.push(bin_dir.join("../share/pagewright/app"));
    }
    candidates.push(PathBuf::from(SYSTEM_APP_DIR));
    candidates
}

fn non_blank<'a>(env: &'a Environment, key: &str) -> Option<&'a str> {
    env.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn words(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = RunnerSettings::from_env(&Environment::default()).unwrap();
        assert_eq!(settings.extractor, DEFAULT_EXTRACTOR);
        assert_eq!(settings.build_timeout, Some(DEFAULT_BUILD_TIMEOUT));
        assert_eq!(settings.command(false), ["npm", "run", "build"]);
        assert_eq!(settings.command(true), ["npm", "run", "dev"]);
        assert_eq!(
            settings.app_dir_candidates.last(),
            Some(&PathBuf::from(SYSTEM_APP_DIR))
        );
    }

    #[test]
    fn app_dir_override_is_probed_first() {
        let env = Environment::from_pairs([(APP_DIR_VAR, "/opt/site")]);
        let settings = RunnerSettings::from_env(&env).unwrap();
        assert_eq!(settings.app_dir_candidates[0], PathBuf::from("/opt/site"));
        assert!(settings.app_dir_candidates.len() >= 2);
    }

    #[test]
    fn zero_timeout_disables() {
        let env = Environment::from_pairs([(BUILD_TIMEOUT_VAR, "0")]);
        assert_eq!(RunnerSettings::from_env(&env).unwrap().build_timeout, None);

        let env = Environment::from_pairs([(BUILD_TIMEOUT_VAR, " 90 ")]);
        assert_eq!(
            RunnerSettings::from_env(&env).unwrap().build_timeout,
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn bad_timeout_is_a_settings_error() {
        let env = Environment::from_pairs([(BUILD_TIMEOUT_VAR, "soon")]);
        let err = RunnerSettings::from_env(&env).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn command_override_applies_to_both_modes() {
        let env = Environment::from_pairs([
            (BUILD_COMMAND_VAR, "sh build.sh"),
            (EXTRACTOR_VAR, "mock"),
        ]);
        let settings = RunnerSettings::from_env(&env).unwrap();
        assert_eq!(settings.extractor, "mock");
        assert_eq!(settings.command(false), ["sh", "build.sh"]);
        assert_eq!(settings.command(true), ["sh", "build.sh"]);
    }
}
