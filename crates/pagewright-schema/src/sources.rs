//! The three raw input sources: command line, process environment, config file.

use crate::field::{find, Variant};
use crate::merge::RawValue;
use crate::SchemaError;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Prefix of the environment variable consulted for every non-CLI-only field.
pub const ENV_PREFIX: &str = "INPUT_";

/// `input` -> `INPUT_INPUT`, `build_dir` -> `INPUT_BUILD_DIR`.
pub fn env_var_name(field: &str) -> String {
    format!("{ENV_PREFIX}{}", field.to_uppercase())
}

/// Values given explicitly on the command line.
///
/// Text flags carry their string; presence flags are recorded by name.
/// An unset flag and an absent option look the same to the merger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliInputs {
    values: BTreeMap<String, String>,
    flags: BTreeSet<String>,
}

impl CliInputs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values.insert(field.to_owned(), value.into());
        self
    }

    /// Record an optional value; `None` leaves the field unset.
    #[must_use]
    pub fn maybe_value(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.value(field, v),
            None => self,
        }
    }

    #[must_use]
    pub fn flag(mut self, field: &str, present: bool) -> Self {
        if present {
            self.flags.insert(field.to_owned());
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn has_flag(&self, field: &str) -> bool {
        self.flags.contains(field)
    }
}

/// Snapshot of a process environment.
///
/// Taken once per invocation so that resolution and the child-process
/// environment work from the same view, and so tests can inject their own.
/// Names and values are kept as the OS reported them. Lookups by name only
/// see values that are valid UTF-8; everything is passed on to children
/// byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_os(key).and_then(OsStr::to_str)
    }

    pub fn get_os(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    pub fn to_map(&self) -> BTreeMap<OsString, OsString> {
        self.vars.clone()
    }

    /// Value for a field's `INPUT_*` variable.
    pub fn field_value(&self, field: &str) -> Option<&str> {
        self.get(&env_var_name(field))
    }
}

/// Field values read from a `-c <path>` TOML file.
///
/// Keys map 1:1 onto field names (dashes are accepted in place of
/// underscores). Keys naming a command-line-only field are dropped at load
/// time so they can never reach the merger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    values: BTreeMap<String, RawValue>,
}

impl ConfigFile {
    pub fn load(path: &Path, variant: Variant) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::ConfigFileIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, path, variant)
    }

    pub fn parse(content: &str, path: &Path, variant: Variant) -> Result<Self, SchemaError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|source| SchemaError::ConfigFileParse {
                path: path.display().to_string(),
                source,
            })?;

        let mut values = BTreeMap::new();
        for (key, value) in table {
            let name = key.replace('-', "_");
            let Some(spec) = find(variant, &name) else {
                return Err(SchemaError::UnknownConfigKey {
                    path: path.display().to_string(),
                    key,
                });
            };
            if spec.kind.cli_only() {
                continue;
            }
            let raw = match value {
                toml::Value::String(s) => RawValue::Text(s),
                toml::Value::Boolean(b) if spec.kind.is_flag() => RawValue::Bool(b),
                other => {
                    return Err(SchemaError::malformed(
                        spec,
                        format!(
                            "config file value must be a string, got {}",
                            other.type_str()
                        ),
                    ))
                }
            };
            values.insert(name, raw);
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.values.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
