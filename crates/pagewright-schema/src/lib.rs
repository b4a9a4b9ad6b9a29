//! Configuration schema layer for pagewright.
//!
//! This crate declares the recognized input fields for each action variant
//! (`FieldSpec`), collects raw values from the command line, the process
//! environment and an optional TOML config file (`sources`), merges them by
//! precedence into a `ResolvedConfig` (`merge`), and validates the result
//! (`validate`). Nothing here touches the pipeline; it is pure input handling.

pub mod field;
pub mod merge;
pub mod resolved;
pub mod sources;
pub mod validate;

pub use field::{fields, FieldKind, FieldSpec, Variant, ACTION_FIELDS, BUILD_FIELDS};
pub use merge::{collect, resolve, RawInputSet, RawValue, RawValues};
pub use resolved::{FieldValue, Origin, ResolvedConfig, ResolvedValue};
pub use sources::{env_var_name, CliInputs, ConfigFile, Environment, ENV_PREFIX};
pub use validate::{parse_flag, validate};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required field '{field}': pass --{flag} or set {env}")]
    MissingRequiredField {
        field: String,
        flag: String,
        env: String,
    },
    #[error("malformed value for field '{field}': {reason}")]
    MalformedValue { field: String, reason: String },
    #[error("failed to read config file {path}: {source}")]
    ConfigFileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigFileParse {
        path: String,
        source: toml::de::Error,
    },
    #[error("config file {path}: unknown key '{key}'")]
    UnknownConfigKey { path: String, key: String },
}

impl SchemaError {
    pub(crate) fn missing(spec: &FieldSpec) -> Self {
        Self::MissingRequiredField {
            field: spec.name.to_owned(),
            flag: spec.flag_name(),
            env: env_var_name(spec.name),
        }
    }

    pub(crate) fn malformed(spec: &FieldSpec, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            field: spec.name.to_owned(),
            reason: reason.into(),
        }
    }

    /// Name of the field this error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field, .. } | Self::MalformedValue { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}
