//! Precedence merge of raw source values into a `ResolvedConfig`.
//!
//! Per field, highest first: command line, `INPUT_*` environment variable,
//! config file, static default. Whitespace-only values count as absent and
//! fall through to the next source.

use crate::field::{FieldSpec, Variant};
use crate::resolved::{FieldValue, Origin, ResolvedConfig, ResolvedValue};
use crate::sources::{CliInputs, ConfigFile, Environment};
use crate::validate::parse_flag;
use crate::SchemaError;

/// A value as found in one source, before precedence is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Bool(bool),
}

impl RawValue {
    /// Blank text is indistinguishable from an absent value.
    fn present(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Bool(_) => true,
        }
    }
}

/// What each source said about a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawValues {
    pub cli: Option<RawValue>,
    pub env: Option<RawValue>,
    pub file: Option<RawValue>,
}

impl RawValues {
    /// First present value in precedence order.
    fn winner(&self) -> Option<(Origin, &RawValue)> {
        [
            (Origin::Cli, self.cli.as_ref()),
            (Origin::Env, self.env.as_ref()),
            (Origin::File, self.file.as_ref()),
        ]
        .into_iter()
        .find_map(|(origin, raw)| raw.filter(|r| r.present()).map(|r| (origin, r)))
    }
}

/// Raw values for every field of one variant, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInputSet {
    pub variant: Variant,
    pub entries: Vec<(FieldSpec, RawValues)>,
}

/// Gather each field's value from every source that may supply it.
pub fn collect(
    variant: Variant,
    cli: &CliInputs,
    env: &Environment,
    file: Option<&ConfigFile>,
) -> RawInputSet {
    let entries = variant
        .fields()
        .iter()
        .map(|spec| {
            let cli_value = if spec.kind.is_flag() {
                cli.has_flag(spec.name).then_some(RawValue::Bool(true))
            } else {
                cli.get(spec.name).map(|v| RawValue::Text(v.to_owned()))
            };

            let raw = if spec.kind.cli_only() {
                RawValues {
                    cli: cli_value,
                    env: None,
                    file: None,
                }
            } else {
                RawValues {
                    cli: cli_value,
                    env: env
                        .field_value(spec.name)
                        .map(|v| RawValue::Text(v.to_owned())),
                    file: file
                        .filter(|_| variant.accepts_config_file())
                        .and_then(|f| f.get(spec.name).cloned()),
                }
            };
            (*spec, raw)
        })
        .collect();

    RawInputSet { variant, entries }
}

impl RawInputSet {
    /// Apply precedence. Fails on the first required field (in declaration
    /// order) that no source supplies.
    pub fn resolve(&self) -> Result<ResolvedConfig, SchemaError> {
        let mut config = ResolvedConfig::new(self.variant);
        for (spec, raw) in &self.entries {
            let resolved = match raw.winner() {
                Some((origin, value)) => ResolvedValue {
                    value: convert(spec, value),
                    origin,
                },
                None if spec.required => return Err(SchemaError::missing(spec)),
                None => ResolvedValue {
                    value: default_value(spec),
                    origin: Origin::Default,
                },
            };
            config.insert(spec.name, resolved);
        }
        Ok(config)
    }
}

/// Collect and resolve in one step.
pub fn resolve(
    variant: Variant,
    cli: &CliInputs,
    env: &Environment,
    file: Option<&ConfigFile>,
) -> Result<ResolvedConfig, SchemaError> {
    collect(variant, cli, env, file).resolve()
}

fn convert(spec: &FieldSpec, raw: &RawValue) -> FieldValue {
    match (spec.kind.is_flag(), raw) {
        (true, RawValue::Bool(b)) => FieldValue::Flag(*b),
        // Unparseable flag text is kept verbatim for the validator to reject.
        (true, RawValue::Text(s)) => {
            parse_flag(s).map_or_else(|| FieldValue::Text(s.clone()), FieldValue::Flag)
        }
        (false, RawValue::Text(s)) => FieldValue::Text(s.clone()),
        (false, RawValue::Bool(b)) => FieldValue::Text(b.to_string()),
    }
}

fn default_value(spec: &FieldSpec) -> FieldValue {
    let default = spec.default.unwrap_or_default();
    if spec.kind.is_flag() {
        FieldValue::Flag(parse_flag(default).unwrap_or(false))
    } else {
        FieldValue::Text(default.to_owned())
    }
}
