use serde::Serialize;
use std::fmt;

/// How a field is sourced and what shape its value takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Free-form text.
    Text,
    /// A filesystem path, kept as text until the pipeline absolutizes it.
    Path,
    /// Presence flag on the command line; `true`/`false`-style text elsewhere.
    Flag,
    /// Presence flag that only a command-line invocation can turn on.
    /// Environment variables and config files are never consulted.
    CliFlag,
}

impl FieldKind {
    pub fn is_flag(self) -> bool {
        matches!(self, Self::Flag | Self::CliFlag)
    }

    pub fn cli_only(self) -> bool {
        matches!(self, Self::CliFlag)
    }
}

/// A recognized configuration field.
///
/// Either required (no default) or optional (has a default, possibly empty).
/// The two constructors are the only way to build one, so that invariant
/// holds for every declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<&'static str>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind, default: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
        }
    }

    /// Command-line flag name without the leading dashes.
    pub fn flag_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

pub const ACTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("input", FieldKind::Path),
    FieldSpec::required("output", FieldKind::Path),
    FieldSpec::optional("cache", FieldKind::Path, ""),
    FieldSpec::optional("configuration", FieldKind::Path, ""),
    FieldSpec::optional("debug", FieldKind::Flag, ""),
];

pub const BUILD_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("input", FieldKind::Path),
    FieldSpec::required("output", FieldKind::Path),
    FieldSpec::optional("cache", FieldKind::Path, ""),
    FieldSpec::optional("configuration", FieldKind::Path, ""),
    FieldSpec::optional("debug", FieldKind::Flag, ""),
    FieldSpec::optional("dev", FieldKind::CliFlag, ""),
];

/// The two invocation shapes the orchestrator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Resolves from command line and environment, then forwards to `Build`.
    Action,
    /// Full pipeline: extraction followed by the external app build.
    Build,
}

impl Variant {
    pub fn fields(self) -> &'static [FieldSpec] {
        fields(self)
    }

    /// Only the build variant takes a `-c <file>` source.
    pub fn accepts_config_file(self) -> bool {
        matches!(self, Self::Build)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Build => "build",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn fields(variant: Variant) -> &'static [FieldSpec] {
    match variant {
        Variant::Action => ACTION_FIELDS,
        Variant::Build => BUILD_FIELDS,
    }
}

pub fn find(variant: Variant, name: &str) -> Option<&'static FieldSpec> {
    fields(variant).iter().find(|f| f.name == name)
}
