use crate::field::Variant;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Final value of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Flag(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Which source a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Cli,
    Env,
    File,
    Default,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::File => "file",
            Self::Default => "default",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    pub value: FieldValue,
    pub origin: Origin,
}

/// Field name -> final value for one invocation.
///
/// Built once by the merger and never mutated afterwards. Ordered by field
/// name so that equal inputs always render to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub variant: Variant,
    values: BTreeMap<String, ResolvedValue>,
}

impl ResolvedConfig {
    pub(crate) fn new(variant: Variant) -> Self {
        Self {
            variant,
            values: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &str, value: ResolvedValue) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).map(|v| &v.value)
    }

    pub fn origin(&self, name: &str) -> Option<Origin> {
        self.values.get(name).map(|v| v.origin)
    }

    /// Text value of a field; `None` for flags and unknown fields.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.value(name)? {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    /// Text value, or `None` when the field is absent or blank.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).filter(|s| !s.trim().is_empty())
    }

    /// Flag value of a field; `false` for anything that is not a set flag.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.value(name), Some(FieldValue::Flag(true)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Compact JSON with a stable key order.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
