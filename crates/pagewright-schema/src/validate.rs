use crate::field::{FieldKind, FieldSpec};
use crate::resolved::{FieldValue, ResolvedConfig};
use crate::SchemaError;

const FLAG_WORDS: &str = "true, false, 1, 0, yes, no, on, off";

/// Interpret flag text from the environment or a config file.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Check a resolved configuration against its field list.
///
/// Required fields must be present and non-blank; optional fields must be
/// blank or well-formed for their kind. Reports the first offending field
/// in declaration order.
pub fn validate(config: &ResolvedConfig, fields: &[FieldSpec]) -> Result<(), SchemaError> {
    for spec in fields {
        let Some(value) = config.value(spec.name) else {
            if spec.required {
                return Err(SchemaError::missing(spec));
            }
            continue;
        };

        if spec.required && value.is_blank() {
            return Err(SchemaError::missing(spec));
        }

        check_kind(spec, value)?;
    }
    Ok(())
}

fn check_kind(spec: &FieldSpec, value: &FieldValue) -> Result<(), SchemaError> {
    match (spec.kind, value) {
        (FieldKind::Flag | FieldKind::CliFlag, FieldValue::Flag(_)) => Ok(()),
        (FieldKind::Flag | FieldKind::CliFlag, FieldValue::Text(s)) => Err(SchemaError::malformed(
            spec,
            format!("'{s}' is not a flag value (expected one of: {FLAG_WORDS})"),
        )),
        (FieldKind::Text | FieldKind::Path, FieldValue::Text(s)) => {
            if s.contains('\0') {
                Err(SchemaError::malformed(spec, "value contains a NUL byte"))
            } else {
                Ok(())
            }
        }
        (FieldKind::Text | FieldKind::Path, FieldValue::Flag(_)) => {
            Err(SchemaError::malformed(spec, "expected text, got a flag"))
        }
    }
}
