//! # Validator Engine
//!
//! Compiles the constraint tags attached to a field into [`Validator`]s and applies
//! them to decoded values.
//!
//! ## Tag grammar
//!
//! Tags are comma-separated `key=value` tokens:
//!
//! | key        | meaning                                          |
//! |------------|--------------------------------------------------|
//! | `required` | the field must be present and non-empty          |
//! | `min`/`max`| inclusive integer range (both must be given)     |
//! | `minLen`/`maxLen` | inclusive string length (both must be given) |
//! | `options`  | `a\|b\|c`, the value must be one of them     |
//! | `isDomain` | the value must be a lowercase domain name        |
//! | `default`  | literal used when the field is absent            |
//!
//! Unknown keys and tokens without `=` are ignored. A rule attached to a shape it
//! cannot apply to (e.g. `options` on an integer) produces no validator.
//!
//! ## Containers
//!
//! Validators over slice or map fields check every element and report the first
//! element that fails together with its index or key.

use crate::describe::FieldType;
use crate::error::{ConstraintViolation, SchemaError};
use crate::inspect::inspect;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

const MAX_DOMAIN_LEN: usize = 253;

/// Parsed constraint tags of one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintTags {
    pub required: bool,
    pub min: Option<String>,
    pub max: Option<String>,
    pub min_len: Option<String>,
    pub max_len: Option<String>,
    pub options: Option<String>,
    pub is_domain: bool,
    pub default: Option<String>,
}

impl ConstraintTags {
    pub fn parse(tags: &str) -> Self {
        let mut parsed = ConstraintTags::default();
        for token in tags.split(',') {
            let Some((key, value)) = token.trim().split_once('=') else {
                continue;
            };
            let value = value.to_string();
            match key {
                "required" => parsed.required = value == "true",
                "min" => parsed.min = Some(value),
                "max" => parsed.max = Some(value),
                "minLen" => parsed.min_len = Some(value),
                "maxLen" => parsed.max_len = Some(value),
                "options" => parsed.options = Some(value),
                "isDomain" => parsed.is_domain = value == "true",
                "default" => parsed.default = Some(value),
                _ => {}
            }
        }
        parsed
    }
}

/// A stateless rule over one field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    Range { min: i64, max: i64 },
    Length { min: usize, max: usize },
    Options(Vec<String>),
    Domain,
}

impl Validator {
    /// Checks `value`, descending into arrays and objects. `null` passes.
    pub fn validate(&self, value: &Value) -> Result<(), ConstraintViolation> {
        match value {
            Value::Null => Ok(()),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.validate_element(item)
                        .map_err(|e| element_error(i.to_string(), e))?;
                }
                Ok(())
            }
            Value::Object(entries) => {
                for (key, item) in entries {
                    self.validate_element(item)
                        .map_err(|e| element_error(key.clone(), e))?;
                }
                Ok(())
            }
            scalar => self.validate_element(scalar),
        }
    }

    fn validate_element(&self, value: &Value) -> Result<(), ConstraintViolation> {
        match self {
            Validator::Range { min, max } => {
                let n = integer(value)?;
                if n < i128::from(*min) || n > i128::from(*max) {
                    return Err(ConstraintViolation::OutOfRange {
                        value: n,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            Validator::Length { min, max } => {
                let len = string(value)?.chars().count();
                if len < *min || len > *max {
                    return Err(ConstraintViolation::Length {
                        len,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            Validator::Options(options) => {
                let s = string(value)?;
                if !options.iter().any(|o| o == s) {
                    return Err(ConstraintViolation::NotInOptions {
                        value: s.to_string(),
                        options: options.clone(),
                    });
                }
                Ok(())
            }
            Validator::Domain => {
                let s = string(value)?;
                if !is_domain_name(s) {
                    return Err(ConstraintViolation::InvalidDomain(s.to_string()));
                }
                Ok(())
            }
        }
    }
}

fn element_error(index: String, e: ConstraintViolation) -> ConstraintViolation {
    ConstraintViolation::Element {
        index,
        inner: Box::new(e),
    }
}

fn integer(value: &Value) -> Result<i128, ConstraintViolation> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
        .ok_or_else(|| ConstraintViolation::TypeMismatch {
            expected: "integer",
            found: value.to_string(),
        })
}

fn string(value: &Value) -> Result<&str, ConstraintViolation> {
    value.as_str().ok_or_else(|| ConstraintViolation::TypeMismatch {
        expected: "string",
        found: value.to_string(),
    })
}

fn domain_regex() -> Option<&'static Regex> {
    static DOMAIN: OnceLock<Option<Regex>> = OnceLock::new();
    DOMAIN
        .get_or_init(|| {
            Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").ok()
        })
        .as_ref()
}

/// Lowercase RFC 1123 subdomain.
pub fn is_domain_name(s: &str) -> bool {
    s.len() <= MAX_DOMAIN_LEN && domain_regex().is_some_and(|re| re.is_match(s))
}

/// Compiles the validators for one field.
///
/// Returns an error for malformed bounds; a rule that does not fit the field's
/// shape is skipped, so callers must not assume a mismatch always errors.
pub fn build(
    field: &str,
    ty: &FieldType,
    tags: &ConstraintTags,
) -> Result<Vec<Validator>, SchemaError> {
    let Some(scalar) = inspect(field, ty)?.element_scalar() else {
        return Ok(Vec::new());
    };

    let mut validators = Vec::new();

    if scalar.is_integer() {
        if let Some((min, max)) = bounds(field, "min", &tags.min, "max", &tags.max)? {
            validators.push(Validator::Range {
                min: to_i64(field, "min", min)?,
                max: to_i64(field, "max", max)?,
            });
        }
    }

    if scalar.is_string() {
        if let Some((min, max)) = bounds(field, "minLen", &tags.min_len, "maxLen", &tags.max_len)? {
            if min < 0 {
                return Err(invalid_tag(field, "minLen", min, "length cannot be negative"));
            }
            validators.push(Validator::Length {
                min: min as usize,
                max: max as usize,
            });
        }

        if let Some(options) = &tags.options {
            let options: Vec<String> = options
                .split('|')
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if options.is_empty() {
                return Err(invalid_tag(field, "options", "", "no options given"));
            }
            validators.push(Validator::Options(options));
        }

        if tags.is_domain {
            validators.push(Validator::Domain);
        }
    }

    if validators.is_empty() && has_rules(tags) {
        warn!(field, ty = %ty, "Constraint tags do not apply to field shape");
    }

    Ok(validators)
}

fn has_rules(tags: &ConstraintTags) -> bool {
    tags.min.is_some()
        || tags.max.is_some()
        || tags.min_len.is_some()
        || tags.max_len.is_some()
        || tags.options.is_some()
        || tags.is_domain
}

/// Parses a `min`/`max` style pair. Only a complete pair yields bounds.
fn bounds(
    field: &str,
    min_key: &'static str,
    min: &Option<String>,
    max_key: &'static str,
    max: &Option<String>,
) -> Result<Option<(i128, i128)>, SchemaError> {
    let (Some(min), Some(max)) = (min, max) else {
        if min.is_some() || max.is_some() {
            warn!(field, min_key, max_key, "Incomplete bounds ignored");
        }
        return Ok(None);
    };
    let min = parse_bound(field, min_key, min)?;
    let max = parse_bound(field, max_key, max)?;
    if min > max {
        return Err(SchemaError::InvertedBounds {
            field: field.to_string(),
            key: min_key,
            min,
            max,
        });
    }
    Ok(Some((min, max)))
}

fn parse_bound(field: &str, key: &str, raw: &str) -> Result<i128, SchemaError> {
    raw.trim()
        .parse::<i128>()
        .map_err(|e| invalid_tag(field, key, raw, &e.to_string()))
}

fn to_i64(field: &str, key: &str, n: i128) -> Result<i64, SchemaError> {
    i64::try_from(n).map_err(|_| invalid_tag(field, key, n, "bound does not fit in i64"))
}

fn invalid_tag(field: &str, key: &str, value: impl ToString, reason: &str) -> SchemaError {
    SchemaError::InvalidTag {
        field: field.to_string(),
        tag: format!("{}={}", key, value.to_string()),
        reason: reason.to_string(),
    }
}
