//! Generic shape validator.

use crate::{Coercion, FieldType, Payload, Requirement, Shape};
use mangaweave_error::{FieldViolation, ValidationError, ValidationErrorKind};
use serde_json::{Map, Value};

/// Parse `candidate` and check it against `shape`.
///
/// Missing optional fields are filled with defaults and unknown keys are
/// dropped. Every violation is reported, not just the first.
///
/// # Errors
///
/// `ValidationErrorKind::Parse` when the text is not a JSON object,
/// `ValidationErrorKind::Shape` listing all violations otherwise.
pub fn validate(candidate: &str, shape: &Shape) -> Result<Payload, ValidationError> {
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| ValidationError::new(ValidationErrorKind::Parse(e.to_string())))?;
    validate_value(&value, shape)
}

/// Check an already parsed value against `shape`.
pub fn validate_value(value: &Value, shape: &Shape) -> Result<Payload, ValidationError> {
    let Value::Object(object) = value else {
        return Err(ValidationError::new(ValidationErrorKind::Parse(format!(
            "expected a JSON object, found {}",
            kind_of(value)
        ))));
    };

    let mut violations = Vec::new();
    let fields = check_record(object, shape, "", &mut violations);

    if violations.is_empty() {
        Ok(Payload::new(shape.name().clone(), fields))
    } else {
        tracing::debug!(
            shape = %shape.name(),
            violations = violations.len(),
            "Candidate rejected"
        );
        Err(ValidationError::new(ValidationErrorKind::Shape {
            shape: shape.name().clone(),
            violations,
        }))
    }
}

fn check_record(
    object: &Map<String, Value>,
    shape: &Shape,
    prefix: &str,
    violations: &mut Vec<FieldViolation>,
) -> Map<String, Value> {
    let mut out = Map::new();

    for field in shape.fields() {
        let path = join_path(prefix, field.name());
        let Some(raw) = object.get(field.name()) else {
            match field.requirement() {
                Requirement::Required => {
                    violations.push(FieldViolation::new(path, "field required"));
                }
                Requirement::Optional(default) => {
                    out.insert(field.name().clone(), default.clone());
                }
            }
            continue;
        };

        if raw.is_null() && *field.accepts_null() {
            out.insert(field.name().clone(), Value::Null);
            continue;
        }

        let coerced = match field.coercion() {
            Some(coercion) => coerce(raw, coercion),
            None => raw.clone(),
        };

        if let Some(checked) = check_value(&coerced, field.field_type(), &path, violations) {
            out.insert(field.name().clone(), checked);
        }
    }

    let unknown: Vec<&str> = object
        .keys()
        .filter(|k| shape.field(k).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        tracing::trace!(shape = %shape.name(), ?unknown, "Dropping unknown keys");
    }

    out
}

fn check_value(
    value: &Value,
    field_type: &FieldType,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let mismatch = |violations: &mut Vec<FieldViolation>| {
        violations.push(FieldViolation::new(
            path,
            format!("expected {}, found {}", field_type.label(), kind_of(value)),
        ));
        None
    };

    match field_type {
        FieldType::String => match value {
            Value::String(_) => Some(value.clone()),
            _ => mismatch(violations),
        },
        FieldType::Integer { min, max } => {
            let Some(n) = as_integer(value) else {
                return mismatch(violations);
            };
            if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                violations.push(FieldViolation::new(
                    path,
                    format!("value {} is outside {}", n, field_type.label()),
                ));
                return None;
            }
            Some(Value::from(n))
        }
        FieldType::Float { min, max } => {
            let Some(x) = value.as_f64() else {
                return mismatch(violations);
            };
            if min.is_some_and(|m| x < m) || max.is_some_and(|m| x > m) {
                violations.push(FieldViolation::new(
                    path,
                    format!("value {} is outside {}", x, field_type.label()),
                ));
                return None;
            }
            Some(Value::from(x))
        }
        FieldType::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            _ => mismatch(violations),
        },
        FieldType::List(inner) => {
            let Value::Array(items) = value else {
                return mismatch(violations);
            };
            let checked = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    check_value(item, inner, &format!("{}[{}]", path, i), violations)
                })
                .collect();
            Some(Value::Array(checked))
        }
        FieldType::Record(shape) => {
            let Value::Object(object) = value else {
                return mismatch(violations);
            };
            Some(Value::Object(check_record(object, shape, path, violations)))
        }
        FieldType::Enum(literals) => match value {
            Value::String(s) if literals.iter().any(|l| l == s) => Some(value.clone()),
            Value::String(s) => {
                violations.push(FieldViolation::new(
                    path,
                    format!("expected {}, found \"{}\"", field_type.label(), s),
                ));
                None
            }
            _ => mismatch(violations),
        },
        FieldType::Map(inner) => {
            let Value::Object(object) = value else {
                return mismatch(violations);
            };
            let checked = object
                .iter()
                .filter_map(|(k, v)| {
                    check_value(v, inner, &join_path(path, k), violations)
                        .map(|checked| (k.clone(), checked))
                })
                .collect();
            Some(Value::Object(checked))
        }
        FieldType::Object => match value {
            Value::Object(_) => Some(value.clone()),
            _ => mismatch(violations),
        },
        FieldType::Any => Some(value.clone()),
    }
}

fn coerce(value: &Value, coercion: &Coercion) -> Value {
    match coercion {
        Coercion::IndexedText {
            number_field,
            text_field,
        } => match value {
            Value::Null => Value::Array(Vec::new()),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::String(text) => {
                            let mut record = Map::new();
                            record.insert(number_field.clone(), Value::from(i + 1));
                            record.insert(text_field.clone(), Value::String(text.clone()));
                            Value::Object(record)
                        }
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        },
    }
}

/// Integers, and floats with no fractional part.
fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) => format!("number {}", n),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "list".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
