//! Validated payloads.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A JSON object that conformed to a shape, with defaults filled.
///
/// Payloads only come out of the validator or [`crate::Shape`] defaults;
/// there is no partially valid payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    shape: String,
    fields: Map<String, Value>,
}

impl Payload {
    pub(crate) fn new(shape: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            shape: shape.into(),
            fields,
        }
    }

    /// Name of the shape this payload conforms to.
    pub fn shape_name(&self) -> &str {
        &self.shape
    }

    /// Raw field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String field, or `""` when absent or not a string.
    pub fn str(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Integer field.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    /// Float field.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// List field, or an empty slice.
    pub fn list(&self, name: &str) -> &[Value] {
        self.fields
            .get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// String items of a list field.
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.list(name)
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// All fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Clone into a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Convert into a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.fields.clone()))
    }
}

impl crate::Shape {
    /// A payload holding every field at its default or type-appropriate zero value.
    ///
    /// ```
    /// use mangaweave_schema::{FieldType, Shape};
    ///
    /// let shape = Shape::new("anchor")
    ///     .required("anchor_id", FieldType::String)
    ///     .required("importance_score", FieldType::integer(1, 5))
    ///     .optional("tone", FieldType::String, "neutral");
    /// let payload = shape.default_payload();
    /// assert_eq!(payload.str("anchor_id"), "");
    /// assert_eq!(payload.int("importance_score"), Some(1));
    /// assert_eq!(payload.str("tone"), "neutral");
    /// ```
    pub fn default_payload(&self) -> Payload {
        Payload::new(self.name().clone(), self.default_fields())
    }
}
