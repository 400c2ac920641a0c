//! Shape definitions.

use derive_getters::Getters;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Type of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// JSON string
    String,
    /// Whole number, optionally bounded (inclusive)
    Integer {
        /// Lower bound
        min: Option<i64>,
        /// Upper bound
        max: Option<i64>,
    },
    /// Any number, optionally bounded (inclusive)
    Float {
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },
    /// JSON boolean
    Boolean,
    /// Homogeneous list
    List(Box<FieldType>),
    /// Nested record described by another shape
    Record(Arc<Shape>),
    /// One of a fixed set of string literals
    Enum(Vec<String>),
    /// Object with arbitrary string keys and uniformly typed values
    Map(Box<FieldType>),
    /// Any JSON object, not inspected
    Object,
    /// Any JSON value, not inspected
    Any,
}

impl FieldType {
    /// Bounded integer.
    pub fn integer(min: i64, max: i64) -> Self {
        FieldType::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Bounded float.
    pub fn float_range(min: f64, max: f64) -> Self {
        FieldType::Float {
            min: Some(min),
            max: Some(max),
        }
    }

    /// List of `inner`.
    pub fn list(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    /// List of strings.
    pub fn string_list() -> Self {
        Self::list(FieldType::String)
    }

    /// Nested record.
    pub fn record(shape: Shape) -> Self {
        FieldType::Record(Arc::new(shape))
    }

    /// Enum of string literals.
    pub fn one_of<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldType::Enum(literals.into_iter().map(Into::into).collect())
    }

    /// Map from string keys to `inner`.
    pub fn map(inner: FieldType) -> Self {
        FieldType::Map(Box::new(inner))
    }

    /// The type-appropriate zero value.
    ///
    /// Bounded numbers start at their lower bound so the value is itself valid.
    pub fn zero_value(&self) -> Value {
        match self {
            FieldType::String => Value::String(String::new()),
            FieldType::Integer { min, .. } => Value::from(min.unwrap_or(0)),
            FieldType::Float { min, .. } => Value::from(min.unwrap_or(0.0)),
            FieldType::Boolean => Value::Bool(false),
            FieldType::List(_) => Value::Array(Vec::new()),
            FieldType::Record(shape) => Value::Object(shape.default_fields()),
            FieldType::Enum(literals) => {
                Value::String(literals.first().cloned().unwrap_or_default())
            }
            FieldType::Map(_) | FieldType::Object => Value::Object(Map::new()),
            FieldType::Any => Value::Null,
        }
    }

    /// Short human-readable label, used in prompts and error messages.
    pub fn label(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Integer { min, max } => bounded_label("integer", *min, *max),
            FieldType::Float { min, max } => bounded_label("number", *min, *max),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::List(inner) => format!("list of {}", inner.label()),
            FieldType::Record(shape) => format!("object `{}`", shape.name()),
            FieldType::Enum(literals) => format!(
                "one of {}",
                literals
                    .iter()
                    .map(|l| format!("\"{}\"", l))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            FieldType::Map(inner) => format!("object mapping keys to {}", inner.label()),
            FieldType::Object => "object".to_string(),
            FieldType::Any => "any value".to_string(),
        }
    }

    /// The record shape reachable through lists and maps, if any.
    pub fn nested_shape(&self) -> Option<&Shape> {
        match self {
            FieldType::Record(shape) => Some(shape),
            FieldType::List(inner) | FieldType::Map(inner) => inner.nested_shape(),
            _ => None,
        }
    }

    fn descriptor(&self) -> Value {
        match self {
            FieldType::String => json!({"type": "string"}),
            FieldType::Integer { min, max } => {
                let mut d = json!({"type": "integer"});
                if let Some(min) = min {
                    d["minimum"] = Value::from(*min);
                }
                if let Some(max) = max {
                    d["maximum"] = Value::from(*max);
                }
                d
            }
            FieldType::Float { min, max } => {
                let mut d = json!({"type": "number"});
                if let Some(min) = min {
                    d["minimum"] = Value::from(*min);
                }
                if let Some(max) = max {
                    d["maximum"] = Value::from(*max);
                }
                d
            }
            FieldType::Boolean => json!({"type": "boolean"}),
            FieldType::List(inner) => json!({"type": "array", "items": inner.descriptor()}),
            FieldType::Record(shape) => shape.json_descriptor(),
            FieldType::Enum(literals) => json!({"type": "string", "enum": literals}),
            FieldType::Map(inner) => {
                json!({"type": "object", "additionalProperties": inner.descriptor()})
            }
            FieldType::Object => json!({"type": "object"}),
            FieldType::Any => json!({}),
        }
    }
}

fn bounded_label<T: std::fmt::Display>(base: &str, min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} from {} to {}", base, min, max),
        (Some(min), None) => format!("{} >= {}", base, min),
        (None, Some(max)) => format!("{} <= {}", base, max),
        (None, None) => base.to_string(),
    }
}

/// Whether a field must be present.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    /// Missing field is a violation
    Required,
    /// Missing field takes this default
    Optional(Value),
}

/// Normalisation applied to a raw value before type checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    /// For a list of records: a string item at position `i` becomes
    /// `{number_field: i + 1, text_field: item}`, and `null` becomes `[]`.
    IndexedText {
        /// Field receiving the 1-based position
        number_field: String,
        /// Field receiving the string
        text_field: String,
    },
}

/// One field of a shape.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Field {
    /// Key in the JSON object
    name: String,
    /// Expected type
    field_type: FieldType,
    /// Required or defaulted
    requirement: Requirement,
    /// Whether an explicit `null` is accepted
    accepts_null: bool,
    /// Normalisation before checking
    coercion: Option<Coercion>,
}

impl Field {
    /// A required field.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            requirement: Requirement::Required,
            accepts_null: false,
            coercion: None,
        }
    }

    /// An optional field with a default.
    pub fn optional(
        name: impl Into<String>,
        field_type: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            requirement: Requirement::Optional(default.into()),
            accepts_null: false,
            coercion: None,
        }
    }

    /// An optional field that accepts `null` and defaults to it.
    pub fn nullable(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            requirement: Requirement::Optional(Value::Null),
            accepts_null: true,
            coercion: None,
        }
    }

    /// Attach a coercion.
    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    /// True for required fields.
    pub fn is_required(&self) -> bool {
        matches!(self.requirement, Requirement::Required)
    }

    /// Value used when the field is absent from a default payload.
    pub fn default_value(&self) -> Value {
        match &self.requirement {
            Requirement::Optional(default) => default.clone(),
            Requirement::Required => self.field_type.zero_value(),
        }
    }
}

/// A named record definition.
///
/// Shapes are immutable once built and are shared behind `Arc`.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Shape {
    /// Registry name
    name: String,
    /// Fields in declaration order
    fields: Vec<Field>,
}

impl Shape {
    /// Empty shape.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a required field.
    pub fn required(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.with(Field::required(name, field_type))
    }

    /// Append an optional field.
    pub fn optional(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.with(Field::optional(name, field_type, default))
    }

    /// Append a nullable field.
    pub fn nullable(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.with(Field::nullable(name, field_type))
    }

    /// Look a field up by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// True when at least one field is required.
    pub fn has_required_fields(&self) -> bool {
        self.fields.iter().any(Field::is_required)
    }

    pub(crate) fn default_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default_value()))
            .collect()
    }

    /// Field listing for prompts: one line per field, nested records indented.
    ///
    /// ```
    /// use mangaweave_schema::{FieldType, Shape};
    ///
    /// let shape = Shape::new("anchor")
    ///     .required("anchor_id", FieldType::String)
    ///     .required("importance_score", FieldType::integer(1, 5));
    /// assert_eq!(
    ///     shape.describe(),
    ///     "- anchor_id: string (required)\n- importance_score: integer from 1 to 5 (required)"
    /// );
    /// ```
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        describe_fields(self, 0, &mut lines);
        lines.join("\n")
    }

    /// JSON Schema style descriptor of this shape.
    pub fn json_descriptor(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut d = field.field_type.descriptor();
            if let Requirement::Optional(default) = &field.requirement {
                d["default"] = default.clone();
            } else {
                required.push(Value::String(field.name.clone()));
            }
            if field.accepts_null {
                d["nullable"] = Value::Bool(true);
            }
            properties.insert(field.name.clone(), d);
        }
        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn describe_fields(shape: &Shape, depth: usize, lines: &mut Vec<String>) {
    let indent = "    ".repeat(depth);
    for field in shape.fields() {
        let requirement = match field.requirement() {
            Requirement::Required => "required".to_string(),
            Requirement::Optional(Value::Null) => "optional".to_string(),
            Requirement::Optional(default) => format!("optional, default {}", default),
        };
        lines.push(format!(
            "{}- {}: {} ({})",
            indent,
            field.name(),
            field.field_type().label(),
            requirement
        ));
        if let Some(nested) = field.field_type().nested_shape() {
            describe_fields(nested, depth + 1, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_value_respects_lower_bound() {
        assert_eq!(FieldType::integer(1, 5).zero_value(), json!(1));
        assert_eq!(FieldType::one_of(["A", "B"]).zero_value(), json!("A"));
        assert_eq!(FieldType::string_list().zero_value(), json!([]));
    }

    #[test]
    fn test_describe_nests_records() {
        let inner = Shape::new("visual_details").optional("setting", FieldType::String, "");
        let shape = Shape::new("summary").optional(
            "visual_details",
            FieldType::record(inner),
            json!({"setting": ""}),
        );
        let text = shape.describe();
        assert!(text.contains("- visual_details: object `visual_details`"));
        assert!(text.contains("\n    - setting: string (optional, default \"\")"));
    }

    #[test]
    fn test_json_descriptor_lists_required() {
        let shape = Shape::new("x")
            .required("a", FieldType::String)
            .nullable("b", FieldType::float_range(0.0, 1.0));
        let d = shape.json_descriptor();
        assert_eq!(d["required"], json!(["a"]));
        assert_eq!(d["properties"]["b"]["maximum"], json!(1.0));
        assert_eq!(d["properties"]["b"]["nullable"], json!(true));
    }
}
