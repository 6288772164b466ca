//! Strongly-typed draft-07 JSON Schema model.
//!
//! The mapper and the transformer only ever build [`Schema`] values; the
//! conversion to `serde_json::Value` happens once, at the document boundary.
//! Field order in [`Schema`] is the key order of the emitted object.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

/// The `type` keyword: either a bare name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(Primitive),
    Union(Vec<Primitive>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Format {
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(rename = "time")]
    Time,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub dialect: Option<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Never emitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaType {
    /// Add `null` to the type set, keeping the existing names first.
    pub fn or_null(self) -> Self {
        match self {
            Self::Single(Primitive::Null) => Self::Single(Primitive::Null),
            Self::Single(x) => Self::Union(vec![x, Primitive::Null]),
            Self::Union(mut xs) => {
                if !xs.contains(&Primitive::Null) {
                    xs.push(Primitive::Null);
                }
                Self::Union(xs)
            }
        }
    }
}

impl Schema {
    pub fn of(p: Primitive) -> Self {
        Self { ty: Some(SchemaType::Single(p)), ..Self::default() }
    }
    pub fn string() -> Self { Self::of(Primitive::String) }
    pub fn integer() -> Self { Self::of(Primitive::Integer) }
    pub fn number() -> Self { Self::of(Primitive::Number) }
    pub fn boolean() -> Self { Self::of(Primitive::Boolean) }

    /// Object node. An empty `required` list is dropped on emission.
    pub fn object(properties: IndexMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            properties: Some(properties),
            required,
            ..Self::of(Primitive::Object)
        }
    }

    pub fn array(items: Schema) -> Self {
        Self { items: Some(Box::new(items)), ..Self::of(Primitive::Array) }
    }

    pub fn with_dialect(mut self, dialect: &'static str) -> Self {
        self.dialect = Some(dialect);
        self
    }
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_ = Some(values);
        self
    }
    pub fn with_unique_items(mut self) -> Self {
        self.unique_items = true;
        self
    }
    pub fn with_min_items(mut self, n: u32) -> Self {
        self.min_items = Some(n);
        self
    }
    pub fn with_minimum(mut self, n: Number) -> Self {
        self.minimum = Some(n);
        self
    }
    pub fn with_maximum(mut self, n: Number) -> Self {
        self.maximum = Some(n);
        self
    }
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Widen `type` so that an explicit `null` is accepted.
    ///
    /// A fragment without a `type` is treated as an untyped string.
    pub fn nullable(mut self) -> Self {
        self.ty = Some(match self.ty.take() {
            Some(ty) => ty.or_null(),
            None => SchemaType::Union(vec![Primitive::String, Primitive::Null]),
        });
        self
    }

    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Prefer emitting integers when exact.
pub fn number_pref_i64(n: f64) -> Option<Number> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
