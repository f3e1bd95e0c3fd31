#![deny(missing_docs)]

//! # Schema Shape Normalization
//!
//! Classifies a raw schema node into one closed set of shapes before parsing, so the
//! parser dispatches on a single enum instead of probing keys everywhere.
//!
//! Compatibility spellings are folded here:
//! - `nullable: true` and `x-nullable: true` (OpenAPI 3.0 / Swagger 2.0)
//! - `const` (treated as a one-value `enum`)
//! - boolean schemas `true` / `false`
//! - missing `type`, inferred from `properties`, `items`, or enum values

use crate::error::{AppError, AppResult};
use crate::oas::reference::Reference;
use serde_json::{Map, Value};

/// A declared (or inferred) JSON Schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(SchemaKind::String),
            "number" => Some(SchemaKind::Number),
            "integer" => Some(SchemaKind::Integer),
            "boolean" => Some(SchemaKind::Boolean),
            "array" => Some(SchemaKind::Array),
            "object" => Some(SchemaKind::Object),
            "null" => Some(SchemaKind::Null),
            _ => None,
        }
    }

    fn of_value(value: &Value) -> Self {
        match value {
            Value::String(_) => SchemaKind::String,
            Value::Number(_) => SchemaKind::Number,
            Value::Bool(_) => SchemaKind::Boolean,
            Value::Array(_) => SchemaKind::Array,
            Value::Object(_) => SchemaKind::Object,
            Value::Null => SchemaKind::Null,
        }
    }

    /// Whether an enum value belongs to this kind.
    pub(crate) fn admits(&self, value: &Value) -> bool {
        match self {
            SchemaKind::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
            kind => SchemaKind::of_value(value) == *kind,
        }
    }
}

/// The closed set of raw node shapes, in parser priority order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SchemaShape<'a> {
    /// `{"$ref": "..."}`
    Reference(&'a str),
    /// `allOf` members.
    AllOf(&'a [Value]),
    /// `oneOf` members.
    OneOf(&'a [Value]),
    /// `anyOf` members.
    AnyOf(&'a [Value]),
    /// One or more declared primitive types.
    Typed(Vec<SchemaKind>),
    /// Nothing to classify on.
    Unconstrained,
}

/// A schema node after shape classification.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedNode<'a> {
    pub shape: SchemaShape<'a>,
    /// Legacy nullable flag.
    pub nullable: bool,
    /// Literal values from `enum` or `const`.
    pub enum_values: Option<Vec<&'a Value>>,
    /// The object members, if the node is an object.
    pub fields: Option<&'a Map<String, Value>>,
}

impl<'a> NormalizedNode<'a> {
    /// Reads a keyword from the node's members.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.and_then(|f| f.get(key))
    }
}

/// Classifies `node` found at `location`.
///
/// # Errors
///
/// Returns [`AppError::MalformedSchema`] for nodes that are neither objects nor
/// booleans, non-string `$ref` values and non-array combinator members.
pub(crate) fn normalize_node<'a>(
    node: &'a Value,
    location: &Reference,
) -> AppResult<NormalizedNode<'a>> {
    let map = match node {
        Value::Object(map) => map,
        Value::Bool(_) => {
            return Ok(NormalizedNode {
                shape: SchemaShape::Unconstrained,
                nullable: false,
                enum_values: None,
                fields: None,
            })
        }
        other => {
            return Err(AppError::malformed(
                location,
                format!("expected a schema object, found {}", json_type_name(other)),
            ))
        }
    };

    let nullable = is_flag_set(map, "nullable") || is_flag_set(map, "x-nullable");
    let enum_values = collect_enum_values(map, location)?;

    let shape = if let Some(target) = map.get("$ref") {
        let target = target
            .as_str()
            .ok_or_else(|| AppError::malformed(location, "`$ref` must be a string"))?;
        SchemaShape::Reference(target)
    } else if let Some(members) = combinator(map, "allOf", location)? {
        SchemaShape::AllOf(members)
    } else if let Some(members) = combinator(map, "oneOf", location)? {
        SchemaShape::OneOf(members)
    } else if let Some(members) = combinator(map, "anyOf", location)? {
        SchemaShape::AnyOf(members)
    } else {
        let kinds = declared_kinds(map, location)?;
        let kinds = if kinds.is_empty() {
            inferred_kinds(map, enum_values.as_deref())
        } else {
            kinds
        };
        if kinds.is_empty() {
            SchemaShape::Unconstrained
        } else {
            SchemaShape::Typed(kinds)
        }
    };

    Ok(NormalizedNode {
        shape,
        nullable,
        enum_values,
        fields: Some(map),
    })
}

fn is_flag_set(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn combinator<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    location: &Reference,
) -> AppResult<Option<&'a [Value]>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.as_slice())),
        Some(_) => Err(AppError::malformed(
            location,
            format!("`{}` must be an array of schemas", key),
        )),
    }
}

fn collect_enum_values<'a>(
    map: &'a Map<String, Value>,
    location: &Reference,
) -> AppResult<Option<Vec<&'a Value>>> {
    if let Some(values) = map.get("enum") {
        let items = values
            .as_array()
            .ok_or_else(|| AppError::malformed(location, "`enum` must be an array"))?;
        return Ok(Some(items.iter().collect()));
    }
    Ok(map.get("const").map(|value| vec![value]))
}

fn declared_kinds(map: &Map<String, Value>, location: &Reference) -> AppResult<Vec<SchemaKind>> {
    let names: Vec<&str> = match map.get("type") {
        None => Vec::new(),
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names
            .iter()
            .map(|n| {
                n.as_str()
                    .ok_or_else(|| AppError::malformed(location, "`type` entries must be strings"))
            })
            .collect::<AppResult<_>>()?,
        Some(_) => {
            return Err(AppError::malformed(
                location,
                "`type` must be a string or an array of strings",
            ))
        }
    };

    // Unknown type names are skipped: they match no parsing rule.
    let mut kinds = Vec::new();
    for kind in names.into_iter().filter_map(SchemaKind::from_name) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn inferred_kinds(map: &Map<String, Value>, enum_values: Option<&[&Value]>) -> Vec<SchemaKind> {
    if map.contains_key("properties") || map.contains_key("additionalProperties") {
        return vec![SchemaKind::Object];
    }
    if map.contains_key("items") || map.contains_key("prefixItems") {
        return vec![SchemaKind::Array];
    }
    let mut kinds = Vec::new();
    for value in enum_values.unwrap_or_default() {
        let kind = SchemaKind::of_value(value);
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
