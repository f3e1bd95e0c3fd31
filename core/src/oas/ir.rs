#![deny(missing_docs)]

//! # Type IR
//!
//! Target-agnostic structural type representation produced by the schema parser.
//!
//! `Identifier` never embeds a declaration, only its name: cycles in the schema graph
//! are broken exclusively through `Identifier` + `Recursive`.

use serde::Serialize;

/// Primitive kinds. `integer` and `number` both map to [`Primitive::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    /// `true` / `false`
    Boolean,
    /// Any JSON number.
    Number,
    /// Emitter-only; the parser never produces it.
    Integer,
    /// Any string.
    String,
    /// Exactly `null`.
    Null,
}

/// A literal value of an enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// String literal.
    String(String),
    /// Numeric literal.
    Number(serde_json::Number),
    /// Boolean literal.
    Boolean(bool),
    /// `null`
    Null,
}

/// One field of a [`TypeIr::Record`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Property name as declared.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub ty: TypeIr,
    /// `true` if the property is not in the schema's `required` list.
    pub optional: bool,
}

/// The structural type representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypeIr {
    /// A primitive type.
    Primitive(Primitive),
    /// Homogeneous list.
    Array(Box<TypeIr>),
    /// Object with known fields, in declaration order.
    Record(Vec<Field>),
    /// Any object; value type of its members.
    Dictionary(Box<TypeIr>),
    /// `A | B`
    Union(Vec<TypeIr>),
    /// `A & B`
    Intersection(Vec<TypeIr>),
    /// Fixed-arity list.
    Tuple(Vec<TypeIr>),
    /// A single literal value.
    Literal(LiteralValue),
    /// Reference to a generated declaration.
    Identifier {
        /// Declaration name.
        name: String,
        /// Where the declaration is emitted, if not local.
        import_path: Option<String>,
    },
    /// A self-referential declaration body.
    Recursive {
        /// Name the body refers back to.
        name: String,
        /// The declaration body.
        body: Box<TypeIr>,
    },
    /// A well-known cross-cutting type.
    Opaque {
        /// Name shown in generated code.
        display_name: String,
        /// Runtime helper backing it.
        backing_name: String,
    },
    /// Unconstrained value.
    Unknown,
}

impl TypeIr {
    /// `null`
    pub fn null() -> Self {
        TypeIr::Primitive(Primitive::Null)
    }

    /// `string`
    pub fn string() -> Self {
        TypeIr::Primitive(Primitive::String)
    }

    /// `number`
    pub fn number() -> Self {
        TypeIr::Primitive(Primitive::Number)
    }

    /// `boolean`
    pub fn boolean() -> Self {
        TypeIr::Primitive(Primitive::Boolean)
    }

    /// `T[]`
    pub fn array(element: TypeIr) -> Self {
        TypeIr::Array(Box::new(element))
    }

    /// The "any object" placeholder.
    pub fn any_object() -> Self {
        TypeIr::Dictionary(Box::new(TypeIr::Unknown))
    }

    /// A string literal.
    pub fn string_literal(value: impl Into<String>) -> Self {
        TypeIr::Literal(LiteralValue::String(value.into()))
    }

    /// A reference to a declaration.
    pub fn identifier(name: impl Into<String>, import_path: Option<String>) -> Self {
        TypeIr::Identifier {
            name: name.into(),
            import_path,
        }
    }

    /// Builds a union: nested unions are flattened, equal members dropped, and a
    /// single remaining member is returned as is.
    pub fn union(members: Vec<TypeIr>) -> Self {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            match member {
                TypeIr::Union(inner) => {
                    for m in inner {
                        push_unique(&mut flat, m);
                    }
                }
                other => push_unique(&mut flat, other),
            }
        }
        collapse(flat, TypeIr::Union)
    }

    /// Builds an intersection with the same flattening and collapse rules as
    /// [`TypeIr::union`].
    pub fn intersection(members: Vec<TypeIr>) -> Self {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            match member {
                TypeIr::Intersection(inner) => {
                    for m in inner {
                        push_unique(&mut flat, m);
                    }
                }
                other => push_unique(&mut flat, other),
            }
        }
        collapse(flat, TypeIr::Intersection)
    }

    /// `T | null`
    pub fn nullable(self) -> Self {
        TypeIr::union(vec![self, TypeIr::null()])
    }

    /// Whether this type is complex enough to deserve its own named declaration.
    ///
    /// Records always qualify; composites qualify if any member does; containers
    /// inherit from their element; leaves never qualify.
    pub fn qualifies_for_declaration(&self) -> bool {
        match self {
            TypeIr::Record(_) => true,
            TypeIr::Union(members) | TypeIr::Intersection(members) | TypeIr::Tuple(members) => {
                members.iter().any(TypeIr::qualifies_for_declaration)
            }
            TypeIr::Array(inner) | TypeIr::Dictionary(inner) => inner.qualifies_for_declaration(),
            TypeIr::Recursive { body, .. } => body.qualifies_for_declaration(),
            TypeIr::Primitive(_)
            | TypeIr::Literal(_)
            | TypeIr::Identifier { .. }
            | TypeIr::Opaque { .. }
            | TypeIr::Unknown => false,
        }
    }

    /// Whether this is an `Identifier` pointing at `name`.
    pub fn is_identifier_of(&self, name: &str) -> bool {
        matches!(self, TypeIr::Identifier { name: n, .. } if n == name)
    }
}

fn push_unique(members: &mut Vec<TypeIr>, candidate: TypeIr) {
    if !members.contains(&candidate) {
        members.push(candidate);
    }
}

fn collapse(mut members: Vec<TypeIr>, wrap: fn(Vec<TypeIr>) -> TypeIr) -> TypeIr {
    match members.len() {
        0 => TypeIr::Unknown,
        1 => members.remove(0),
        _ => wrap(members),
    }
}
