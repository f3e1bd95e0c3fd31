#![deny(missing_docs)]

//! # Schema Parser
//!
//! Turns a raw schema node into a [`TypeIr`]. Dispatch follows a fixed priority:
//!
//! 1. `$ref`: resolved through the model generator (document switch + memo).
//! 2. `allOf`: `Intersection` of the members.
//! 3. `oneOf` / `anyOf`: `Union` of the members.
//! 4. Declared (or inferred) primitive types, each parsed on its own and unioned.
//!
//! A legacy `nullable` flag wraps whatever the node produced, after combination.

use crate::error::{AppError, AppResult};
use crate::oas::context::ResolutionContext;
use crate::oas::generator::resolve_reference;
use crate::oas::ir::{Field, LiteralValue, TypeIr};
use crate::oas::normalization::{normalize_node, NormalizedNode, SchemaKind, SchemaShape};
use crate::oas::reference::Reference;
use serde_json::Value;
use tracing::trace;

/// Parses the schema node found at `location`.
///
/// # Arguments
///
/// * `ctx` - The session state; relative references resolve against its current document.
/// * `node` - The raw schema node.
/// * `location` - Where `node` lives, used for child locations and error messages.
pub fn parse_node(
    ctx: &mut ResolutionContext<'_>,
    node: &Value,
    location: &Reference,
) -> AppResult<TypeIr> {
    trace!(location = %location, "parsing schema node");
    let normalized = normalize_node(node, location)?;

    let parsed = match &normalized.shape {
        SchemaShape::Reference(raw) => {
            let target = ctx.reference(raw)?;
            resolve_reference(ctx, &target, None)?
        }
        SchemaShape::AllOf(members) => {
            TypeIr::intersection(parse_members(ctx, members, location, "allOf")?)
        }
        SchemaShape::OneOf(members) => {
            TypeIr::union(parse_members(ctx, members, location, "oneOf")?)
        }
        SchemaShape::AnyOf(members) => {
            TypeIr::union(parse_members(ctx, members, location, "anyOf")?)
        }
        SchemaShape::Typed(kinds) => {
            let mut arms = Vec::with_capacity(kinds.len());
            for kind in kinds {
                arms.push(parse_kind(ctx, &normalized, *kind, location)?);
            }
            TypeIr::union(arms)
        }
        SchemaShape::Unconstrained => TypeIr::Unknown,
    };

    Ok(if normalized.nullable {
        parsed.nullable()
    } else {
        parsed
    })
}

/// Resolves the node `reference` points at and parses it with the current
/// document switched to the reference's document.
pub(crate) fn parse_target(
    ctx: &mut ResolutionContext<'_>,
    reference: &Reference,
) -> AppResult<TypeIr> {
    let node = ctx.store().resolve(reference)?;
    let mut scope = ctx.enter_document(reference.document());
    parse_node(&mut scope, node, reference)
}

fn parse_members(
    ctx: &mut ResolutionContext<'_>,
    members: &[Value],
    location: &Reference,
    keyword: &str,
) -> AppResult<Vec<TypeIr>> {
    let base = location.child(keyword);
    members
        .iter()
        .enumerate()
        .map(|(i, member)| parse_node(ctx, member, &base.child(i.to_string())))
        .collect()
}

fn parse_kind(
    ctx: &mut ResolutionContext<'_>,
    node: &NormalizedNode<'_>,
    kind: SchemaKind,
    location: &Reference,
) -> AppResult<TypeIr> {
    match kind {
        SchemaKind::String => Ok(parse_string(ctx, node)),
        SchemaKind::Number | SchemaKind::Integer => {
            Ok(literals(node, kind).unwrap_or_else(TypeIr::number))
        }
        SchemaKind::Boolean => Ok(literals(node, kind).unwrap_or_else(TypeIr::boolean)),
        SchemaKind::Null => Ok(TypeIr::null()),
        SchemaKind::Array => parse_array(ctx, node, location),
        SchemaKind::Object => parse_object(ctx, node, location),
    }
}

fn parse_string(ctx: &mut ResolutionContext<'_>, node: &NormalizedNode<'_>) -> TypeIr {
    if let Some(literal) = literals(node, SchemaKind::String) {
        return literal;
    }

    let format = node.get("format").and_then(Value::as_str);
    match format {
        Some(format) if ctx.config().is_temporal_format(format) => {
            let binding = ctx.config().date_type.clone();
            ctx.registry_mut()
                .record_opaque_import(&binding.import_path, &binding.backing_name);
            TypeIr::Opaque {
                display_name: binding.display_name,
                backing_name: binding.backing_name,
            }
        }
        _ => TypeIr::string(),
    }
}

/// Enum values admitted by `kind` as a union of literals, or `None` if the node
/// has no such values.
fn literals(node: &NormalizedNode<'_>, kind: SchemaKind) -> Option<TypeIr> {
    let values = node.enum_values.as_ref()?;
    let literals: Vec<TypeIr> = values
        .iter()
        .filter(|v| kind.admits(v))
        .filter_map(|v| literal_value(v))
        .map(TypeIr::Literal)
        .collect();
    if literals.is_empty() {
        None
    } else {
        Some(TypeIr::union(literals))
    }
}

fn literal_value(value: &Value) -> Option<LiteralValue> {
    match value {
        Value::String(s) => Some(LiteralValue::String(s.clone())),
        Value::Number(n) => Some(LiteralValue::Number(n.clone())),
        Value::Bool(b) => Some(LiteralValue::Boolean(*b)),
        Value::Null => Some(LiteralValue::Null),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_array(
    ctx: &mut ResolutionContext<'_>,
    node: &NormalizedNode<'_>,
    location: &Reference,
) -> AppResult<TypeIr> {
    if let Some(prefix) = node.get("prefixItems") {
        let members = prefix.as_array().ok_or_else(|| {
            AppError::malformed(location, "`prefixItems` must be an array of schemas")
        })?;
        return Ok(TypeIr::Tuple(parse_members(ctx, members, location, "prefixItems")?));
    }

    match node.get("items") {
        None => Ok(TypeIr::array(TypeIr::Unknown)),
        // Draft 4 tuple form.
        Some(Value::Array(members)) => Ok(TypeIr::Tuple(parse_members(
            ctx, members, location, "items",
        )?)),
        Some(items) => Ok(TypeIr::array(parse_node(
            ctx,
            items,
            &location.child("items"),
        )?)),
    }
}

fn parse_object(
    ctx: &mut ResolutionContext<'_>,
    node: &NormalizedNode<'_>,
    location: &Reference,
) -> AppResult<TypeIr> {
    let Some(properties) = node.get("properties") else {
        return match node.get("additionalProperties") {
            Some(schema @ Value::Object(_)) => Ok(TypeIr::Dictionary(Box::new(parse_node(
                ctx,
                schema,
                &location.child("additionalProperties"),
            )?))),
            Some(Value::Bool(false)) => Ok(TypeIr::Record(Vec::new())),
            _ => Ok(TypeIr::any_object()),
        };
    };

    let properties = properties
        .as_object()
        .ok_or_else(|| AppError::malformed(location, "`properties` must be an object"))?;
    let required: Vec<&str> = node
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let base = location.child("properties");
    let mut fields = Vec::with_capacity(properties.len());
    for (name, schema) in properties {
        let ty = parse_node(ctx, schema, &base.child(name.as_str()))?;
        fields.push(Field {
            name: name.clone(),
            ty,
            optional: !required.contains(&name.as_str()),
        });
    }
    Ok(TypeIr::Record(fields))
}
