#![deny(missing_docs)]

//! # Model Generator
//!
//! Decides which resolved references become named declarations and records them in
//! the registry. A reference is parsed at most once per run: declarations are
//! memoized by canonical reference, and targets that do not qualify for a name are
//! kept in a separate inline memo that is never dumped.
//!
//! Self-reference is detected through the registry's pending set. When a reference
//! is met again while its own target is still being parsed, its name is fixed
//! immediately, an `Identifier` is handed out, and the finished body is stored as
//! a `Recursive` declaration.

use crate::error::{AppError, AppResult};
use crate::oas::context::ResolutionContext;
use crate::oas::ir::TypeIr;
use crate::oas::naming::NamingPolicy;
use crate::oas::parser::parse_target;
use crate::oas::reference::Reference;
use std::rc::Rc;
use tracing::debug;

/// Resolves a reference string (relative to the root document) for a top-level
/// request, naming the result with `naming` if it qualifies for a declaration.
///
/// If the reference was already materialized earlier in the run, the existing
/// declaration is reused whatever `naming` says.
///
/// # Examples
///
/// ```
/// use cdd_typemodel::{resolve_schema, ComponentNaming, DocumentStore, ResolutionContext, TypeIr};
/// use serde_json::json;
///
/// let store = DocumentStore::new()
///     .with_document("api.json", json!({
///         "components": { "schemas": { "Pet": {
///             "type": "object",
///             "properties": { "name": { "type": "string" } }
///         } } }
///     }))
///     .unwrap();
/// let mut ctx = ResolutionContext::new(&store, "api.json").unwrap();
/// let ty = resolve_schema(&mut ctx, "#/components/schemas/Pet", ComponentNaming).unwrap();
/// assert_eq!(ty, TypeIr::identifier("Pet", None));
/// assert_eq!(ctx.registry().len(), 1);
/// ```
pub fn resolve_schema<N>(
    ctx: &mut ResolutionContext<'_>,
    reference: &str,
    naming: N,
) -> AppResult<TypeIr>
where
    N: NamingPolicy + 'static,
{
    let reference = Reference::parse(reference, ctx.root_document())?;
    resolve_reference(ctx, &reference, Some(Rc::new(naming)))
}

/// Resolves `reference` to a [`TypeIr`]: an `Identifier` if its target is (or
/// becomes) a named declaration, the inline type otherwise.
///
/// `naming` defaults to [`ResolutionContext::default_naming`].
///
/// On error, everything recorded while resolving this reference is rolled back.
pub fn resolve_reference(
    ctx: &mut ResolutionContext<'_>,
    reference: &Reference,
    naming: Option<Rc<dyn NamingPolicy>>,
) -> AppResult<TypeIr> {
    let canonical = reference.canonical();

    if let Some(model) = ctx.registry().get(&canonical) {
        debug!(reference = %canonical, name = %model.name, "registry hit");
        return Ok(model.identifier());
    }
    if let Some(inline) = ctx.registry().inline(&canonical) {
        return Ok(inline.clone());
    }
    if let Some(name) = ctx.registry_mut().reserve_recursive(reference, &canonical)? {
        debug!(reference = %canonical, name = %name, "recursive reference");
        return Ok(TypeIr::identifier(name.name, name.import_path));
    }

    let naming = naming.unwrap_or_else(|| ctx.default_naming(reference));
    let checkpoint = ctx.registry().checkpoint();
    ctx.registry_mut().begin(canonical, naming);

    let result = parse_target(ctx, reference).and_then(|raw| materialize(ctx, reference, raw));
    if result.is_err() {
        ctx.registry_mut().rollback(checkpoint);
    }
    result
}

/// Names `raw_type` if it qualifies for a declaration and records it.
///
/// Returns the `Identifier` of the declaration, or `raw_type` unchanged when it
/// does not qualify (no declaration, no registry entry).
///
/// # Errors
///
/// [`AppError::MalformedSchema`] if the reference is recursive but its body is
/// nothing but a reference to itself.
pub fn materialize(
    ctx: &mut ResolutionContext<'_>,
    reference: &Reference,
    raw_type: TypeIr,
) -> AppResult<TypeIr> {
    let canonical = reference.canonical();
    if let Some(model) = ctx.registry().get(&canonical) {
        return Ok(model.identifier());
    }

    let (naming, reserved) = match ctx.registry_mut().finish(&canonical) {
        Some(finished) => finished,
        None => (ctx.default_naming(reference), None),
    };

    let registry = ctx.registry_mut();
    if let Some(name) = reserved {
        let own = TypeIr::identifier(name.name.clone(), name.import_path.clone());
        if is_unproductive(&raw_type, &own) {
            return Err(AppError::malformed(
                reference,
                "reference cycle without a concrete type",
            ));
        }
        let declaration = TypeIr::Recursive {
            name: name.name.clone(),
            body: Box::new(raw_type),
        };
        let model = registry.insert(reference, canonical, name, declaration);
        debug!(reference = %model.reference, name = %model.name, "recursive declaration");
        return Ok(model.identifier());
    }

    if !raw_type.qualifies_for_declaration() {
        registry.record_inline(canonical, raw_type.clone());
        return Ok(raw_type);
    }

    let name = registry.assign_name(naming.as_ref(), reference, &canonical)?;
    let model = registry.insert(reference, canonical, name, raw_type);
    debug!(reference = %model.reference, name = %model.name, "new declaration");
    Ok(model.identifier())
}

/// A body that only restates the reference being defined: the identifier itself,
/// or a union/intersection of the identifier and `null`.
fn is_unproductive(body: &TypeIr, own: &TypeIr) -> bool {
    match body {
        TypeIr::Union(members) | TypeIr::Intersection(members) => members
            .iter()
            .all(|m| m == own || *m == TypeIr::null()),
        other => other == own,
    }
}
