#![deny(missing_docs)]

//! # Generated-Model Registry
//!
//! The de-duplication memo of one engine run: canonical reference string to the
//! declaration generated for it. Also tracks references whose generation is in
//! progress, which is how self-reference is detected.

use crate::error::{AppError, AppResult};
use crate::oas::ir::TypeIr;
use crate::oas::naming::{ModelName, NamingPolicy};
use crate::oas::reference::Reference;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

const MAX_DISAMBIGUATION_ATTEMPTS: usize = 10_000;

/// A named declaration produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedModel {
    /// The reference the declaration was generated from.
    pub reference: Reference,
    /// Declaration name.
    pub name: String,
    /// Declaration body.
    pub declaration: TypeIr,
    /// Output grouping, `None` for the local file.
    pub import_path: Option<String>,
}

impl GeneratedModel {
    /// The `Identifier` pointing at this declaration.
    pub fn identifier(&self) -> TypeIr {
        TypeIr::identifier(self.name.clone(), self.import_path.clone())
    }
}

/// Complete output of one engine run, handed to emitters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDump {
    /// Declarations keyed by canonical reference, in completion order.
    pub models: IndexMap<String, GeneratedModel>,
    /// Import path to the well-known opaque backing names used under it.
    pub opaque_imports: BTreeMap<String, BTreeSet<String>>,
}

/// Registry sizes at a point in time; see [`ModelRegistry::rollback`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    models: usize,
    inline: usize,
    pending: usize,
    names: usize,
}

/// Naming policy and reserved name of a reference whose generation just ended.
pub(crate) type FinishedModel = (Rc<dyn NamingPolicy>, Option<ModelName>);

/// A reference whose target is currently being parsed.
pub(crate) struct PendingModel {
    naming: Rc<dyn NamingPolicy>,
    reserved: Option<ModelName>,
}

/// Registry of generated declarations.
#[derive(Default)]
pub struct ModelRegistry {
    models: IndexMap<String, GeneratedModel>,
    inline: IndexMap<String, TypeIr>,
    pending: IndexMap<String, PendingModel>,
    names: IndexMap<ModelName, String>,
    opaque_imports: BTreeMap<String, BTreeSet<String>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The declaration generated for `canonical`, if any.
    pub fn get(&self, canonical: &str) -> Option<&GeneratedModel> {
        self.models.get(canonical)
    }

    /// The declaration generated for a reference, if any.
    pub fn lookup(&self, reference: &Reference) -> Option<&GeneratedModel> {
        self.models.get(&reference.canonical())
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no declaration has been generated yet.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Declarations in completion order.
    pub fn models(&self) -> impl Iterator<Item = &GeneratedModel> {
        self.models.values()
    }

    /// Whether generation of `canonical` is in progress.
    pub fn is_pending(&self, canonical: &str) -> bool {
        self.pending.contains_key(canonical)
    }

    /// Snapshot of the registry for emitters.
    pub fn dump(&self) -> ModelDump {
        ModelDump {
            models: self.models.clone(),
            opaque_imports: self.opaque_imports.clone(),
        }
    }

    /// Consumes the registry into its dump.
    pub fn into_dump(self) -> ModelDump {
        ModelDump {
            models: self.models,
            opaque_imports: self.opaque_imports,
        }
    }

    pub(crate) fn inline(&self, canonical: &str) -> Option<&TypeIr> {
        self.inline.get(canonical)
    }

    pub(crate) fn record_inline(&mut self, canonical: String, ty: TypeIr) {
        self.inline.insert(canonical, ty);
    }

    pub(crate) fn record_opaque_import(&mut self, import_path: &str, backing_name: &str) {
        self.opaque_imports
            .entry(import_path.to_string())
            .or_default()
            .insert(backing_name.to_string());
    }

    /// Marks `canonical` as in progress.
    pub(crate) fn begin(&mut self, canonical: String, naming: Rc<dyn NamingPolicy>) {
        self.pending.insert(
            canonical,
            PendingModel {
                naming,
                reserved: None,
            },
        );
    }

    /// Handles a reference found while its own target is still being parsed: the
    /// name is fixed now so the caller can hand out an `Identifier`.
    ///
    /// Returns `None` if `canonical` is not pending.
    pub(crate) fn reserve_recursive(
        &mut self,
        reference: &Reference,
        canonical: &str,
    ) -> AppResult<Option<ModelName>> {
        let naming = match self.pending.get(canonical) {
            None => return Ok(None),
            Some(PendingModel {
                reserved: Some(name),
                ..
            }) => return Ok(Some(name.clone())),
            Some(pending) => Rc::clone(&pending.naming),
        };
        let name = self.assign_name(naming.as_ref(), reference, canonical)?;
        if let Some(pending) = self.pending.get_mut(canonical) {
            pending.reserved = Some(name.clone());
        }
        Ok(Some(name))
    }

    /// Ends generation of `canonical`, returning the reserved name if the target
    /// turned out to be recursive.
    pub(crate) fn finish(&mut self, canonical: &str) -> Option<FinishedModel> {
        self.pending
            .shift_remove(canonical)
            .map(|pending| (pending.naming, pending.reserved))
    }

    /// Marks the current state so a failed resolution can be undone.
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            models: self.models.len(),
            inline: self.inline.len(),
            pending: self.pending.len(),
            names: self.names.len(),
        }
    }

    /// Forgets every declaration, memo entry, pending reference and reserved
    /// name recorded after `checkpoint`.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.models.truncate(checkpoint.models);
        self.inline.truncate(checkpoint.inline);
        self.pending.truncate(checkpoint.pending);
        self.names.truncate(checkpoint.names);
    }

    /// Picks a free name for `canonical`, asking `naming` for disambiguated
    /// variants on collision, and reserves it.
    pub(crate) fn assign_name(
        &mut self,
        naming: &dyn NamingPolicy,
        reference: &Reference,
        canonical: &str,
    ) -> AppResult<ModelName> {
        let base = naming.name(reference);
        let mut candidate = base.clone();
        let mut attempt = 0;
        loop {
            match self.names.get(&candidate) {
                Some(owner) if owner != canonical => {
                    attempt += 1;
                    if attempt > MAX_DISAMBIGUATION_ATTEMPTS {
                        return Err(AppError::NamingConflict(format!(
                            "no free variant of '{}' for {}",
                            base, canonical
                        )));
                    }
                    candidate = naming.disambiguate(&base, attempt);
                }
                _ => break,
            }
        }
        self.names.insert(candidate.clone(), canonical.to_string());
        Ok(candidate)
    }

    /// Stores a finished declaration.
    pub(crate) fn insert(
        &mut self,
        reference: &Reference,
        canonical: String,
        name: ModelName,
        declaration: TypeIr,
    ) -> &GeneratedModel {
        let model = GeneratedModel {
            reference: reference.clone(),
            name: name.name,
            declaration,
            import_path: name.import_path,
        };
        self.models.entry(canonical).or_insert(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::naming::ComponentNaming;

    #[test]
    fn test_assign_name_disambiguates_other_references() {
        let mut registry = ModelRegistry::new();
        let a = Reference::parse("#/components/schemas/Pet", "a.yaml").unwrap();
        let b = Reference::parse("#/definitions/Pet", "a.yaml").unwrap();
        let first = registry
            .assign_name(&ComponentNaming, &a, &a.canonical())
            .unwrap();
        let second = registry
            .assign_name(&ComponentNaming, &b, &b.canonical())
            .unwrap();
        assert_eq!(first.name, "Pet");
        assert_eq!(second.name, "Pet2");
        // Same reference asking again keeps its name.
        let again = registry
            .assign_name(&ComponentNaming, &a, &a.canonical())
            .unwrap();
        assert_eq!(again.name, "Pet");
    }

    #[test]
    fn test_names_are_scoped_by_import_path() {
        let mut registry = ModelRegistry::new();
        registry
            .names
            .insert(ModelName::local("Money"), "a.yaml#/Money".into());
        let ext = ModelName::in_namespace("Money", "external/common");
        assert!(registry.names.get(&ext).is_none());
    }

    #[test]
    fn test_rollback_releases_reserved_name() {
        let mut registry = ModelRegistry::new();
        let r = Reference::parse("#/components/schemas/Node", "a.yaml").unwrap();
        let key = r.canonical();
        let checkpoint = registry.checkpoint();
        registry.begin(key.clone(), Rc::new(ComponentNaming));
        let name = registry.reserve_recursive(&r, &key).unwrap().unwrap();
        assert_eq!(name.name, "Node");
        assert!(registry.is_pending(&key));
        registry.record_inline("a.yaml#/x".into(), TypeIr::string());
        registry.rollback(checkpoint);
        assert!(!registry.is_pending(&key));
        assert!(registry.names.is_empty());
        assert!(registry.inline("a.yaml#/x").is_none());
    }

    #[test]
    fn test_reserve_recursive_is_stable() {
        let mut registry = ModelRegistry::new();
        let r = Reference::parse("#/components/schemas/Node", "a.yaml").unwrap();
        let key = r.canonical();
        assert!(registry.reserve_recursive(&r, &key).unwrap().is_none());
        registry.begin(key.clone(), Rc::new(ComponentNaming));
        let first = registry.reserve_recursive(&r, &key).unwrap();
        let second = registry.reserve_recursive(&r, &key).unwrap();
        assert_eq!(first, second);
        let (_, reserved) = registry.finish(&key).unwrap();
        assert_eq!(reserved, first);
    }
}
