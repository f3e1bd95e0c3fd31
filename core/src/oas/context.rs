#![deny(missing_docs)]

//! # Resolution Context
//!
//! Session state threaded through every resolution call of one engine run:
//! the root document id, the read-only [`DocumentStore`], the "current document"
//! cell and the [`ModelRegistry`].
//!
//! Outside of an active resolution call the current document is always the root
//! document. Document switches go through [`ResolutionContext::enter_document`],
//! whose guard restores the previous value when dropped, so early returns, `?` and
//! panics all leave the cell as they found it.

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::oas::naming::{ComponentNaming, ExternalDocumentNaming, NamingPolicy};
use crate::oas::ref_utils::canonical_document_id;
use crate::oas::reference::Reference;
use crate::oas::registry::{ModelDump, ModelRegistry};
use crate::oas::store::DocumentStore;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use tracing::debug;

/// Mutable session state for one engine run.
pub struct ResolutionContext<'s> {
    root: String,
    store: &'s DocumentStore,
    current: String,
    registry: ModelRegistry,
    config: EngineConfig,
}

impl<'s> ResolutionContext<'s> {
    /// Creates a context rooted at `root` with the default configuration.
    ///
    /// # Errors
    ///
    /// [`AppError::UnknownDocument`] if `root` is not in `store`.
    pub fn new(store: &'s DocumentStore, root: &str) -> AppResult<Self> {
        Self::with_config(store, root, EngineConfig::default())
    }

    /// Creates a context with an explicit configuration.
    pub fn with_config(
        store: &'s DocumentStore,
        root: &str,
        config: EngineConfig,
    ) -> AppResult<Self> {
        let root = canonical_document_id(root)
            .filter(|id| store.contains(id))
            .ok_or_else(|| AppError::UnknownDocument(root.to_string()))?;
        Ok(Self {
            current: root.clone(),
            root,
            store,
            registry: ModelRegistry::new(),
            config,
        })
    }

    /// The root document id.
    pub fn root_document(&self) -> &str {
        &self.root
    }

    /// The document relative references currently resolve against.
    pub fn current_document(&self) -> &str {
        &self.current
    }

    /// The document store. The returned borrow is independent of `self`.
    pub fn store(&self) -> &'s DocumentStore {
        self.store
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The generated-model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    /// Parses a reference string relative to the current document.
    pub fn reference(&self, raw: &str) -> AppResult<Reference> {
        Reference::parse(raw, &self.current)
    }

    /// Naming policy for references met while parsing: schemas outside the root
    /// document are grouped per external document, local ones use their own name.
    pub fn default_naming(&self, reference: &Reference) -> Rc<dyn NamingPolicy> {
        if reference.document() == self.root {
            Rc::new(ComponentNaming)
        } else {
            Rc::new(ExternalDocumentNaming::new(&self.config.external_namespace))
        }
    }

    /// Switches the current document until the returned guard is dropped.
    pub fn enter_document(&mut self, document: &str) -> DocumentScope<'_, 's> {
        let previous = std::mem::replace(&mut self.current, document.to_string());
        if previous != self.current {
            debug!(from = %previous, to = %self.current, "entering document");
        }
        DocumentScope {
            context: self,
            previous: Some(previous),
        }
    }

    /// Ends the run, returning the registry dump.
    pub fn finish(self) -> ModelDump {
        self.registry.into_dump()
    }
}

/// Restores the previous current document on drop.
pub struct DocumentScope<'c, 's> {
    context: &'c mut ResolutionContext<'s>,
    previous: Option<String>,
}

impl<'s> Deref for DocumentScope<'_, 's> {
    type Target = ResolutionContext<'s>;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for DocumentScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for DocumentScope<'_, '_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.context.current = previous;
        }
    }
}
