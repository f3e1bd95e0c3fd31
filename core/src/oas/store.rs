#![deny(missing_docs)]

//! # Document Store
//!
//! Stores already-loaded OpenAPI / JSON Schema documents for multi-document
//! reference resolution. No network or file access is performed: callers hand in
//! document text or parsed values keyed by a document id.

use crate::error::{AppError, AppResult};
use crate::oas::ref_utils::canonical_document_id;
use crate::oas::reference::Reference;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Immutable mapping from document id to parsed document tree.
///
/// The store is populated once, before resolution begins, and only read afterwards.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    docs: BTreeMap<String, JsonValue>,
}

impl DocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document from YAML text.
    pub fn insert_yaml(&mut self, id: &str, yaml: &str) -> AppResult<String> {
        let raw: JsonValue = serde_yaml::from_str(yaml)
            .map_err(|e| {
                AppError::General(format!("Failed to parse YAML document '{}': {}", id, e))
            })?;
        self.insert(id, raw)
    }

    /// Registers a document from JSON text.
    pub fn insert_json_str(&mut self, id: &str, json: &str) -> AppResult<String> {
        let raw: JsonValue = serde_json::from_str(json)
            .map_err(|e| {
                AppError::General(format!("Failed to parse JSON document '{}': {}", id, e))
            })?;
        self.insert(id, raw)
    }

    /// Registers an already parsed document.
    ///
    /// Returns the canonical id the document is stored under.
    pub fn insert(&mut self, id: &str, document: JsonValue) -> AppResult<String> {
        let key = canonical_document_id(id).ok_or_else(|| {
            AppError::General(format!("Invalid document id '{}'", id))
        })?;
        if self.docs.contains_key(&key) {
            return Err(AppError::DuplicateDocument(key));
        }
        self.docs.insert(key.clone(), document);
        Ok(key)
    }

    /// Builder-style variant of [`DocumentStore::insert`].
    pub fn with_document(mut self, id: &str, document: JsonValue) -> AppResult<Self> {
        self.insert(id, document)?;
        Ok(self)
    }

    /// Returns a document by canonical id.
    pub fn get(&self, id: &str) -> Option<&JsonValue> {
        self.docs.get(id)
    }

    /// Whether a document with this canonical id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }

    /// Iterates the registered document ids in sorted order.
    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.docs.keys().map(String::as_str)
    }

    /// Resolves a reference to the raw node it points at.
    ///
    /// Object members are looked up by key, array elements by decimal index.
    ///
    /// # Errors
    ///
    /// * [`AppError::UnknownDocument`] if the document is not registered.
    /// * [`AppError::UnresolvedReference`] if any path token does not exist.
    pub fn resolve(&self, reference: &Reference) -> AppResult<&JsonValue> {
        let mut node = self
            .docs
            .get(reference.document())
            .ok_or_else(|| AppError::UnknownDocument(reference.document().to_string()))?;

        for token in reference.path() {
            let next = match node {
                JsonValue::Object(map) => map.get(token),
                JsonValue::Array(items) => parse_array_index(token).and_then(|i| items.get(i)),
                _ => None,
            };
            node = next.ok_or_else(|| AppError::UnresolvedReference(reference.canonical()))?;
        }

        Ok(node)
    }
}

fn parse_array_index(token: &str) -> Option<usize> {
    // RFC 6901: no leading zeros, no sign.
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
