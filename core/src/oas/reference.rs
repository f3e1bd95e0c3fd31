#![deny(missing_docs)]

//! # References
//!
//! A [`Reference`] identifies one node inside the document graph: a document id plus
//! a sequence of decoded JSON Pointer tokens. It is the registry key for every
//! generated declaration.

use crate::error::{AppError, AppResult};
use crate::oas::ref_utils::{decode_pointer_segment, encode_pointer_segment, resolve_document_id};
use serde::{Serialize, Serializer};
use std::fmt;

/// A location inside a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    document: String,
    path: Vec<String>,
}

impl Reference {
    /// Builds a reference from an already canonical document id and decoded tokens.
    pub fn new(document: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            document: document.into(),
            path,
        }
    }

    /// The root node of `document`.
    pub fn root(document: impl Into<String>) -> Self {
        Self::new(document, Vec::new())
    }

    /// Parses the string form of a reference.
    ///
    /// A bare fragment (`#/a/b`, or `#`) is taken relative to `current_document`;
    /// a document part is resolved against the current document's location before
    /// being used as a store key.
    ///
    /// # Arguments
    ///
    /// * `raw` - The reference string, e.g. `common.yaml#/components/schemas/Id`.
    /// * `current_document` - Id of the document the reference appears in.
    pub fn parse(raw: &str, current_document: &str) -> AppResult<Self> {
        let (doc_part, fragment) = match raw.split_once('#') {
            Some((doc, frag)) => (doc, Some(frag)),
            None => (raw, None),
        };

        let document = if doc_part.is_empty() {
            current_document.to_string()
        } else {
            resolve_document_id(doc_part, current_document)
                .ok_or_else(|| AppError::UnknownDocument(doc_part.to_string()))?
        };

        let path = match fragment {
            None | Some("") => Vec::new(),
            Some(frag) if frag.starts_with('/') => frag[1..]
                .split('/')
                .map(decode_pointer_segment)
                .collect(),
            Some(frag) => {
                return Err(AppError::malformed(
                    raw,
                    format!("unsupported fragment '#{}': only JSON Pointers are resolved", frag),
                ))
            }
        };

        Ok(Self { document, path })
    }

    /// Document id of the referenced node.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Decoded path tokens.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Whether the reference addresses the document root.
    pub fn is_document_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Last path token, if any.
    pub fn last_segment(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// Location of a child node.
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(token.into());
        Self {
            document: self.document.clone(),
            path,
        }
    }

    /// Encoded JSON Pointer (`""` for the root, `/a/b` otherwise).
    pub fn pointer(&self) -> String {
        self.path
            .iter()
            .map(|t| format!("/{}", encode_pointer_segment(t)))
            .collect()
    }

    /// Canonical string form, used as the registry memo key.
    pub fn canonical(&self) -> String {
        format!("{}#{}", self.document, self.pointer())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.pointer())
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}
