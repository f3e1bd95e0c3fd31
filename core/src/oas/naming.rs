#![deny(missing_docs)]

//! # Naming Policies
//!
//! Pure functions from a [`Reference`] to a declaration name plus optional import
//! path. Each call site picks its policy:
//!
//! - [`ComponentNaming`]: `components/schemas/{Name}` becomes `{Name}`.
//! - [`OperationNaming`]: inline operation artifacts become
//!   `{Operation}{RequestBody|Response{code}|Parameter{index}}Schema`.
//! - [`ExternalDocumentNaming`]: schemas inside another document become
//!   `{lastPathSegment}`, grouped under a per-document namespace.

use crate::oas::reference::Reference;
use heck::ToUpperCamelCase;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A candidate declaration name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelName {
    /// Identifier of the declaration.
    pub name: String,
    /// Output grouping; `None` means the local namespace.
    pub import_path: Option<String>,
}

impl ModelName {
    /// A name in the local namespace.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            import_path: None,
        }
    }

    /// A name under `import_path`.
    pub fn in_namespace(name: impl Into<String>, import_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            import_path: Some(import_path.into()),
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.import_path {
            Some(path) => write!(f, "{}::{}", path, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Chooses names for materialized declarations.
pub trait NamingPolicy {
    /// The preferred name for the declaration at `reference`.
    fn name(&self, reference: &Reference) -> ModelName;

    /// A deterministic variant of `candidate` for the `attempt`-th collision
    /// (starting at 1). The default appends `attempt + 1`: `Pet`, `Pet2`, `Pet3`...
    fn disambiguate(&self, candidate: &ModelName, attempt: usize) -> ModelName {
        ModelName {
            name: format!("{}{}", candidate.name, attempt + 1),
            import_path: candidate.import_path.clone(),
        }
    }
}

/// Names a local schema after its last path token, or after the document for a
/// root reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentNaming;

impl NamingPolicy for ComponentNaming {
    fn name(&self, reference: &Reference) -> ModelName {
        ModelName::local(local_name(reference))
    }
}

/// The kind of inline schema attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationArtifact {
    /// The request body schema.
    RequestBody,
    /// A response schema for a status code (`200`, `default`, ...).
    Response(String),
    /// The schema of the n-th parameter.
    Parameter(usize),
}

impl fmt::Display for OperationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationArtifact::RequestBody => f.write_str("RequestBody"),
            OperationArtifact::Response(code) => {
                write!(f, "Response{}", code.to_upper_camel_case())
            }
            OperationArtifact::Parameter(index) => write!(f, "Parameter{}", index),
        }
    }
}

/// Names inline schemas nested under an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationNaming {
    operation: String,
    artifact: OperationArtifact,
    suffix: String,
}

impl OperationNaming {
    /// Creates a policy for one artifact of `operation` (an `operationId` or a
    /// derived name; it is PascalCased).
    pub fn new(operation: &str, artifact: OperationArtifact, suffix: &str) -> Self {
        Self {
            operation: sanitize_identifier(&operation.to_upper_camel_case()),
            artifact,
            suffix: suffix.to_string(),
        }
    }
}

impl NamingPolicy for OperationNaming {
    fn name(&self, _reference: &Reference) -> ModelName {
        ModelName::local(format!("{}{}{}", self.operation, self.artifact, self.suffix))
    }
}

/// Names the schema of a reusable parameter, body or response declared under
/// `components/{kind}/{Name}`, independently of the operations that use it.
///
/// e.g. `components/parameters/Filter/schema` -> `FilterParameterSchema`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedComponentNaming {
    suffix: String,
}

impl SharedComponentNaming {
    /// Creates a policy appending `suffix` to every name.
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
        }
    }

    /// Whether `reference` lives under a `components/{kind}/{Name}` entry.
    pub fn applies_to(reference: &Reference) -> bool {
        matches!(reference.path(), [components, _, _, ..] if components == "components")
    }
}

impl NamingPolicy for SharedComponentNaming {
    fn name(&self, reference: &Reference) -> ModelName {
        let [_, kind, component, ..] = reference.path() else {
            return ModelName::local(local_name(reference));
        };
        let kind = match kind.as_str() {
            "parameters" => "Parameter".to_string(),
            "requestBodies" => "RequestBody".to_string(),
            "responses" => "Response".to_string(),
            "headers" => "Header".to_string(),
            other => other.to_upper_camel_case(),
        };
        ModelName::local(format!(
            "{}{}{}",
            sanitize_identifier(&component.to_upper_camel_case()),
            kind,
            self.suffix
        ))
    }
}

/// Names schemas living in a document other than the root one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDocumentNaming {
    namespace: String,
}

impl ExternalDocumentNaming {
    /// Creates a policy grouping declarations under `namespace/{document}`.
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.trim_end_matches('/').to_string(),
        }
    }

    /// Import path for declarations coming from `document`.
    pub fn import_path(&self, document: &str) -> String {
        format!("{}/{}", self.namespace, document_namespace(document))
    }
}

impl NamingPolicy for ExternalDocumentNaming {
    fn name(&self, reference: &Reference) -> ModelName {
        ModelName::in_namespace(local_name(reference), self.import_path(reference.document()))
    }
}

/// Derives a handler-style operation name from method and path when
/// `operationId` is missing.
///
/// e.g. `GET /users/{id}` -> `get_users_id`
pub fn derive_operation_name(method: &str, path: &str) -> String {
    let clean_path = path.replace(['{', '}'], "").replace('/', "_");
    format!(
        "{}_{}",
        method.to_lowercase(),
        clean_path.trim_start_matches('_')
    )
}

fn local_name(reference: &Reference) -> String {
    match reference.last_segment() {
        Some(segment) => sanitize_identifier(segment),
        None => sanitize_identifier(&document_stem(reference.document()).to_upper_camel_case()),
    }
}

/// File name of a document id without directories or extension.
fn document_stem(document: &str) -> &str {
    let file = document
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(document);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    }
}

/// A stable, path-like namespace for a document id:
/// `https://x.org/a/pets.yaml` -> `x_org_a_pets`, `../shared/types.json` -> `shared_types`.
fn document_namespace(document: &str) -> String {
    let without_scheme = document
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(document);
    let without_ext = match without_scheme.rsplit_once('.') {
        Some((head, ext)) if !ext.contains('/') && !head.is_empty() => head,
        _ => without_scheme,
    };
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("Invalid regex"));
    let joined = non_word.replace_all(without_ext, "_");
    let trimmed = joined.trim_matches('_').to_lowercase();
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed
    }
}

/// Replaces characters that cannot appear in an identifier.
fn sanitize_identifier(raw: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid regex"));
    let cleaned = invalid.replace_all(raw, "_").into_owned();
    match cleaned.chars().next() {
        None => "Model".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", cleaned),
        Some(_) => cleaned,
    }
}
