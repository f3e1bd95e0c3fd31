#![deny(missing_docs)]

//! # OpenAPI / JSON Schema Resolution
//!
//! - **reference** / **ref_utils**: `$ref` parsing and canonical identity.
//! - **store**: the read-only document set.
//! - **normalization**: classifies raw schema nodes.
//! - **ir**: the language-neutral type model.
//! - **parser**: turns schema nodes into IR.
//! - **naming**: declaration naming policies.
//! - **registry** / **generator**: de-duplicated, recursion-safe declarations.
//! - **context**: per-run session state.
//! - **operations**: top-level requests for an OpenAPI document.

pub mod context;
pub mod generator;
pub mod ir;
pub mod naming;
pub(crate) mod normalization;
pub mod operations;
pub mod parser;
pub(crate) mod ref_utils;
pub mod reference;
pub mod registry;
pub mod store;

// Re-export public API
pub use context::{DocumentScope, ResolutionContext};
pub use generator::{materialize, resolve_reference, resolve_schema};
pub use ir::{Field, LiteralValue, Primitive, TypeIr};
pub use naming::{
    derive_operation_name, ComponentNaming, ExternalDocumentNaming, ModelName, NamingPolicy,
    OperationArtifact, OperationNaming, SharedComponentNaming,
};
pub use operations::{
    generate_all, generate_components, generate_operations, ArtifactKind, GenerationReport,
    ResolvedArtifact,
};
pub use parser::parse_node;
pub use reference::Reference;
pub use registry::{GeneratedModel, ModelDump, ModelRegistry};
pub use store::DocumentStore;
