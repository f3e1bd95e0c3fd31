#![deny(missing_docs)]

//! # CDD Type Model
//!
//! Resolves `$ref`s across a set of OpenAPI / JSON Schema documents and turns the
//! schemas they point at into a de-duplicated, recursion-safe model of named type
//! declarations, ready for a language emitter.

/// Shared error types.
pub mod error;

/// Engine configuration.
pub mod config;

/// Reference resolution and type-model generation.
pub mod oas;

pub use config::{EngineConfig, OpaqueBinding};
pub use error::{AppError, AppResult};
pub use oas::{
    derive_operation_name, generate_all, generate_components, generate_operations, materialize,
    parse_node, resolve_reference, resolve_schema, ArtifactKind, ComponentNaming, DocumentScope,
    DocumentStore, ExternalDocumentNaming, Field, GeneratedModel, GenerationReport, LiteralValue,
    ModelDump, ModelName, ModelRegistry, NamingPolicy, OperationArtifact, OperationNaming,
    Primitive, Reference, ResolutionContext, ResolvedArtifact, SharedComponentNaming, TypeIr,
};
