//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// Every resolution failure surfaces through this type unchanged; the engine never
/// downgrades one variant into another.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// A reference names a document that is not present in the store.
    #[from(ignore)]
    #[display("Unknown document: {_0}")]
    UnknownDocument(String),

    /// A reference path does not exist inside an otherwise-known document.
    #[from(ignore)]
    #[display("Unresolved reference: {_0}")]
    UnresolvedReference(String),

    /// A schema node that cannot be parsed by any rule.
    #[from(ignore)]
    #[display("Malformed schema at {location}: {reason}")]
    MalformedSchema {
        /// Canonical reference of the offending node.
        location: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A document id registered twice.
    #[from(ignore)]
    #[display("Document already registered: {_0}")]
    DuplicateDocument(String),

    /// The naming policy never produced a free name.
    #[from(ignore)]
    #[display("Naming conflict: {_0}")]
    NamingConflict(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Shorthand for building a [`AppError::MalformedSchema`].
    pub fn malformed(location: impl ToString, reason: impl Into<String>) -> Self {
        AppError::MalformedSchema {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
