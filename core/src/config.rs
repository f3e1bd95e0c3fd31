#![deny(missing_docs)]

//! # Engine Configuration
//!
//! Knobs shared by every resolution call of one engine run. All fields have
//! defaults, so an empty YAML document is a valid configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A well-known cross-cutting type emitted as an `Opaque` IR node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueBinding {
    /// Name shown in generated declarations (e.g. `Date`).
    pub display_name: String,
    /// Name of the runtime helper backing the type.
    pub backing_name: String,
    /// Import path the helper is emitted under.
    pub import_path: String,
}

/// Configuration for one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// String formats parsed as the temporal opaque type.
    pub temporal_formats: Vec<String>,
    /// The temporal opaque type.
    pub date_type: OpaqueBinding,
    /// Import-path prefix for declarations coming from external documents.
    pub external_namespace: String,
    /// Suffix appended to operation artifact names.
    pub schema_suffix: String,
    /// Media types searched first when picking a body or response schema.
    pub preferred_media_types: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temporal_formats: vec!["date".to_string(), "date-time".to_string()],
            date_type: OpaqueBinding {
                display_name: "Date".to_string(),
                backing_name: "DateString".to_string(),
                import_path: "runtime/temporal".to_string(),
            },
            external_namespace: "external".to_string(),
            schema_suffix: "Schema".to_string(),
            preferred_media_types: vec!["application/json".to_string()],
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from YAML; missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> AppResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| AppError::General(format!("Failed to parse engine config: {}", e)))
    }

    /// Whether `format` is one of the configured temporal formats.
    pub fn is_temporal_format(&self, format: &str) -> bool {
        self.temporal_formats.iter().any(|f| f == format)
    }
}
