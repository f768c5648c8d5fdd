//! # Catalog Error Types
//!
//! Error types for catalog lookups and fixture loading.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  io::Error / serde_json::Error                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogError (this module) ← Adds context and categorization          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (apportion-engine)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError ← Serialized for the caller                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Catalog operation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Entity not found in the catalog.
    ///
    /// ## When This Occurs
    /// - No tax setting exists for the requested country
    /// - A single-record accessor was asked for an unknown id
    ///
    /// Batched lookups never raise this; they omit the missing ids instead.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Fixture document could not be parsed.
    ///
    /// ## When This Occurs
    /// - Malformed JSON
    /// - Missing required fields
    /// - A decimal that does not parse
    #[error("Invalid catalog fixture: {0}")]
    Fixture(#[from] serde_json::Error),

    /// Fixture file could not be read.
    #[error("Failed to read catalog fixture: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CatalogError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns true if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
