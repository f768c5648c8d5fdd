//! # Engine & API Error Types
//!
//! `EngineError` is what the pipeline returns; `ApiError` is the serialized
//! shape a caller (CLI, HTTP handler, FFI) hands on to its own client.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Apportion                              │
//! │                                                                         │
//! │  AllocationEngine::allocate(request)                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Validation?  ── all field errors, one batch ──► Validation      │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Catalog miss? ── all missing ids, one batch ──► NotFound        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Capacity shortfall? ── logged at error! ─────► Invariant        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────► AllocationResponse │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  EngineError ──► ApiError { code, message, errors[] } ──► caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant Violations Are Not User Errors
//! A capacity shortfall means money was mis-tracked before it reached the
//! redistributor. It maps to `INVARIANT_VIOLATION`, never to
//! `VALIDATION_ERROR`, and a caller must not retry it.

use apportion_catalog::CatalogError;
use apportion_core::{CoreError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Field Error
// =============================================================================

/// One problem with one field of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Path into the request, e.g. `lineItems[1].components[0].baseQuantity`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for FieldError {
    fn from(err: ValidationError) -> Self {
        FieldError::new(err.field(), err.to_string())
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Errors returned by the allocation pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// One or more request fields are invalid.
    #[error("Request validation failed ({} errors)", .0.len())]
    Validation(Vec<FieldError>),

    /// One or more referenced catalog records do not exist.
    #[error("Catalog references not found ({} missing)", .0.len())]
    NotFound(Vec<FieldError>),

    /// Money was mis-tracked upstream of a split. Fatal for the request.
    #[error("Allocation aborted: {0}")]
    Invariant(CoreError),

    /// The catalog backend failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl EngineError {
    /// Returns the field errors carried by batched variants.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            EngineError::Validation(errors) | EngineError::NotFound(errors) => errors,
            EngineError::Invariant(_) | EngineError::Catalog(_) => &[],
        }
    }

    /// Wraps a core error raised while processing the line at `index`.
    pub fn at_line(index: usize, err: CoreError) -> Self {
        match err {
            CoreError::InvariantViolation { .. } => EngineError::Invariant(err),
            CoreError::InvalidComposite { reason } => {
                EngineError::Validation(vec![FieldError::new(format!("lineItems[{index}]"), reason)])
            }
            CoreError::UnsupportedCurrency(code) => EngineError::Validation(vec![FieldError::new(
                "currency",
                format!("unsupported currency code '{code}'"),
            )]),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// API Error
// =============================================================================

/// Error shape returned to callers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Request validation failed (2 errors)",
///   "errors": [
///     { "field": "lineItems[0].quantity", "message": "lineItems[0].quantity must be positive" },
///     { "field": "currency", "message": "currency has invalid format: unsupported currency code 'XYZ'" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Field-level details for batched errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced catalog record absent (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Allocation accounting broke; not retryable (500)
    InvariantViolation,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Attaches field-level details.
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts engine errors to API errors.
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::Validation(errors) => {
                ApiError::new(ErrorCode::ValidationError, message).with_errors(errors)
            }
            EngineError::NotFound(errors) => {
                ApiError::new(ErrorCode::NotFound, message).with_errors(errors)
            }
            EngineError::Invariant(_) => ApiError::new(ErrorCode::InvariantViolation, message),
            EngineError::Catalog(e) => {
                tracing::error!("Catalog backend failed: {}", e);
                ApiError::internal("Catalog lookup failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_validation_maps_to_validation_code() {
        let err = EngineError::Validation(vec![
            FieldError::new("lineItems[0].quantity", "must be positive"),
            FieldError::new("currency", "unsupported"),
        ]);
        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert_eq!(api.errors.len(), 2);
        assert_eq!(api.message, "Request validation failed (2 errors)");
    }

    #[test]
    fn test_invariant_is_never_a_user_error() {
        let err = EngineError::Invariant(CoreError::InvariantViolation {
            context: "discount d1".to_string(),
            remaining: Decimal::ONE,
            capacity: Decimal::ZERO,
        });
        assert!(err.field_errors().is_empty());
        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::InvariantViolation);
    }

    #[test]
    fn test_catalog_failure_is_internal() {
        let err = EngineError::from(CatalogError::not_found("TaxSetting", "ZZ"));
        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::Internal);
    }

    #[test]
    fn test_at_line_routes_core_errors() {
        let invariant = CoreError::InvariantViolation {
            context: "decompose".to_string(),
            remaining: Decimal::ONE,
            capacity: Decimal::ZERO,
        };
        assert!(matches!(EngineError::at_line(0, invariant), EngineError::Invariant(_)));

        let composite = CoreError::InvalidComposite {
            reason: "base quantity must be positive".to_string(),
        };
        let err = EngineError::at_line(3, composite);
        assert_eq!(err.field_errors()[0].field, "lineItems[3]");

        let currency = EngineError::at_line(0, CoreError::UnsupportedCurrency("ZZZ".to_string()));
        assert!(matches!(currency, EngineError::Validation(_)));
        assert_eq!(currency.field_errors()[0].field, "currency");
    }

    #[test]
    fn test_serialized_shape() {
        let api = ApiError::new(ErrorCode::NotFound, "missing")
            .with_errors(vec![FieldError::new("lineItems[0].variantId", "Variant 9 not found")]);
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["errors"][0]["field"], "lineItems[0].variantId");

        let bare = serde_json::to_value(ApiError::internal("boom")).unwrap();
        assert!(bare.get("errors").is_none());
    }
}
