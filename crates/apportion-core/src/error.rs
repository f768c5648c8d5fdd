//! # Error Types
//!
//! Domain-specific error types for apportion-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  apportion-core errors (this file)                                     │
//! │  ├── CoreError        - Arithmetic / invariant failures                │
//! │  └── ValidationError  - Input validation failures (field-annotated)    │
//! │                                                                         │
//! │  apportion-catalog errors (separate crate)                             │
//! │  └── CatalogError     - Lookup / fixture failures                      │
//! │                                                                         │
//! │  apportion-engine errors                                               │
//! │  └── EngineError → ApiError (what callers see, serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError / CoreError → EngineError → ApiError → Caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Classes of Failure
//! 1. **User errors** (`ValidationError`) - the request is wrong; the caller can fix it.
//! 2. **Programming errors** (`CoreError::InvariantViolation`) - money was mis-tracked
//!    upstream. Never downgraded to a user error, never retried.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core allocation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Not enough capacity left to place a remainder.
    ///
    /// ## When This Occurs
    /// - A discount larger than the sum of its targets' subtotals reached the allocator
    /// - A split produced more remainder than the targets can hold
    ///
    /// Either way an upstream step lost track of money. The request is aborted.
    #[error("Allocation invariant violated in {context}: {remaining} left to place, only {capacity} capacity")]
    InvariantViolation {
        context: String,
        remaining: Decimal,
        capacity: Decimal,
    },

    /// Currency code is not in the supported table.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// A composite line cannot be decomposed as described.
    #[error("Invalid composite line: {reason}")]
    InvalidComposite { reason: String },
}

impl CoreError {
    /// Returns true for errors that indicate a bug rather than bad input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, CoreError::InvariantViolation { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant carries the field path it applies to, e.g.
/// `lineItems[2].discountAllocations[0].amount`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., unknown currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not allowed in this context.
    #[error("{field} is not allowed: {reason}")]
    NotAllowed { field: String, reason: String },

    /// A set of parts adds up to more than its whole.
    #[error("{field} total {total} exceeds {limit}")]
    ExceedsTotal {
        field: String,
        total: Decimal,
        limit: Decimal,
    },
}

impl ValidationError {
    /// Returns the field path this error applies to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustBeNonNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::ExceedsTotal { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_message() {
        let err = CoreError::InvariantViolation {
            context: "discount".to_string(),
            remaining: Decimal::from(5),
            capacity: Decimal::from(3),
        };
        assert_eq!(
            err.to_string(),
            "Allocation invariant violated in discount: 5 left to place, only 3 capacity"
        );
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "lineItems[0].price".to_string(),
        };
        assert_eq!(err.to_string(), "lineItems[0].price is required");
        assert_eq!(err.field(), "lineItems[0].price");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }
}
