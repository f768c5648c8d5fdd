//! # Validation Module
//!
//! Field-level validation rules for allocation requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Shape and type checks                                             │
//! │  └── Decimal parsing                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Field rules (THIS MODULE)                                    │
//! │  ├── One function per rule, each taking the field path it reports      │
//! │  └── Returns the first problem with that one field                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Request validation (apportion-engine)                        │
//! │  ├── Walks every line, component, discount and tax line                │
//! │  └── Collects ALL failures into one batch                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use apportion_core::validation::{validate_quantity, validate_rate};
//! use rust_decimal::Decimal;
//!
//! assert!(validate_quantity("lineItems[0].quantity", Decimal::from(5), Decimal::from(100)).is_ok());
//! assert!(validate_rate("lineItems[0].taxLines[0].rate", Decimal::new(15, 1)).is_err());
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Currency;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Presence
// =============================================================================

/// Returns the value, or `Required` when it is missing.
pub fn require<T: Copy>(field: &str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must be a whole number
/// - Must not exceed `max`
pub fn validate_quantity(field: &str, qty: Decimal, max: Decimal) -> ValidationResult<()> {
    if qty <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    validate_whole(field, qty)?;

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "1".to_string(),
            max: max.to_string(),
        });
    }

    Ok(())
}

/// Quantities weight whole-unit steps, so fractions are rejected.
fn validate_whole(field: &str, qty: Decimal) -> ValidationResult<()> {
    if !qty.fract().is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number".to_string(),
        });
    }
    Ok(())
}

/// Validates a price or amount.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, zero-priced bundle parts)
pub fn validate_amount(field: &str, amount: Decimal) -> ValidationResult<()> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount the caller sends in `currency`.
///
/// ## Rules
/// - Must be non-negative
/// - Must not exceed `max`
/// - Must not be finer than the currency's minimal unit (`1.004` USD is rejected)
pub fn validate_money(field: &str, amount: Decimal, currency: &Currency, max: Decimal) -> ValidationResult<()> {
    validate_amount(field, amount)?;
    validate_at_most(field, amount, max)?;

    if amount.normalize().scale() > currency.fraction_digits {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!(
                "{} allows at most {} decimal places",
                currency.code, currency.fraction_digits
            ),
        });
    }
    Ok(())
}

/// Validates an upper bound on a non-negative value.
pub fn validate_at_most(field: &str, value: Decimal, max: Decimal) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate expressed as a fraction.
///
/// ## Rules
/// - Must be between 0 and 1 (0% to 100%)
pub fn validate_rate(field: &str, rate: Decimal) -> ValidationResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "1".to_string(),
        });
    }
    Ok(())
}

/// Validates that a set of parts does not exceed its whole.
///
/// Used for "discounts on a line never exceed the line price".
pub fn validate_within(field: &str, total: Decimal, limit: Decimal) -> ValidationResult<()> {
    if total > limit {
        return Err(ValidationError::ExceedsTotal {
            field: field.to_string(),
            total,
            limit,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the size of a list.
///
/// ## Rules
/// - Must not be empty when `min` is 1
/// - Must not exceed `max`
pub fn validate_count(field: &str, count: usize, min: usize, max: usize) -> ValidationResult<()> {
    if count == 0 && min > 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if count < min || count > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Currency
// =============================================================================

/// Resolves a currency code, reporting failures against `field`.
pub fn validate_currency(field: &str, code: &str) -> ValidationResult<Currency> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Currency::from_code(code).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("unsupported currency code '{code}'"),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
