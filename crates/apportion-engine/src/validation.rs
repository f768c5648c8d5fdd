//! # Request Validation
//!
//! Walks the whole request and collects every problem before any catalog
//! lookup or arithmetic runs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FieldErrors                                                            │
//! │    .check(validate_quantity("lineItems[0].quantity", …))   ✘ recorded  │
//! │    .check(validate_amount("lineItems[0].price", …))        ✔           │
//! │    .check(validate_rate("lineItems[2].taxLines[0].rate",…))✘ recorded  │
//! │    .finish()  ──► Err(EngineError::Validation([2 errors]))             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use apportion_core::money::round_half_up;
use apportion_core::validation::{
    require, validate_amount, validate_at_most, validate_count, validate_currency, validate_money,
    validate_quantity, validate_rate, validate_within, ValidationResult,
};
use apportion_core::{Currency, LineKind, ValidationError};
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult, FieldError};
use crate::options::EngineOptions;
use crate::request::{AllocationRequest, LineItemInput, TaxLineInput};

/// Accumulates field errors instead of stopping at the first.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the error of a failed check and returns the value of a passed one.
    pub fn check<T>(&mut self, result: ValidationResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(err.into());
                None
            }
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Raises everything collected as one validation batch.
    pub fn finish(self) -> EngineResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self.errors))
        }
    }
}

/// Validates a request and resolves its currency.
pub fn validate_request(request: &AllocationRequest, options: &EngineOptions) -> EngineResult<Currency> {
    let mut errors = FieldErrors::new();

    let code = request
        .currency
        .as_deref()
        .unwrap_or(options.default_currency.as_str());
    let currency = errors.check(validate_currency("currency", code));
    let money = MoneyRules {
        currency: currency.as_ref(),
        max: options.max_amount,
    };

    errors.check(validate_count(
        "lineItems",
        request.line_items.len(),
        1,
        options.max_line_items,
    ));

    for (i, line) in request.line_items.iter().enumerate() {
        validate_line(&mut errors, &format!("lineItems[{i}]"), line, request, options, &money);
    }

    for (i, application) in request.discount_applications.iter().enumerate() {
        let path = format!("discountApplications[{i}]");
        errors.check(validate_id(&format!("{path}.applicationId"), &application.application_id));
        errors.check(money.validate(&format!("{path}.amount"), application.amount));
    }

    for (i, shipping) in request.shipping_lines.iter().enumerate() {
        let path = format!("shippingLines[{i}]");
        errors.check(money.validate(&format!("{path}.price"), shipping.price));
        validate_tax_lines(&mut errors, &path, &shipping.tax_lines, &money);
    }

    errors.finish()?;
    // finish() only succeeds when every check passed, including the currency
    currency.ok_or_else(|| EngineError::Validation(Vec::new()))
}

/// Amount rules for one request. Without a valid currency only sign and
/// ceiling are checked; the currency error is already recorded.
struct MoneyRules<'a> {
    currency: Option<&'a Currency>,
    max: Decimal,
}

impl MoneyRules<'_> {
    fn validate(&self, field: &str, amount: Decimal) -> ValidationResult<()> {
        match self.currency {
            Some(currency) => validate_money(field, amount, currency, self.max),
            None => validate_amount(field, amount).and_then(|_| validate_at_most(field, amount, self.max)),
        }
    }
}

fn validate_line(
    errors: &mut FieldErrors,
    path: &str,
    line: &LineItemInput,
    request: &AllocationRequest,
    options: &EngineOptions,
    money: &MoneyRules<'_>,
) {
    let quantity = errors.check(validate_quantity(
        &format!("{path}.quantity"),
        line.quantity,
        options.max_quantity,
    ));

    let price_field = format!("{path}.price");
    let price = match (line.variant_id, line.price) {
        (None, price) => errors
            .check(require(&price_field, price))
            .and_then(|price| errors.check(money.validate(&price_field, price)).map(|_| price)),
        (Some(_), Some(price)) => errors.check(money.validate(&price_field, price)).map(|_| price),
        (Some(_), None) => None,
    };

    validate_components(errors, path, line, options, money);

    let mut discounts_valid = true;
    for (k, allocation) in line.discount_allocations.iter().enumerate() {
        let entry = format!("{path}.discountAllocations[{k}]");
        errors.check(validate_id(&format!("{entry}.applicationId"), &allocation.application_id));
        discounts_valid &= errors
            .check(money.validate(&format!("{entry}.amount"), allocation.amount))
            .is_some();
    }

    // A price the catalog will overwrite is checked once it is resolved
    let price_is_final = !(request.update_product_info && line.variant_id.is_some());
    if let (Some(price), Some(()), Some(currency), true, true) =
        (price, quantity, money.currency, price_is_final, discounts_valid)
    {
        if let Some(total) = price.checked_mul(line.quantity) {
            errors.check(validate_within(
                &format!("{path}.discountAllocations"),
                line.discount_total(),
                round_half_up(total, currency),
            ));
        }
    }

    validate_tax_lines(errors, path, &line.tax_lines, money);
}

fn validate_components(
    errors: &mut FieldErrors,
    path: &str,
    line: &LineItemInput,
    options: &EngineOptions,
    money: &MoneyRules<'_>,
) {
    let components = line.component_inputs();
    let field = format!("{path}.components");

    errors.check(validate_count(&field, components.len(), 0, options.max_components));

    // Custom lines have no variant to take the kind from
    let kind = match (line.kind, line.variant_id) {
        (Some(kind), _) => Some(kind),
        (None, None) => Some(LineKind::Normal),
        (None, Some(_)) => None,
    };

    match kind {
        Some(LineKind::Normal) if !components.is_empty() => {
            errors.push(
                ValidationError::NotAllowed {
                    field: field.clone(),
                    reason: "line kind is normal".to_string(),
                }
                .into(),
            );
        }
        Some(kind) if kind.is_composite() && line.variant_id.is_none() && components.is_empty() => {
            errors.push(ValidationError::Required { field: field.clone() }.into());
        }
        Some(LineKind::Packsize) if components.len() > 1 => {
            errors.push(
                ValidationError::InvalidFormat {
                    field: field.clone(),
                    reason: "a packsize line has exactly one component".to_string(),
                }
                .into(),
            );
        }
        _ => {}
    }

    for (j, component) in components.iter().enumerate() {
        let entry = format!("{field}[{j}]");
        errors.check(validate_quantity(
            &format!("{entry}.baseQuantity"),
            component.base_quantity,
            options.max_quantity,
        ));
        // A split weight, so finer than the currency unit is fine
        let price_field = format!("{entry}.price");
        errors.check(
            validate_amount(&price_field, component.price)
                .and_then(|_| validate_at_most(&price_field, component.price, money.max)),
        );
    }
}

fn validate_tax_lines(errors: &mut FieldErrors, path: &str, tax_lines: &[TaxLineInput], money: &MoneyRules<'_>) {
    for (k, tax) in tax_lines.iter().enumerate() {
        let entry = format!("{path}.taxLines[{k}]");
        errors.check(validate_id(&format!("{entry}.title"), &tax.title));
        errors.check(validate_rate(&format!("{entry}.rate"), tax.rate));
        errors.check(money.validate(&format!("{entry}.price"), tax.price));
    }
}

fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
