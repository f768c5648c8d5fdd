//! # Allocation Engine
//!
//! The per-request pipeline.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  allocate(request)                     span: allocate{request_id}      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. validate_request          every field error, one batch             │
//! │  2. resolve_catalog           batched lookups, every miss, one batch   │
//! │  3. prepare lines             price / title / kind / composition       │
//! │  4. decompose                 combo + packsize → components            │
//! │  5. order discounts           discountApplications → lines             │
//! │  6. cascade discounts         line allocations → components            │
//! │  7. tax                       custom split or rate-derived, merged     │
//! │  8. assemble                  totals + response                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AllocationResponse  (or EngineError; nothing to roll back)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Trusting the Request
//! With `updateProductInfo = false` a line keeps the price, title and
//! components the caller sent, and the catalog only fills what is missing.
//! With `updateProductInfo = true` the catalog overwrites them.

use apportion_catalog::{CatalogError, CatalogLookup, ResolvedTaxSetting, TaxSettingProvider};
use apportion_core::money::{floor_to_multiple, round_half_up, sum};
use apportion_core::tax::total_tax;
use apportion_core::validation::validate_within;
use apportion_core::{
    allocate_discounts, compute_tax_lines, decompose, merge_tax_lines, split_custom_taxes,
    AllocationTarget, CatalogId, ComponentSpec, CompositeLine, Currency, DiscountAllocation,
    DiscountApplication, LineComposition, LineKind, TaxLine, TaxRule, ValidationError,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult, FieldError};
use crate::options::EngineOptions;
use crate::request::{AllocationRequest, ComponentInput, LineItemInput};
use crate::resolve::{effective_kind, resolve_catalog, uses_catalog_components, ResolvedCatalog};
use crate::response::{AllocationResponse, ComponentOutput, LineItemOutput, ShippingLineOutput};
use crate::validation::{validate_request, FieldErrors};

/// A line on its way through the pipeline.
#[derive(Debug, Clone)]
struct LineWork {
    line: CompositeLine,
    title: String,
    unit_price: Decimal,
    taxable: bool,
    custom_taxes: Vec<TaxLine>,
}

/// Runs allocation requests against a catalog.
///
/// ## Usage
/// ```rust
/// use apportion_catalog::{CatalogRepository, TaxSettingRepository};
/// use apportion_engine::{AllocationEngine, AllocationRequest, EngineOptions};
///
/// let catalog = CatalogRepository::new();
/// let taxes = TaxSettingRepository::new();
/// let engine = AllocationEngine::new(&catalog, &taxes, EngineOptions::default());
///
/// let request: AllocationRequest = serde_json::from_str(
///     r#"{ "currency": "USD", "lineItems": [{ "title": "Fee", "quantity": 1, "price": "5.00" }] }"#,
/// ).unwrap();
/// let response = engine.allocate(&request).unwrap();
/// assert_eq!(response.line_items.len(), 1);
/// assert_eq!(response.total_price, response.subtotal_price);
/// ```
pub struct AllocationEngine<'a> {
    catalog: &'a dyn CatalogLookup,
    taxes: &'a dyn TaxSettingProvider,
    options: EngineOptions,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(
        catalog: &'a dyn CatalogLookup,
        taxes: &'a dyn TaxSettingProvider,
        options: EngineOptions,
    ) -> Self {
        AllocationEngine {
            catalog,
            taxes,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Allocates one request.
    ///
    /// ## Errors
    /// - `EngineError::Validation` - every invalid field, batched
    /// - `EngineError::NotFound` - every missing catalog reference, batched
    /// - `EngineError::Invariant` - a split lost track of money; the request is aborted
    /// - `EngineError::Catalog` - the catalog backend failed
    pub fn allocate(&self, request: &AllocationRequest) -> EngineResult<AllocationResponse> {
        let request_id = Uuid::new_v4();
        let span = info_span!("allocate", request_id = %request_id);
        let _guard = span.enter();

        let result = self.run(request_id, request);
        match &result {
            Ok(response) => info!(
                lines = response.line_items.len(),
                subtotal = %response.subtotal_price,
                discounts = %response.total_discounts,
                tax = %response.total_tax,
                total = %response.total_price,
                "Allocation complete"
            ),
            Err(EngineError::Invariant(e)) => {
                error!(error = %e, "Allocation invariant violated; request aborted")
            }
            Err(e) => warn!(
                error = %e,
                fields = e.field_errors().len(),
                "Allocation rejected"
            ),
        }
        result
    }

    fn run(&self, request_id: Uuid, request: &AllocationRequest) -> EngineResult<AllocationResponse> {
        let currency = validate_request(request, &self.options)?;
        let country_code = request
            .country_code
            .as_deref()
            .unwrap_or(self.options.default_country.as_str())
            .trim()
            .to_ascii_uppercase();

        let resolved = resolve_catalog(request, self.catalog)?;
        let mut works = prepare_lines(request, &resolved, &currency, &self.options)?;

        for (i, work) in works.iter_mut().enumerate() {
            work.line.components = decompose(&work.line, &currency).map_err(|e| EngineError::at_line(i, e))?;
            debug!(
                line = i,
                kind = ?work.line.kind(),
                line_price = %work.line.line_price,
                components = work.line.components.len(),
                "Prepared line"
            );
        }

        apply_order_discounts(request, &mut works, &currency)?;
        cascade_discounts(&mut works, &currency)?;

        let setting = if request.calculate_tax && !request.tax_exempt {
            Some(self.resolve_tax(&country_code, &works)?)
        } else {
            None
        };
        let tax_included = request
            .tax_included
            .or(setting.as_ref().map(|s| s.tax_included))
            .unwrap_or(false);

        if request.tax_exempt {
            for work in &mut works {
                clear_taxes(&mut work.line);
            }
        } else if let Some(setting) = &setting {
            let rule = TaxRule::new(setting.title.clone(), setting.country_default_rate, tax_included);
            for work in &mut works {
                apply_taxes(work, setting, &rule, &currency);
            }
        } else {
            for work in &mut works {
                work.line.tax_lines = work.custom_taxes.clone();
            }
        }

        let shipping_lines = shipping_outputs(request, setting.as_ref(), tax_included, &currency);

        Ok(assemble(
            request_id,
            &currency,
            country_code,
            tax_included,
            works,
            shipping_lines,
        ))
    }

    fn resolve_tax(&self, country_code: &str, works: &[LineWork]) -> EngineResult<ResolvedTaxSetting> {
        let mut product_ids: Vec<CatalogId> = Vec::new();
        let ids = works.iter().flat_map(|w| {
            w.line
                .product_id
                .into_iter()
                .chain(w.line.components.iter().filter_map(|c| c.spec.product_id))
        });
        for id in ids {
            if !product_ids.contains(&id) {
                product_ids.push(id);
            }
        }

        self.taxes
            .resolve(country_code, &product_ids)
            .map_err(|e| match e {
                CatalogError::NotFound { .. } => {
                    EngineError::NotFound(vec![FieldError::new("countryCode", e.to_string())])
                }
                other => EngineError::Catalog(other),
            })
    }
}

// =============================================================================
// Line Preparation
// =============================================================================

fn component_spec(input: &ComponentInput) -> ComponentSpec {
    ComponentSpec {
        variant_id: input.variant_id,
        product_id: input.product_id,
        title: input.title.clone(),
        base_quantity: input.base_quantity,
        catalog_price: input.price,
        taxable: input.taxable,
    }
}

fn caller_allocations(line: &LineItemInput, currency: &Currency) -> Vec<DiscountAllocation> {
    let step = line.quantity * currency.minimal_unit();
    line.discount_allocations
        .iter()
        .map(|d| DiscountAllocation {
            application_id: d.application_id.clone(),
            amount: d.amount,
            remainder: d.amount - floor_to_multiple(d.amount, step),
        })
        .collect()
}

/// Resolves price, title, kind and composition for every line.
fn prepare_lines(
    request: &AllocationRequest,
    resolved: &ResolvedCatalog,
    currency: &Currency,
    options: &EngineOptions,
) -> EngineResult<Vec<LineWork>> {
    let update = request.update_product_info;
    let mut errors = FieldErrors::new();
    let mut works = Vec::with_capacity(request.line_items.len());

    for (i, input) in request.line_items.iter().enumerate() {
        let path = format!("lineItems[{i}]");
        let variant = input.variant_id.and_then(|id| resolved.variants.get(&id));
        let kind = effective_kind(input, variant, update);

        let (unit_price, title, product_id, taxable) = match variant {
            Some(v) if update => (v.price, v.title.clone(), Some(v.product_id), v.taxable),
            Some(v) => (
                input.price.unwrap_or(v.price),
                if input.title.is_empty() { v.title.clone() } else { input.title.clone() },
                input.product_id.or(Some(v.product_id)),
                input.taxable.unwrap_or(v.taxable),
            ),
            None => (
                input.price.unwrap_or(Decimal::ZERO),
                input.title.clone(),
                input.product_id,
                input.taxable.unwrap_or(true),
            ),
        };

        // Catalog prices have not been bounded yet
        let line_price = match unit_price.checked_mul(input.quantity) {
            Some(total) if total <= options.max_amount => Some(round_half_up(total, currency)),
            _ => {
                errors.push(FieldError::new(
                    format!("{path}.price"),
                    format!("line price must not exceed {}", options.max_amount),
                ));
                None
            }
        };
        let from_catalog = uses_catalog_components(input, variant, update);
        let components = input.component_inputs();

        let composition = match kind {
            LineKind::Normal => {
                if !components.is_empty() && !from_catalog {
                    errors.push(
                        ValidationError::NotAllowed {
                            field: format!("{path}.components"),
                            reason: "line kind is normal".to_string(),
                        }
                        .into(),
                    );
                }
                LineComposition::Normal
            }
            LineKind::Combo => match variant {
                Some(v) if from_catalog => LineComposition::Combo(
                    resolved
                        .combos
                        .get(&v.id)
                        .map(|c| c.component_specs())
                        .unwrap_or_default(),
                ),
                _ => LineComposition::Combo(components.iter().map(component_spec).collect()),
            },
            LineKind::Packsize => {
                let spec = match variant {
                    Some(v) if from_catalog => resolved.packsizes.get(&v.id).map(|p| p.to_spec()),
                    _ if components.len() == 1 => components.first().map(component_spec),
                    _ => None,
                };
                match spec {
                    Some(spec) => LineComposition::Packsize(spec),
                    None => {
                        errors.push(
                            ValidationError::InvalidFormat {
                                field: format!("{path}.components"),
                                reason: "a packsize line has exactly one component".to_string(),
                            }
                            .into(),
                        );
                        LineComposition::Normal
                    }
                }
            }
        };

        check_catalog_components(&mut errors, &path, &composition, options);

        let mut line = CompositeLine::new(input.quantity, line_price.unwrap_or_default(), composition);
        line.variant_id = input.variant_id;
        line.product_id = product_id;
        line.discount_allocations = caller_allocations(input, currency);

        // Only now is every line price known
        if line_price.is_some() {
            errors.check(validate_within(
                &format!("{path}.discountAllocations"),
                line.total_discount(),
                line.line_price,
            ));
        }

        works.push(LineWork {
            line,
            title,
            unit_price,
            taxable,
            custom_taxes: input.tax_lines.iter().map(|t| t.to_tax_line()).collect(),
        });
    }

    errors.finish()?;
    Ok(works)
}

/// Bounds catalog-supplied bundle contents the way request fields are bounded.
fn check_catalog_components(
    errors: &mut FieldErrors,
    path: &str,
    composition: &LineComposition,
    options: &EngineOptions,
) {
    let specs = match composition {
        LineComposition::Normal => return,
        LineComposition::Combo(specs) => specs.as_slice(),
        LineComposition::Packsize(spec) => std::slice::from_ref(spec),
    };
    let out_of_range = specs
        .iter()
        .any(|s| s.catalog_price > options.max_amount || s.base_quantity > options.max_quantity);
    if out_of_range {
        errors.push(
            ValidationError::InvalidFormat {
                field: format!("{path}.components"),
                reason: "a component price or quantity exceeds the configured limits".to_string(),
            }
            .into(),
        );
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// Spreads order-level discount applications over the lines.
fn apply_order_discounts(
    request: &AllocationRequest,
    works: &mut [LineWork],
    currency: &Currency,
) -> EngineResult<()> {
    if request.discount_applications.is_empty() {
        return Ok(());
    }

    let applications: Vec<DiscountApplication> = request
        .discount_applications
        .iter()
        .map(|a| a.to_application())
        .collect();
    let targets: Vec<AllocationTarget> = works
        .iter()
        .map(|w| AllocationTarget::new(w.line.quantity, w.unit_price, w.line.line_price))
        .collect();
    let already: Vec<Decimal> = works.iter().map(|w| w.line.total_discount()).collect();

    let requested = sum(applications.iter().map(|a| a.amount));
    let available = sum(works.iter().map(|w| w.line.subtotal().max(Decimal::ZERO)));
    if requested > available {
        return Err(EngineError::Validation(vec![ValidationError::ExceedsTotal {
            field: "discountApplications".to_string(),
            total: requested,
            limit: available,
        }
        .into()]));
    }

    let per_line = allocate_discounts(&applications, &targets, &already, currency)
        .map_err(EngineError::Invariant)?;
    for (work, allocations) in works.iter_mut().zip(per_line) {
        work.line.discount_allocations.extend(allocations);
    }

    debug!(
        applications = applications.len(),
        amount = %requested,
        "Allocated order discounts"
    );
    Ok(())
}

/// Pushes each line's discount allocations down into its components.
fn cascade_discounts(works: &mut [LineWork], currency: &Currency) -> EngineResult<()> {
    for (i, work) in works.iter_mut().enumerate() {
        let line = &mut work.line;
        if line.components.is_empty() || line.discount_allocations.is_empty() {
            continue;
        }

        let applications: Vec<DiscountApplication> = line
            .discount_allocations
            .iter()
            .map(|a| DiscountApplication {
                application_id: a.application_id.clone(),
                amount: a.amount,
            })
            .collect();
        let targets: Vec<AllocationTarget> = line
            .components
            .iter()
            .map(|c| AllocationTarget {
                capacity: c.target.line_price,
                ..c.target.clone()
            })
            .collect();

        let per_component = allocate_discounts(&applications, &targets, &[], currency)
            .map_err(|e| EngineError::at_line(i, e))?;
        for (component, allocations) in line.components.iter_mut().zip(per_component) {
            component.discount_allocations = allocations;
        }
    }
    Ok(())
}

// =============================================================================
// Tax
// =============================================================================

fn clear_taxes(line: &mut CompositeLine) {
    line.tax_lines.clear();
    for component in &mut line.components {
        component.tax_lines.clear();
    }
}

fn apply_taxes(work: &mut LineWork, setting: &ResolvedTaxSetting, rule: &TaxRule, currency: &Currency) {
    let line = &mut work.line;

    if line.components.is_empty() {
        line.tax_lines = if work.custom_taxes.is_empty() {
            let rule = rule.with_rate(setting.rate_for(line.product_id));
            compute_tax_lines(line.subtotal(), work.taxable, &rule, currency)
        } else {
            work.custom_taxes.clone()
        };
        return;
    }

    if work.custom_taxes.is_empty() {
        for component in &mut line.components {
            let rule = rule.with_rate(setting.rate_for(component.spec.product_id));
            let taxable = work.taxable && component.spec.taxable;
            component.tax_lines = compute_tax_lines(component.subtotal(), taxable, &rule, currency);
        }
    } else {
        let prices: Vec<Decimal> = line.components.iter().map(|c| c.target.line_price).collect();
        let shares = split_custom_taxes(&work.custom_taxes, &prices, line.line_price, currency);
        for (component, tax_lines) in line.components.iter_mut().zip(shares) {
            component.tax_lines = tax_lines;
        }
    }

    line.tax_lines = merge_tax_lines(line.components.iter().flat_map(|c| c.tax_lines.iter().cloned()));
}

fn shipping_outputs(
    request: &AllocationRequest,
    setting: Option<&ResolvedTaxSetting>,
    tax_included: bool,
    currency: &Currency,
) -> Vec<ShippingLineOutput> {
    request
        .shipping_lines
        .iter()
        .map(|shipping| {
            let tax_lines = if request.tax_exempt {
                Vec::new()
            } else if !shipping.tax_lines.is_empty() {
                shipping.tax_lines.iter().map(|t| t.to_tax_line()).collect()
            } else {
                match setting {
                    Some(s) if s.tax_shipping => {
                        let rule = TaxRule::new(s.title.clone(), s.country_default_rate, tax_included);
                        compute_tax_lines(shipping.price, true, &rule, currency)
                    }
                    _ => Vec::new(),
                }
            };
            ShippingLineOutput {
                title: shipping.title.clone(),
                price: shipping.price,
                tax_lines,
            }
        })
        .collect()
}

// =============================================================================
// Assembly
// =============================================================================

fn assemble(
    request_id: Uuid,
    currency: &Currency,
    country_code: String,
    tax_included: bool,
    works: Vec<LineWork>,
    shipping_lines: Vec<ShippingLineOutput>,
) -> AllocationResponse {
    let line_items: Vec<LineItemOutput> = works
        .into_iter()
        .map(|work| {
            let line = work.line;
            LineItemOutput {
                variant_id: line.variant_id,
                product_id: line.product_id,
                title: work.title,
                kind: line.kind(),
                quantity: line.quantity,
                price: work.unit_price,
                line_price: line.line_price,
                subtotal: line.subtotal(),
                taxable: work.taxable,
                components: line.components.iter().map(ComponentOutput::from).collect(),
                discount_allocations: line.discount_allocations,
                tax_lines: line.tax_lines,
            }
        })
        .collect();

    let subtotal_price = sum(line_items.iter().map(|l| l.line_price));
    let total_discounts = sum(line_items.iter().map(|l| l.line_price - l.subtotal));
    let total_shipping = sum(shipping_lines.iter().map(|s| s.price));
    let total_tax = sum(line_items.iter().map(|l| total_tax(&l.tax_lines)))
        + sum(shipping_lines.iter().map(|s| total_tax(&s.tax_lines)));

    let mut total_price = subtotal_price - total_discounts + total_shipping;
    if !tax_included {
        total_price += total_tax;
    }

    AllocationResponse {
        request_id,
        currency: currency.code.clone(),
        country_code,
        tax_included,
        line_items,
        shipping_lines,
        subtotal_price,
        total_discounts,
        total_tax,
        total_shipping,
        total_price,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
