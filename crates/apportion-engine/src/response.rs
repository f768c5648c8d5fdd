//! # Allocation Response
//!
//! The request's line shape enriched with resolved prices, component
//! breakdowns, discount allocations and tax lines, plus order totals.

use apportion_core::{CatalogId, Component, DiscountAllocation, LineKind, TaxLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub request_id: Uuid,
    pub currency: String,
    pub country_code: String,
    pub tax_included: bool,

    pub line_items: Vec<LineItemOutput>,
    pub shipping_lines: Vec<ShippingLineOutput>,

    /// Σ line prices before discounts.
    pub subtotal_price: Decimal,
    pub total_discounts: Decimal,
    pub total_tax: Decimal,
    pub total_shipping: Decimal,

    /// What the customer pays. Tax is added only for tax-exclusive prices.
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemOutput {
    pub variant_id: Option<CatalogId>,
    pub product_id: Option<CatalogId>,
    pub title: String,
    pub kind: LineKind,
    pub quantity: Decimal,

    /// Unit price.
    pub price: Decimal,
    pub line_price: Decimal,

    /// `line_price − Σ discount_allocations`.
    pub subtotal: Decimal,
    pub taxable: bool,

    pub components: Vec<ComponentOutput>,
    pub discount_allocations: Vec<DiscountAllocation>,

    /// Merged by `(title, rate)` across components.
    pub tax_lines: Vec<TaxLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentOutput {
    pub variant_id: Option<CatalogId>,
    pub product_id: Option<CatalogId>,
    pub title: String,
    pub base_quantity: Decimal,
    pub quantity: Decimal,

    /// Whole-unit price.
    pub price: Decimal,
    pub line_price: Decimal,

    /// Part of `line_price` not covered by `price × quantity`.
    pub remainder: Decimal,
    pub can_absorb_odd: bool,
    pub subtotal: Decimal,
    pub taxable: bool,
    pub discount_allocations: Vec<DiscountAllocation>,
    pub tax_lines: Vec<TaxLine>,
}

impl From<&Component> for ComponentOutput {
    fn from(component: &Component) -> Self {
        ComponentOutput {
            variant_id: component.spec.variant_id,
            product_id: component.spec.product_id,
            title: component.spec.title.clone(),
            base_quantity: component.spec.base_quantity,
            quantity: component.quantity,
            price: component.target.unit_price,
            line_price: component.target.line_price,
            remainder: component.target.remainder,
            can_absorb_odd: component.target.can_absorb_odd,
            subtotal: component.subtotal(),
            taxable: component.spec.taxable,
            discount_allocations: component.discount_allocations.clone(),
            tax_lines: component.tax_lines.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLineOutput {
    pub title: String,
    pub price: Decimal,
    pub tax_lines: Vec<TaxLine>,
}
