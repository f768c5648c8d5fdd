//! # Allocation Request
//!
//! What a caller sends. Every collection defaults to empty and every flag
//! defaults to `false`, so the smallest valid request is a currency and one
//! line item.
//!
//! ```json
//! {
//!   "currency": "VND",
//!   "lineItems": [{ "variantId": 100, "quantity": "2" }]
//! }
//! ```

use apportion_core::{CatalogId, DiscountApplication, LineKind, TaxLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body for one allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    /// Recompute prices, titles and bundle contents from the catalog instead
    /// of trusting what the request carries.
    #[serde(default)]
    pub update_product_info: bool,

    #[serde(default)]
    pub calculate_tax: bool,

    #[serde(default)]
    pub tax_exempt: bool,

    /// Falls back to the country's tax setting when absent.
    #[serde(default)]
    pub tax_included: Option<bool>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub country_code: Option<String>,

    #[serde(default)]
    pub line_items: Vec<LineItemInput>,

    /// Order-level discounts, spread over the lines.
    #[serde(default)]
    pub discount_applications: Vec<DiscountApplicationInput>,

    #[serde(default)]
    pub shipping_lines: Vec<ShippingLineInput>,
}

/// One line of the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    /// Absent for a custom line.
    #[serde(default)]
    pub variant_id: Option<CatalogId>,

    #[serde(default)]
    pub product_id: Option<CatalogId>,

    pub quantity: Decimal,

    /// Unit price. Required for custom lines.
    #[serde(default)]
    pub price: Option<Decimal>,

    #[serde(default)]
    pub title: String,

    /// Taken from the variant when absent.
    #[serde(default)]
    pub kind: Option<LineKind>,

    #[serde(default)]
    pub taxable: Option<bool>,

    /// Caller-supplied breakdown of a composite line.
    #[serde(default)]
    pub components: Option<Vec<ComponentInput>>,

    #[serde(default)]
    pub discount_allocations: Vec<DiscountAllocationInput>,

    /// Custom tax lines; they replace rate-derived tax for this line.
    #[serde(default)]
    pub tax_lines: Vec<TaxLineInput>,
}

impl LineItemInput {
    /// Sum of the caller-supplied discount allocations.
    pub fn discount_total(&self) -> Decimal {
        self.discount_allocations.iter().map(|d| d.amount).sum()
    }

    /// Caller components, empty when none were sent.
    pub fn component_inputs(&self) -> &[ComponentInput] {
        self.components.as_deref().unwrap_or(&[])
    }
}

/// One component of a caller-described composite line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInput {
    #[serde(default)]
    pub variant_id: Option<CatalogId>,

    #[serde(default)]
    pub product_id: Option<CatalogId>,

    #[serde(default)]
    pub title: String,

    /// Units per bundle.
    pub base_quantity: Decimal,

    /// Catalog unit price used to weight a combo split.
    #[serde(default)]
    pub price: Decimal,

    #[serde(default = "default_true")]
    pub taxable: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountAllocationInput {
    #[serde(default)]
    pub application_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLineInput {
    #[serde(default)]
    pub title: String,
    pub rate: Decimal,
    pub price: Decimal,
}

impl TaxLineInput {
    /// Converts to a core tax line flagged as custom.
    pub fn to_tax_line(&self) -> TaxLine {
        TaxLine {
            title: self.title.clone(),
            rate: self.rate,
            price: self.price,
            custom: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountApplicationInput {
    #[serde(default)]
    pub application_id: String,

    #[serde(default)]
    pub title: Option<String>,

    pub amount: Decimal,
}

impl DiscountApplicationInput {
    pub fn to_application(&self) -> DiscountApplication {
        DiscountApplication {
            application_id: self.application_id.clone(),
            amount: self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLineInput {
    #[serde(default)]
    pub title: String,
    pub price: Decimal,

    #[serde(default)]
    pub tax_lines: Vec<TaxLineInput>,
}
