//! # Catalog Models
//!
//! Read-only records the engine resolves line items against.
//!
//! ## Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Product ◄──── Variant (kind = normal | combo | packsize)              │
//! │                   │                                                     │
//! │        ┌──────────┴───────────┐                                        │
//! │        ▼                      ▼                                         │
//! │  Combo (by variant_id)   Packsize (by variant_id)                      │
//! │  items: ComboItem[]      child variant × quantity                      │
//! │                                                                         │
//! │  TaxSetting (by country_code)                                          │
//! │  default rate + per-product overrides                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use apportion_core::{CatalogId, ComponentSpec, LineKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

// =============================================================================
// Products & Variants
// =============================================================================

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: CatalogId,
    pub title: String,
}

/// A purchasable SKU of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: CatalogId,
    pub product_id: CatalogId,
    pub title: String,

    /// Unit selling price.
    pub price: Decimal,

    #[serde(default = "default_true")]
    pub taxable: bool,

    /// How this SKU is sold.
    #[serde(default)]
    pub kind: LineKind,
}

// =============================================================================
// Combos
// =============================================================================

/// One product inside a combo bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboItem {
    pub variant_id: CatalogId,
    pub product_id: CatalogId,
    pub title: String,

    /// Units of this item in one bundle.
    pub quantity: Decimal,

    /// Catalog unit price used to weight the split; zero-priced items share
    /// whatever the priced ones leave.
    pub price: Decimal,

    #[serde(default = "default_true")]
    pub taxable: bool,
}

impl ComboItem {
    /// Converts to the core component description.
    pub fn to_spec(&self) -> ComponentSpec {
        ComponentSpec {
            variant_id: Some(self.variant_id),
            product_id: Some(self.product_id),
            title: self.title.clone(),
            base_quantity: self.quantity,
            catalog_price: self.price,
            taxable: self.taxable,
        }
    }
}

/// A bundle of distinct products sold under one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combo {
    /// The bundle variant.
    pub variant_id: CatalogId,

    /// Bundle contents in catalog order. The order decides which item
    /// closes rounding drift, so it is preserved as stored.
    pub items: Vec<ComboItem>,
}

impl Combo {
    pub fn component_specs(&self) -> Vec<ComponentSpec> {
        self.items.iter().map(ComboItem::to_spec).collect()
    }
}

// =============================================================================
// Packsizes
// =============================================================================

/// N units of a single product sold as one case variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Packsize {
    /// The case variant; packsizes are looked up by this id.
    pub variant_id: CatalogId,

    pub child_variant_id: CatalogId,
    pub child_product_id: CatalogId,
    pub title: String,

    /// Units per case.
    pub quantity: Decimal,

    #[serde(default = "default_true")]
    pub taxable: bool,
}

impl Packsize {
    pub fn to_spec(&self) -> ComponentSpec {
        ComponentSpec {
            variant_id: Some(self.child_variant_id),
            product_id: Some(self.child_product_id),
            title: self.title.clone(),
            base_quantity: self.quantity,
            catalog_price: Decimal::ZERO,
            taxable: self.taxable,
        }
    }
}

// =============================================================================
// Tax Settings
// =============================================================================

/// A rate that overrides the country default for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTaxRate {
    pub product_id: CatalogId,
    pub rate: Decimal,
}

/// Stored tax configuration for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSetting {
    pub country_code: String,

    /// Title printed on tax lines (e.g. "VAT", "GST").
    #[serde(default = "default_tax_title")]
    pub title: String,

    pub country_default_rate: Decimal,

    #[serde(default)]
    pub product_rates: Vec<ProductTaxRate>,

    #[serde(default)]
    pub tax_included: bool,

    #[serde(default)]
    pub tax_shipping: bool,
}

fn default_tax_title() -> String {
    "Tax".to_string()
}

/// A tax setting narrowed to the products of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTaxSetting {
    pub country_code: String,
    pub title: String,
    pub country_default_rate: Decimal,
    pub per_product_rates: Vec<ProductTaxRate>,
    pub tax_included: bool,
    pub tax_shipping: bool,
}

impl ResolvedTaxSetting {
    /// The product's own rate if it has one, else the country default.
    pub fn rate_for(&self, product_id: Option<CatalogId>) -> Decimal {
        product_id
            .and_then(|id| self.per_product_rates.iter().find(|r| r.product_id == id))
            .map(|r| r.rate)
            .unwrap_or(self.country_default_rate)
    }
}
