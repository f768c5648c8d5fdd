//! # Lookup Traits
//!
//! The two read-only interfaces the engine consumes. Any store can back them;
//! this crate ships in-memory implementations in [`crate::repository`].
//!
//! ## Batching Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine                                       store                    │
//! │    │  variants_by_ids([1, 2, 9])                  │                     │
//! │    │─────────────────────────────────────────────►│                     │
//! │    │            [Variant 1, Variant 2]            │  (9 is missing)     │
//! │    │◄─────────────────────────────────────────────│                     │
//! │    │                                                                    │
//! │    └─► engine reports variantId 9 as NotFound                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! One call per entity type per request; ids are distinct; result order is
//! not significant.

use apportion_core::CatalogId;

use crate::error::CatalogResult;
use crate::models::{Combo, Packsize, Product, ResolvedTaxSetting, Variant};

/// Batched catalog reads.
pub trait CatalogLookup {
    fn variants_by_ids(&self, ids: &[CatalogId]) -> CatalogResult<Vec<Variant>>;

    fn products_by_ids(&self, ids: &[CatalogId]) -> CatalogResult<Vec<Product>>;

    /// Combos keyed by their bundle variant id.
    fn combos_by_variant_ids(&self, variant_ids: &[CatalogId]) -> CatalogResult<Vec<Combo>>;

    /// Packsizes keyed by their case variant id.
    fn packsizes_by_ids(&self, ids: &[CatalogId]) -> CatalogResult<Vec<Packsize>>;
}

/// Resolves the tax configuration for an order.
pub trait TaxSettingProvider {
    /// Returns the country's setting narrowed to `product_ids`.
    ///
    /// ## Errors
    /// `CatalogError::NotFound` when the country has no setting.
    fn resolve(&self, country_code: &str, product_ids: &[CatalogId]) -> CatalogResult<ResolvedTaxSetting>;
}
