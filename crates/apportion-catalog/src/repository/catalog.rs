//! # Catalog Repository
//!
//! Variants, products, combos and packsizes held in memory.
//!
//! Records are indexed by id on insert; lookups walk the requested ids and
//! skip the ones that are absent.

use std::collections::HashMap;

use apportion_core::CatalogId;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::lookup::CatalogLookup;
use crate::models::{Combo, Packsize, Product, Variant};

/// In-memory catalog.
///
/// ## Usage
/// ```rust
/// use apportion_catalog::{CatalogLookup, CatalogRepository, Product};
///
/// let mut repo = CatalogRepository::new();
/// repo.insert_product(Product { id: 1, title: "Tea".to_string() });
///
/// let found = repo.products_by_ids(&[1, 2]).unwrap();
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogRepository {
    variants: HashMap<CatalogId, Variant>,
    products: HashMap<CatalogId, Product>,
    combos: HashMap<CatalogId, Combo>,
    packsizes: HashMap<CatalogId, Packsize>,
}

impl CatalogRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a variant.
    pub fn insert_variant(&mut self, variant: Variant) {
        self.variants.insert(variant.id, variant);
    }

    /// Inserts or replaces a product.
    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    /// Inserts or replaces a combo, keyed by its bundle variant.
    pub fn insert_combo(&mut self, combo: Combo) {
        self.combos.insert(combo.variant_id, combo);
    }

    /// Inserts or replaces a packsize, keyed by its case variant.
    pub fn insert_packsize(&mut self, packsize: Packsize) {
        self.packsizes.insert(packsize.variant_id, packsize);
    }

    /// Gets a single variant.
    ///
    /// ## Returns
    /// * `Ok(Variant)` - Variant found
    /// * `Err(CatalogError::NotFound)` - No such id
    pub fn get_variant(&self, id: CatalogId) -> CatalogResult<Variant> {
        self.variants
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("Variant", id))
    }

    /// Number of records per entity type: (variants, products, combos, packsizes).
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.variants.len(),
            self.products.len(),
            self.combos.len(),
            self.packsizes.len(),
        )
    }
}

fn collect<T: Clone>(map: &HashMap<CatalogId, T>, ids: &[CatalogId]) -> Vec<T> {
    ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

impl CatalogLookup for CatalogRepository {
    fn variants_by_ids(&self, ids: &[CatalogId]) -> CatalogResult<Vec<Variant>> {
        let found = collect(&self.variants, ids);
        debug!(requested = ids.len(), found = found.len(), "Looked up variants");
        Ok(found)
    }

    fn products_by_ids(&self, ids: &[CatalogId]) -> CatalogResult<Vec<Product>> {
        let found = collect(&self.products, ids);
        debug!(requested = ids.len(), found = found.len(), "Looked up products");
        Ok(found)
    }

    fn combos_by_variant_ids(&self, variant_ids: &[CatalogId]) -> CatalogResult<Vec<Combo>> {
        let found = collect(&self.combos, variant_ids);
        debug!(requested = variant_ids.len(), found = found.len(), "Looked up combos");
        Ok(found)
    }

    fn packsizes_by_ids(&self, ids: &[CatalogId]) -> CatalogResult<Vec<Packsize>> {
        let found = collect(&self.packsizes, ids);
        debug!(requested = ids.len(), found = found.len(), "Looked up packsizes");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apportion_core::LineKind;
    use rust_decimal::Decimal;

    fn variant(id: CatalogId, kind: LineKind) -> Variant {
        Variant {
            id,
            product_id: id * 10,
            title: format!("Variant {id}"),
            price: Decimal::from(id),
            taxable: true,
            kind,
        }
    }

    #[test]
    fn test_missing_ids_are_skipped() {
        let mut repo = CatalogRepository::new();
        repo.insert_variant(variant(1, LineKind::Normal));
        repo.insert_variant(variant(2, LineKind::Combo));

        let found = repo.variants_by_ids(&[2, 3, 1]).unwrap();
        let ids: Vec<CatalogId> = found.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut repo = CatalogRepository::new();
        repo.insert_variant(variant(1, LineKind::Normal));
        let mut updated = variant(1, LineKind::Normal);
        updated.price = Decimal::from(99);
        repo.insert_variant(updated);

        assert_eq!(repo.get_variant(1).unwrap().price, Decimal::from(99));
        assert_eq!(repo.counts(), (1, 0, 0, 0));
    }

    #[test]
    fn test_get_variant_not_found() {
        let repo = CatalogRepository::new();
        assert!(repo.get_variant(42).unwrap_err().is_not_found());
    }

    #[test]
    fn test_combos_and_packsizes_keyed_by_variant() {
        let mut repo = CatalogRepository::new();
        repo.insert_combo(Combo {
            variant_id: 100,
            items: Vec::new(),
        });
        repo.insert_packsize(Packsize {
            variant_id: 200,
            child_variant_id: 2,
            child_product_id: 20,
            title: "Can".to_string(),
            quantity: Decimal::from(6),
            taxable: true,
        });

        assert_eq!(repo.combos_by_variant_ids(&[100]).unwrap().len(), 1);
        assert!(repo.combos_by_variant_ids(&[200]).unwrap().is_empty());
        assert_eq!(repo.packsizes_by_ids(&[200]).unwrap()[0].child_variant_id, 2);
    }
}
