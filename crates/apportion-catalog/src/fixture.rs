//! # Catalog Fixture
//!
//! Loads a JSON catalog document into the in-memory repositories.
//!
//! ## Document Shape
//! ```json
//! {
//!   "variants":    [{ "id": 1, "productId": 10, "title": "Tea", "price": "2.50" }],
//!   "products":    [{ "id": 10, "title": "Tea" }],
//!   "combos":      [{ "variantId": 100, "items": [ ... ] }],
//!   "packsizes":   [{ "variantId": 200, "childVariantId": 1, "childProductId": 10,
//!                     "title": "Tea", "quantity": "6" }],
//!   "taxSettings": [{ "countryCode": "US", "countryDefaultRate": "0.08" }]
//! }
//! ```
//! Every section is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogResult;
use crate::models::{Combo, Packsize, Product, TaxSetting, Variant};
use crate::repository::{CatalogRepository, TaxSettingRepository};

/// A whole catalog as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFixture {
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub combos: Vec<Combo>,
    #[serde(default)]
    pub packsizes: Vec<Packsize>,
    #[serde(default)]
    pub tax_settings: Vec<TaxSetting>,
}

impl CatalogFixture {
    /// Parses a fixture from a JSON string.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let fixture = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            variants = fixture.variants.len(),
            combos = fixture.combos.len(),
            packsizes = fixture.packsizes.len(),
            tax_settings = fixture.tax_settings.len(),
            "Loaded catalog fixture"
        );
        Ok(fixture)
    }

    /// Builds the repositories backing the lookup traits.
    pub fn into_repositories(self) -> (CatalogRepository, TaxSettingRepository) {
        let mut catalog = CatalogRepository::new();
        for variant in self.variants {
            catalog.insert_variant(variant);
        }
        for product in self.products {
            catalog.insert_product(product);
        }
        for combo in self.combos {
            catalog.insert_combo(combo);
        }
        for packsize in self.packsizes {
            catalog.insert_packsize(packsize);
        }

        let mut taxes = TaxSettingRepository::new();
        for setting in self.tax_settings {
            taxes.insert(setting);
        }

        (catalog, taxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::lookup::{CatalogLookup, TaxSettingProvider};
    use apportion_core::LineKind;
    use rust_decimal::Decimal;

    const FIXTURE: &str = r#"{
        "variants": [
            { "id": 1, "productId": 10, "title": "Coffee", "price": "30" },
            { "id": 2, "productId": 20, "title": "Bread", "price": 70 },
            { "id": 100, "productId": 1000, "title": "Breakfast Set", "price": "99999", "kind": "combo" }
        ],
        "products": [{ "id": 10, "title": "Coffee" }],
        "combos": [{
            "variantId": 100,
            "items": [
                { "variantId": 1, "productId": 10, "title": "Coffee", "quantity": "1", "price": "30" },
                { "variantId": 2, "productId": 20, "title": "Bread", "quantity": "1", "price": "70" }
            ]
        }],
        "taxSettings": [{ "countryCode": "VN", "title": "VAT", "countryDefaultRate": "0.1", "taxIncluded": true }]
    }"#;

    #[test]
    fn test_fixture_round_trip_into_repositories() {
        let (catalog, taxes) = CatalogFixture::from_json(FIXTURE).unwrap().into_repositories();

        let variants = catalog.variants_by_ids(&[100, 2]).unwrap();
        assert_eq!(variants[0].kind, LineKind::Combo);
        assert_eq!(variants[1].price, Decimal::from(70));

        let combo = &catalog.combos_by_variant_ids(&[100]).unwrap()[0];
        assert_eq!(combo.items.len(), 2);
        assert_eq!(combo.items[1].title, "Bread");

        let tax = taxes.resolve("VN", &[]).unwrap();
        assert_eq!(tax.title, "VAT");
        assert!(tax.tax_included);
        assert!(!tax.tax_shipping);
    }

    #[test]
    fn test_empty_document() {
        let fixture = CatalogFixture::from_json("{}").unwrap();
        assert_eq!(fixture, CatalogFixture::default());
    }

    #[test]
    fn test_malformed_document() {
        let err = CatalogFixture::from_json(r#"{"variants": [{"id": "x"}]}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Fixture(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CatalogFixture::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
