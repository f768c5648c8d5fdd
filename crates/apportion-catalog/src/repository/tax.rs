//! # Tax Setting Repository
//!
//! Per-country tax settings held in memory.

use std::collections::HashMap;

use apportion_core::CatalogId;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::lookup::TaxSettingProvider;
use crate::models::{ResolvedTaxSetting, TaxSetting};

/// In-memory tax settings, keyed by upper-case country code.
#[derive(Debug, Clone, Default)]
pub struct TaxSettingRepository {
    settings: HashMap<String, TaxSetting>,
}

impl TaxSettingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the setting for its country.
    pub fn insert(&mut self, setting: TaxSetting) {
        self.settings
            .insert(setting.country_code.to_ascii_uppercase(), setting);
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

impl TaxSettingProvider for TaxSettingRepository {
    fn resolve(&self, country_code: &str, product_ids: &[CatalogId]) -> CatalogResult<ResolvedTaxSetting> {
        let key = country_code.trim().to_ascii_uppercase();
        let setting = self
            .settings
            .get(&key)
            .ok_or_else(|| CatalogError::not_found("TaxSetting", &key))?;

        // Only the overrides this request can use
        let per_product_rates = setting
            .product_rates
            .iter()
            .filter(|r| product_ids.contains(&r.product_id))
            .cloned()
            .collect::<Vec<_>>();

        debug!(
            country = %key,
            overrides = per_product_rates.len(),
            tax_included = setting.tax_included,
            "Resolved tax setting"
        );

        Ok(ResolvedTaxSetting {
            country_code: key,
            title: setting.title.clone(),
            country_default_rate: setting.country_default_rate,
            per_product_rates,
            tax_included: setting.tax_included,
            tax_shipping: setting.tax_shipping,
        })
    }
}
