//! # Catalog Resolution
//!
//! Pulls every catalog record a request references, one batched lookup per
//! entity type, and reports all missing references together.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  round 1   variants_by_ids(distinct line variant ids)                  │
//! │            products_by_ids(distinct explicit product ids)              │
//! │                     │                                                   │
//! │                     ▼  line kinds are now known                        │
//! │  round 2   combos_by_variant_ids(combo lines needing catalog parts)    │
//! │            packsizes_by_ids(packsize lines needing catalog parts)      │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  any miss ──► EngineError::NotFound([every missing reference])         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use apportion_catalog::{CatalogLookup, Combo, Packsize, Product, Variant};
use apportion_core::{CatalogId, LineKind};
use tracing::debug;

use crate::error::{EngineError, EngineResult, FieldError};
use crate::request::{AllocationRequest, LineItemInput};

/// Catalog records referenced by one request, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCatalog {
    pub variants: HashMap<CatalogId, Variant>,
    pub products: HashMap<CatalogId, Product>,
    /// Keyed by bundle variant id.
    pub combos: HashMap<CatalogId, Combo>,
    /// Keyed by case variant id.
    pub packsizes: HashMap<CatalogId, Packsize>,
}

/// The kind a line is processed as.
///
/// With `update_product_info` the catalog decides; otherwise an explicit
/// request kind wins over the variant's.
pub fn effective_kind(line: &LineItemInput, variant: Option<&Variant>, update: bool) -> LineKind {
    match variant {
        Some(v) if update => v.kind,
        Some(v) => line.kind.unwrap_or(v.kind),
        None => line.kind.unwrap_or_default(),
    }
}

/// Whether a line's components come from the catalog rather than the request.
pub fn uses_catalog_components(line: &LineItemInput, variant: Option<&Variant>, update: bool) -> bool {
    variant.is_some() && (update || line.components.is_none())
}

fn distinct<I>(ids: I) -> Vec<CatalogId>
where
    I: IntoIterator<Item = CatalogId>,
{
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Resolves every catalog reference in `request`.
///
/// ## Errors
/// - `EngineError::NotFound` listing every missing variant, product, combo or packsize
/// - `EngineError::Catalog` if the backend fails
pub fn resolve_catalog(request: &AllocationRequest, catalog: &dyn CatalogLookup) -> EngineResult<ResolvedCatalog> {
    let update = request.update_product_info;
    let mut resolved = ResolvedCatalog::default();
    let mut missing = Vec::new();

    // -------------------------------------------------------------------------
    // Round 1: variants and products
    // -------------------------------------------------------------------------
    let variant_ids = distinct(request.line_items.iter().filter_map(|l| l.variant_id));
    if !variant_ids.is_empty() {
        resolved.variants = catalog
            .variants_by_ids(&variant_ids)?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();
    }
    debug!(requested = variant_ids.len(), found = resolved.variants.len(), "Resolved variants");

    let product_ids = distinct(request.line_items.iter().flat_map(|l| {
        l.product_id
            .into_iter()
            .chain(l.component_inputs().iter().filter_map(|c| c.product_id))
    }));
    if !product_ids.is_empty() {
        resolved.products = catalog
            .products_by_ids(&product_ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
    }
    debug!(requested = product_ids.len(), found = resolved.products.len(), "Resolved products");

    for (i, line) in request.line_items.iter().enumerate() {
        if let Some(id) = line.variant_id {
            if !resolved.variants.contains_key(&id) {
                missing.push(FieldError::new(
                    format!("lineItems[{i}].variantId"),
                    format!("Variant {id} not found"),
                ));
            }
        }
        if let Some(id) = line.product_id {
            if !resolved.products.contains_key(&id) {
                missing.push(FieldError::new(
                    format!("lineItems[{i}].productId"),
                    format!("Product {id} not found"),
                ));
            }
        }
        for (j, component) in line.component_inputs().iter().enumerate() {
            if let Some(id) = component.product_id {
                if !resolved.products.contains_key(&id) {
                    missing.push(FieldError::new(
                        format!("lineItems[{i}].components[{j}].productId"),
                        format!("Product {id} not found"),
                    ));
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Round 2: bundle contents
    // -------------------------------------------------------------------------
    let mut combo_lines = Vec::new();
    let mut packsize_lines = Vec::new();
    for (i, line) in request.line_items.iter().enumerate() {
        let variant = line.variant_id.and_then(|id| resolved.variants.get(&id));
        let Some(variant) = variant else { continue };
        if !uses_catalog_components(line, Some(variant), update) {
            continue;
        }
        match effective_kind(line, Some(variant), update) {
            LineKind::Combo => combo_lines.push((i, variant.id)),
            LineKind::Packsize => packsize_lines.push((i, variant.id)),
            LineKind::Normal => {}
        }
    }

    let combo_ids = distinct(combo_lines.iter().map(|(_, id)| *id));
    if !combo_ids.is_empty() {
        resolved.combos = catalog
            .combos_by_variant_ids(&combo_ids)?
            .into_iter()
            .map(|c| (c.variant_id, c))
            .collect();
        debug!(requested = combo_ids.len(), found = resolved.combos.len(), "Resolved combos");
    }

    let packsize_ids = distinct(packsize_lines.iter().map(|(_, id)| *id));
    if !packsize_ids.is_empty() {
        resolved.packsizes = catalog
            .packsizes_by_ids(&packsize_ids)?
            .into_iter()
            .map(|p| (p.variant_id, p))
            .collect();
        debug!(requested = packsize_ids.len(), found = resolved.packsizes.len(), "Resolved packsizes");
    }

    for (i, id) in combo_lines {
        if !resolved.combos.contains_key(&id) {
            missing.push(FieldError::new(
                format!("lineItems[{i}].variantId"),
                format!("Combo for variant {id} not found"),
            ));
        }
    }
    for (i, id) in packsize_lines {
        if !resolved.packsizes.contains_key(&id) {
            missing.push(FieldError::new(
                format!("lineItems[{i}].variantId"),
                format!("Packsize for variant {id} not found"),
            ));
        }
    }

    if !missing.is_empty() {
        return Err(EngineError::NotFound(missing));
    }

    Ok(resolved)
}
