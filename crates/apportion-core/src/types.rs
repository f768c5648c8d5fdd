//! # Domain Types
//!
//! The value types money is split into and out of.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────────┐        ┌───────────────────────────────────┐    │
//! │  │  CompositeLine    │        │  LineComposition                  │    │
//! │  │  ───────────────  │  has   │  ───────────────────────────────  │    │
//! │  │  quantity         │───────►│  Normal                           │    │
//! │  │  line_price       │        │  Combo(Vec<ComponentSpec>)        │    │
//! │  │  components       │        │  Packsize(ComponentSpec)          │    │
//! │  │  discounts, taxes │        └───────────────────────────────────┘    │
//! │  └─────────┬─────────┘                                                  │
//! │            │ decomposes into                                            │
//! │            ▼                                                            │
//! │  ┌───────────────────┐        ┌───────────────────┐  ┌──────────────┐  │
//! │  │  Component        │  wraps │ AllocationTarget  │  │ TaxLine      │  │
//! │  │  spec + quantity  │───────►│ weight, capacity  │  │ title, rate  │  │
//! │  │  discounts, taxes │        │ line_price, …     │  │ price        │  │
//! │  └───────────────────┘        └───────────────────┘  └──────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Target Type, Two Granularities
//! `AllocationTarget` is used both for the components of a bundle and for the
//! lines of an order. The redistributor and the discount allocator only ever
//! see targets, so the same code serves both call sites.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::sum;

/// Catalog identifier (variant, product, combo or packsize).
pub type CatalogId = u64;

// =============================================================================
// Allocation Target
// =============================================================================

/// The unit money is distributed into: a component of a bundle, or a line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTarget {
    /// Quantity. One whole-unit step for this target is `weight × minimal_unit`.
    pub weight: Decimal,

    /// Ceiling on what this target may absorb (its own subtotal).
    pub capacity: Decimal,

    /// Price per unit after the split.
    pub unit_price: Decimal,

    /// Total price of this target after the split.
    pub line_price: Decimal,

    /// Part of `line_price` that is not a whole `unit_price × weight` multiple.
    pub remainder: Decimal,

    /// Marks the designated last-resort absorber.
    pub can_absorb_odd: bool,
}

impl AllocationTarget {
    /// Creates a target whose capacity is its own line price.
    pub fn new(weight: Decimal, unit_price: Decimal, line_price: Decimal) -> Self {
        AllocationTarget {
            weight,
            capacity: line_price,
            unit_price,
            line_price,
            remainder: Decimal::ZERO,
            can_absorb_odd: false,
        }
    }

    /// Smallest amount that keeps the per-unit price whole.
    #[inline]
    pub fn step(&self, minimal_unit: Decimal) -> Decimal {
        if self.weight > Decimal::ZERO {
            self.weight * minimal_unit
        } else {
            minimal_unit
        }
    }
}

// =============================================================================
// Line Kind & Composition
// =============================================================================

/// How a line item is sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// A single product.
    #[default]
    Normal,
    /// A bundle of distinct products sold under one SKU.
    Combo,
    /// N units of one product sold as a single case SKU.
    Packsize,
}

impl LineKind {
    /// Returns true for bundles and multi-packs.
    #[inline]
    pub const fn is_composite(&self) -> bool {
        !matches!(self, LineKind::Normal)
    }
}

/// One catalog-resolved component of a composite line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub variant_id: Option<CatalogId>,
    pub product_id: Option<CatalogId>,
    pub title: String,

    /// Units of this component in one bundle / case.
    pub base_quantity: Decimal,

    /// Catalog unit price (combo only; ignored for packsize).
    #[serde(default)]
    pub catalog_price: Decimal,

    #[serde(default = "default_true")]
    pub taxable: bool,
}

fn default_true() -> bool {
    true
}

/// What a line is made of.
///
/// Adding a variant here forces every decomposition match to handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineComposition {
    Normal,
    Combo(Vec<ComponentSpec>),
    Packsize(ComponentSpec),
}

impl LineComposition {
    /// Returns the kind tag for this composition.
    pub fn kind(&self) -> LineKind {
        match self {
            LineComposition::Normal => LineKind::Normal,
            LineComposition::Combo(_) => LineKind::Combo,
            LineComposition::Packsize(_) => LineKind::Packsize,
        }
    }
}

// =============================================================================
// Discount Allocation
// =============================================================================

/// Amount of one discount application attributed to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountAllocation {
    pub application_id: String,
    pub amount: Decimal,

    /// Part of `amount` that does not divide evenly over the target's quantity.
    #[serde(default)]
    pub remainder: Decimal,
}

impl DiscountAllocation {
    pub fn new(application_id: impl Into<String>, amount: Decimal) -> Self {
        DiscountAllocation {
            application_id: application_id.into(),
            amount,
            remainder: Decimal::ZERO,
        }
    }
}

/// A discount to be spread over a set of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountApplication {
    pub application_id: String,
    pub amount: Decimal,
}

// =============================================================================
// Tax Line
// =============================================================================

/// A tax charged on a target. Merge key is `(title, rate)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLine {
    pub title: String,

    /// Fraction in `[0, 1]` (0.1 = 10%).
    pub rate: Decimal,

    pub price: Decimal,

    /// Supplied by the caller rather than derived from a catalog rate.
    #[serde(default)]
    pub custom: bool,
}

impl TaxLine {
    pub fn new(title: impl Into<String>, rate: Decimal, price: Decimal) -> Self {
        TaxLine {
            title: title.into(),
            rate,
            price,
            custom: false,
        }
    }

    /// Returns true when both lines share the same `(title, rate)` key.
    #[inline]
    pub fn same_key(&self, other: &TaxLine) -> bool {
        self.title == other.title && self.rate == other.rate
    }
}

// =============================================================================
// Components & Composite Lines
// =============================================================================

/// A priced component of a composite line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub spec: ComponentSpec,

    /// `base_quantity × line quantity`; equal to `target.weight`.
    pub quantity: Decimal,

    pub target: AllocationTarget,

    #[serde(default)]
    pub discount_allocations: Vec<DiscountAllocation>,

    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
}

impl Component {
    /// Total discount attributed to this component.
    pub fn total_discount(&self) -> Decimal {
        sum(self.discount_allocations.iter().map(|a| a.amount))
    }

    /// Line price after discounts.
    pub fn subtotal(&self) -> Decimal {
        self.target.line_price - self.total_discount()
    }
}

/// A line item of an order, possibly made of several components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLine {
    pub variant_id: Option<CatalogId>,
    pub product_id: Option<CatalogId>,
    pub quantity: Decimal,

    /// Total for the whole line (unit price × quantity).
    pub line_price: Decimal,

    pub composition: LineComposition,
    pub components: Vec<Component>,
    pub discount_allocations: Vec<DiscountAllocation>,
    pub tax_lines: Vec<TaxLine>,
}

impl CompositeLine {
    /// Creates a line with no components, discounts or taxes yet.
    pub fn new(quantity: Decimal, line_price: Decimal, composition: LineComposition) -> Self {
        CompositeLine {
            variant_id: None,
            product_id: None,
            quantity,
            line_price,
            composition,
            components: Vec::new(),
            discount_allocations: Vec::new(),
            tax_lines: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> LineKind {
        self.composition.kind()
    }

    /// Total discount attributed to this line.
    pub fn total_discount(&self) -> Decimal {
        sum(self.discount_allocations.iter().map(|a| a.amount))
    }

    /// Line price after discounts.
    pub fn subtotal(&self) -> Decimal {
        self.line_price - self.total_discount()
    }

    /// Sum of component line prices (equals `line_price` once decomposed).
    pub fn components_total(&self) -> Decimal {
        sum(self.components.iter().map(|c| c.target.line_price))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_kind_default() {
        assert_eq!(LineKind::default(), LineKind::Normal);
        assert!(!LineKind::Normal.is_composite());
        assert!(LineKind::Combo.is_composite());
        assert!(LineKind::Packsize.is_composite());
    }

    #[test]
    fn test_line_kind_serde() {
        let json = serde_json::to_string(&LineKind::Packsize).unwrap();
        assert_eq!(json, "\"packsize\"");
        let kind: LineKind = serde_json::from_str("\"combo\"").unwrap();
        assert_eq!(kind, LineKind::Combo);
    }

    #[test]
    fn test_target_step() {
        let unit = Decimal::new(1, 2);
        let target = AllocationTarget::new(Decimal::from(3), Decimal::ONE, Decimal::from(3));
        assert_eq!(target.step(unit), Decimal::new(3, 2));
        assert_eq!(target.capacity, Decimal::from(3));

        let weightless = AllocationTarget::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(weightless.step(unit), unit);
    }

    #[test]
    fn test_tax_line_key() {
        let a = TaxLine::new("VAT", Decimal::new(1, 1), Decimal::from(10));
        let b = TaxLine::new("VAT", Decimal::new(10, 2), Decimal::from(4));
        let c = TaxLine::new("VAT", Decimal::new(5, 2), Decimal::from(4));
        assert!(a.same_key(&b));
        assert!(!a.same_key(&c));
    }

    #[test]
    fn test_composition_kind() {
        assert_eq!(LineComposition::Normal.kind(), LineKind::Normal);
        assert_eq!(LineComposition::Combo(vec![]).kind(), LineKind::Combo);
    }
}
