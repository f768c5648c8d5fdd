//! # apportion-core: Exact Money Splitting
//!
//! This crate is the **heart** of Apportion. It contains every split as a
//! pure function over `rust_decimal::Decimal`, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Apportion Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apportion CLI                                │   │
//! │  │    settings ──► catalog fixture ──► request JSON ──► response  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apportion-engine                             │   │
//! │  │    validate ──► resolve catalog ──► allocate ──► assemble      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ apportion-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐ │   │
//! │  │   │   money   │  │redistribute│  │ decompose │  │ discount  │ │   │
//! │  │   │ Currency  │  │  4-pass    │  │ combo /   │  │ per-line  │ │   │
//! │  │   │ rounding  │  │ remainder  │  │ packsize  │  │ split     │ │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘ │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐                │   │
//! │  │   │    tax    │  │   types    │  │validation │                │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘                │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOGGING • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                    apportion-catalog                            │   │
//! │  │              lookup traits, in-memory repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Currency table and the two rounding rules
//! - [`types`] - Allocation targets, composite lines, discount and tax lines
//! - [`redistribute`] - Places a leftover remainder in whole minimal units
//! - [`decompose`] - Splits combo and packsize lines into priced components
//! - [`discount`] - Spreads discount amounts over targets
//! - [`tax`] - Rate-derived and custom tax lines, merge by `(title, rate)`
//! - [`validation`] - Field-level request rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Conservation**: every split returns parts that add up to the whole, exactly
//! 2. **Determinism**: same input in the same order = same output
//! 3. **Explicit Currency**: scale is passed in, never assumed
//! 4. **Explicit Errors**: a capacity shortfall is a typed error, never a panic
//!
//! ## Example Usage
//!
//! ```rust
//! use apportion_core::{decompose, Currency, CompositeLine, ComponentSpec, LineComposition};
//! use rust_decimal::Decimal;
//!
//! // A case of 3 bottles, two cases bought for 100 000 VND
//! let bottle = ComponentSpec {
//!     variant_id: Some(7),
//!     product_id: Some(70),
//!     title: "Bottle".to_string(),
//!     base_quantity: Decimal::from(3),
//!     catalog_price: Decimal::ZERO,
//!     taxable: true,
//! };
//! let line = CompositeLine::new(
//!     Decimal::from(2),
//!     Decimal::from(100_000),
//!     LineComposition::Packsize(bottle),
//! );
//!
//! let components = decompose(&line, &Currency::from_code("VND").unwrap()).unwrap();
//! assert_eq!(components[0].target.unit_price, Decimal::from(16_666));
//! assert_eq!(components[0].target.line_price, Decimal::from(100_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod decompose;
pub mod discount;
pub mod error;
pub mod money;
pub mod redistribute;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use apportion_core::Currency` instead of
// `use apportion_core::money::Currency`

pub use decompose::decompose;
pub use discount::{allocate_discount, allocate_discounts};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Currency;
pub use redistribute::{redistribute, Redistribution, Slot};
pub use tax::{compute_tax_lines, merge_tax_lines, split_custom_taxes, TaxRule};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default cap on line items in a single request.
///
/// ## Business Reason
/// Keeps a request bounded; hosts can lower or raise it through settings.
pub const MAX_LINE_ITEMS: usize = 250;

/// Default cap on the quantity of a single line.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Default cap on the components of one composite line.
pub const MAX_COMPONENTS: usize = 50;

/// Default cap on any single monetary amount, and on any resolved line price.
///
/// ## Business Reason
/// Products of two capped amounts (a line price times a split weight) stay
/// far inside `Decimal`'s range, so no split can overflow.
pub const MAX_AMOUNT: i64 = 100_000_000_000;
