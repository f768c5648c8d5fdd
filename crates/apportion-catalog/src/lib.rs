//! # apportion-catalog: Catalog Access for Apportion
//!
//! This crate provides the read-only catalog the allocation engine resolves
//! line items against: variants, products, combo contents, packsize
//! multipliers and per-country tax settings.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Apportion Data Flow                              │
//! │                                                                         │
//! │  AllocationEngine::allocate(request)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apportion-catalog (THIS CRATE)                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    lookup     │    │  repository   │    │   fixture    │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ CatalogLookup │◄───│ CatalogRepo   │◄───│ JSON loader  │  │   │
//! │  │   │ TaxSetting-   │◄───│ TaxSetting-   │    │              │  │   │
//! │  │   │   Provider    │    │   Repository  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     catalog.json                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`models`] - Catalog records
//! - [`lookup`] - The traits the engine depends on
//! - [`repository`] - In-memory implementations
//! - [`fixture`] - JSON document loading
//! - [`error`] - Catalog error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use apportion_catalog::{CatalogFixture, CatalogLookup};
//!
//! let (catalog, taxes) = CatalogFixture::from_path("catalog.json")?.into_repositories();
//! let variants = catalog.variants_by_ids(&[1, 2, 3])?;
//! # Ok::<(), apportion_catalog::CatalogError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fixture;
pub mod lookup;
pub mod models;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CatalogError, CatalogResult};
pub use fixture::CatalogFixture;
pub use lookup::{CatalogLookup, TaxSettingProvider};
pub use models::{
    Combo, ComboItem, Packsize, Product, ProductTaxRate, ResolvedTaxSetting, TaxSetting, Variant,
};

// Repository re-exports for convenience
pub use repository::{CatalogRepository, TaxSettingRepository};
