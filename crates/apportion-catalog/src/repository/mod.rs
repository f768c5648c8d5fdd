//! # Repository Module
//!
//! In-memory implementations of the lookup traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  AllocationEngine                                                      │
//! │       │                                                                 │
//! │       │  catalog.variants_by_ids(&[1, 2])                              │
//! │       ▼                                                                 │
//! │  dyn CatalogLookup ─────────────► CatalogRepository (HashMaps)         │
//! │  dyn TaxSettingProvider ────────► TaxSettingRepository (HashMap)       │
//! │                                                                         │
//! │  The engine only sees the traits; a SQL or HTTP backed store drops in  │
//! │  without touching allocation code.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`] - Variants, products, combos, packsizes
//! - [`TaxSettingRepository`] - Tax settings by country

pub mod catalog;
pub mod tax;

pub use catalog::CatalogRepository;
pub use tax::TaxSettingRepository;
