//! # apportion-engine: Allocation Orchestration for Apportion
//!
//! Takes an [`AllocationRequest`] and produces an [`AllocationResponse`]:
//! every line priced, every bundle broken into components, every discount
//! and tax amount placed, and all of it adding up to the cent.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Allocation Request Lifecycle                        │
//! │                                                                         │
//! │  JSON request                                                           │
//! │       │  serde (camelCase, decimals as strings or numbers)              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               apportion-engine (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  validation ──► resolve ──► engine ──────────────► response    │   │
//! │  │      │             │           │                                │   │
//! │  │      │             │           └── apportion-core splits        │   │
//! │  │      │             └── CatalogLookup / TaxSettingProvider       │   │
//! │  │      │                                                          │   │
//! │  │      └──► EngineError ──► ApiError { code, message, errors }   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`request`] / [`response`] - Wire DTOs
//! - [`validation`] - Whole-request validation, all field errors in one batch
//! - [`resolve`] - Batched catalog lookups
//! - [`engine`] - The pipeline itself
//! - [`options`] - Limits and defaults shared by every request
//! - [`error`] - Engine errors and their caller-facing form
//!
//! ## Concurrency
//! An [`AllocationEngine`] only borrows its catalog and tax provider, and a
//! request owns all of its working state. Separate requests can run on
//! separate threads against the same catalog.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod options;
pub mod request;
pub mod resolve;
pub mod response;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::AllocationEngine;
pub use error::{ApiError, EngineError, EngineResult, ErrorCode, FieldError};
pub use options::EngineOptions;
pub use request::{
    AllocationRequest, ComponentInput, DiscountAllocationInput, DiscountApplicationInput,
    LineItemInput, ShippingLineInput, TaxLineInput,
};
pub use response::{AllocationResponse, ComponentOutput, LineItemOutput, ShippingLineOutput};
