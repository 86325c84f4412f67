//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! This crate holds the inventory domain as plain data and pure functions.
//! Nothing in here touches a database, a camera or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/station (stockroom CLI)                    │   │
//! │  │      scan console ──► products list/add ──► low-stock report    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   stockroom-scan: decoder adapter, debouncer, scan session      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │ validation │  │ symbology  │  │  error   │  │   │
//! │  │   │  Product  │  │   drafts   │  │ check digit│  │ Validat- │  │   │
//! │  │   │  History  │  │   queries  │  │ inference  │  │ ionError │  │   │
//! │  │   └───────────┘  └────────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockroom-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ProductDraft, ScanHistoryEntry, ...)
//! - [`symbology`] - Barcode symbologies and check digit helpers
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::{ProductDraft, validation::validate_draft};
//!
//! let mut draft = ProductDraft::for_scanned_code("0123456789012");
//! draft.name = "Sparkling Water".to_string();
//! draft.quantity = "12".to_string();
//! draft.category = "Beverages".to_string();
//!
//! let product = validate_draft(&draft).unwrap();
//! assert_eq!(product.sku, "0123456789012");
//! assert_eq!(product.quantity, 12);
//! ```

pub mod error;
pub mod symbology;
pub mod types;
pub mod validation;

// These allow users to do `use stockroom_core::Product` instead of
// `use stockroom_core::types::Product`
pub use error::{CoreError, ValidationError};
pub use symbology::Symbology;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Products with a quantity strictly below this are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Minimum time between two accepted scans, in milliseconds.
pub const DEFAULT_SCAN_COOLDOWN_MS: u64 = 2000;

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on a single listing page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Upper bound on a stored quantity.
///
/// ## Business Reason
/// Catches typos such as an extra zero on a form before they reach the catalog.
pub const MAX_QUANTITY: i64 = 1_000_000;
