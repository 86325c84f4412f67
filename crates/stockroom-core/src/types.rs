//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │  ProductDraft   │   │  ScanHistoryEntry   │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  name  (text)   │   │  code               │   │
//! │  │  sku (business) │◄──│  sku   (text)   │   │  symbology          │   │
//! │  │  name           │   │  quantity(text) │   │  timestamp          │   │
//! │  │  quantity       │   │  category(text) │   │  outcome            │   │
//! │  │  category       │   └─────────────────┘   └─────────────────────┘   │
//! │  └─────────────────┘     validate_draft()                              │
//! │                          ───► NewProduct                               │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │  ProductQuery   │   │    Page<T>      │   │  SessionState       │   │
//! │  │  page, limit    │──►│  items, total   │   │  Idle / Active /    │   │
//! │  │  search, sort   │   │  total_pages    │   │  Paused / Accepted  │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every product has:
//! - `id`: UUID v4 - immutable, used for relations
//! - `sku`: business identifier, the value printed in the barcode

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::symbology::Symbology;
use crate::{DEFAULT_PAGE_SIZE, LOW_STOCK_THRESHOLD, MAX_PAGE_SIZE};

// =============================================================================
// Product
// =============================================================================

/// A product tracked in the inventory catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - trimmed, matched exactly, unique.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Units on hand (never negative).
    pub quantity: i64,

    /// Optional grouping shown in listings.
    pub category: Option<String>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if the product is below the default low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.is_below(LOW_STOCK_THRESHOLD)
    }

    /// Checks if the product quantity is strictly below `threshold`.
    #[inline]
    pub fn is_below(&self, threshold: i64) -> bool {
        self.quantity < threshold
    }
}

/// A validated product ready to be written to the catalog.
///
/// Produced by [`crate::validation::validate_draft`] or
/// [`crate::validation::validate_new_product`]; the SKU is already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub category: Option<String>,
}

// =============================================================================
// Product Draft
// =============================================================================

/// Transient creation form state used when a scanned code is not in the catalog.
///
/// ## Lifecycle
/// ```text
/// lookup miss ──► ProductDraft::for_scanned_code(code)   (sku pre-filled)
///      │
///      ▼
/// operator fills name / quantity / category
///      │
///      ▼
/// validate_draft() ──► ValidationError? form stays open
///      │
///      ▼
/// NewProduct ──► catalog create ──► draft discarded
/// ```
///
/// All fields are raw text exactly as typed so that blank input can be told
/// apart from a zero quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub quantity: String,
    pub category: String,
}

impl ProductDraft {
    /// Creates a draft with the scanned code as SKU and everything else blank.
    pub fn for_scanned_code(code: &str) -> Self {
        ProductDraft {
            sku: code.trim().to_string(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Scan History
// =============================================================================

/// Result of looking up a scanned code in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ScanOutcome {
    Found,
    NotFound,
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanOutcome::Found => write!(f, "Found"),
            ScanOutcome::NotFound => write!(f, "Not Found"),
        }
    }
}

/// One resolved scan, as recorded in the session history.
///
/// Entries are immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryEntry {
    pub code: String,
    pub symbology: Symbology,
    /// When the barcode was detected.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub outcome: ScanOutcome,
}

/// Lifecycle state of a scan session.
///
/// ```text
///            begin_session()             accepted detection
///   Idle ───────────────────► Active ─────────────────────► Accepted
///    ▲                        │    ▲                           │
///    │      end_session()     │    │ resume()                  │ lookup resolved
///    ├────────────────────────┘    │                           │ (or failed)
///    │                        pause()                          │
///    │                          ▼  │                           │
///    ├──────────────────────── Paused                          │
///    └─────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Camera released, waiting for the operator to start a scan.
    #[default]
    Idle,
    /// Camera leased, detections flowing.
    Active,
    /// Camera leased, detections discarded.
    Paused,
    /// A detection was accepted; camera already released, lookup in flight.
    Accepted,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Active => write!(f, "active"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Accepted => write!(f, "accepted"),
        }
    }
}

// =============================================================================
// Listing Queries
// =============================================================================

/// Column a product listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    Sku,
    Quantity,
    CreatedAt,
    UpdatedAt,
}

impl ProductSort {
    /// Column name in the `products` table.
    pub const fn column(&self) -> &'static str {
        match self {
            ProductSort::Name => "name",
            ProductSort::Sku => "sku",
            ProductSort::Quantity => "quantity",
            ProductSort::CreatedAt => "created_at",
            ProductSort::UpdatedAt => "updated_at",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "name" => Ok(ProductSort::Name),
            "sku" => Ok(ProductSort::Sku),
            "quantity" | "qty" => Ok(ProductSort::Quantity),
            "created_at" | "created" => Ok(ProductSort::CreatedAt),
            "updated_at" | "updated" => Ok(ProductSort::UpdatedAt),
            _ => Err(ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: ["name", "sku", "quantity", "created_at", "updated_at"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Paginated, sorted and filtered product listing request.
///
/// `page` is 1-based. Out-of-range values are clamped by [`ProductQuery::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring match on name or SKU.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    pub sort: ProductSort,
    pub direction: SortDirection,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            category: None,
            sort: ProductSort::default(),
            direction: SortDirection::default(),
        }
    }
}

impl ProductQuery {
    /// Returns a copy with page/limit clamped and blank filters removed.
    pub fn normalized(&self) -> Self {
        let blank_to_none = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        ProductQuery {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
            search: blank_to_none(&self.search),
            category: blank_to_none(&self.category),
            sort: self.sort,
            direction: self.direction,
        }
    }

    /// Number of rows to skip for this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Builds a page, deriving `total_pages` from `total` and `limit`.
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: i64) -> Self {
        let limit = limit.max(1);
        let total_pages = if total <= 0 {
            0
        } else {
            ((total as u64).div_ceil(u64::from(limit))) as u32
        };
        Page {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Aggregate counters for the inventory dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub product_count: i64,
    pub low_stock_count: i64,
    pub total_units: i64,
    pub category_count: i64,
}
