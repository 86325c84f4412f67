//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Station console / CLI                                         │
//! │  ├── Raw text from prompts and flags                                    │
//! │  └── Re-prompt on error, form stays open                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Required fields, lengths, control chars                            │
//! │  └── ProductDraft ──► NewProduct (normalized)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE (sku)                                                       │
//! │  └── CHECK (quantity >= 0)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{normalize_sku, validate_quantity};
//!
//! assert_eq!(normalize_sku("  coke-330 ").unwrap(), "coke-330");
//! assert!(validate_quantity(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewProduct, ProductDraft};
use crate::{MAX_PAGE_SIZE, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest SKU accepted. Covers every 1D symbology a station reads.
pub const MAX_SKU_LEN: usize = 64;

const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;
const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// A SKU is the decoded barcode text, matched exactly. Code 39 carries
/// spaces and Code 128 any printable ASCII, so the alphabet is open.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - No control characters
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("AB 12").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A\tB").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if sku.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a SKU and returns its stored form.
///
/// Only surrounding whitespace is removed; case and inner characters are
/// kept, so `abc` and `ABC` are different products.
pub fn normalize_sku(sku: &str) -> ValidationResult<String> {
    validate_sku(sku)?;
    Ok(sku.trim().to_string())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional category and returns its stored form.
///
/// Blank input becomes `None`.
pub fn validate_category(category: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: MAX_CATEGORY_LEN,
        });
    }

    Ok(Some(category.to_string()))
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stored quantity.
///
/// ## Rules
/// - Zero is allowed (out of stock)
/// - Must not exceed [`MAX_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Parses a quantity typed into a form.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Quantity prompt: "12"                                                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  parse_quantity("12") ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── blank?          → Error: "quantity is required"              │
/// │       ├── "12.5" / "abc"? → Error: must be a whole number              │
/// │       ├── "-3"?           → Error: must be between 0 and 1000000       │
/// │       └── OK → 12                                                      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn parse_quantity(raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::required("quantity"));
    }

    let qty: i64 = raw.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: "must be a whole number".to_string(),
    })?;

    validate_quantity(qty)?;
    Ok(qty)
}

/// Validates listing pagination parameters.
///
/// `page` is 1-based; `limit` must be between 1 and [`MAX_PAGE_SIZE`].
pub fn validate_page_params(page: u32, limit: u32) -> ValidationResult<()> {
    if page == 0 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::from(u32::MAX),
        });
    }

    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a scan-station creation form.
///
/// Every field of the form is required, category included. Errors are
/// reported for the first offending field in form order
/// (name, sku, quantity, category).
pub fn validate_draft(draft: &ProductDraft) -> ValidationResult<NewProduct> {
    validate_product_name(&draft.name)?;
    let sku = normalize_sku(&draft.sku)?;
    let quantity = parse_quantity(&draft.quantity)?;
    let category = validate_category(Some(&draft.category))?
        .ok_or_else(|| ValidationError::required("category"))?;

    Ok(NewProduct {
        sku,
        name: draft.name.trim().to_string(),
        quantity,
        category: Some(category),
    })
}

/// Validates a product built from CLI flags, where category is optional.
pub fn validate_new_product(
    sku: &str,
    name: &str,
    quantity: i64,
    category: Option<&str>,
) -> ValidationResult<NewProduct> {
    validate_product_name(name)?;
    let sku = normalize_sku(sku)?;
    validate_quantity(quantity)?;
    let category = validate_category(category)?;

    Ok(NewProduct {
        sku,
        name: name.trim().to_string(),
        quantity,
        category,
    })
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
