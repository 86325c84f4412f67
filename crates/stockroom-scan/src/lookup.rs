//! # Lookup / Create Workflow
//!
//! What happens to an accepted scan.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lookup(catalog, "9999999999999")      ← exactly one catalog read      │
//! │       │                                                                 │
//! │       ├── Some(product) ──► Found(product)      (nothing written)      │
//! │       │                                                                 │
//! │       ├── None ──► NotFound(ProductDraft { sku: "9999999999999", .. }) │
//! │       │                 │                                               │
//! │       │                 ▼  operator fills the form                      │
//! │       │            submit_draft(catalog, &draft)                        │
//! │       │                 ├── invalid ──► Validation (nothing written)   │
//! │       │                 ├── SKU taken ──► Validation(Duplicate)        │
//! │       │                 └── ok ──► catalog.create ──► Product          │
//! │       │                                                                 │
//! │       └── Err ──► LookupFailed (not retried)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_core::validation::validate_draft;
use stockroom_core::{Product, ProductDraft, ScanOutcome, ValidationError};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::error::{ScanError, ScanResult};

/// Result of looking up a scanned code.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResolution {
    /// The code is a known SKU.
    Found(Product),
    /// Unknown code; a creation form pre-filled with the code as SKU.
    NotFound(ProductDraft),
}

impl LookupResolution {
    pub fn outcome(&self) -> ScanOutcome {
        match self {
            LookupResolution::Found(_) => ScanOutcome::Found,
            LookupResolution::NotFound(_) => ScanOutcome::NotFound,
        }
    }

    pub fn product(&self) -> Option<&Product> {
        match self {
            LookupResolution::Found(product) => Some(product),
            LookupResolution::NotFound(_) => None,
        }
    }

    pub fn draft(&self) -> Option<&ProductDraft> {
        match self {
            LookupResolution::Found(_) => None,
            LookupResolution::NotFound(draft) => Some(draft),
        }
    }
}

/// Looks a scanned code up in the catalog. Never writes.
pub async fn lookup(catalog: &dyn Catalog, code: &str) -> ScanResult<LookupResolution> {
    let code = code.trim();

    match catalog.lookup(code).await {
        Ok(Some(product)) => {
            info!(code = %code, sku = %product.sku, "Scan matched product");
            Ok(LookupResolution::Found(product))
        }
        Ok(None) => {
            info!(code = %code, "Scan did not match any product");
            Ok(LookupResolution::NotFound(ProductDraft::for_scanned_code(code)))
        }
        Err(err) => {
            warn!(code = %code, error = %err, "Product lookup failed");
            Err(ScanError::LookupFailed(err.to_string()))
        }
    }
}

/// Validates a creation form and stores the product.
///
/// On any validation error the catalog is not called at all.
pub async fn submit_draft(catalog: &dyn Catalog, draft: &ProductDraft) -> ScanResult<Product> {
    let product = validate_draft(draft).map_err(|err| {
        debug!(field = err.field(), error = %err, "Draft rejected");
        err
    })?;

    match catalog.create(product).await {
        Ok(created) => {
            info!(sku = %created.sku, id = %created.id, "Product created from scan");
            Ok(created)
        }
        Err(CatalogError::Duplicate { field, value }) => {
            Err(ValidationError::Duplicate { field, value }.into())
        }
        Err(CatalogError::Unavailable(msg)) => {
            warn!(error = %msg, "Product creation failed");
            Err(ScanError::CreateFailed(msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCatalog;

    fn filled(sku: &str) -> ProductDraft {
        ProductDraft {
            name: "Sparkling Water".to_string(),
            sku: sku.to_string(),
            quantity: "12".to_string(),
            category: "Beverages".to_string(),
        }
    }

    #[tokio::test]
    async fn test_found_does_not_mutate() {
        let catalog = MemoryCatalog::with_product("0123456789012", "Water", 3);

        let resolution = lookup(catalog.as_ref(), "0123456789012").await.unwrap();
        assert_eq!(resolution.outcome(), ScanOutcome::Found);
        assert_eq!(resolution.product().map(|p| p.quantity), Some(3));
        assert!(resolution.draft().is_none());

        assert_eq!(catalog.lookups(), 1);
        assert_eq!(catalog.creates(), 0);
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_prefills_sku() {
        let catalog = MemoryCatalog::new();

        let resolution = lookup(catalog.as_ref(), "9999999999999").await.unwrap();
        let draft = resolution.draft().unwrap();
        assert_eq!(draft.sku, "9999999999999");
        assert!(draft.name.is_empty());
        assert_eq!(catalog.lookups(), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let catalog = MemoryCatalog::new();
        catalog.break_storage();

        let err = lookup(catalog.as_ref(), "A").await.unwrap_err();
        assert!(matches!(err, ScanError::LookupFailed(_)));
        // Not retried
        assert_eq!(catalog.lookups(), 1);
    }

    #[tokio::test]
    async fn test_submit_blank_name_does_not_touch_catalog() {
        let catalog = MemoryCatalog::new();
        let mut draft = filled("9999999999999");
        draft.name = String::new();

        let err = submit_draft(catalog.as_ref(), &draft).await.unwrap_err();
        assert_eq!(err, ScanError::Validation(ValidationError::required("name")));
        assert_eq!(catalog.creates(), 0);
        assert_eq!(catalog.len(), 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_quantity_and_sku() {
        let catalog = MemoryCatalog::new();

        let mut draft = filled("9999999999999");
        draft.quantity = "-1".to_string();
        assert!(matches!(
            submit_draft(catalog.as_ref(), &draft).await.unwrap_err(),
            ScanError::Validation(ValidationError::OutOfRange { .. })
        ));

        let draft = filled("bad\tsku");
        assert!(matches!(
            submit_draft(catalog.as_ref(), &draft).await.unwrap_err(),
            ScanError::Validation(ValidationError::InvalidFormat { .. })
        ));

        assert_eq!(catalog.creates(), 0);
    }

    #[tokio::test]
    async fn test_submit_creates_product() {
        let catalog = MemoryCatalog::new();

        let product = submit_draft(catalog.as_ref(), &filled("9999999999999"))
            .await
            .unwrap();
        assert_eq!(product.sku, "9999999999999");
        assert_eq!(product.quantity, 12);
        assert_eq!(catalog.len(), 1);

        let again = lookup(catalog.as_ref(), "9999999999999").await.unwrap();
        assert_eq!(again.outcome(), ScanOutcome::Found);
    }

    #[tokio::test]
    async fn test_submit_duplicate_is_validation_error() {
        let catalog = MemoryCatalog::with_product("ABC-1", "Existing", 1);

        let err = submit_draft(catalog.as_ref(), &filled(" ABC-1 ")).await.unwrap_err();
        assert_eq!(
            err,
            ScanError::Validation(ValidationError::Duplicate {
                field: "sku".to_string(),
                value: "ABC-1".to_string(),
            })
        );
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_case_variant_is_new_product() {
        let catalog = MemoryCatalog::with_product("ABC-1", "Existing", 1);

        let product = submit_draft(catalog.as_ref(), &filled("abc-1")).await.unwrap();
        assert_eq!(product.sku, "abc-1");
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_storage_failure() {
        let catalog = MemoryCatalog::new();
        catalog.break_storage();

        let err = submit_draft(catalog.as_ref(), &filled("X1")).await.unwrap_err();
        assert!(matches!(err, ScanError::CreateFailed(_)));
    }
}
