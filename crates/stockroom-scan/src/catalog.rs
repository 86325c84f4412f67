//! # Catalog Seam
//!
//! The two catalog operations the scan workflow needs, behind a trait so the
//! workflow can run against SQLite in the station and against memory in tests.
//!
//! ```text
//! ScanSession ──► lookup(code)      ──► Catalog ──► ProductRepository::get_by_sku
//!             ──► create(product)   ──►         ──► ProductRepository::insert
//! ```

use async_trait::async_trait;
use stockroom_core::{NewProduct, Product};
use stockroom_db::{DbError, ProductRepository};
use thiserror::Error;
use tracing::debug;

/// Why a catalog call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A unique field (the SKU) is already taken.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Storage could not be reached or failed the query.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl From<DbError> for CatalogError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, value } => CatalogError::Duplicate { field, value },
            other => CatalogError::Unavailable(other.to_string()),
        }
    }
}

/// Product catalog as seen by the scan workflow.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Finds the product whose SKU equals the scanned code.
    async fn lookup(&self, code: &str) -> Result<Option<Product>, CatalogError>;

    /// Stores a validated product.
    async fn create(&self, product: NewProduct) -> Result<Product, CatalogError>;
}

#[async_trait]
impl Catalog for ProductRepository {
    async fn lookup(&self, code: &str) -> Result<Option<Product>, CatalogError> {
        debug!(code = %code, "Catalog lookup");
        Ok(self.get_by_sku(code).await?)
    }

    async fn create(&self, product: NewProduct) -> Result<Product, CatalogError> {
        Ok(self.insert(&product).await?)
    }
}
