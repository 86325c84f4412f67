//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Lookup by scanned SKU
//! - CRUD operations
//! - Paginated, filtered, sorted listing
//! - Stock adjustments and low-stock reporting
//!
//! ## Listing Query Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductQuery { page: 2, limit: 10, search: "cola", sort: quantity }    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT COUNT(*) FROM products WHERE (name LIKE ? OR sku LIKE ?)        │
//! │       │                                 ──► total                       │
//! │       ▼                                                                 │
//! │  SELECT ... WHERE (same filters)                                        │
//! │  ORDER BY quantity ASC, id ASC LIMIT 10 OFFSET 10                       │
//! │       │                                 ──► items                       │
//! │       ▼                                                                 │
//! │  Page { items, page: 2, limit: 10, total, total_pages }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sort columns come from a closed enum, never from user text, so they are
//! pushed into the SQL directly; every value is bound.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::{InventorySummary, NewProduct, Page, Product, ProductQuery};

const PRODUCT_COLUMNS: &str = "id, sku, name, quantity, category, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_sku("0123456789012").await?;
/// let page = repo.list(&ProductQuery::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        debug!(id = %id, "Getting product by ID");

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by SKU.
    ///
    /// The SKU is trimmed, then matched exactly (case-sensitive), the same
    /// way it was stored. Used by the scan workflow: one call per accepted scan.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sku = sku.trim();
        debug!(sku = %sku, "Getting product by SKU");

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Like [`get_by_sku`](Self::get_by_sku), but a miss is an error.
    pub async fn require_by_sku(&self, sku: &str) -> DbResult<Product> {
        self.get_by_sku(sku)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku.trim()))
    }

    /// Inserts a new product and returns the stored row.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the SKU is already taken
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        let now = Utc::now();
        let stored = Product {
            id: generate_product_id(),
            sku: product.sku.trim().to_string(),
            name: product.name.clone(),
            quantity: product.quantity,
            category: product.category.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, quantity, category, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.sku)
        .bind(&stored.name)
        .bind(stored.quantity)
        .bind(&stored.category)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&stored.sku))?;

        Ok(stored)
    }

    /// Replaces every editable field of a product.
    ///
    /// ## Errors
    /// - `NotFound` if no product has this ID
    /// - `UniqueViolation` if the new SKU belongs to another product
    pub async fn update(&self, id: &str, product: &NewProduct) -> DbResult<Product> {
        debug!(id = %id, sku = %product.sku, "Updating product");

        let sku = product.sku.trim();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                sku = ?2,
                name = ?3,
                quantity = ?4,
                category = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(sku)
        .bind(&product.name)
        .bind(product.quantity)
        .bind(&product.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Adds `delta` to a product's quantity (negative to remove stock).
    ///
    /// The check and the write are one statement, so two stations adjusting
    /// the same product cannot drive it below zero.
    ///
    /// ## Errors
    /// - `NotFound` if no product has this ID
    /// - `InsufficientStock` if the result would be negative
    pub async fn adjust_quantity(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting quantity");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                quantity = quantity + ?2,
                updated_at = ?3
            WHERE id = ?1 AND quantity + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::InsufficientStock {
                sku: current.sku,
                available: current.quantity,
                requested: -delta,
            });
        }

        Ok(current)
    }

    /// Deletes a product.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists products one page at a time.
    ///
    /// Out-of-range page and limit values are clamped, blank filters ignored.
    /// Ties in the sort column are broken by ID so pages never overlap.
    pub async fn list(&self, query: &ProductQuery) -> DbResult<Page<Product>> {
        let query = query.normalized();
        debug!(?query, "Listing products");

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count, &query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products"
        ));
        push_filters(&mut select, &query);
        select
            .push(" ORDER BY ")
            .push(query.sort.column())
            .push(" COLLATE NOCASE ")
            .push(query.direction.keyword())
            .push(", id ASC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);

        let items = select
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, query.page, query.limit, total))
    }

    /// Products with a quantity strictly below `threshold`, emptiest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        debug!(threshold = %threshold, "Listing low-stock products");

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE quantity < ?1 ORDER BY quantity ASC, name COLLATE NOCASE ASC"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Aggregate counters for the whole catalog.
    pub async fn summary(&self, low_stock_threshold: i64) -> DbResult<InventorySummary> {
        let (product_count, low_stock_count, total_units, category_count): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN quantity < ?1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(quantity), 0),
                    COUNT(DISTINCT category)
                FROM products
                "#,
            )
            .bind(low_stock_threshold)
            .fetch_one(&self.pool)
            .await?;

        Ok(InventorySummary {
            product_count,
            low_stock_count,
            total_units,
            category_count,
        })
    }

    /// Counts total products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Appends the WHERE clause for the query's search and category filters.
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ProductQuery) {
    let mut separator = " WHERE ";

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(separator)
            .push("(name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR sku LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
        separator = " AND ";
    }

    if let Some(category) = &query.category {
        builder
            .push(separator)
            .push("category = ")
            .push_bind(category.clone())
            .push(" COLLATE NOCASE");
    }
}

/// Escapes LIKE wildcards so a search for `50%` matches the literal text.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
