//! # Product Commands
//!
//! Catalog maintenance from the command line.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stockroom products add 0123456789012 --name "Cola 330ml" --quantity 24 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_new_product()  ── ValidationError ──► exit 2                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository::insert()  ── UniqueViolation ──► exit 1            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  "Added 0123456789012  Cola 330ml  qty 24"                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command addresses products by SKU; lookups match the SKU exactly.

use std::io::Write;

use stockroom_core::validation::{
    normalize_sku, validate_category, validate_new_product, validate_page_params,
    validate_search_query,
};
use stockroom_core::{Product, ProductQuery, SortDirection};
use stockroom_db::ProductRepository;
use tracing::info;

use crate::cli::{ListArgs, NewProductArgs, UpdateProductArgs};
use crate::error::StationResult;

/// One product as a table row, flagged `(low)` when its quantity is
/// strictly below `low_stock_threshold`.
pub fn product_row(product: &Product, low_stock_threshold: i64) -> String {
    format!(
        "{:<16} {:<32} {:>8}  {}{}",
        product.sku,
        product.name,
        product.quantity,
        product.category.as_deref().unwrap_or("-"),
        if product.is_below(low_stock_threshold) { "  (low)" } else { "" },
    )
}

/// `products list`
pub async fn list(
    repo: &ProductRepository,
    args: &ListArgs,
    default_limit: u32,
    low_stock_threshold: i64,
    out: &mut impl Write,
) -> StationResult<()> {
    let limit = args.limit.unwrap_or(default_limit);
    validate_page_params(args.page, limit)?;
    let search = args
        .search
        .as_deref()
        .map(validate_search_query)
        .transpose()?;

    let query = ProductQuery {
        page: args.page,
        limit,
        search,
        category: args.category.clone(),
        sort: args.sort,
        direction: if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    };

    let page = repo.list(&query).await?;

    for product in &page.items {
        writeln!(out, "{}", product_row(product, low_stock_threshold))?;
    }
    writeln!(
        out,
        "page {} of {} ({} products)",
        page.page,
        page.total_pages.max(1),
        page.total
    )?;
    Ok(())
}

/// `products show <sku>`
pub async fn show(repo: &ProductRepository, sku: &str, out: &mut impl Write) -> StationResult<()> {
    let product = repo.require_by_sku(sku).await?;

    writeln!(out, "SKU:      {}", product.sku)?;
    writeln!(out, "Name:     {}", product.name)?;
    writeln!(out, "Quantity: {}", product.quantity)?;
    writeln!(
        out,
        "Category: {}",
        product.category.as_deref().unwrap_or("-")
    )?;
    writeln!(out, "Created:  {}", product.created_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "Updated:  {}", product.updated_at.format("%Y-%m-%d %H:%M:%S"))?;
    Ok(())
}

/// `products add <sku>`
pub async fn add(
    repo: &ProductRepository,
    sku: &str,
    args: &NewProductArgs,
    low_stock_threshold: i64,
    out: &mut impl Write,
) -> StationResult<()> {
    let new = validate_new_product(sku, &args.name, args.quantity, args.category.as_deref())?;
    let product = repo.insert(&new).await?;

    info!(sku = %product.sku, "Product added");
    writeln!(out, "Added {}", product_row(&product, low_stock_threshold))?;
    Ok(())
}

/// `products update <sku>`
pub async fn update(
    repo: &ProductRepository,
    sku: &str,
    args: &UpdateProductArgs,
    low_stock_threshold: i64,
    out: &mut impl Write,
) -> StationResult<()> {
    let existing = repo.require_by_sku(sku).await?;

    let category = match args.category.as_deref() {
        Some(raw) => validate_category(Some(raw))?,
        None => existing.category.clone(),
    };
    let new = validate_new_product(
        args.new_sku.as_deref().unwrap_or(&existing.sku),
        args.name.as_deref().unwrap_or(&existing.name),
        args.quantity.unwrap_or(existing.quantity),
        category.as_deref(),
    )?;

    let product = repo.update(&existing.id, &new).await?;

    info!(id = %product.id, sku = %product.sku, "Product updated");
    writeln!(out, "Updated {}", product_row(&product, low_stock_threshold))?;
    Ok(())
}

/// `products adjust <sku> <delta>`
pub async fn adjust(
    repo: &ProductRepository,
    sku: &str,
    delta: i64,
    out: &mut impl Write,
) -> StationResult<()> {
    let existing = repo.require_by_sku(sku).await?;
    let product = repo.adjust_quantity(&existing.id, delta).await?;

    info!(sku = %product.sku, delta, quantity = product.quantity, "Quantity adjusted");
    writeln!(
        out,
        "{}: {} -> {}",
        product.sku, existing.quantity, product.quantity
    )?;
    Ok(())
}

/// `products delete <sku>`
pub async fn delete(
    repo: &ProductRepository,
    sku: &str,
    out: &mut impl Write,
) -> StationResult<()> {
    let sku = normalize_sku(sku)?;
    let existing = repo.require_by_sku(&sku).await?;
    repo.delete(&existing.id).await?;

    info!(sku = %sku, "Product deleted");
    writeln!(out, "Deleted {}", sku)?;
    Ok(())
}

/// `low-stock`
pub async fn low_stock(
    repo: &ProductRepository,
    threshold: i64,
    out: &mut impl Write,
) -> StationResult<()> {
    let products = repo.low_stock(threshold).await?;

    if products.is_empty() {
        writeln!(out, "No products below {}", threshold)?;
        return Ok(());
    }
    for product in &products {
        writeln!(out, "{}", product_row(product, threshold))?;
    }
    writeln!(out, "{} products below {}", products.len(), threshold)?;
    Ok(())
}

/// `summary`
pub async fn summary(
    repo: &ProductRepository,
    threshold: i64,
    out: &mut impl Write,
) -> StationResult<()> {
    let summary = repo.summary(threshold).await?;

    writeln!(out, "Products:   {}", summary.product_count)?;
    writeln!(out, "Units:      {}", summary.total_units)?;
    writeln!(out, "Categories: {}", summary.category_count)?;
    writeln!(out, "Low stock:  {} (below {})", summary.low_stock_count, threshold)?;
    Ok(())
}
