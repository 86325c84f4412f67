//! Command line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stockroom_core::ProductSort;

/// Stockroom scan station: inventory catalog and barcode scan console.
#[derive(Debug, Parser)]
#[command(name = "stockroom", version, about)]
pub struct Cli {
    /// Config file (default: platform config dir, station.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file, overrides config and STOCKROOM_DB_PATH
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive scan console
    Scan,

    /// Manage the product catalog
    #[command(subcommand)]
    Products(ProductsCommand),

    /// List products below the low-stock threshold
    LowStock {
        /// Threshold (default from config)
        #[arg(long)]
        threshold: Option<i64>,
    },

    /// Show catalog totals
    Summary,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List products, one page at a time
    List(ListArgs),

    /// Show one product
    Show { sku: String },

    /// Add a product
    Add {
        sku: String,
        #[command(flatten)]
        fields: NewProductArgs,
    },

    /// Change a product's fields; omitted fields keep their value
    Update {
        sku: String,
        #[command(flatten)]
        fields: UpdateProductArgs,
    },

    /// Change a product's quantity by a signed amount
    Adjust {
        sku: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Delete a product
    Delete { sku: String },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page (default from config)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Name or SKU substring
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// name, sku, quantity, created_at or updated_at
    #[arg(long, default_value = "name")]
    pub sort: ProductSort,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(Debug, Args)]
pub struct NewProductArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value_t = 0)]
    pub quantity: i64,

    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateProductArgs {
    /// New SKU
    #[arg(long = "set-sku")]
    pub new_sku: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub quantity: Option<i64>,

    /// New category; an empty value clears it
    #[arg(long)]
    pub category: Option<String>,
}
