//! # Station Commands
//!
//! One-shot subcommands of the `stockroom` binary.
//!
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch)
//! └── products.rs  ◄─── products list/show/add/update/adjust/delete,
//!                       low-stock, summary
//! ```
//!
//! `scan` is not here: it lives in [`crate::console`].

pub mod products;

use std::io::Write;

use stockroom_db::ProductRepository;

use crate::cli::ProductsCommand;
use crate::config::StationConfig;
use crate::error::StationResult;

/// Runs one `products` subcommand.
pub async fn run_products(
    repo: &ProductRepository,
    command: &ProductsCommand,
    config: &StationConfig,
    out: &mut impl Write,
) -> StationResult<()> {
    let threshold = config.inventory.low_stock_threshold;
    match command {
        ProductsCommand::List(args) => {
            products::list(repo, args, config.inventory.page_size, threshold, out).await
        }
        ProductsCommand::Show { sku } => products::show(repo, sku, out).await,
        ProductsCommand::Add { sku, fields } => {
            products::add(repo, sku, fields, threshold, out).await
        }
        ProductsCommand::Update { sku, fields } => {
            products::update(repo, sku, fields, threshold, out).await
        }
        ProductsCommand::Adjust { sku, delta } => products::adjust(repo, sku, *delta, out).await,
        ProductsCommand::Delete { sku } => products::delete(repo, sku, out).await,
    }
}
