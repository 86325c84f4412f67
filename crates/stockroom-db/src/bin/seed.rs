//! # Seed Data Generator
//!
//! Populates a catalog with products for development and scan testing.
//!
//! ## Usage
//! ```bash
//! # Generate 100 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount into a specific database
//! cargo run -p stockroom-db --bin seed -- --count 1000 --db ./data/stockroom.db
//! ```
//!
//! ## Generated Products
//! Every SKU is a valid EAN-13 in the `200` in-store prefix range, so printed
//! labels of seeded products scan straight into a station. Quantities cycle
//! through 0..25, which leaves a handful of products in the low-stock report.

use clap::Parser;
use stockroom_core::symbology::mod10_check_digit;
use stockroom_core::NewProduct;
use stockroom_db::{Database, DbConfig};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Sparkling Water",
            "Orange Juice",
            "Apple Juice",
            "Cola",
            "Lemonade",
            "Iced Tea",
            "Cold Brew Coffee",
            "Energy Drink",
        ],
    ),
    (
        "Snacks",
        &[
            "Salted Crisps",
            "Tortilla Chips",
            "Pretzels",
            "Trail Mix",
            "Chocolate Bar",
            "Oat Cookies",
            "Rice Crackers",
            "Gummy Bears",
        ],
    ),
    (
        "Hardware",
        &[
            "Wood Screws",
            "Drywall Anchors",
            "Masking Tape",
            "Cable Ties",
            "Hex Key Set",
            "Wall Hooks",
            "Sandpaper",
            "Wood Glue",
        ],
    ),
    (
        "Office",
        &[
            "Printer Paper",
            "Ballpoint Pens",
            "Sticky Notes",
            "Binder Clips",
            "Highlighters",
            "Envelopes",
            "Stapler",
            "Label Tape",
        ],
    ),
];

/// Size variants for products
const SIZES: &[&str] = &["Small", "Medium", "Large", "Single", "6-Pack", "12-Pack"];

/// Stockroom seed data generator
#[derive(Debug, Parser)]
#[command(name = "seed", version)]
struct Args {
    /// Number of products to generate
    #[arg(short, long, default_value_t = 100)]
    count: usize,

    /// Database file path
    #[arg(short, long, default_value = "./stockroom_dev.db")]
    db: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", args.db);
    println!("Products: {}", args.count);
    println!();

    let db = Database::new(DbConfig::new(&args.db)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    let combinations = CATEGORIES.iter().flat_map(|(category, names)| {
        names
            .iter()
            .flat_map(move |name| SIZES.iter().map(move |size| (*category, *name, *size)))
    });

    for (seq, (category, name, size)) in combinations.take(args.count).enumerate() {
        let product = generate_product(category, name, size, seq);

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
            continue;
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let summary = db.products().summary(stockroom_core::LOW_STOCK_THRESHOLD).await?;
    println!(
        "  {} products, {} low on stock",
        summary.product_count, summary.low_stock_count
    );

    Ok(())
}

/// Generates a single product with a scannable EAN-13 SKU.
fn generate_product(category: &str, name: &str, size: &str, seq: usize) -> NewProduct {
    let data: Vec<u8> = format!("200{:09}", seq)
        .bytes()
        .map(|b| b - b'0')
        .collect();
    let check = mod10_check_digit(&data);
    let sku = format!("200{:09}{}", seq, check);

    NewProduct {
        sku,
        name: format!("{} {}", name, size),
        quantity: (seq % 25) as i64,
        category: Some(category.to_string()),
    }
}
