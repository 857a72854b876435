//! # Catalog Seed
//!
//! Populates the database with sample products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p crm-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p crm-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p crm-db --bin seed -- --db ./data/crm.db
//! ```
//!
//! Each product gets a fresh GUID, a name of the form `{base} {variant}`,
//! a price between $4.99 and $239.98 and a stock level between 0 and 120.

use std::env;

use crm_core::{Product, ProductDraft};
use crm_db::{Database, DbConfig};

/// Catalog categories with their base product names.
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Electronics",
        &[
            "Wireless Mouse",
            "Mechanical Keyboard",
            "USB-C Hub",
            "Noise Cancelling Headphones",
            "Webcam",
            "Portable SSD",
            "Bluetooth Speaker",
            "Monitor Arm",
        ],
    ),
    (
        "Office Supplies",
        &[
            "Ballpoint Pens",
            "Sticky Notes",
            "Spiral Notebook",
            "Desk Organizer",
            "Stapler",
            "Whiteboard Markers",
            "File Folders",
            "Paper Shredder",
        ],
    ),
    (
        "Furniture",
        &[
            "Ergonomic Chair",
            "Standing Desk",
            "Bookshelf",
            "Filing Cabinet",
            "Desk Lamp",
            "Footrest",
        ],
    ),
    (
        "Software",
        &[
            "Antivirus Licence",
            "Office Suite",
            "Photo Editor",
            "Backup Service",
            "Password Manager",
        ],
    ),
    (
        "Accessories",
        &[
            "Laptop Sleeve",
            "Cable Organizer",
            "Mouse Pad",
            "Screen Cleaner",
            "Phone Stand",
            "Travel Adapter",
        ],
    ),
];

/// Variants and their price surcharge in cents.
const VARIANTS: &[(&str, i64)] = &[
    ("Basic", 0),
    ("Standard", 500),
    ("Plus", 1500),
    ("Pro", 4000),
    ("Black", 0),
    ("White", 0),
    ("Large", 1000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./crm_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("CRM Catalog Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./crm_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 CRM Catalog Seed");
    println!("===================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

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

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category, names) in CATALOG {
        for name in names.iter() {
            for (variant, surcharge) in VARIANTS {
                if generated >= count {
                    break 'outer;
                }

                let product = match generate_product(category, name, variant, *surcharge, generated)
                {
                    Ok(product) => product,
                    Err(e) => {
                        eprintln!("Skipping {} {}: {}", name, variant, e);
                        continue;
                    }
                };

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }

                generated += 1;

                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());
    println!("  Catalog now holds {} products", db.products().count().await?);

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one validated product. `seed` spreads prices and stock levels.
fn generate_product(
    category: &str,
    name: &str,
    variant: &str,
    surcharge: i64,
    seed: usize,
) -> Result<Product, crm_core::ValidationError> {
    // $4.99 - $199.97 before the variant surcharge
    let base_price = 499 + ((seed * 37) % 19_500) as i64;

    Product::create(ProductDraft {
        name: format!("{} {}", name, variant),
        description: format!("{} {} from the {} range", variant, name, category),
        price_cents: base_price + surcharge,
        stock_quantity: (seed % 121) as i64,
        category: category.to_string(),
    })
}
