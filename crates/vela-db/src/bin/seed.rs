//! # Seed Data Generator
//!
//! Populates a development database with products, restaurant tables and
//! opening stock.
//!
//! ## Usage
//! ```bash
//! # Default database path (./vela_dev.db)
//! cargo run -p vela-db --bin seed
//!
//! # Custom path and product count
//! cargo run -p vela-db --bin seed -- --db ./data/vela.db --count 200
//! ```

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use vela_core::{InventoryTransaction, Product, RestaurantTable, StockMovementType, TableStatus, TaxType, DEFAULT_BUSINESS_ID};
use vela_db::{Database, DbConfig};

/// Menu sections with representative items (name, price cents).
const MENU: &[(&str, &[(&str, i64)])] = &[
    (
        "FOOD",
        &[
            ("Beef Burger", 850),
            ("Chicken Burger", 750),
            ("Margherita Pizza", 1200),
            ("Pepperoni Pizza", 1400),
            ("Club Sandwich", 650),
            ("Caesar Salad", 550),
            ("Chicken Karahi", 1600),
            ("Beef Nihari", 1500),
            ("Chicken Biryani", 900),
            ("French Fries", 300),
        ],
    ),
    (
        "BEV",
        &[
            ("Mineral Water", 100),
            ("Soft Drink Can", 150),
            ("Fresh Lime", 250),
            ("Mango Shake", 400),
            ("Green Tea", 200),
            ("Coffee", 350),
        ],
    ),
    (
        "RETAIL",
        &[
            ("Potato Chips", 250),
            ("Chocolate Bar", 180),
            ("Biscuits Pack", 120),
            ("Instant Noodles", 160),
        ],
    ),
];

/// Tax rates in basis points, cycled across products.
const TAX_RATES: &[(u32, TaxType)] = &[
    (0, TaxType::None),
    (500, TaxType::Gst),
    (800, TaxType::SalesTax),
    (1600, TaxType::Gst),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./vela_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
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
                println!("Vela Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum products to generate (default: all)");
                println!("  -d, --db <PATH>    Database file path (default: ./vela_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Vela Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("Connected, migrations applied");

    let existing = db.products().count(DEFAULT_BUSINESS_ID).await?;
    if existing > 0 {
        println!("Database already has {} products; skipping seed.", existing);
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    // Products with opening stock via receiving movements, so the ledger
    // audit trail starts populated.
    let mut generated = 0usize;
    for (section, items) in MENU {
        for (idx, (name, price_cents)) in items.iter().enumerate() {
            if generated >= count {
                break;
            }

            let (tax_rate_bps, tax_type) = TAX_RATES[(generated) % TAX_RATES.len()];
            let now = Utc::now();
            let product = Product {
                id: Uuid::new_v4().to_string(),
                business_id: DEFAULT_BUSINESS_ID.to_string(),
                sku: format!("{}-{:03}", section, idx + 1),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                cost_cents: Some(price_cents * 6 / 10),
                tax_rate_bps,
                tax_type,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            db.products().insert(&product).await?;

            let opening_stock = 20 + (generated as i64 * 7) % 60;
            db.inventory()
                .record_movement(&InventoryTransaction {
                    id: Uuid::new_v4().to_string(),
                    business_id: DEFAULT_BUSINESS_ID.to_string(),
                    product_id: product.id.clone(),
                    movement_type: StockMovementType::Receiving,
                    quantity: opening_stock,
                    created_by: "seed".to_string(),
                    notes: Some("opening stock".to_string()),
                    created_at: now,
                })
                .await?;
            db.inventory()
                .set_reorder_level(DEFAULT_BUSINESS_ID, &product.id, 10)
                .await?;

            generated += 1;
        }
    }
    println!("Generated {} products with opening stock", generated);

    // Floor plan: 12 tables across two sections.
    for number in 1..=12i64 {
        let section = if number <= 8 { "main" } else { "terrace" };
        db.tables()
            .insert(&RestaurantTable {
                id: Uuid::new_v4().to_string(),
                business_id: DEFAULT_BUSINESS_ID.to_string(),
                number,
                section: Some(section.to_string()),
                seat_capacity: if number % 3 == 0 { 6 } else { 4 },
                status: TableStatus::Available,
                updated_at: Utc::now(),
            })
            .await?;
    }
    println!("Generated 12 tables");

    println!();
    println!("Seed complete!");

    Ok(())
}
