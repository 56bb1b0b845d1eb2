//! # Seed Data Generator
//!
//! Populates the database with menu products and driver profiles for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p mesa-db --bin seed
//!
//! # Specify database path
//! cargo run -p mesa-db --bin seed -- --db ./data/mesa.db
//!
//! # Scale the menu (each base item gets size variants)
//! cargo run -p mesa-db --bin seed -- --count 200
//! ```
//!
//! ## Generated Data
//! - Menu products across categories (mains, sides, drinks, desserts),
//!   each with a deterministic price and starting stock
//! - A handful of driver profiles, some on shift and some off

use chrono::Utc;
use std::env;
use uuid::Uuid;

use mesa_core::{DriverProfile, Product, ROLE_DRIVER};
use mesa_db::{Database, DbConfig};

/// Menu categories for realistic development data.
const MENU: &[(&str, &[&str])] = &[
    (
        "MAIN",
        &[
            "Margherita Pizza",
            "Pepperoni Pizza",
            "Pad Thai",
            "Green Curry",
            "Cheeseburger",
            "Veggie Burger",
            "California Roll",
            "Spicy Tuna Roll",
            "Chicken Shawarma",
            "Falafel Wrap",
            "Carbonara",
            "Lasagna",
        ],
    ),
    (
        "SIDE",
        &[
            "Fries",
            "Sweet Potato Fries",
            "Caesar Salad",
            "Greek Salad",
            "Garlic Bread",
            "Spring Rolls",
            "Edamame",
            "Miso Soup",
        ],
    ),
    (
        "DRINK",
        &[
            "Cola",
            "Lemonade",
            "Iced Tea",
            "Sparkling Water",
            "Orange Juice",
            "Thai Iced Tea",
        ],
    ),
    (
        "DESSERT",
        &[
            "Tiramisu",
            "Cheesecake",
            "Mochi Ice Cream",
            "Baklava",
            "Chocolate Lava Cake",
        ],
    ),
];

/// Size variants with price addons in cents.
const SIZES: &[(&str, i64)] = &[("Regular", 0), ("Large", 300), ("Family", 700)];

/// Development drivers: (name, on shift).
const DRIVERS: &[(&str, bool)] = &[
    ("Sam Porter", true),
    ("Robin Vega", true),
    ("Noor Haddad", false),
    ("Ivy Chen", true),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./mesa_dev.db");

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
                println!("Mesa Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Cap on products to generate (default: full menu)");
                println!("  -d, --db <PATH>    Database file path (default: ./mesa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Mesa Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database (runs migrations)
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("Connected, migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products", existing);
        println!("Skipping seed to avoid duplicates.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate products
    println!();
    println!("Generating menu...");

    let mut generated = 0;
    'outer: for (category_idx, (category, items)) in MENU.iter().enumerate() {
        for (item_idx, item_name) in items.iter().enumerate() {
            for (size_name, price_addon) in SIZES.iter() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 100 + item_idx;
                let product = generate_product(category, item_name, size_name, *price_addon, seed);

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }

                generated += 1;
            }
        }
    }

    println!("Generated {} products", generated);

    // Drivers
    println!();
    println!("Generating drivers...");

    let now = Utc::now();
    for (name, on_shift) in DRIVERS {
        let profile = DriverProfile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role: ROLE_DRIVER.to_string(),
            is_available: *on_shift,
            created_at: now,
            updated_at: now,
        };
        db.drivers().insert(&profile).await?;
    }

    let available = db.drivers().list_available().await?;
    println!(
        "Generated {} drivers ({} on shift)",
        DRIVERS.len(),
        available.len()
    );

    println!();
    println!("Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic development data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    // Base price $6.50-$14.49 derived from the seed, plus the size addon
    let base_price = 650 + ((seed * 37) % 800) as i64;
    let price_cents = base_price + price_addon;

    // Starting stock 5-44 units
    let stock = (5 + (seed * 13) % 40) as i64;

    Product {
        id: Uuid::new_v4().to_string(),
        name: format!("{} ({})", name, size),
        description: Some(format!("{} menu item", category)),
        price_cents,
        stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
