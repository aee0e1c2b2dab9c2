//! # Menu Seeder
//!
//! Loads a starter catalog into the register's database for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p comanda-db --bin seed
//!
//! # Specify database path
//! cargo run -p comanda-db --bin seed -- --db ./data/comanda.db
//! ```
//!
//! Seeding is skipped when the catalog already has items.

use std::env;

use comanda_core::{MenuItem, Money};
use comanda_db::{Database, DbConfig};

/// (category, [(name, price, description)])
const MENU: &[(&str, &[(&str, i64, &str)])] = &[
    (
        "Entradas",
        &[
            ("Gyozas de cerdo", 3500, "5 unidades"),
            ("Gyozas vegetarianas", 3300, "5 unidades"),
            ("Sunomono", 2900, ""),
            ("Ceviche de salmón", 5900, "Salmón, cebolla morada, cilantro"),
            ("Edamame", 2500, ""),
        ],
    ),
    (
        "Rolls",
        &[
            ("Acevichado Roll", 6990, "Camarón tempura, palta, salsa acevichada"),
            ("California Roll", 5490, "Kanikama, palta, pepino"),
            ("Avocado Roll", 5990, "Salmón, queso crema, envuelto en palta"),
            ("Tempura Roll", 6490, "Pollo, queso crema, cebollín"),
            ("Sake Roll", 5990, "Salmón, queso crema"),
            ("Veggie Roll", 4990, "Palta, pepino, espárrago"),
        ],
    ),
    (
        "Handrolls",
        &[
            ("Handroll Salmón", 3990, ""),
            ("Handroll Camarón", 3990, ""),
            ("Handroll Pollo", 3490, ""),
        ],
    ),
    (
        "Promociones",
        &[
            ("Promo 30 piezas", 15990, "3 rolls a elección"),
            ("Promo 50 piezas", 24990, "5 rolls a elección"),
        ],
    ),
    (
        "Bebidas",
        &[
            ("Bebida lata", 1500, ""),
            ("Agua mineral", 1200, ""),
            ("Té verde", 1800, ""),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./comanda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Comanda Menu Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./comanda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Comanda Menu Seeder");
    println!("===================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.menu().list_all().await?;
    if !existing.is_empty() {
        println!("⚠ Menu already has {} items", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut inserted = 0;
    for (category, items) in MENU {
        for (name, price, description) in items.iter() {
            let item = MenuItem {
                id: String::new(),
                name: name.to_string(),
                category: category.to_string(),
                price: Money::from_minor(*price),
                description: (!description.is_empty()).then(|| description.to_string()),
            };

            if let Err(e) = db.menu().insert(&item).await {
                eprintln!("Failed to insert {}: {}", item.name, e);
                continue;
            }
            inserted += 1;
        }
    }

    println!();
    println!("✓ Inserted {} menu items", inserted);
    for category in db.menu().categories().await? {
        let count = db.menu().by_category(&category).await?.len();
        println!("  {:<12} {}", category, count);
    }

    db.close().await;
    Ok(())
}
