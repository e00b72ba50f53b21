//! # Seed Data Generator
//!
//! Populates a database with a small working bakery for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./bakery.db (or BAKERY_DB_PATH)
//! cargo run -p bakery-db --bin seed
//!
//! # Specify database path
//! cargo run -p bakery-db --bin seed -- --db ./data/bakery.db
//!
//! # Print the resulting reports as JSON instead of a table
//! cargo run -p bakery-db --bin seed -- --json
//! ```
//!
//! ## Generated Data
//! - One supplier, a wholesale and a retail client
//! - Flour, sugar, butter and a packaging box
//! - Bread dough and butter dough recipes
//! - Loaf and croissant products (retail prices from default markups)
//! - Two flour receipts and one receipt of everything else
//! - One order already in production, one draft order
//!
//! Prints the stock valuation and order summary at the end.

use bakery_core::catalog::{
    ClientRequest, ComponentRequest, ContactRequest, ProductRequest, RecipeItemRequest,
    RecipeRequest,
};
use bakery_core::pricing::{OrderLineRequest, OrderRequest};
use bakery_core::receiving::PurchaseRequest;
use bakery_core::report::{AnalyticsSnapshot, StockValuation};
use bakery_core::{Component, Supplier};
use bakery_db::{Database, DbConfig, DbResult};
use serde::Serialize;
use std::env;
use tracing_subscriber::EnvFilter;

/// `(name, kind, unit)`
const COMPONENTS: &[(&str, &str, &str)] = &[
    ("Flour", "raw_material", "kg"),
    ("Sugar", "raw_material", "kg"),
    ("Butter", "raw_material", "kg"),
    ("Box", "packaging", "pcs"),
];

/// `(component index, quantity, price per unit, transport)`
const RECEIPTS: &[(usize, &str, &str, &str)] = &[
    (0, "100", "10", "50"),
    (0, "50", "9", "0"),
    (1, "40", "6.5", "20"),
    (2, "25", "48", "35"),
    (3, "500", "1.2", "0"),
];

/// Reports printed with `--json`.
#[derive(Serialize)]
struct SeedReport {
    valuation: StockValuation,
    analytics: AnalyticsSnapshot,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env()?;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--json" => json = true,
            "--help" | "-h" => {
                println!("Bakery ERP Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: BAKERY_DB_PATH or ./bakery.db)");
                println!("      --json         Print reports as JSON");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Bakery ERP Seed Data Generator");
    println!("==============================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().list_components().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} components", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    seed(&db).await?;

    let valuation = db.reports().stock_valuation().await?;
    if json {
        let report = SeedReport {
            analytics: db.reports().analytics().await?,
            valuation,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("Stock valuation");
    for line in &valuation.lines {
        println!(
            "  {:<10} {:>8} {:<4} @ {:>8} = {:>10}",
            line.name, line.qty_on_hand, line.unit, line.avg_cost, line.value
        );
    }
    println!("  total value: {}", valuation.total_value);

    let summary = db.reports().order_summary().await?;
    println!();
    println!(
        "Orders: {} ({} draft, {} in production)",
        summary.total_orders, summary.draft, summary.in_production
    );
    println!(
        "  revenue {}  cost of goods {}  profit {}",
        summary.revenue, summary.cost_of_goods, summary.profit
    );

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bakery=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn seed(db: &Database) -> DbResult<()> {
    let catalog = db.catalog();

    let supplier = catalog
        .create_supplier(&ContactRequest {
            name: "Northern Mill".to_string(),
            phone: Some("+1 555 0100".to_string()),
            ..Default::default()
        })
        .await?;

    let shop = catalog
        .create_client(&ClientRequest {
            contact: ContactRequest {
                name: "Corner Shop".to_string(),
                ..Default::default()
            },
            tier: Some("wholesale".to_string()),
        })
        .await?;
    catalog
        .create_client(&ClientRequest {
            contact: ContactRequest {
                name: "Morning Cafe".to_string(),
                email: Some("orders@morning.example".to_string()),
                ..Default::default()
            },
            tier: Some("retail1".to_string()),
        })
        .await?;

    let mut components = Vec::with_capacity(COMPONENTS.len());
    for (name, kind, unit) in COMPONENTS {
        components.push(
            catalog
                .create_component(&ComponentRequest {
                    name: name.to_string(),
                    kind: kind.to_string(),
                    unit: unit.to_string(),
                })
                .await?,
        );
    }
    println!("✓ Created {} components", components.len());

    for (index, quantity, price, transport) in RECEIPTS {
        receive(db, &supplier, &components[*index], quantity, price, transport).await?;
    }
    println!("✓ Recorded {} purchases", RECEIPTS.len());

    let (flour, sugar, butter) = (&components[0], &components[1], &components[2]);

    let bread_dough = catalog
        .create_recipe(&recipe(
            "Bread Dough",
            "10",
            &[(flour, "6"), (sugar, "0.2")],
        ))
        .await?;
    let butter_dough = catalog
        .create_recipe(&recipe(
            "Butter Dough",
            "5",
            &[(flour, "2.5"), (butter, "1.5"), (sugar, "0.5")],
        ))
        .await?;

    let loaf = catalog
        .create_product(&ProductRequest {
            name: "Sandwich Loaf".to_string(),
            code: "loaf-800".to_string(),
            recipe_id: bread_dough.id.clone(),
            box_gross_weight: "8.5".to_string(),
            box_net_weight: "8".to_string(),
            base_price: "95".to_string(),
            retail1_price: None,
            retail2_price: None,
        })
        .await?;
    let croissant = catalog
        .create_product(&ProductRequest {
            name: "Butter Croissant".to_string(),
            code: "CRS-24".to_string(),
            recipe_id: butter_dough.id.clone(),
            box_gross_weight: "2.6".to_string(),
            box_net_weight: "2.4".to_string(),
            base_price: "120".to_string(),
            retail1_price: Some("175".to_string()),
            retail2_price: None,
        })
        .await?;
    println!("✓ Created 2 recipes and 2 products");

    let orders = db.orders();
    let produced = orders
        .create_order(&OrderRequest {
            client_id: shop.id.clone(),
            items: vec![
                OrderLineRequest {
                    product_id: loaf.id.clone(),
                    boxes: 5,
                },
                OrderLineRequest {
                    product_id: croissant.id.clone(),
                    boxes: 4,
                },
            ],
            notes: Some("Friday delivery".to_string()),
        })
        .await?;
    orders
        .create_order(&OrderRequest {
            client_id: shop.id.clone(),
            items: vec![OrderLineRequest {
                product_id: loaf.id.clone(),
                boxes: 2,
            }],
            notes: None,
        })
        .await?;

    let result = db.production().start_production(&produced.id).await?;
    println!(
        "✓ {} in production: cost of goods {}, profit {}",
        result.order.order_number, result.cost_of_goods, result.profit
    );

    Ok(())
}

async fn receive(
    db: &Database,
    supplier: &Supplier,
    component: &Component,
    quantity: &str,
    price: &str,
    transport: &str,
) -> DbResult<()> {
    db.purchases()
        .record_purchase(&PurchaseRequest {
            supplier_id: supplier.id.clone(),
            component_id: component.id.clone(),
            quantity: quantity.to_string(),
            price_per_unit: price.to_string(),
            transport_cost: transport.to_string(),
            ..Default::default()
        })
        .await?;
    Ok(())
}

fn recipe(name: &str, output_weight: &str, items: &[(&Component, &str)]) -> RecipeRequest {
    RecipeRequest {
        name: name.to_string(),
        output_weight: output_weight.to_string(),
        output_unit: "kg".to_string(),
        items: items
            .iter()
            .map(|(component, weight)| RecipeItemRequest {
                component_id: component.id.clone(),
                weight: weight.to_string(),
                unit: component.unit.clone(),
            })
            .collect(),
    }
}
