//! Catalog CLI commands: seeding and browsing products.

use anyhow::Result;
use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

use clara_core::repository::ProductRepository;
use clara_infra::seed::{seed_store, SeedCatalog};
use clara_types::catalog::{Product, ProductQuery};

use crate::state::AppState;

/// Load the bundled demo catalog. Safe to run repeatedly.
pub async fn seed(state: &AppState, json: bool) -> Result<()> {
    let catalog = SeedCatalog::bundled()?;

    let spinner = super::spinner("Seeding catalog...");
    let report = seed_store(state.store.as_ref(), &catalog).await;
    spinner.finish_and_clear();
    let report = report?;

    if json {
        let out = serde_json::json!({
            "users_created": report.users_created,
            "users_skipped": report.users_skipped,
            "products_created": report.products_created,
            "products_skipped": report.products_skipped,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} Catalog seeded", style("✓").green().bold());
    println!(
        "  Customers: {} created, {} already present",
        style(report.users_created).bold(),
        report.users_skipped
    );
    println!(
        "  Products:  {} created, {} skipped",
        style(report.products_created).bold(),
        report.products_skipped
    );
    if report.products_skipped > 0 {
        println!(
            "  {}",
            style("Products are only loaded into an empty catalog.").dim()
        );
    }
    println!();

    Ok(())
}

/// List products matching `query` in a table.
pub async fn list_products(state: &AppState, query: ProductQuery, json: bool) -> Result<()> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        anyhow::ensure!(min <= max, "--min-price ({min}) must not exceed --max-price ({max})");
    }

    let products = state.store.search_products(&query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!();
        if query.is_empty() {
            println!(
                "  No products yet. Run {} to load the demo catalog.",
                style("clara seed").cyan()
            );
        } else {
            println!("  No products match those filters.");
        }
        println!();
        return Ok(());
    }

    println!();
    println!("{}", product_table(&products));
    println!();
    println!(
        "  {} product{}",
        style(products.len()).bold(),
        if products.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn product_table(products: &[Product]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Category").fg(Color::White),
        Cell::new("Occasion").fg(Color::White),
        Cell::new("Price").fg(Color::White),
        Cell::new("Stock").fg(Color::White),
    ]);

    for product in products {
        let stock_cell = match product.stock {
            0 => Cell::new("out").fg(Color::Red),
            1..=5 => Cell::new(product.stock).fg(Color::Yellow),
            _ => Cell::new(product.stock).fg(Color::Green),
        };

        table.add_row(vec![
            Cell::new(product.id).fg(Color::DarkGrey),
            Cell::new(&product.name).fg(Color::Cyan),
            Cell::new(&product.category),
            Cell::new(&product.occasion),
            Cell::new(format!("${:.2}", product.price)).set_alignment(CellAlignment::Right),
            stock_cell.set_alignment(CellAlignment::Right),
        ]);
    }

    table
}
