//! Cart, checkout, and order CLI commands.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use dialoguer::{Confirm, Input};

use clara_core::repository::{OrderRepository, UserRepository};
use clara_types::commerce::{CartView, CheckoutRequest, OrderStatus};
use clara_types::pricing::OrderTotals;

use crate::state::AppState;

/// Show a customer's cart with totals.
pub async fn show_cart(state: &AppState, user_id: i64, json: bool) -> Result<()> {
    let cart = state.checkout.cart(user_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cart)?);
        return Ok(());
    }

    println!();
    if cart.lines.is_empty() {
        println!("  Cart is empty.");
        println!();
        return Ok(());
    }
    print_cart(&cart);
    println!();
    println!(
        "  Check out with {}",
        style(format!("clara checkout {user_id}")).cyan()
    );
    println!();

    Ok(())
}

/// Add a product to a customer's cart.
pub async fn add_to_cart(
    state: &AppState,
    user_id: i64,
    product_id: i64,
    quantity: i64,
    json: bool,
) -> Result<()> {
    let item = state
        .checkout
        .add_to_cart(user_id, product_id, quantity)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Added {} x product {} (now {} in cart)",
        style("✓").green().bold(),
        quantity,
        style(product_id).cyan(),
        style(item.quantity).bold()
    );
    println!();

    Ok(())
}

/// Place and pay for the order in a customer's cart.
pub async fn checkout(
    state: &AppState,
    user_id: i64,
    request: CheckoutRequest,
    force: bool,
    json: bool,
) -> Result<()> {
    let mut request = request;
    if request.shipping_address.trim().is_empty() {
        request.shipping_address = Input::<String>::new()
            .with_prompt("Shipping address")
            .interact_text()?;
    }
    anyhow::ensure!(
        !request.shipping_address.trim().is_empty(),
        "shipping address must not be empty"
    );

    if !force && !json {
        let cart = state.checkout.cart(user_id).await?;
        println!();
        print_cart(&cart);
        println!();
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Place order for ${:.2} before any loyalty discount?",
                cart.totals.final_amount
            ))
            .default(true)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let spinner = super::spinner("Processing payment...");
    let receipt = state.checkout.checkout(user_id, &request).await;
    spinner.finish_and_clear();
    let receipt = receipt?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    let order = &receipt.order;
    println!();
    println!(
        "  {} Order {} confirmed",
        style("✓").green().bold(),
        style(&order.order_number).cyan().bold()
    );
    println!();
    print_totals(&order.totals());
    println!();
    println!("  {}  {}", style("Transaction:").bold(), style(&receipt.transaction_id).dim());
    println!("  {}  {}", style("Ship to:").bold(), order.shipping_address);
    if receipt.points_redeemed > 0 {
        println!(
            "  {}  -{}",
            style("Points redeemed:").bold(),
            receipt.points_redeemed
        );
    }
    println!(
        "  {}  +{} (balance {})",
        style("Points earned:").bold(),
        style(receipt.points_earned).green(),
        style(receipt.loyalty_balance).bold()
    );
    println!();

    Ok(())
}

/// List a customer's orders, newest first.
pub async fn list_orders(state: &AppState, user_id: i64, json: bool) -> Result<()> {
    state
        .store
        .get_user(user_id)
        .await?
        .with_context(|| format!("user {user_id} not found"))?;
    let orders = state.store.get_orders(user_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&orders)?);
        return Ok(());
    }

    if orders.is_empty() {
        println!();
        println!("  No orders yet.");
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Order").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Payment").fg(Color::White),
        Cell::new("Items").fg(Color::White),
        Cell::new("Total").fg(Color::White),
        Cell::new("Placed").fg(Color::White),
    ]);

    for order in &orders {
        let status_cell = match order.status {
            OrderStatus::Cancelled => Cell::new(order.status).fg(Color::Red),
            OrderStatus::Processing => Cell::new(order.status).fg(Color::Yellow),
            _ => Cell::new(order.status).fg(Color::Green),
        };
        let items: i64 = order.items.iter().map(|i| i.quantity).sum();

        table.add_row(vec![
            Cell::new(&order.order_number).fg(Color::Cyan),
            status_cell,
            Cell::new(order.payment_status),
            Cell::new(items).set_alignment(CellAlignment::Right),
            Cell::new(format!("${:.2}", order.final_amount)).set_alignment(CellAlignment::Right),
            Cell::new(order.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} order{}",
        style(orders.len()).bold(),
        if orders.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn print_cart(cart: &CartView) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Product").fg(Color::White),
        Cell::new("Qty").fg(Color::White),
        Cell::new("Unit").fg(Color::White),
        Cell::new("Line").fg(Color::White),
    ]);

    for line in &cart.lines {
        table.add_row(vec![
            Cell::new(format!("{} (#{})", line.product.name, line.product.id)).fg(Color::Cyan),
            Cell::new(line.item.quantity).set_alignment(CellAlignment::Right),
            Cell::new(format!("${:.2}", line.product.price)).set_alignment(CellAlignment::Right),
            Cell::new(format!("${:.2}", line.line_total())).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{table}");
    println!();
    print_totals(&cart.totals);
}

fn print_totals(totals: &OrderTotals) {
    println!("  Subtotal:  ${:.2}", totals.subtotal);
    println!("  Tax:       ${:.2}", totals.tax);
    println!("  Shipping:  ${:.2}", totals.shipping);
    if !totals.discount.is_zero() {
        println!("  Discount: -${:.2}", totals.discount);
    }
    println!("  {}     {}", style("Total:").bold(), style(format!("${:.2}", totals.final_amount)).bold());
}
