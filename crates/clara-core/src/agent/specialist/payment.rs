//! Payment agent: cart summary and accepted payment methods.

use std::fmt::Write;

use clara_types::agent::UserContext;
use clara_types::commerce::cart_subtotal;
use clara_types::error::AgentError;
use clara_types::pricing::OrderTotals;
use rust_decimal::Decimal;

use crate::repository::Store;

pub const PAYMENT_METHODS: &[&str] = &[
    "Credit Card",
    "PayPal",
    "Apple Pay",
    "Google Pay",
    "Store Credit",
];

pub async fn handle<S: Store>(
    store: &S,
    _message: &str,
    context: &UserContext,
) -> Result<String, AgentError> {
    let Some(user_id) = context.user_id else {
        return Ok("I need to know who you are to process payment. \
                   Please sign in or share your account details."
            .to_string());
    };

    let lines = store.get_cart(user_id).await?;
    if lines.is_empty() {
        return Ok("Your cart is empty. Please add items before checkout.".to_string());
    }

    let totals = OrderTotals::with_loyalty(
        cart_subtotal(&lines),
        context.loyalty_points.unwrap_or(0),
    );

    let mut out = String::from("Here's your order summary:\n\n");
    for line in &lines {
        let _ = writeln!(
            out,
            "- {}x {}: ${}",
            line.item.quantity,
            line.product.name,
            line.line_total()
        );
    }
    let _ = writeln!(out, "\nSubtotal: ${}", totals.subtotal);
    let _ = writeln!(out, "Tax (8%): ${}", totals.tax);
    if totals.shipping.is_zero() {
        out.push_str("Shipping: FREE\n");
    } else {
        let _ = writeln!(out, "Shipping: ${}", totals.shipping);
    }
    if totals.discount > Decimal::ZERO {
        let _ = writeln!(out, "Loyalty Discount: -${}", totals.discount);
    }
    let _ = writeln!(out, "Total: ${}", totals.final_amount);

    let _ = write!(
        out,
        "\nAccepted payment methods: {}.\nSay \"checkout\" when you're ready to complete your purchase.",
        PAYMENT_METHODS.join(", ")
    );
    Ok(out)
}
