//! Cart and order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::catalog::Product;
use crate::pricing::OrderTotals;

/// A (user, product, quantity) tuple. Quantity is always at least 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

/// A cart item joined with its product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.item.quantity)
    }
}

/// Sum of line totals for a cart.
pub fn cart_subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Processing,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(OrderStatus::Processing),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("invalid order status: '{other}'")),
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("invalid payment status: '{other}'")),
        }
    }
}

/// A line of an order, with the unit price captured at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// A placed order. Immutable after creation except for status transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// `ORD-YYYYMMDD-NNNN`, unique within the store.
    pub order_number: String,
    pub user_id: i64,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub shipping_address: String,
    pub billing_address: String,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            tax: self.tax,
            shipping: self.shipping,
            discount: self.discount,
            final_amount: self.final_amount,
        }
    }

    /// Orders that still have a delivery in flight.
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Processing | OrderStatus::Shipped)
    }
}

/// Everything the store needs to create an order from a cart.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
}

impl NewOrder {
    /// Whether `claimed` (product id, quantity) pairs are exactly this
    /// order's cart lines, in any order.
    pub fn matches_cart(&self, claimed: &[(i64, i64)]) -> bool {
        let mut expected: Vec<(i64, i64)> = self
            .lines
            .iter()
            .map(|line| (line.item.product_id, line.item.quantity))
            .collect();
        let mut claimed = claimed.to_vec();
        expected.sort_unstable();
        claimed.sort_unstable();
        !expected.is_empty() && expected == claimed
    }
}

/// Payment method used when a checkout request names none.
pub const DEFAULT_PAYMENT_METHOD: &str = "credit_card";

/// Customer-supplied checkout details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    /// Defaults to the shipping address.
    #[serde(default)]
    pub billing_address: Option<String>,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    /// Apply the loyalty balance as a discount.
    #[serde(default)]
    pub redeem_points: bool,
}

fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}

/// Result of a settled checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub transaction_id: String,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub loyalty_balance: i64,
}

/// A cart with its computed totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub user_id: i64,
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
}

/// Format an order number from its date and daily sequence.
pub fn format_order_number(date: chrono::NaiveDate, seq: i64) -> String {
    format!("ORD-{}-{:04}", date.format("%Y%m%d"), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(format_order_number(date, 7), "ORD-20260309-0007");
        assert_eq!(format_order_number(date, 12345), "ORD-20260309-12345");
    }

    fn line(product_id: i64, quantity: i64) -> CartLine {
        CartLine {
            item: CartItem {
                id: product_id,
                user_id: 1,
                product_id,
                quantity,
                added_at: Utc::now(),
            },
            product: Product {
                id: product_id,
                name: format!("Product {product_id}"),
                description: String::new(),
                category: "dresses".into(),
                occasion: "casual".into(),
                price: Decimal::new(50, 0),
                stock: 10,
                material: None,
                sizes: Vec::new(),
                colors: Vec::new(),
                featured: false,
                image_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    fn order_for(lines: Vec<CartLine>) -> NewOrder {
        NewOrder {
            user_id: 1,
            totals: OrderTotals::compute(cart_subtotal(&lines), Decimal::ZERO),
            lines,
            shipping_address: "1 Main St".into(),
            billing_address: "1 Main St".into(),
            payment_method: DEFAULT_PAYMENT_METHOD.into(),
        }
    }

    #[test]
    fn test_claimed_cart_must_match_order_lines() {
        let order = order_for(vec![line(3, 1), line(7, 2)]);
        assert!(order.matches_cart(&[(7, 2), (3, 1)]));
        assert!(!order.matches_cart(&[(3, 1)]));
        assert!(!order.matches_cart(&[(3, 1), (7, 3)]));
        assert!(!order.matches_cart(&[]));
        assert!(!order_for(Vec::new()).matches_cart(&[]));
    }

    #[test]
    fn test_checkout_request_defaults() {
        let request: CheckoutRequest =
            serde_json::from_str(r#"{"shipping_address": "1 Main St"}"#).unwrap();
        assert_eq!(request.payment_method, "credit_card");
        assert!(request.billing_address.is_none());
        assert!(!request.redeem_points);
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(OrderStatus::default(), OrderStatus::Processing);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<PaymentStatus>().is_err());
    }
}
