//! SQLite order repository implementation.
//!
//! `create_order` runs in one transaction on the single-connection writer:
//! it claims the user's cart rows, bumps the per-day counter, inserts the
//! order and its items, and decrements stock with a floor at zero.

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use clara_core::repository::OrderRepository;
use clara_types::commerce::{
    format_order_number, NewOrder, Order, OrderItem, OrderStatus, PaymentStatus,
};
use clara_types::error::RepositoryError;

use super::store::{format_datetime, parse_datetime, parse_decimal, query_err, SqliteStore};

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct OrderRow {
    id: String,
    order_number: String,
    user_id: i64,
    subtotal: String,
    tax: String,
    shipping: String,
    discount: String,
    final_amount: String,
    payment_status: String,
    payment_method: String,
    transaction_id: Option<String>,
    shipping_address: String,
    billing_address: String,
    status: String,
    tracking_number: Option<String>,
    created_at: String,
    updated_at: String,
}

impl OrderRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            order_number: row.try_get("order_number")?,
            user_id: row.try_get("user_id")?,
            subtotal: row.try_get("subtotal")?,
            tax: row.try_get("tax")?,
            shipping: row.try_get("shipping")?,
            discount: row.try_get("discount")?,
            final_amount: row.try_get("final_amount")?,
            payment_status: row.try_get("payment_status")?,
            payment_method: row.try_get("payment_method")?,
            transaction_id: row.try_get("transaction_id")?,
            shipping_address: row.try_get("shipping_address")?,
            billing_address: row.try_get("billing_address")?,
            status: row.try_get("status")?,
            tracking_number: row.try_get("tracking_number")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid order id: {e}")))?;
        let payment_status: PaymentStatus = self
            .payment_status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Order {
            id,
            order_number: self.order_number,
            user_id: self.user_id,
            subtotal: parse_decimal(&self.subtotal)?,
            tax: parse_decimal(&self.tax)?,
            shipping: parse_decimal(&self.shipping)?,
            discount: parse_decimal(&self.discount)?,
            final_amount: parse_decimal(&self.final_amount)?,
            payment_status,
            payment_method: self.payment_method,
            transaction_id: self.transaction_id,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            status,
            tracking_number: self.tracking_number,
            items,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct OrderItemRow {
    product_id: i64,
    product_name: String,
    quantity: i64,
    unit_price: String,
    total_price: String,
}

impl OrderItemRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            total_price: row.try_get("total_price")?,
        })
    }

    fn into_item(self) -> Result<OrderItem, RepositoryError> {
        Ok(OrderItem {
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price: parse_decimal(&self.unit_price)?,
            total_price: parse_decimal(&self.total_price)?,
        })
    }
}

impl SqliteStore {
    async fn order_items(&self, order_id: &str) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM order_items WHERE order_id = ? ORDER BY id ASC")
            .bind(order_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(OrderItemRow::from_row(row).map_err(query_err)?.into_item()?);
        }
        Ok(items)
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Order, RepositoryError> {
        let order_row = OrderRow::from_row(row).map_err(query_err)?;
        let items = self.order_items(&order_row.id).await?;
        order_row.into_order(items)
    }
}

// ---------------------------------------------------------------------------
// OrderRepository implementation
// ---------------------------------------------------------------------------

impl OrderRepository for SqliteStore {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let now = Utc::now();
        let now_str = format_datetime(&now);
        let today = now.date_naive();
        let id = Uuid::now_v7();

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        // Whoever deletes the cart rows owns the checkout. Anything else
        // rolls back when `tx` drops.
        let rows = sqlx::query(
            "DELETE FROM cart_items WHERE user_id = ? RETURNING product_id, quantity",
        )
        .bind(order.user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(query_err)?;
        let mut claimed: Vec<(i64, i64)> = Vec::with_capacity(rows.len());
        for row in &rows {
            claimed.push((
                row.try_get("product_id").map_err(query_err)?,
                row.try_get("quantity").map_err(query_err)?,
            ));
        }
        if !order.matches_cart(&claimed) {
            return Err(RepositoryError::Conflict(format!(
                "cart for user {} changed during checkout",
                order.user_id
            )));
        }

        let seq: i64 = sqlx::query(
            r#"INSERT INTO order_counters (day, last_seq) VALUES (?, 1)
               ON CONFLICT (day) DO UPDATE SET last_seq = last_seq + 1
               RETURNING last_seq"#,
        )
        .bind(today.format("%Y%m%d").to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?
        .try_get("last_seq")
        .map_err(query_err)?;
        let order_number = format_order_number(today, seq);

        sqlx::query(
            r#"INSERT INTO orders (id, order_number, user_id, subtotal, tax, shipping, discount, final_amount,
                                   payment_status, payment_method, transaction_id, shipping_address, billing_address,
                                   status, tracking_number, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, NULL, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(&order_number)
        .bind(order.user_id)
        .bind(order.totals.subtotal.to_string())
        .bind(order.totals.tax.to_string())
        .bind(order.totals.shipping.to_string())
        .bind(order.totals.discount.to_string())
        .bind(order.totals.final_amount.to_string())
        .bind(PaymentStatus::Pending.to_string())
        .bind(&order.payment_method)
        .bind(&order.shipping_address)
        .bind(&order.billing_address)
        .bind(OrderStatus::Processing.to_string())
        .bind(&now_str)
        .bind(&now_str)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        let mut items = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let item = OrderItem {
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                quantity: line.item.quantity,
                unit_price: line.product.price,
                total_price: line.line_total(),
            };

            sqlx::query(
                r#"INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price, total_price)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(id.to_string())
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price.to_string())
            .bind(item.total_price.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

            sqlx::query("UPDATE products SET stock = MAX(stock - ?, 0), updated_at = ? WHERE id = ?")
                .bind(item.quantity)
                .bind(&now_str)
                .bind(item.product_id)
                .execute(&mut *tx)
                .await
                .map_err(query_err)?;

            items.push(item);
        }

        tx.commit().await.map_err(query_err)?;

        Ok(Order {
            id,
            order_number,
            user_id: order.user_id,
            subtotal: order.totals.subtotal,
            tax: order.totals.tax,
            shipping: order.totals.shipping,
            discount: order.totals.discount,
            final_amount: order.totals.final_amount,
            payment_status: PaymentStatus::Pending,
            payment_method: order.payment_method.clone(),
            transaction_id: None,
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
            status: OrderStatus::Processing,
            tracking_number: None,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_orders(&self, user_id: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC, order_number DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(self.hydrate(row).await?);
        }

        Ok(orders)
    }

    async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM orders WHERE order_number = ?")
            .bind(order_number)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn mark_paid(&self, order_id: &Uuid, transaction_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE orders
               SET payment_status = ?, status = ?, transaction_id = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(PaymentStatus::Paid.to_string())
        .bind(OrderStatus::Confirmed.to_string())
        .bind(transaction_id)
        .bind(format_datetime(&Utc::now()))
        .bind(order_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_order_status(
        &self,
        order_id: &Uuid,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(format_datetime(&Utc::now()))
            .bind(order_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
