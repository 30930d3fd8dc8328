//! SQLite cart repository implementation.

use chrono::Utc;
use sqlx::Row;

use clara_core::repository::CartRepository;
use clara_types::commerce::{CartItem, CartLine};
use clara_types::error::RepositoryError;

use super::product::ProductRow;
use super::store::{format_datetime, parse_datetime, query_err, SqliteStore};

struct CartItemRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    quantity: i64,
    added_at: String,
}

impl CartItemRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            added_at: row.try_get("added_at")?,
        })
    }

    /// Read the `cart_`-prefixed columns of the cart/product join.
    fn from_joined_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("cart_id")?,
            user_id: row.try_get("cart_user_id")?,
            product_id: row.try_get("cart_product_id")?,
            quantity: row.try_get("cart_quantity")?,
            added_at: row.try_get("cart_added_at")?,
        })
    }

    fn into_item(self) -> Result<CartItem, RepositoryError> {
        Ok(CartItem {
            id: self.id,
            user_id: self.user_id,
            product_id: self.product_id,
            quantity: self.quantity,
            added_at: parse_datetime(&self.added_at)?,
        })
    }
}

impl CartRepository for SqliteStore {
    async fn get_cart(&self, user_id: i64) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT p.*,
                      c.id AS cart_id, c.user_id AS cart_user_id, c.product_id AS cart_product_id,
                      c.quantity AS cart_quantity, c.added_at AS cart_added_at
               FROM cart_items c
               JOIN products p ON p.id = c.product_id
               WHERE c.user_id = ?
               ORDER BY c.id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            let item = CartItemRow::from_joined_row(row).map_err(query_err)?.into_item()?;
            let product = ProductRow::from_row(row).map_err(query_err)?.into_product()?;
            lines.push(CartLine { item, product });
        }

        Ok(lines)
    }

    async fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query(
            r#"INSERT INTO cart_items (user_id, product_id, quantity, added_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (user_id, product_id)
               DO UPDATE SET quantity = quantity + excluded.quantity
               RETURNING *"#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(format_datetime(&Utc::now()))
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => query_err(other),
        })?;

        CartItemRow::from_row(&row).map_err(query_err)?.into_item()
    }

    async fn clear_cart(&self, user_id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(())
    }
}
