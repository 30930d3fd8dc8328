//! SQLite product repository implementation.
//!
//! Prices are stored as decimal TEXT, so price bounds are applied after the
//! category/occasion filter runs in SQL.

use chrono::Utc;
use sqlx::Row;

use clara_core::repository::ProductRepository;
use clara_types::catalog::{NewProduct, Product, ProductQuery};
use clara_types::error::RepositoryError;

use super::store::{
    format_datetime, format_string_list, parse_datetime, parse_decimal, parse_string_list,
    query_err, SqliteStore,
};

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

pub(crate) struct ProductRow {
    id: i64,
    name: String,
    description: String,
    category: String,
    occasion: String,
    price: String,
    stock: i64,
    material: Option<String>,
    sizes: String,
    colors: String,
    featured: bool,
    image_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ProductRow {
    pub(crate) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            occasion: row.try_get("occasion")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            material: row.try_get("material")?,
            sizes: row.try_get("sizes")?,
            colors: row.try_get("colors")?,
            featured: row.try_get("featured")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub(crate) fn into_product(self) -> Result<Product, RepositoryError> {
        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            occasion: self.occasion,
            price: parse_decimal(&self.price)?,
            stock: self.stock,
            material: self.material,
            sizes: parse_string_list(&self.sizes)?,
            colors: parse_string_list(&self.colors)?,
            featured: self.featured,
            image_url: self.image_url,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ProductRepository implementation
// ---------------------------------------------------------------------------

impl ProductRepository for SqliteStore {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(
                ProductRow::from_row(&row).map_err(query_err)?.into_product()?,
            )),
            None => Ok(None),
        }
    }

    async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM products WHERE 1 = 1");
        if query.category.is_some() {
            sql.push_str(" AND category = ? COLLATE NOCASE");
        }
        if query.occasion.is_some() {
            sql.push_str(" AND occasion = ? COLLATE NOCASE");
        }
        sql.push_str(" ORDER BY id ASC");

        let mut q = sqlx::query(&sql);
        if let Some(ref category) = query.category {
            q = q.bind(category);
        }
        if let Some(ref occasion) = query.occasion {
            q = q.bind(occasion);
        }

        let rows = q
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            let product = ProductRow::from_row(row).map_err(query_err)?.into_product()?;
            if query.matches(&product) {
                products.push(product);
            }
        }

        Ok(products)
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let row = sqlx::query(
            r#"INSERT INTO products (name, description, category, occasion, price, stock, material, sizes, colors, featured, image_url, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.occasion)
        .bind(product.price.to_string())
        .bind(product.stock.max(0))
        .bind(&product.material)
        .bind(format_string_list(&product.sizes))
        .bind(format_string_list(&product.colors))
        .bind(product.featured)
        .bind(&product.image_url)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_err)?;

        ProductRow::from_row(&row).map_err(query_err)?.into_product()
    }

    async fn update_stock(&self, id: i64, qty_delta: i64) -> Result<i64, RepositoryError> {
        let row = sqlx::query(
            r#"UPDATE products
               SET stock = MAX(stock + ?, 0), updated_at = ?
               WHERE id = ?
               RETURNING stock"#,
        )
        .bind(qty_delta)
        .bind(format_datetime(&Utc::now()))
        .bind(id)
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_err)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_get("stock").map_err(query_err)
    }
}
