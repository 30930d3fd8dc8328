//! Product repository trait definition.

use clara_types::catalog::{NewProduct, Product, ProductQuery};
use clara_types::error::RepositoryError;

/// Repository trait for the product catalog.
pub trait ProductRepository: Send + Sync {
    /// Get a product by id.
    fn get_product(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Search the catalog. An empty query returns every product, ordered by id.
    fn search_products(
        &self,
        query: &ProductQuery,
    ) -> impl std::future::Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Insert a product into the catalog.
    fn create_product(
        &self,
        product: &NewProduct,
    ) -> impl std::future::Future<Output = Result<Product, RepositoryError>> + Send;

    /// Apply `qty_delta` to a product's stock, flooring at zero.
    ///
    /// Returns the new stock level, or `NotFound` for an unknown product.
    fn update_stock(
        &self,
        id: i64,
        qty_delta: i64,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;
}
