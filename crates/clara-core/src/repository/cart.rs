//! Cart repository trait definition.

use clara_types::commerce::{CartItem, CartLine};
use clara_types::error::RepositoryError;

/// Repository trait for shopping carts.
pub trait CartRepository: Send + Sync {
    /// Cart lines for a user, joined with their products, oldest first.
    fn get_cart(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;

    /// Add `quantity` of a product. Repeated additions of the same product
    /// are merged by summing quantities.
    fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> impl std::future::Future<Output = Result<CartItem, RepositoryError>> + Send;

    /// Remove every item from a user's cart.
    fn clear_cart(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
