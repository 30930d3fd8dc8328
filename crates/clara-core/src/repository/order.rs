//! Order repository trait definition.

use clara_types::commerce::{NewOrder, Order, OrderStatus};
use clara_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for orders.
pub trait OrderRepository: Send + Sync {
    /// Create an order from the user's cart lines, consuming the cart.
    ///
    /// The cart rows are removed, the order number allocated and stock
    /// decremented atomically with the insert. If the stored cart no longer
    /// holds exactly `order.lines` (another checkout claimed it, or it was
    /// edited since it was read) nothing is written and the call fails
    /// with `RepositoryError::Conflict`.
    fn create_order(
        &self,
        order: &NewOrder,
    ) -> impl std::future::Future<Output = Result<Order, RepositoryError>> + Send;

    /// All orders for a user, newest first.
    fn get_orders(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// Look up an order by its human-readable number.
    fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> impl std::future::Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Record a settled payment and confirm the order.
    fn mark_paid(
        &self,
        order_id: &Uuid,
        transaction_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Move an order to a new status.
    fn update_order_status(
        &self,
        order_id: &Uuid,
        status: OrderStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
