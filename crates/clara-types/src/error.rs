use thiserror::Error;

/// Errors from repository operations (used by trait definitions in clara-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by a specialist agent while handling a message.
///
/// Decoded once by the fan-out coordinator into a labeled output; never
/// surfaced to the end user directly.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("agent task panicked")]
    Panicked,
}

/// Errors related to cart and checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("cannot redeem {requested} points, balance is {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}
