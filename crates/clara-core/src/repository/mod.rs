//! Repository trait definitions for the catalog and commerce ledger.
//!
//! Implementations live in clara-infra (e.g., `SqliteStore`). Every trait
//! uses native async fn in traits (RPITIT, Rust 2024 edition).

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;

use crate::chat::repository::ChatRepository;

/// The full backing store handed to every component constructor.
///
/// Blanket-implemented for anything that implements all repository traits,
/// so a single adapter (or test double) can be injected everywhere.
pub trait Store:
    UserRepository
    + ProductRepository
    + CartRepository
    + OrderRepository
    + ChatRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> Store for T where
    T: UserRepository
        + ProductRepository
        + CartRepository
        + OrderRepository
        + ChatRepository
        + Send
        + Sync
        + 'static
{
}
