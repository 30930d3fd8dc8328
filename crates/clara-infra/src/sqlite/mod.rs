//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools. A single [`store::SqliteStore`] implements
//! every repository trait so it satisfies `clara_core::repository::Store`.

pub mod cart;
pub mod chat;
pub mod order;
pub mod pool;
pub mod product;
pub mod store;
pub mod user;
