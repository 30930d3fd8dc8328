//! HTTP handler modules, one per resource.

pub mod cart;
pub mod orders;
pub mod products;
pub mod sales;
pub mod sessions;
