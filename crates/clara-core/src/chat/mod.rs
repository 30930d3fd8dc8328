pub mod repository;
pub mod session;
