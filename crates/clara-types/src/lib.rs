//! Shared domain types for Clara.
//!
//! This crate contains the domain types used across the assistant:
//! catalog and commerce records, chat sessions, agent routing types,
//! pricing rules, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, rust_decimal, thiserror.

pub mod agent;
pub mod catalog;
pub mod chat;
pub mod commerce;
pub mod config;
pub mod error;
pub mod llm;
pub mod pricing;
pub mod sales;
