//! Infrastructure implementations for Clara.
//!
//! Implements the repository traits defined in `clara-core` with SQLite via
//! sqlx, provides the OpenAI-compatible LLM provider, loads `config.toml`
//! and seeds the demo catalog.

pub mod config;
pub mod llm;
pub mod seed;
pub mod sqlite;
