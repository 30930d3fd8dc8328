//! Orchestration core and repository trait definitions for Clara.
//!
//! This crate defines the "ports" (repository traits, LLM provider) that the
//! infrastructure layer implements, plus the per-turn pipeline: intent
//! classification, context assembly, specialist fan-out, and reply
//! composition. It depends on `clara-types` (and `clara-observe` for span
//! attribute names) -- never on `clara-infra` or any database/IO crate.

pub mod agent;
pub mod chat;
pub mod commerce;
pub mod llm;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;
