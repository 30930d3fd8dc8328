//! The per-turn sales pipeline.
//!
//! classify -> build context -> fan out to specialists -> compose -> persist.
//! `Orchestrator` wires the stages together; each stage is usable alone.

pub mod action;
pub mod classifier;
pub mod composer;
pub mod context;
pub mod coordinator;
pub mod fallback;
pub mod orchestrator;
pub mod preferences;
pub mod prompt;
pub mod retrieval;
pub mod specialist;
