//! Observability for Clara: subscriber setup and OTel GenAI attribute names.

pub mod genai_attrs;
pub mod tracing_setup;
