//! HTTP/REST API layer for Clara.
//!
//! Axum-based REST API with the envelope response format and CORS support.
//! `POST /sales` is the one exception to the envelope: it returns the bare
//! sales reply so chat widgets can consume it directly.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
