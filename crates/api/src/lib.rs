//! HTTP surface over the stock services.
//!
//! Everything lives under [`app`]: router assembly, request payloads,
//! handlers and the error-to-status mapping. The binary in `main.rs` is a
//! thin wrapper that picks a store and serves the router.

pub mod app;
