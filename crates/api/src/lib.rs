//! HTTP trigger surface for the generation pipeline.
//!
//! Exposes config, state, error handling, routes, and the router
//! builder so integration tests and the binary entrypoint share them.

pub mod background;
pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;
