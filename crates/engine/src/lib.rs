//! REST client for the external image-generation engine.
//!
//! The engine is a request/response service: a submission returns an
//! asynchronous task handle, and a status check later resolves to a
//! result URL or a failure reason. The engine is treated as unreliable
//! and latent; nothing here assumes ordering or delivery guarantees.

pub mod api;

pub use api::{EngineApi, EngineApiError, GenerationStatus, SubmitResponse};
