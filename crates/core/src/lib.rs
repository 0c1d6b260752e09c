//! Pure domain logic for the photo-generation pipeline.
//!
//! No I/O lives here. Everything in this crate is a plain function or
//! value type shared by the database layer, the pipeline, and the API.

pub mod delivery;
pub mod error;
pub mod outcome;
pub mod polling;
pub mod prompt;
pub mod types;
