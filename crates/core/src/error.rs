//! Domain-level error type shared across crates.

/// Errors produced by domain logic, independent of any transport.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name, e.g. `"job"`.
        entity: &'static str,
        /// The id that was looked up.
        id: i64,
    },

    /// Input failed validation. Always a client error.
    #[error("{0}")]
    Validation(String),

    /// The operation conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// Something went wrong that the caller cannot fix.
    #[error("{0}")]
    Internal(String),
}
