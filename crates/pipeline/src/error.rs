//! Pipeline-level error type.

use pixora_core::error::CoreError;
use pixora_engine::EngineApiError;
use pixora_payments::PaymentApiError;

use crate::queue::QueueError;

/// Errors surfaced by pipeline entry points.
///
/// Per-unit and per-notification failures are absorbed and recorded
/// where they occur; only errors that invalidate a whole entry-point
/// invocation reach this type.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A domain error: validation failure, missing entity, conflict.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A generation-engine call failed at the transport/API level.
    #[error(transparent)]
    Engine(#[from] EngineApiError),

    /// The durable work queue rejected a publish.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A refund call failed; the payment is left for reconciliation.
    #[error(transparent)]
    Payment(#[from] PaymentApiError),
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = Result<T, PipelineError>;
