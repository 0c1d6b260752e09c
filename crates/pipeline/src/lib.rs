//! Generation-job orchestration: admission, dispatch, polling,
//! aggregation, compensation, and result delivery.
//!
//! The pipeline has no dedicated worker process. It is driven by three
//! independent entry points (a detached continuation spawned after
//! admission, a scheduled poll tick, and manual admin retries), all of
//! which mutate the same job/task rows. No component trusts its own
//! exclusivity: every transition is a conditional single-row update and
//! every insert is existence-checked, so concurrent triggers resolve at
//! the data level instead of through in-process locks.

pub mod aggregator;
pub mod compensation;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod notification;
pub mod poller;
pub mod queue;

pub use aggregator::{Aggregator, Resolution};
pub use compensation::{RefundEngine, RefundOutcome};
pub use config::{PipelineConfig, QueueConfig};
pub use dispatcher::{AdmissionRequest, Dispatcher};
pub use error::{PipelineError, PipelineResult};
pub use notification::{DeliveryReport, Notifier};
pub use poller::{ingest, CycleReport, IngestOutcome, TaskPoller};
pub use queue::{ChunkMessage, QueueClient};
