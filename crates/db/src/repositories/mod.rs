//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. State transitions are
//! single-row conditional updates whose `rows_affected()` result tells
//! the caller whether it won the transition.

pub mod avatar_repo;
pub mod job_repo;
pub mod notification_repo;
pub mod payment_repo;
pub mod photo_repo;
pub mod style_repo;
pub mod task_repo;
pub mod user_repo;

pub use avatar_repo::AvatarRepo;
pub use job_repo::JobRepo;
pub use notification_repo::NotificationRepo;
pub use payment_repo::PaymentRepo;
pub use photo_repo::PhotoRepo;
pub use style_repo::StyleRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
