//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the writes that component needs

pub mod avatar;
pub mod job;
pub mod notification;
pub mod payment;
pub mod photo;
pub mod status;
pub mod style;
pub mod task;
pub mod user;
