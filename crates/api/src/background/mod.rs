//! Background tasks spawned by the binary entrypoint.

pub mod poll_loop;
