//! Background tasks.
//!
//! Long-running work spawned via `tokio::spawn`. Tasks stop on a
//! [`tokio_util::sync::CancellationToken`] so shutdown is graceful.

pub mod scheduler;

pub use scheduler::Scheduler;
