//! Request handlers.
//!
//! Handlers delegate to [`crate::engine::ScriptService`] or the scheduler and
//! map errors via [`crate::error::AppError`].

pub mod episodes;
pub mod scheduler;
pub mod scripts;
pub mod sheet;
