//! Script generation engine.
//!
//! Shared by the HTTP handlers and the daily scheduler: episode lookup,
//! the generate/parse/SEO pipeline, status write-back and the optional
//! on-disk archive of generated scripts.

pub mod archive;
pub mod scripts;

pub use scripts::ScriptService;
