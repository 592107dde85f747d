//! Pure domain logic for podscript: spreadsheet schema inference, episode
//! selection, prompt assembly, script parsing, and scheduling rules.
//!
//! Nothing in this crate performs I/O. The spreadsheet and generation
//! capabilities are described by the traits in [`providers`] and implemented
//! by the `podscript-sheets` and `podscript-llm` crates.

pub mod columns;
pub mod dates;
pub mod episode;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod schedule;
pub mod script;
pub mod seo;
pub mod templates;
