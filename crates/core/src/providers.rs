//! Seams to the two external capabilities.
//!
//! Implementations live in `podscript-sheets` and `podscript-llm`; tests use
//! in-memory fakes. Implementations convert their own transport errors into
//! [`CoreError::Upstream`] so callers only ever match on core errors.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::prompt::GenerationRequest;

/// Spreadsheet title and tab names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetInfo {
    pub title: String,
    pub tabs: Vec<String>,
}

/// Read/write access to the episode spreadsheet.
#[async_trait]
pub trait SpreadsheetProvider: Send + Sync {
    /// Read a rectangular range as text. Trailing empty cells may be missing,
    /// so rows can be shorter than the header.
    async fn get_rows(&self, range: &str) -> Result<Vec<Vec<String>>, CoreError>;

    /// Overwrite one cell. `row` is the 1-based sheet row and `column` the
    /// zero-based column index, matching [`crate::episode::Episode::row_index`]
    /// and [`crate::columns::ColumnMap`].
    async fn update_cell(&self, row: usize, column: usize, value: &str) -> Result<(), CoreError>;

    async fn describe(&self) -> Result<SheetInfo, CoreError>;
}

/// Token accounting reported by the generation capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Text returned for one [`GenerationRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

/// Large-language-model text completion.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, CoreError>;
}
