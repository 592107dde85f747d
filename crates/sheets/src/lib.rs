//! Google Sheets v4 client for the episode spreadsheet.
//!
//! [`SheetsApi`] implements [`podscript_core::providers::SpreadsheetProvider`]
//! over the `values` and spreadsheet-metadata endpoints. Requests are
//! authorised either with a static OAuth access token or with a service
//! account key exchanged for short-lived tokens (see [`auth`]).

pub mod a1;
pub mod auth;
pub mod client;

pub use auth::SheetsAuth;
pub use client::{SheetsApi, SheetsError};
