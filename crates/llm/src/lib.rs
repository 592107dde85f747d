//! Anthropic Messages API client.
//!
//! [`AnthropicClient`] implements
//! [`podscript_core::providers::GenerationProvider`]: one system prompt plus
//! one user turn in, the concatenated text blocks and token usage out.

pub mod anthropic;

pub use anthropic::{AnthropicClient, LlmError};
