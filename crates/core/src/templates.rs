//! Fixed script templates.
//!
//! Section names double as the parser's heading vocabulary (see
//! [`crate::script`]), so renaming one changes how generated text is split.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One named, word-count-targeted part of a script template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTemplate {
    pub name: &'static str,
    pub target_words: u32,
}

const fn section(name: &'static str, target_words: u32) -> SectionTemplate {
    SectionTemplate { name, target_words }
}

/// Long-form weekly episode, 9500 words.
pub const MAIN_SECTIONS: &[SectionTemplate] = &[
    section("Cold Open", 500),
    section("Introduction", 800),
    section("Understanding the Topic", 1500),
    section("The Science", 1500),
    section("Personal Stories", 1200),
    section("Practical Strategies", 1800),
    section("Common Pitfalls", 900),
    section("Listener Reflection", 800),
    section("Closing", 500),
];

/// Short-form Friday episode, 3200 words.
pub const FRIDAY_SECTIONS: &[SectionTemplate] = &[
    section("Welcome", 300),
    section("Weekly Check-In", 500),
    section("Topic Spotlight", 900),
    section("Quick Tools", 700),
    section("Community Corner", 500),
    section("Weekend Intention", 300),
];

/// Script template variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    Main,
    Friday,
}

impl EpisodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            EpisodeType::Main => "main",
            EpisodeType::Friday => "friday",
        }
    }

    pub fn sections(self) -> &'static [SectionTemplate] {
        match self {
            EpisodeType::Main => MAIN_SECTIONS,
            EpisodeType::Friday => FRIDAY_SECTIONS,
        }
    }

    pub fn target_words(self) -> u32 {
        self.sections().iter().map(|s| s.target_words).sum()
    }

    /// Output token budget for a full script of this type.
    ///
    /// Roughly 1.5 tokens per English word plus headroom for headings.
    pub fn max_tokens(self) -> u32 {
        match self {
            EpisodeType::Main => 16_000,
            EpisodeType::Friday => 6_000,
        }
    }
}

impl std::str::FromStr for EpisodeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(EpisodeType::Main),
            "friday" => Ok(EpisodeType::Friday),
            other => Err(CoreError::Validation(format!(
                "Invalid episode type '{other}'. Must be one of: main, friday"
            ))),
        }
    }
}

impl std::fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
