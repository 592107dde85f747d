//! Generation request assembly.
//!
//! Pure string building from an [`Episode`] and a script template; the
//! result is handed to whatever implements
//! [`crate::providers::GenerationProvider`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::episode::Episode;
use crate::templates::EpisodeType;

/// Sampling temperature used when the caller does not override it.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Host name used when the sheet leaves the host column blank.
pub const DEFAULT_HOST: &str = "the host";

/// Voice label used when the sheet leaves the voice column blank.
pub const DEFAULT_VOICE: &str = "warm, calm and conversational";

const SCRIPT_SYSTEM_PROMPT: &str = "You are an experienced podcast scriptwriter for a \
trauma-informed mental health show about CPTSD and PTSD recovery. You write complete, \
speakable scripts for a single host. You never give diagnoses, you encourage listeners to \
seek professional support when appropriate, and you avoid graphic descriptions of trauma. \
Write in plain paragraphs without stage directions or bullet lists.";

/// Everything the generation capability needs for one completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

/// Build the script-generation request for `episode` using the template of
/// `episode_type`.
pub fn build_prompt(episode: &Episode, episode_type: EpisodeType) -> GenerationRequest {
    let host = or_default(&episode.host, DEFAULT_HOST);
    let voice = or_default(&episode.voice, DEFAULT_VOICE);
    let sections = episode_type.sections();

    let mut user = String::new();
    let _ = writeln!(
        user,
        "Write a {} podcast episode script of about {} words.",
        episode_type,
        episode_type.target_words()
    );
    let _ = writeln!(user);
    let _ = writeln!(user, "Topic: {}", episode.display_topic());
    if !episode.title.trim().is_empty() {
        let _ = writeln!(user, "Working title: {}", episode.title.trim());
    }
    let _ = writeln!(user, "Host persona: {host}");
    let _ = writeln!(user, "Voice style: {voice}");
    let _ = writeln!(user);
    let _ = writeln!(
        user,
        "Use exactly these {} sections, in this order. Start each one with a line \
         containing only its name as a markdown heading (for example \"## {}\").",
        sections.len(),
        sections[0].name
    );
    for (i, section) in sections.iter().enumerate() {
        let _ = writeln!(
            user,
            "{}. {} (~{} words)",
            i + 1,
            section.name,
            section.target_words
        );
    }
    let _ = writeln!(user);
    let _ = write!(
        user,
        "Do not mention section names anywhere except in their headings. \
         Speak directly to the listener as {host}."
    );

    GenerationRequest {
        system_prompt: SCRIPT_SYSTEM_PROMPT.to_string(),
        user_prompt: user,
        max_tokens: episode_type.max_tokens(),
        temperature: DEFAULT_TEMPERATURE,
    }
}
