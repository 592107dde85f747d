//! Splitting generated text into template sections.
//!
//! Section detection is a substring heuristic: a line opens a section if it
//! contains (case-insensitively) the name of any section in the template,
//! wherever that name appears in the line. A prose sentence that happens to
//! mention "the science" or "closing" therefore starts a new section. Callers
//! rely on this lenient matching (models do not format headings
//! consistently), so tightening it to heading-prefix detection is a behavior
//! change, not a fix.

use serde::Serialize;

use crate::templates::{EpisodeType, SectionTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSection {
    pub name: String,
    pub content: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedScript {
    pub episode_type: EpisodeType,
    pub sections: Vec<ScriptSection>,
    /// Sum of section word counts. Text outside recognised sections is not
    /// counted, so this can be lower than a word count of `full_text`.
    pub total_words: usize,
    pub full_text: String,
}

impl GeneratedScript {
    /// True when no section heading was recognised in the response.
    pub fn is_degraded(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Whitespace-separated token count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn matching_section(line: &str, templates: &[SectionTemplate]) -> Option<&'static str> {
    let lowered = line.to_lowercase();
    templates
        .iter()
        .find(|t| lowered.contains(&t.name.to_lowercase()))
        .map(|t| t.name)
}

struct OpenSection {
    name: &'static str,
    body: String,
}

impl OpenSection {
    fn close(self) -> ScriptSection {
        let content = self.body.trim_end().to_string();
        let word_count = count_words(&content);
        ScriptSection {
            name: self.name.to_string(),
            content,
            word_count,
        }
    }
}

/// Split `raw` into the sections of `episode_type`.
///
/// Heading lines are not part of any section body; lines before the first
/// heading are dropped. A response with no recognisable heading yields zero
/// sections and `total_words == 0`.
pub fn parse_script(raw: &str, episode_type: EpisodeType) -> GeneratedScript {
    let templates = episode_type.sections();
    let mut sections = Vec::new();
    let mut current: Option<OpenSection> = None;

    for line in raw.lines() {
        if let Some(name) = matching_section(line, templates) {
            if let Some(open) = current.take() {
                sections.push(open.close());
            }
            current = Some(OpenSection {
                name,
                body: String::new(),
            });
        } else if let Some(open) = current.as_mut() {
            open.body.push_str(line);
            open.body.push('\n');
        }
    }
    if let Some(open) = current.take() {
        sections.push(open.close());
    }

    let total_words = sections.iter().map(|s| s.word_count).sum();
    GeneratedScript {
        episode_type,
        sections,
        total_words,
        full_text: raw.to_string(),
    }
}
