//! SEO title, tags and show-notes description for a generated script.

use serde::{Deserialize, Serialize};

use crate::episode::Episode;
use crate::error::{CoreError, UpstreamKind};
use crate::prompt::GenerationRequest;
use crate::script::GeneratedScript;

/// Most tags kept from a response.
pub const MAX_TAGS: usize = 15;

/// Characters of the script sent along as context for the description.
const SCRIPT_EXCERPT_CHARS: usize = 4_000;

const SEO_MAX_TOKENS: u32 = 1_024;
const SEO_TEMPERATURE: f32 = 0.4;

const SEO_SYSTEM_PROMPT: &str = "You write podcast metadata. Respond with a single JSON \
object and nothing else.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: String,
}

/// Build the request asking for SEO metadata for a finished script.
pub fn build_seo_prompt(episode: &Episode, script: &GeneratedScript) -> GenerationRequest {
    let excerpt: String = script.full_text.chars().take(SCRIPT_EXCERPT_CHARS).collect();
    let user_prompt = format!(
        "Create SEO metadata for a mental health podcast episode.\n\
         Topic: {topic}\n\
         Working title: {title}\n\
         Episode type: {kind} ({words} words)\n\n\
         Return JSON with exactly these keys:\n\
         {{\"title\": \"under 70 characters\", \"tags\": [\"5 to 15 short tags\"], \
         \"description\": \"150 to 300 word show notes\"}}\n\n\
         Script excerpt:\n{excerpt}",
        topic = episode.display_topic(),
        title = episode.title.trim(),
        kind = script.episode_type,
        words = script.total_words,
    );

    GenerationRequest {
        system_prompt: SEO_SYSTEM_PROMPT.to_string(),
        user_prompt,
        max_tokens: SEO_MAX_TOKENS,
        temperature: SEO_TEMPERATURE,
    }
}

/// Extract the JSON object from an SEO response.
///
/// Models sometimes wrap the object in prose or code fences, so parsing starts
/// at each `{` in turn and the first complete metadata object wins; anything
/// after it is ignored. Strings are trimmed, blank tags dropped, and the tag
/// list capped at [`MAX_TAGS`].
pub fn parse_seo(raw: &str) -> Result<SeoMetadata, CoreError> {
    let invalid = |msg: String| CoreError::upstream("generation", UpstreamKind::InvalidResponse, msg);

    let mut last_error = None;
    let mut parsed = None;
    for (start, _) in raw.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<SeoMetadata>();
        match values.next() {
            Some(Ok(seo)) => {
                parsed = Some(seo);
                break;
            }
            Some(Err(e)) => last_error = Some(e),
            None => {}
        }
    }

    let mut seo = match (parsed, last_error) {
        (Some(seo), _) => seo,
        (None, Some(e)) => {
            return Err(invalid(format!("SEO response was not valid metadata JSON: {e}")))
        }
        (None, None) => return Err(invalid("SEO response contained no JSON object".to_string())),
    };

    seo.title = seo.title.trim().to_string();
    seo.description = seo.description.trim().to_string();
    seo.tags = seo
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect();

    if seo.title.is_empty() {
        return Err(invalid("SEO response had an empty title".to_string()));
    }
    Ok(seo)
}
