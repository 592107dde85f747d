//! On-disk copies of generated scripts.
//!
//! Each script is written as pretty JSON to
//! `<dir>/<YYYY-MM-DD>-<topic-slug>-<type>.json`. Regenerating the same topic
//! and type on the same day overwrites the earlier file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use podscript_core::episode::Episode;
use podscript_core::script::GeneratedScript;
use podscript_core::seo::SeoMetadata;
use podscript_core::templates::EpisodeType;
use serde::Serialize;

/// Longest slug kept in a file name.
const MAX_SLUG_LEN: usize = 60;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArchivedScript<'a> {
    generated_at: DateTime<Utc>,
    episode: &'a Episode,
    script: &'a GeneratedScript,
    seo: Option<&'a SeoMetadata>,
}

/// Lowercase ASCII slug: alphanumerics kept, every other run of characters
/// collapsed to a single `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let mut slug = slug.trim_end_matches('-').to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        slug.push_str("episode");
    }
    slug
}

pub fn file_name(date: DateTime<Utc>, topic: &str, episode_type: EpisodeType) -> String {
    format!(
        "{}-{}-{}.json",
        date.format("%Y-%m-%d"),
        slugify(topic),
        episode_type.as_str()
    )
}

/// Directory that receives generated scripts.
#[derive(Debug, Clone)]
pub struct ScriptArchive {
    dir: PathBuf,
}

impl ScriptArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one script and return the path it was saved to.
    pub async fn save(
        &self,
        episode: &Episode,
        script: &GeneratedScript,
        seo: Option<&SeoMetadata>,
    ) -> std::io::Result<PathBuf> {
        let now = Utc::now();
        let path = self
            .dir
            .join(file_name(now, episode.display_topic(), script.episode_type));
        let record = ArchivedScript {
            generated_at: now,
            episode,
            script,
            seo,
        };
        let json = serde_json::to_vec_pretty(&record)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}
