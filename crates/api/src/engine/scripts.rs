//! Episode lookup and script generation.
//!
//! [`ScriptService`] ties the spreadsheet and generation capabilities to the
//! pure pipeline in `podscript_core`: fetch rows, infer columns, select
//! episodes, build the prompt, generate, parse, and optionally add SEO
//! metadata, archive the result and write the status back.

use std::path::PathBuf;
use std::sync::Arc;

use podscript_core::columns::{infer_columns, ColumnMap, Field};
use podscript_core::episode::{self, Episode, GENERATED_STATUS};
use podscript_core::error::CoreError;
use podscript_core::prompt::build_prompt;
use podscript_core::providers::{GenerationProvider, SheetInfo, SpreadsheetProvider, Usage};
use podscript_core::script::{parse_script, GeneratedScript};
use podscript_core::seo::{build_seo_prompt, parse_seo, SeoMetadata};
use podscript_core::templates::EpisodeType;
use serde::Serialize;

use crate::engine::archive::ScriptArchive;

/// Spreadsheet metadata plus the columns resolved from its header row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetOverview {
    #[serde(flatten)]
    pub info: SheetInfo,
    pub range: String,
    pub data_rows: usize,
    pub columns: ColumnMap,
}

/// Everything produced for one episode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub episode: Episode,
    pub script: GeneratedScript,
    pub seo: Option<SeoMetadata>,
    /// No section heading was recognised in the model output.
    pub degraded: bool,
    pub usage: Usage,
    pub archived_to: Option<String>,
    pub marked_processed: bool,
}

/// One requested item of a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub topic: String,
    pub episode_type: EpisodeType,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub topic: String,
    pub error: String,
}

/// Result of a batch; items fail independently.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<GenerationOutcome>,
    pub errors: Vec<BatchFailure>,
}

pub struct ScriptService {
    sheets: Arc<dyn SpreadsheetProvider>,
    llm: Arc<dyn GenerationProvider>,
    range: String,
    temperature: f32,
    archive: Option<ScriptArchive>,
}

impl ScriptService {
    pub fn new(
        sheets: Arc<dyn SpreadsheetProvider>,
        llm: Arc<dyn GenerationProvider>,
        range: String,
        temperature: f32,
        archive_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            sheets,
            llm,
            range,
            temperature,
            archive: archive_dir.map(ScriptArchive::new),
        }
    }

    // ---- reads ----

    /// Fetch the configured range and resolve its header.
    async fn read_sheet(&self) -> Result<(Vec<Vec<String>>, ColumnMap), CoreError> {
        let rows = self.sheets.get_rows(&self.range).await?;
        let columns = match rows.first() {
            Some(header) => infer_columns(header.as_slice()),
            None => ColumnMap::default(),
        };
        Ok((rows, columns))
    }

    pub async fn describe_sheet(&self) -> Result<SheetOverview, CoreError> {
        let info = self.sheets.describe().await?;
        let (rows, columns) = self.read_sheet().await?;
        Ok(SheetOverview {
            info,
            range: self.range.clone(),
            data_rows: rows.len().saturating_sub(1),
            columns,
        })
    }

    /// Every non-blank data row, unfiltered.
    pub async fn all_episodes(&self) -> Result<Vec<Episode>, CoreError> {
        let (rows, columns) = self.read_sheet().await?;
        Ok(episode::map_all(&rows, &columns))
    }

    /// Mental-health CPTSD/PTSD episodes.
    pub async fn relevant_episodes(&self) -> Result<Vec<Episode>, CoreError> {
        let (rows, columns) = self.read_sheet().await?;
        let episodes = episode::select_relevant(&rows, &columns)?;
        tracing::debug!(count = episodes.len(), "Selected relevant episodes");
        Ok(episodes)
    }

    pub async fn upcoming_episodes(&self, limit: usize) -> Result<Vec<Episode>, CoreError> {
        let episodes = self.relevant_episodes().await?;
        Ok(episode::upcoming(&episodes, limit))
    }

    pub async fn find_episode(&self, topic: &str) -> Result<Episode, CoreError> {
        let episodes = self.relevant_episodes().await?;
        episode::find_by_topic(&episodes, topic).cloned()
    }

    // ---- generation ----

    /// Generate a script for the first relevant episode matching `topic`.
    pub async fn generate_for_topic(
        &self,
        topic: &str,
        episode_type: EpisodeType,
        include_seo: bool,
        mark_processed: bool,
    ) -> Result<GenerationOutcome, CoreError> {
        if topic.trim().is_empty() {
            return Err(CoreError::Validation("topic must not be empty".to_string()));
        }
        let episode = self.find_episode(topic).await?;
        let mut outcome = self.generate_episode(&episode, episode_type, include_seo).await?;

        if mark_processed {
            match self.mark_generated(&episode).await {
                Ok(_) => outcome.marked_processed = true,
                Err(e) => {
                    tracing::warn!(
                        topic = %episode.display_topic(),
                        error = %e,
                        "Script generated but status write-back failed"
                    );
                }
            }
        }
        Ok(outcome)
    }

    /// Run the generation pipeline for an already-resolved episode.
    pub async fn generate_episode(
        &self,
        episode: &Episode,
        episode_type: EpisodeType,
        include_seo: bool,
    ) -> Result<GenerationOutcome, CoreError> {
        let topic = episode.display_topic();
        tracing::info!(%topic, episode_type = %episode_type, "Generating script");

        let request = build_prompt(episode, episode_type).with_temperature(self.temperature);
        let completion = self.llm.complete(&request).await.map_err(|e| {
            tracing::error!(%topic, operation = "script", error = %e, "Generation failed");
            e
        })?;
        let mut usage = completion.usage;

        let script = parse_script(&completion.text, episode_type);
        let degraded = script.is_degraded();
        if degraded {
            tracing::warn!(
                %topic,
                chars = script.full_text.len(),
                "No section headings recognised in generated script"
            );
        }

        let seo = if include_seo {
            let seo_completion = self
                .llm
                .complete(&build_seo_prompt(episode, &script))
                .await
                .map_err(|e| {
                    tracing::error!(%topic, operation = "seo", error = %e, "Generation failed");
                    e
                })?;
            usage.input_tokens += seo_completion.usage.input_tokens;
            usage.output_tokens += seo_completion.usage.output_tokens;
            Some(parse_seo(&seo_completion.text)?)
        } else {
            None
        };

        let archived_to = match &self.archive {
            Some(archive) => match archive.save(episode, &script, seo.as_ref()).await {
                Ok(path) => Some(path.display().to_string()),
                Err(e) => {
                    tracing::warn!(
                        %topic,
                        dir = %archive.dir().display(),
                        error = %e,
                        "Failed to archive generated script"
                    );
                    None
                }
            },
            None => None,
        };

        tracing::info!(
            %topic,
            sections = script.sections.len(),
            total_words = script.total_words,
            output_tokens = usage.output_tokens,
            "Script generated"
        );

        Ok(GenerationOutcome {
            episode: episode.clone(),
            script,
            seo,
            degraded,
            usage,
            archived_to,
            marked_processed: false,
        })
    }

    /// Generate each item in order; a failing item is recorded and the
    /// batch moves on.
    pub async fn generate_batch(
        &self,
        items: &[BatchItem],
        include_seo: bool,
    ) -> Result<BatchReport, CoreError> {
        let episodes = self.relevant_episodes().await?;
        let mut report = BatchReport {
            successful: 0,
            failed: 0,
            results: Vec::with_capacity(items.len()),
            errors: Vec::new(),
        };

        for item in items {
            let result = match episode::find_by_topic(&episodes, &item.topic) {
                Ok(episode) => self.generate_episode(episode, item.episode_type, include_seo).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(outcome) => {
                    report.successful += 1;
                    report.results.push(outcome);
                }
                Err(e) => {
                    tracing::warn!(topic = %item.topic, error = %e, "Batch item failed");
                    report.failed += 1;
                    report.errors.push(BatchFailure {
                        topic: item.topic.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            successful = report.successful,
            failed = report.failed,
            "Batch generation finished"
        );
        Ok(report)
    }

    // ---- write-back ----

    /// Set the status cell of `episode` to [`GENERATED_STATUS`].
    ///
    /// The row is located again on a fresh read so the write lands on the
    /// right row even if rows moved since `episode` was fetched (see
    /// [`resolve_row`]). Returns the 1-based row written.
    pub async fn mark_generated(&self, episode: &Episode) -> Result<usize, CoreError> {
        let (rows, columns) = self.read_sheet().await?;
        let status_column = columns.get(Field::Status).ok_or_else(|| {
            CoreError::Validation("spreadsheet has no status column to write to".to_string())
        })?;

        let current = episode::map_all(&rows, &columns);
        let row_index = resolve_row(&current, episode)?;

        if row_index != episode.row_index {
            tracing::info!(
                topic = %episode.display_topic(),
                fetched_row = episode.row_index,
                current_row = row_index,
                "Episode row moved since it was fetched"
            );
        }

        self.sheets
            .update_cell(row_index, status_column, GENERATED_STATUS)
            .await?;
        Ok(row_index)
    }
}

/// Row of `episode` in a fresh read of the sheet.
///
/// Rows are identified by trimmed topic and title plus the processed state
/// seen at fetch time, so a duplicate that is already `Generated` never stands
/// in for a pending one. The fetched `row_index` is kept while that row still
/// matches. Otherwise the episode must have moved and exactly one row may
/// match; several candidates leave the target ambiguous and nothing is
/// written.
fn resolve_row(current: &[Episode], episode: &Episode) -> Result<usize, CoreError> {
    let same_row = |e: &Episode| {
        e.topic.trim() == episode.topic.trim()
            && e.title.trim() == episode.title.trim()
            && e.processed == episode.processed
    };

    if current
        .iter()
        .any(|e| e.row_index == episode.row_index && same_row(e))
    {
        return Ok(episode.row_index);
    }

    let candidates: Vec<usize> = current
        .iter()
        .filter(|e| same_row(e))
        .map(|e| e.row_index)
        .collect();
    match candidates.as_slice() {
        [row_index] => Ok(*row_index),
        [] => Err(CoreError::NotFound(format!(
            "row for '{}' is no longer in the spreadsheet",
            episode.display_topic()
        ))),
        _ => Err(CoreError::Validation(format!(
            "rows {candidates:?} all match '{}'; not writing status",
            episode.display_topic()
        ))),
    }
}
