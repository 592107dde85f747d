//! Episode records and selection rules.
//!
//! An [`Episode`] is a resolved view of one spreadsheet row. Episodes are
//! rebuilt from the sheet on every fetch; `id` is only an ordinal within one
//! result set and `row_index` is only valid until the sheet is edited.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::columns::{ColumnMap, Field};
use crate::dates::parse_sheet_date;
use crate::error::CoreError;

/// Status values (compared case-insensitively) that mark a row as done.
pub const PROCESSED_STATUSES: &[&str] = &["yes", "true", "done", "complete", "finished", "generated"];

/// Category substrings that mark a row as mental-health content.
pub const CATEGORY_SYNONYMS: &[&str] = &["mental health", "mental-health", "mentalhealth"];

/// Title substrings that mark a row as CPTSD/PTSD content.
pub const TITLE_SYNONYMS: &[&str] = &["c-ptsd", "cptsd", "ptsd recovery", "ptsd"];

/// Title substring used when the strict category + title filter finds nothing.
pub const FALLBACK_TITLE_TERM: &str = "ptsd";

/// Value written to the status cell after a script is generated.
pub const GENERATED_STATUS: &str = "Generated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: usize,
    pub category: String,
    pub title: String,
    pub topic: String,
    pub demand: String,
    pub supply: String,
    pub voice: String,
    pub host: String,
    pub main_day: String,
    pub bonus_day: String,
    pub bonus_name: String,
    pub status: String,
    pub date: Option<NaiveDate>,
    pub processed: bool,
    pub row_index: usize,
}

impl Episode {
    /// Build an episode from a data row using the resolved column map.
    pub fn from_row<S: AsRef<str>>(
        id: usize,
        row: &[S],
        columns: &ColumnMap,
        row_index: usize,
    ) -> Self {
        let text = |field: Field| columns.cell(row, field).to_string();
        let status = text(Field::Status);
        Self {
            id,
            category: text(Field::Category),
            title: text(Field::Title),
            topic: text(Field::Topic),
            demand: text(Field::Demand),
            supply: text(Field::Supply),
            voice: text(Field::Voice),
            host: text(Field::Host),
            main_day: text(Field::Main),
            bonus_day: text(Field::Bonus),
            bonus_name: text(Field::BonusName),
            date: parse_sheet_date(columns.cell(row, Field::Date)),
            processed: is_processed(&status),
            status,
            row_index,
        }
    }

    pub fn demand_rank(&self) -> u8 {
        demand_rank(&self.demand)
    }

    /// Human-friendly label used in logs and prompts.
    pub fn display_topic(&self) -> &str {
        if self.topic.trim().is_empty() {
            &self.title
        } else {
            &self.topic
        }
    }
}

/// Whether a status cell marks the episode as already generated.
pub fn is_processed(status: &str) -> bool {
    let status = status.trim();
    PROCESSED_STATUSES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(status))
}

/// High(3) > Moderate(2) > Low(1) > anything else(0).
pub fn demand_rank(demand: &str) -> u8 {
    match demand.trim().to_ascii_lowercase().as_str() {
        "high" => 3,
        "moderate" => 2,
        "low" => 1,
        _ => 0,
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|n| haystack.contains(n))
}

/// Data rows (header skipped) paired with their 1-based sheet row number.
fn data_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> impl Iterator<Item = (usize, &Vec<S>)> {
    rows.iter()
        .enumerate()
        .skip(1)
        .map(|(i, row)| (i + 1, row))
}

/// Map every non-blank data row to an [`Episode`] without filtering.
pub fn map_all<S: AsRef<str>>(rows: &[Vec<S>], columns: &ColumnMap) -> Vec<Episode> {
    data_rows(rows)
        .filter(|(_, row)| row.iter().any(|c| !c.as_ref().trim().is_empty()))
        .enumerate()
        .map(|(i, (row_index, row))| Episode::from_row(i + 1, row.as_slice(), columns, row_index))
        .collect()
}

/// Rows whose category is mental-health and whose title is CPTSD/PTSD.
///
/// Falls back to "title contains ptsd" when the strict filter matches
/// nothing, and fails with [`CoreError::NotFound`] if that is empty too.
/// Ids are 1-based ordinals within the returned set.
pub fn select_relevant<S: AsRef<str>>(
    rows: &[Vec<S>],
    columns: &ColumnMap,
) -> Result<Vec<Episode>, CoreError> {
    let strict = |cat: &str, title: &str| {
        contains_any(cat, CATEGORY_SYNONYMS) && contains_any(title, TITLE_SYNONYMS)
    };
    let relaxed = |_: &str, title: &str| contains_any(title, &[FALLBACK_TITLE_TERM]);

    let mut selected = filter_rows(rows, columns, strict);
    if selected.is_empty() {
        selected = filter_rows(rows, columns, relaxed);
    }
    if selected.is_empty() {
        return Err(CoreError::NotFound(
            "no mental-health CPTSD/PTSD episodes found in the spreadsheet".to_string(),
        ));
    }
    Ok(selected)
}

fn filter_rows<S, F>(rows: &[Vec<S>], columns: &ColumnMap, keep: F) -> Vec<Episode>
where
    S: AsRef<str>,
    F: Fn(&str, &str) -> bool,
{
    data_rows(rows)
        .filter(|(_, row)| {
            keep(
                columns.cell(row.as_slice(), Field::Category),
                columns.cell(row.as_slice(), Field::Title),
            )
        })
        .enumerate()
        .map(|(i, (row_index, row))| Episode::from_row(i + 1, row.as_slice(), columns, row_index))
        .collect()
}

/// Ordering used for upcoming candidates:
/// dated before undated, earlier date first, then higher demand.
pub fn compare_upcoming(a: &Episode, b: &Episode) -> Ordering {
    match (a.date, b.date) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(da), Some(db)) => da
            .cmp(&db)
            .then_with(|| b.demand_rank().cmp(&a.demand_rank())),
        (None, None) => b.demand_rank().cmp(&a.demand_rank()),
    }
}

/// Unprocessed episodes ranked by [`compare_upcoming`], at most `limit`.
///
/// The sort is stable, so episodes that compare equal keep sheet order.
pub fn upcoming(episodes: &[Episode], limit: usize) -> Vec<Episode> {
    let mut pending: Vec<Episode> = episodes.iter().filter(|e| !e.processed).cloned().collect();
    pending.sort_by(compare_upcoming);
    pending.truncate(limit);
    pending
}

/// First episode whose topic or title contains `query` (case-insensitive).
/// A blank query matches nothing.
pub fn find_by_topic<'a>(episodes: &'a [Episode], query: &str) -> Result<&'a Episode, CoreError> {
    let needle = query.trim().to_lowercase();
    let not_found = || CoreError::NotFound(format!("no episode matches topic '{}'", query.trim()));
    if needle.is_empty() {
        return Err(not_found());
    }
    episodes
        .iter()
        .find(|e| e.topic.to_lowercase().contains(&needle) || e.title.to_lowercase().contains(&needle))
        .ok_or_else(not_found)
}
