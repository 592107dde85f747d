//! Scheduling rules for the daily generation run.
//!
//! Lives in `core` so the selection logic can be tested without the
//! scheduler task, the clock, or any collaborator.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Months, NaiveDate, Utc};

use crate::episode::{compare_upcoming, Episode};

/// Runs starting this soon after the previous run's start are dropped.
pub const REENTRY_GUARD: Duration = Duration::from_secs(60);

/// Calendar months ahead of today that dated episodes are considered for.
pub const LOOKAHEAD_MONTHS: u32 = 2;

/// Demand rank an undated episode needs to be picked up.
const HIGH_DEMAND: u8 = 3;

/// Whether a run starting `since_last_start` after the previous one should
/// be rejected. The first run (`None`) is always allowed.
pub fn is_reentrant(since_last_start: Option<Duration>) -> bool {
    matches!(since_last_start, Some(elapsed) if elapsed < REENTRY_GUARD)
}

/// Dated episodes must fall in `[today, today + 2 months]`; undated episodes
/// qualify only with High demand. Demand is not consulted for dated
/// episodes.
pub fn in_lookahead(episode: &Episode, today: NaiveDate) -> bool {
    match episode.date {
        Some(date) => {
            let horizon = today
                .checked_add_months(Months::new(LOOKAHEAD_MONTHS))
                .unwrap_or(NaiveDate::MAX);
            date >= today && date <= horizon
        }
        None => episode.demand_rank() == HIGH_DEMAND,
    }
}

/// Episodes the scheduler should generate this run, best first.
///
/// Excludes processed rows and ids already handled by this process, applies
/// the lookahead window, ranks with the upcoming ordering and keeps at most
/// `limit`.
pub fn select_candidates(
    episodes: &[Episode],
    today: NaiveDate,
    already_processed: &HashSet<usize>,
    limit: usize,
) -> Vec<Episode> {
    let mut candidates: Vec<Episode> = episodes
        .iter()
        .filter(|e| !e.processed)
        .filter(|e| !already_processed.contains(&e.id))
        .filter(|e| in_lookahead(e, today))
        .cloned()
        .collect();
    candidates.sort_by(compare_upcoming);
    candidates.truncate(limit);
    candidates
}

/// Next occurrence of `hour`:00 UTC strictly after `now`.
pub fn next_daily_run(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let hour = hour.min(23);
    let today_target = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);

    if now < today_target {
        today_target
    } else {
        today_target + chrono::Duration::days(1)
    }
}
