//! Daily script generation scheduler.
//!
//! While running, a background task fires one run immediately and then one
//! run every day at the configured UTC hour. Manual run-once requests go
//! through the same entry point. A run that starts within
//! [`podscript_core::schedule::REENTRY_GUARD`] of the previous run's start
//! is dropped, not queued.
//!
//! Each run walks the selected candidates one at a time: generate the main
//! script and its SEO metadata, write the status back to the sheet, and
//! remember the episode id. Failures are logged per episode and leave the
//! episode eligible for the next run. The remembered ids live only in memory
//! and are reset on restart; the sheet's status column is the durable record.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use podscript_core::episode::Episode;
use podscript_core::error::CoreError;
use podscript_core::schedule::{is_reentrant, next_daily_run, select_candidates};
use podscript_core::templates::EpisodeType;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::engine::ScriptService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// What asked for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    Startup,
    Timer,
    Manual,
}

impl std::fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RunTrigger::Startup => "startup",
            RunTrigger::Timer => "timer",
            RunTrigger::Manual => "manual",
        })
    }
}

/// Outcome for one episode in a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunItem {
    pub episode_id: usize,
    pub topic: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Eligible candidates left for a later run by the per-run cap.
    pub skipped: usize,
    pub items: Vec<RunItem>,
    /// Set when the run could not read episodes at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub run_hour_utc: u32,
    pub max_episodes: usize,
    pub last_run_started_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub processed_count: usize,
    pub last_run: Option<RunSummary>,
}

/// A run that passed the re-entrancy guard and has not executed yet.
#[derive(Debug)]
pub struct RunTicket {
    pub run_id: Uuid,
    trigger: RunTrigger,
    started_at: DateTime<Utc>,
}

struct Inner {
    state: SchedulerState,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    last_run_instant: Option<Instant>,
    last_run_started_at: Option<DateTime<Utc>>,
    next_run_at: Option<DateTime<Utc>>,
    processed: HashSet<usize>,
    last_run: Option<RunSummary>,
}

pub struct Scheduler {
    scripts: Arc<ScriptService>,
    config: SchedulerConfig,
    inner: Mutex<Inner>,
}

impl Scheduler {
    pub fn new(scripts: Arc<ScriptService>, config: SchedulerConfig) -> Self {
        Self {
            scripts,
            config,
            inner: Mutex::new(Inner {
                state: SchedulerState::Stopped,
                cancel: None,
                task: None,
                last_run_instant: None,
                last_run_started_at: None,
                next_run_at: None,
                processed: HashSet::new(),
                last_run: None,
            }),
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        let inner = self.inner.lock().await;
        SchedulerStatus {
            state: inner.state,
            run_hour_utc: self.config.run_hour,
            max_episodes: self.config.max_episodes,
            last_run_started_at: inner.last_run_started_at,
            next_run_at: inner.next_run_at,
            processed_count: inner.processed.len(),
            last_run: inner.last_run.clone(),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.state == SchedulerState::Running
    }

    /// Move to `Running`: spawn the trigger task, which runs once right away
    /// and then daily. Returns `false` if already running.
    pub async fn start(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state == SchedulerState::Running {
            return false;
        }

        let cancel = CancellationToken::new();
        let scheduler = Arc::clone(self);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            scheduler.trigger_loop(task_cancel).await;
        });

        inner.state = SchedulerState::Running;
        inner.cancel = Some(cancel);
        inner.task = Some(task);
        tracing::info!(run_hour_utc = self.config.run_hour, "Scheduler started");
        true
    }

    /// Move to `Stopped`. A run already in progress finishes; no further
    /// triggers fire. Returns `false` if already stopped.
    pub async fn stop(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state == SchedulerState::Stopped {
            return false;
        }
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
        }
        inner.state = SchedulerState::Stopped;
        inner.next_run_at = None;
        tracing::info!("Scheduler stopped");
        true
    }

    /// Stop and wait up to `timeout` for an in-flight run to finish.
    pub async fn shutdown(&self, timeout: Duration) {
        self.stop().await;
        let task = self.inner.lock().await.task.take();
        if let Some(task) = task {
            if tokio::time::timeout(timeout, task).await.is_err() {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Scheduler run still in progress at shutdown"
                );
            }
        }
    }

    /// Pass the re-entrancy guard and record the run start, or return `None`
    /// if the previous run started less than
    /// [`podscript_core::schedule::REENTRY_GUARD`] ago.
    pub async fn begin_run(&self, trigger: RunTrigger) -> Option<RunTicket> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let since_last = inner.last_run_instant.map(|t| now.duration_since(t));
        if is_reentrant(since_last) {
            tracing::info!(
                %trigger,
                since_last_secs = since_last.map(|d| d.as_secs()),
                "Run dropped: previous run started too recently"
            );
            return None;
        }

        let started_at = Utc::now();
        inner.last_run_instant = Some(now);
        inner.last_run_started_at = Some(started_at);
        Some(RunTicket {
            run_id: Uuid::now_v7(),
            trigger,
            started_at,
        })
    }

    /// Execute a run admitted by [`Scheduler::begin_run`].
    pub async fn complete_run(&self, ticket: RunTicket) -> RunSummary {
        let span = tracing::info_span!("scheduler_run", run_id = %ticket.run_id, trigger = %ticket.trigger);
        let summary = self.execute(ticket).instrument(span).await;
        self.inner.lock().await.last_run = Some(summary.clone());
        summary
    }

    /// Guarded run; `None` when dropped by the re-entrancy guard.
    pub async fn run_once(&self, trigger: RunTrigger) -> Option<RunSummary> {
        let ticket = self.begin_run(trigger).await?;
        Some(self.complete_run(ticket).await)
    }

    // ---- private ----

    async fn trigger_loop(&self, cancel: CancellationToken) {
        if !cancel.is_cancelled() {
            self.run_once(RunTrigger::Startup).await;
        }

        loop {
            if cancel.is_cancelled() {
                break;
            }
            let now = Utc::now();
            let next = next_daily_run(now, self.config.run_hour);
            self.inner.lock().await.next_run_at = Some(next);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::info!(next_run_at = %next, wait_secs = wait.as_secs(), "Next scheduled run");

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler trigger loop stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    self.run_once(RunTrigger::Timer).await;
                }
            }
        }
    }

    async fn execute(&self, ticket: RunTicket) -> RunSummary {
        let mut summary = RunSummary {
            run_id: ticket.run_id,
            trigger: ticket.trigger,
            started_at: ticket.started_at,
            finished_at: ticket.started_at,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            items: Vec::new(),
            error: None,
        };

        let episodes = match self.scripts.relevant_episodes().await {
            Ok(episodes) => episodes,
            Err(e) => {
                tracing::error!(error = %e, "Scheduled run could not read episodes");
                summary.error = Some(e.to_string());
                summary.finished_at = Utc::now();
                return summary;
            }
        };

        let processed = self.inner.lock().await.processed.clone();
        let today = Utc::now().date_naive();
        let mut candidates = select_candidates(&episodes, today, &processed, usize::MAX);
        summary.skipped = candidates.len().saturating_sub(self.config.max_episodes);
        candidates.truncate(self.config.max_episodes);

        tracing::info!(
            relevant = episodes.len(),
            candidates = candidates.len(),
            skipped = summary.skipped,
            "Scheduled run started"
        );

        for episode in &candidates {
            let item = match self.process_episode(episode).await {
                Ok(()) => {
                    self.inner.lock().await.processed.insert(episode.id);
                    RunItem {
                        episode_id: episode.id,
                        topic: episode.display_topic().to_string(),
                        succeeded: true,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        episode_id = episode.id,
                        topic = %episode.display_topic(),
                        error = %e,
                        "Scheduled episode failed; it stays eligible for the next run"
                    );
                    RunItem {
                        episode_id: episode.id,
                        topic: episode.display_topic().to_string(),
                        succeeded: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            summary.attempted += 1;
            if item.succeeded {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.items.push(item);
        }

        summary.finished_at = Utc::now();
        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Scheduled run finished"
        );
        summary
    }

    async fn process_episode(&self, episode: &Episode) -> Result<(), CoreError> {
        self.scripts
            .generate_episode(episode, EpisodeType::Main, true)
            .await?;
        let row = self.scripts.mark_generated(episode).await?;
        tracing::info!(episode_id = episode.id, row, "Episode marked as generated");
        Ok(())
    }
}
