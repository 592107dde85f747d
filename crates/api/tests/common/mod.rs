#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use podscript_core::error::{CoreError, UpstreamKind};
use podscript_core::prompt::GenerationRequest;
use podscript_core::providers::{
    Completion, GenerationProvider, SheetInfo, SpreadsheetProvider, Usage,
};
use podscript_core::templates::EpisodeType;
use tower::ServiceExt;

use podscript_api::background::Scheduler;
use podscript_api::config::{
    LlmConfig, LogFormat, SchedulerConfig, ScriptsConfig, ServerConfig, SheetsConfig,
};
use podscript_api::engine::ScriptService;
use podscript_api::router::build_app_router;
use podscript_api::state::AppState;

/// Body text used for every generated section: ten words, none of which
/// contains a section name.
pub const SECTION_BODY: &str = "This part of the show talks gently with the listener.";
pub const SECTION_BODY_WORDS: usize = 10;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

pub const HEADER: [&str; 8] = [
    "Category", "Title", "Topic", "Demand", "Voice", "Host", "Date", "Status",
];

/// Zero-based index of the Status column in [`HEADER`].
pub const STATUS_COLUMN: usize = 7;

fn days_from_today(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

/// Episode plan used by most tests. Dates are relative to today so the
/// scheduler lookahead window stays meaningful.
///
/// Relevant rows (ids in order): 1 flashbacks, 2 sleep, 3 grounding
/// (processed), 4 boundaries (undated, High), 5 far future. The Comedy row
/// is never relevant.
pub fn fixture_rows() -> Vec<Vec<String>> {
    let rows: Vec<Vec<String>> = vec![
        HEADER.iter().map(|s| s.to_string()).collect(),
        vec![
            "Mental Health".into(),
            "C-PTSD Recovery".into(),
            "Emotional flashbacks".into(),
            "High".into(),
            "gentle".into(),
            "Dr. Rowan".into(),
            days_from_today(7),
            String::new(),
        ],
        vec![
            "Mental Health".into(),
            "PTSD Recovery".into(),
            "Sleep and hypervigilance".into(),
            "Moderate".into(),
            String::new(),
            String::new(),
            days_from_today(14),
        ],
        vec![
            "Mental Health".into(),
            "CPTSD Basics".into(),
            "Grounding techniques".into(),
            "Low".into(),
            String::new(),
            String::new(),
            days_from_today(21),
            "Done".into(),
        ],
        vec![
            "Comedy".into(),
            "PTSD jokes".into(),
            "Stand-up".into(),
            "High".into(),
        ],
        vec![
            "Mental Health".into(),
            "C-PTSD Recovery".into(),
            "Boundaries".into(),
            "High".into(),
        ],
        vec![
            "Mental Health".into(),
            "PTSD and work".into(),
            "Far future planning".into(),
            "High".into(),
            String::new(),
            String::new(),
            days_from_today(200),
            String::new(),
        ],
    ];
    rows
}

// ---------------------------------------------------------------------------
// Fake spreadsheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

/// In-memory spreadsheet. Writes are recorded and, unless disabled, applied
/// to the rows so later reads see them.
pub struct FakeSheet {
    rows: Mutex<Vec<Vec<String>>>,
    writes: Mutex<Vec<CellWrite>>,
    reads: AtomicUsize,
    fail_reads: Mutex<Option<UpstreamKind>>,
    apply_writes: AtomicBool,
    pending_insert: Mutex<Option<(usize, Vec<String>)>>,
}

impl FakeSheet {
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            writes: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
            fail_reads: Mutex::new(None),
            apply_writes: AtomicBool::new(true),
            pending_insert: Mutex::new(None),
        }
    }

    pub fn writes(&self) -> Vec<CellWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_reads_with(&self, kind: Option<UpstreamKind>) {
        *self.fail_reads.lock().unwrap() = kind;
    }

    pub fn set_apply_writes(&self, apply: bool) {
        self.apply_writes.store(apply, Ordering::SeqCst);
    }

    pub fn set_rows(&self, rows: Vec<Vec<String>>) {
        *self.rows.lock().unwrap() = rows;
    }

    /// Once `reads` reads have been served, insert `row` directly below the
    /// header, shifting every data row down.
    pub fn insert_row_after_reads(&self, reads: usize, row: Vec<String>) {
        *self.pending_insert.lock().unwrap() = Some((reads, row));
    }
}

#[async_trait]
impl SpreadsheetProvider for FakeSheet {
    async fn get_rows(&self, _range: &str) -> Result<Vec<Vec<String>>, CoreError> {
        let served = self.reads.fetch_add(1, Ordering::SeqCst);
        {
            let mut pending = self.pending_insert.lock().unwrap();
            if pending.as_ref().is_some_and(|(after, _)| served >= *after) {
                if let Some((_, row)) = pending.take() {
                    self.rows.lock().unwrap().insert(1, row);
                }
            }
        }
        if let Some(kind) = *self.fail_reads.lock().unwrap() {
            return Err(CoreError::upstream("spreadsheet", kind, "fake sheet failure"));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn update_cell(&self, row: usize, column: usize, value: &str) -> Result<(), CoreError> {
        self.writes.lock().unwrap().push(CellWrite {
            row,
            column,
            value: value.to_string(),
        });
        if self.apply_writes.load(Ordering::SeqCst) {
            let mut rows = self.rows.lock().unwrap();
            if let Some(cells) = rows.get_mut(row - 1) {
                if cells.len() <= column {
                    cells.resize(column + 1, String::new());
                }
                cells[column] = value.to_string();
            }
        }
        Ok(())
    }

    async fn describe(&self) -> Result<SheetInfo, CoreError> {
        Ok(SheetInfo {
            title: "Episode Plan".into(),
            tabs: vec!["Sheet1".into(), "Archive".into()],
        })
    }
}

// ---------------------------------------------------------------------------
// Fake generation
// ---------------------------------------------------------------------------

/// Scripted model: returns a well-formed script for the requested type,
/// JSON for SEO requests, and errors for configured topics.
pub struct FakeLlm {
    calls: AtomicUsize,
    seo_calls: AtomicUsize,
    failing_topics: Mutex<HashMap<String, UpstreamKind>>,
    degrade: AtomicBool,
    latency: Mutex<std::time::Duration>,
}

impl FakeLlm {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seo_calls: AtomicUsize::new(0),
            failing_topics: Mutex::new(HashMap::new()),
            degrade: AtomicBool::new(false),
            latency: Mutex::new(std::time::Duration::ZERO),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seo_calls(&self) -> usize {
        self.seo_calls.load(Ordering::SeqCst)
    }

    pub fn fail_topic(&self, topic: &str, kind: UpstreamKind) {
        self.failing_topics
            .lock()
            .unwrap()
            .insert(topic.to_string(), kind);
    }

    pub fn heal(&self) {
        self.failing_topics.lock().unwrap().clear();
    }

    /// Sleep for `latency` (tokio time) before answering each call.
    pub fn set_latency(&self, latency: std::time::Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Return prose with no section headings.
    pub fn set_degrade(&self, degrade: bool) {
        self.degrade.store(degrade, Ordering::SeqCst);
    }
}

pub fn scripted_text(episode_type: EpisodeType) -> String {
    episode_type
        .sections()
        .iter()
        .map(|s| format!("## {}\n{SECTION_BODY}\n\n", s.name))
        .collect()
}

#[async_trait]
impl GenerationProvider for FakeLlm {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, CoreError> {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let usage = Usage {
            input_tokens: 100,
            output_tokens: 50,
        };

        let failure = self
            .failing_topics
            .lock()
            .unwrap()
            .iter()
            .find(|(topic, _)| request.user_prompt.contains(&format!("Topic: {topic}")))
            .map(|(_, kind)| *kind);
        if let Some(kind) = failure {
            return Err(CoreError::upstream("generation", kind, "fake model failure"));
        }

        if request.system_prompt.contains("podcast metadata") {
            self.seo_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(Completion {
                text: "```json\n{\"title\": \"Healing Out Loud\", \"tags\": [\"cptsd\", \"ptsd\"], \
                       \"description\": \"Gentle show notes.\"}\n```"
                    .into(),
                usage,
            });
        }

        if self.degrade.load(Ordering::SeqCst) {
            return Ok(Completion {
                text: "I would rather not write that today.".into(),
                usage,
            });
        }

        let episode_type = if request.user_prompt.starts_with("Write a friday") {
            EpisodeType::Friday
        } else {
            EpisodeType::Main
        };
        Ok(Completion {
            text: scripted_text(episode_type),
            usage,
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults. The scheduler is not
/// started automatically.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        batch_timeout_secs: 120,
        shutdown_timeout_secs: 5,
        log_format: LogFormat::Pretty,
        sheets: SheetsConfig {
            spreadsheet_id: "test-sheet".into(),
            range: "Sheet1!A:Z".into(),
            access_token: Some("test-token".into()),
            service_account_file: None,
        },
        llm: LlmConfig {
            api_key: "test-key".into(),
            model: "claude-test".into(),
            api_url: "http://127.0.0.1:9/v1/messages".into(),
        },
        scripts: ScriptsConfig {
            temperature: 0.7,
            output_dir: None,
        },
        scheduler: SchedulerConfig {
            enabled: false,
            run_hour: 6,
            max_episodes: 5,
        },
    }
}

/// Application wired to in-memory collaborators.
pub struct TestApp {
    pub config: ServerConfig,
    pub state: AppState,
    pub sheet: Arc<FakeSheet>,
    pub llm: Arc<FakeLlm>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(FakeSheet::with_rows(fixture_rows()), test_config())
    }

    pub fn with(sheet: FakeSheet, config: ServerConfig) -> Self {
        let sheet = Arc::new(sheet);
        let llm = Arc::new(FakeLlm::new());
        let scripts = Arc::new(ScriptService::new(
            Arc::clone(&sheet) as Arc<dyn SpreadsheetProvider>,
            Arc::clone(&llm) as Arc<dyn GenerationProvider>,
            config.sheets.range.clone(),
            config.scripts.temperature,
            config.scripts.output_dir.clone(),
        ));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&scripts),
            config.scheduler.clone(),
        ));
        let state = AppState {
            config: Arc::new(config.clone()),
            scripts,
            scheduler,
        };
        Self {
            config,
            state,
            sheet,
            llm,
        }
    }

    /// Full router with the production middleware stack.
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }
}

/// Router over the default fixture.
pub fn build_test_app() -> Router {
    TestApp::new().router()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}
