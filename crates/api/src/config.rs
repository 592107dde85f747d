use std::path::PathBuf;
use std::str::FromStr;

use podscript_core::prompt::DEFAULT_TEMPERATURE;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// Every section has defaults suitable for local development except the
/// spreadsheet id and the Anthropic API key, which must be provided.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Script generation
    /// routinely takes minutes.
    pub request_timeout_secs: u64,
    /// Timeout for `POST /scripts/batch` in seconds (default: `3600`). A batch
    /// runs up to five generations back to back, so it gets its own budget
    /// instead of the per-request one.
    pub batch_timeout_secs: u64,
    /// How long to wait for background work after the server stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub log_format: LogFormat,
    pub sheets: SheetsConfig,
    pub llm: LlmConfig,
    pub scripts: ScriptsConfig,
    pub scheduler: SchedulerConfig,
}

/// Where the episode spreadsheet lives and how to authenticate.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// Range read on every fetch; its tab also receives status write-backs.
    /// Row and column positions are counted from the range's top-left cell.
    pub range: String,
    /// Pre-issued OAuth access token. Takes precedence over the key file.
    pub access_token: Option<String>,
    /// Service account JSON key used for the JWT bearer grant.
    pub service_account_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
}

/// Script generation settings.
#[derive(Debug, Clone)]
pub struct ScriptsConfig {
    pub temperature: f32,
    /// Directory that receives a JSON copy of every generated script.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Start the daily trigger when the server boots.
    pub enabled: bool,
    /// Hour of day (UTC) at which the daily run fires.
    pub run_hour: u32,
    /// Most episodes generated per run.
    pub max_episodes: usize,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: &str) -> T {
    var_or(key, default)
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}

fn required_var(key: &str) -> String {
    let value = std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set in the environment"));
    assert!(!value.trim().is_empty(), "{key} must not be empty");
    value
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `BATCH_TIMEOUT_SECS`   | `3600`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `LOG_FORMAT`           | `pretty` (or `json`)       |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values and on missing required variables of the
    /// nested sections.
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = var_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_format = match var_or("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => panic!("LOG_FORMAT must be `pretty` or `json`, got `{other}`"),
        };

        Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", "3000"),
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "300"),
            batch_timeout_secs: parse_var("BATCH_TIMEOUT_SECS", "3600"),
            shutdown_timeout_secs: parse_var("SHUTDOWN_TIMEOUT_SECS", "30"),
            log_format,
            sheets: SheetsConfig::from_env(),
            llm: LlmConfig::from_env(),
            scripts: ScriptsConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
        }
    }
}

impl SheetsConfig {
    /// | Env Var                       | Required | Default      |
    /// |-------------------------------|----------|--------------|
    /// | `SPREADSHEET_ID`              | **yes**  | --           |
    /// | `SHEET_RANGE`                 | no       | `Sheet1!A:Z` |
    /// | `GOOGLE_ACCESS_TOKEN`         | one of   | --           |
    /// | `GOOGLE_SERVICE_ACCOUNT_FILE` | one of   | --           |
    pub fn from_env() -> Self {
        let access_token = optional_var("GOOGLE_ACCESS_TOKEN");
        let service_account_file = optional_var("GOOGLE_SERVICE_ACCOUNT_FILE").map(PathBuf::from);
        assert!(
            access_token.is_some() || service_account_file.is_some(),
            "either GOOGLE_ACCESS_TOKEN or GOOGLE_SERVICE_ACCOUNT_FILE must be set"
        );

        let range = var_or("SHEET_RANGE", "Sheet1!A:Z");
        assert!(
            podscript_sheets::a1::range_origin(&range).is_some(),
            "SHEET_RANGE `{range}` does not start with a valid A1 cell"
        );

        Self {
            spreadsheet_id: required_var("SPREADSHEET_ID"),
            range,
            access_token,
            service_account_file,
        }
    }
}

impl LlmConfig {
    /// | Env Var             | Required | Default                                  |
    /// |---------------------|----------|------------------------------------------|
    /// | `ANTHROPIC_API_KEY` | **yes**  | --                                       |
    /// | `ANTHROPIC_MODEL`   | no       | `claude-sonnet-4-20250514`               |
    /// | `ANTHROPIC_API_URL` | no       | `https://api.anthropic.com/v1/messages`  |
    pub fn from_env() -> Self {
        Self {
            api_key: required_var("ANTHROPIC_API_KEY"),
            model: var_or("ANTHROPIC_MODEL", podscript_llm::anthropic::DEFAULT_MODEL),
            api_url: var_or("ANTHROPIC_API_URL", podscript_llm::anthropic::DEFAULT_API_URL),
        }
    }
}

impl ScriptsConfig {
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `GENERATION_TEMPERATURE` | `0.7`   |
    /// | `SCRIPTS_OUTPUT_DIR`     | unset   |
    pub fn from_env() -> Self {
        let temperature: f32 = parse_var("GENERATION_TEMPERATURE", &DEFAULT_TEMPERATURE.to_string());
        assert!(
            (0.0..=1.0).contains(&temperature),
            "GENERATION_TEMPERATURE must be between 0 and 1"
        );

        Self {
            temperature,
            output_dir: optional_var("SCRIPTS_OUTPUT_DIR").map(PathBuf::from),
        }
    }
}

impl SchedulerConfig {
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `SCHEDULER_ENABLED`      | `true`  |
    /// | `SCHEDULER_RUN_HOUR`     | `6`     |
    /// | `SCHEDULER_MAX_EPISODES` | `5`     |
    pub fn from_env() -> Self {
        let run_hour: u32 = parse_var("SCHEDULER_RUN_HOUR", "6");
        assert!(run_hour < 24, "SCHEDULER_RUN_HOUR must be between 0 and 23");

        Self {
            enabled: parse_var("SCHEDULER_ENABLED", "true"),
            run_hour,
            max_episodes: parse_var("SCHEDULER_MAX_EPISODES", "5"),
        }
    }
}
