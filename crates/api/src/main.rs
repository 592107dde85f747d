use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use podscript_api::background::Scheduler;
use podscript_api::config::{LogFormat, ServerConfig, SheetsConfig};
use podscript_api::engine::ScriptService;
use podscript_api::router::build_app_router;
use podscript_api::state::AppState;
use podscript_llm::AnthropicClient;
use podscript_sheets::{SheetsApi, SheetsAuth};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "podscript_api=debug,podscript_sheets=info,podscript_llm=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Collaborators ---
    let http = reqwest::Client::new();

    let sheets = SheetsApi::with_client(
        http.clone(),
        podscript_sheets::client::DEFAULT_BASE_URL.to_string(),
        config.sheets.spreadsheet_id.clone(),
        &config.sheets.range,
        sheets_auth(&config.sheets),
    );
    tracing::info!(
        spreadsheet_id = %config.sheets.spreadsheet_id,
        range = %config.sheets.range,
        "Spreadsheet client ready"
    );

    let llm = AnthropicClient::with_client(
        http,
        config.llm.api_url.clone(),
        config.llm.api_key.clone(),
        config.llm.model.clone(),
    );
    tracing::info!(model = %config.llm.model, "Generation client ready");

    // --- Engine + scheduler ---
    let scripts = Arc::new(ScriptService::new(
        Arc::new(sheets),
        Arc::new(llm),
        config.sheets.range.clone(),
        config.scripts.temperature,
        config.scripts.output_dir.clone(),
    ));
    if let Some(dir) = &config.scripts.output_dir {
        tracing::info!(dir = %dir.display(), "Generated scripts will be archived");
    }

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&scripts),
        config.scheduler.clone(),
    ));
    if config.scheduler.enabled {
        scheduler.start().await;
    } else {
        tracing::info!("Scheduler disabled at startup (SCHEDULER_ENABLED=false)");
    }

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        scripts,
        scheduler: Arc::clone(&scheduler),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    let ip: IpAddr = config
        .host
        .parse()
        .unwrap_or_else(|e| panic!("HOST '{}' is not an IP address: {e}", config.host));
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot bind {addr}: {e}"));
    tracing::info!(%addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server terminated with an error");
    }

    // An in-flight scheduled run gets the shutdown timeout to finish its
    // current episode loop.
    scheduler
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    tracing::info!("Shutdown complete");
}

/// Static token if configured, otherwise the service account key file.
///
/// Panics when the key file cannot be loaded; the server cannot do anything
/// useful without spreadsheet access.
fn sheets_auth(config: &SheetsConfig) -> SheetsAuth {
    if let Some(token) = &config.access_token {
        tracing::info!("Using static Google access token");
        return SheetsAuth::Static(token.clone());
    }
    let path = config
        .service_account_file
        .as_ref()
        .expect("GOOGLE_SERVICE_ACCOUNT_FILE must be set when GOOGLE_ACCESS_TOKEN is not");
    tracing::info!(path = %path.display(), "Using service account credentials");
    SheetsAuth::service_account_file(path)
        .unwrap_or_else(|e| panic!("Failed to load service account key: {e}"))
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM. A handler that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutdown requested, draining connections");
}
