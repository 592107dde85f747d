use std::sync::Arc;

use crate::background::Scheduler;
use crate::config::ServerConfig;
use crate::engine::ScriptService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Episode lookup and script generation over the configured collaborators.
    pub scripts: Arc<ScriptService>,
    /// Daily generation scheduler.
    pub scheduler: Arc<Scheduler>,
}
