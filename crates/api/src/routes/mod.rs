pub mod episodes;
pub mod health;
pub mod scheduler;
pub mod scripts;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sheet                       spreadsheet title, tabs and resolved columns
///
/// /episodes                    all mapped rows
/// /episodes/matching           mental-health CPTSD/PTSD rows
/// /episodes/upcoming           ranked unprocessed rows (?limit=)
/// /episodes/search             first match by topic (?topic=)
///
/// /scripts/generate            generate one script (POST)
/// /scripts/batch               generate up to five scripts (POST, see
///                              scripts::batch_route)
///
/// /scheduler                   status
/// /scheduler/start             start daily trigger (POST)
/// /scheduler/stop              stop daily trigger (POST)
/// /scheduler/run               run once now (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/sheet", get(handlers::sheet::describe_sheet))
        .nest("/episodes", episodes::router())
        .nest("/scripts", scripts::router())
        .nest("/scheduler", scheduler::router())
}
