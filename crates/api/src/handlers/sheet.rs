use axum::extract::State;
use axum::Json;

use crate::engine::scripts::SheetOverview;
use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /sheet
///
/// Spreadsheet title and tab names plus the column mapping inferred from the
/// current header row. Absent columns are reported as `-1`.
pub async fn describe_sheet(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SheetOverview>>> {
    let overview = state.scripts.describe_sheet().await?;
    Ok(Json(ApiResponse::ok(overview)))
}
