use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::api::{json_body, ApiResponse, ApiResult};
use crate::models::{PlatformInput, PlatformView};
use crate::state::AppState;

/// GET /api/platforms - Every platform, expanded
pub async fn get(State(state): State<AppState>) -> ApiResult<Vec<PlatformView>> {
    let platforms = state.platforms().list().await?;
    Ok(ApiResponse::success(platforms))
}

/// POST /api/platforms - Create a platform
///
/// An active platform is validated and gets its category in the same write.
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<PlatformInput>, JsonRejection>,
) -> ApiResult<PlatformView> {
    let input = json_body(payload)?;
    let platform = state.platforms().create(input).await?;
    Ok(ApiResponse::success(platform))
}

/// DELETE /api/platforms - Remove every platform and the categories they own
pub async fn delete(State(state): State<AppState>) -> ApiResult<Value> {
    let deleted = state.platforms().delete_all().await?;
    Ok(ApiResponse::success(json!({ "deleted": deleted })))
}
