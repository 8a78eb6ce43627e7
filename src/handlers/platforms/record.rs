use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::api::{json_body, parse_id, ApiResponse, ApiResult};
use crate::models::{PlatformInput, PlatformView};
use crate::state::AppState;

/// GET /api/platforms/:id - One platform with category and parts expanded
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<PlatformView> {
    let id = parse_id(&id, "platform")?;
    let platform = state.platforms().get(id).await?;
    Ok(ApiResponse::success(platform))
}

/// PUT /api/platforms/:id - Merge update
///
/// Top-level keys that are present overwrite the stored value. Arrays replace
/// the stored array, keeping ids of entries that carry one.
pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PlatformInput>, JsonRejection>,
) -> ApiResult<PlatformView> {
    let id = parse_id(&id, "platform")?;
    let input = json_body(payload)?;
    let platform = state.platforms().update(id, input).await?;
    Ok(ApiResponse::success(platform))
}

/// DELETE /api/platforms/:id - Delete a platform and its category
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id, "platform")?;
    let platform = state.platforms().delete(id).await?;
    Ok(ApiResponse::success(json!({
        "id": platform.id,
        "category": platform.category,
        "deleted": true
    })))
}
