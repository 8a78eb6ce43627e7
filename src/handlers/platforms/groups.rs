use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::api::{json_body, parse_id, ApiResponse, ApiResult};
use crate::models::{PartGroup, PartGroupInput};
use crate::state::AppState;

/// POST /api/platforms/:id/group
pub async fn post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PartGroupInput>, JsonRejection>,
) -> ApiResult<PartGroup> {
    let platform_id = parse_id(&id, "platform")?;
    let input = json_body(payload)?;
    let group = state.parts().add_group(platform_id, input).await?;
    Ok(ApiResponse::success(group))
}

/// PUT /api/platforms/:id/group/:group_id
pub async fn put(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
    payload: Result<Json<PartGroupInput>, JsonRejection>,
) -> ApiResult<PartGroup> {
    let platform_id = parse_id(&id, "platform")?;
    let group_id = parse_id(&group_id, "part group")?;
    let input = json_body(payload)?;
    let group = state.parts().update_group(platform_id, group_id, input).await?;
    Ok(ApiResponse::success(group))
}
