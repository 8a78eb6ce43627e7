use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::api::{json_body, parse_id, ApiResponse, ApiResult};
use crate::models::{PartDefinition, PartDefinitionInput};
use crate::services::part_service::RemovedPart;
use crate::state::AppState;

/// POST /api/platforms/:id/part - Create a part definition for the platform
pub async fn post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PartDefinitionInput>, JsonRejection>,
) -> ApiResult<PartDefinition> {
    let platform_id = parse_id(&id, "platform")?;
    let input = json_body(payload)?;
    let part = state.parts().add_part(platform_id, input).await?;
    Ok(ApiResponse::success(part))
}

/// PUT /api/platforms/:id/parts/:part_id - Merge update a part definition
pub async fn put(
    State(state): State<AppState>,
    Path((id, part_id)): Path<(String, String)>,
    payload: Result<Json<PartDefinitionInput>, JsonRejection>,
) -> ApiResult<PartDefinition> {
    parse_id(&id, "platform")?;
    let part_id = parse_id(&part_id, "part")?;
    let input = json_body(payload)?;
    let part = state.parts().update_part(part_id, input).await?;
    Ok(ApiResponse::success(part))
}

/// DELETE /api/platforms/:id/part/:part_id - Detach a part, deleting it if inactive
pub async fn delete(
    State(state): State<AppState>,
    Path((id, part_id)): Path<(String, String)>,
) -> ApiResult<RemovedPart> {
    let platform_id = parse_id(&id, "platform")?;
    let part_id = parse_id(&part_id, "part")?;
    let removed = state.parts().remove_part(platform_id, part_id).await?;
    Ok(ApiResponse::success(removed))
}
