use axum::extract::{Path, State};

use crate::api::{parse_id, ApiResponse, ApiResult};
use crate::models::{Category, TreeNode};
use crate::state::AppState;

/// GET /api/categories - Whole forest, roots first, `children` always present
pub async fn tree(State(state): State<AppState>) -> ApiResult<Vec<TreeNode>> {
    let forest = state.categories().full_tree().await?;
    Ok(ApiResponse::success(forest))
}

/// GET /api/categories/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Category> {
    let id = parse_id(&id, "category")?;
    let category = state.categories().get(id).await?;
    Ok(ApiResponse::success(category))
}

/// GET /api/categories/:id/tree - The category with all of its descendants
pub async fn subtree(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<TreeNode> {
    let id = parse_id(&id, "category")?;
    let node = state.categories().subtree(id).await?;
    Ok(ApiResponse::success(node))
}
