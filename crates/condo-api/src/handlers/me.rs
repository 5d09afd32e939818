//! Self-inspection: what the caller can reach

use axum::{
    extract::{Path, State},
    Json,
};

use condo_core::repositories::AccessStore;

use crate::dto::{ModulePermissionsResponse, UserAccessResponse};
use crate::error::ApiError;
use crate::handlers::access::{module_permissions_of, user_access_of};
use crate::middleware::AuthenticatedUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/me/access
pub async fn my_access<S: AccessStore>(
    State(state): State<AppState<S>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<UserAccessResponse>>, ApiError> {
    let access = user_access_of(&state, user.user_id).await?;
    Ok(Json(ApiResponse::success(access)))
}

/// GET /api/v1/me/access/{module_code}
pub async fn my_module_permissions<S: AccessStore>(
    State(state): State<AppState<S>>,
    user: AuthenticatedUser,
    Path(module_code): Path<String>,
) -> Result<Json<ApiResponse<ModulePermissionsResponse>>, ApiError> {
    let permissions = module_permissions_of(&state, user.user_id, module_code).await?;
    Ok(Json(ApiResponse::success(permissions)))
}
