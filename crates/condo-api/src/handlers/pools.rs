//! Pool administration handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use condo_core::repositories::AccessStore;
use condo_core::{Pool, PoolMember, PoolModuleGrant, PoolPermissionGrant};

use crate::dto::{
    AddPoolMemberRequest, CreatePoolRequest, GrantPoolModuleRequest, GrantPoolPermissionRequest,
    PoolPermissionGrantResponse, RevokeResponse,
};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/access/pools
pub async fn create_pool<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Json(payload): Json<CreatePoolRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Pool>>), ApiError> {
    payload.validate()?;

    let pool = state
        .admin
        .create_pool(admin.user_id, payload.name, payload.description)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(pool))))
}

/// POST /api/v1/access/pools/{pool_id}/members
pub async fn add_member<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path(pool_id): Path<Uuid>,
    Json(payload): Json<AddPoolMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PoolMember>>), ApiError> {
    let member = state
        .admin
        .add_pool_member(admin.user_id, pool_id, payload.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(member))))
}

/// DELETE /api/v1/access/pools/{pool_id}/members/{user_id}
pub async fn remove_member<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path((pool_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<PoolMember>>, ApiError> {
    let member = state
        .admin
        .remove_pool_member(admin.user_id, pool_id, user_id)
        .await?;

    Ok(Json(ApiResponse::success(member)))
}

/// POST /api/v1/access/pools/{pool_id}/modules
pub async fn grant_module_access<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path(pool_id): Path<Uuid>,
    Json(payload): Json<GrantPoolModuleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PoolModuleGrant>>), ApiError> {
    let grant = state
        .admin
        .grant_pool_module_access(admin.user_id, pool_id, payload.module_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(grant))))
}

/// DELETE /api/v1/access/pools/{pool_id}/modules/{module_id}
pub async fn revoke_module_access<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path((pool_id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<RevokeResponse>>, ApiError> {
    let cascaded = state
        .admin
        .revoke_pool_module_access(admin.user_id, pool_id, module_id)
        .await?;

    Ok(Json(ApiResponse::success(RevokeResponse {
        revoked: true,
        cascaded,
    })))
}

/// POST /api/v1/access/pools/{pool_id}/permissions
pub async fn grant_permission<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path(pool_id): Path<Uuid>,
    Json(payload): Json<GrantPoolPermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PoolPermissionGrantResponse>>), ApiError> {
    payload.validate()?;

    let outcome = state
        .admin
        .grant_pool_permission(
            admin.user_id,
            pool_id,
            payload.module_permission_id,
            payload.scope,
            payload.scope_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome.into()))))
}

/// DELETE /api/v1/access/pools/{pool_id}/permissions/{grant_id}
pub async fn revoke_permission<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path((pool_id, grant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<PoolPermissionGrant>>, ApiError> {
    let grant = state
        .admin
        .revoke_pool_permission(admin.user_id, pool_id, grant_id)
        .await?;

    Ok(Json(ApiResponse::success(grant)))
}
