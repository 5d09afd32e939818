// ============================================================================
// Condo API - Access Administration Handlers
// File: crates/condo-api/src/handlers/access.rs
// ============================================================================
//! Direct user grants, inspection and the access-check endpoint.
//!
//! Every route here sits behind the administration guard; the acting admin
//! is the authenticated caller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use condo_core::repositories::AccessStore;
use condo_core::UserModuleGrant;
use condo_core::UserPermissionGrant;

use crate::dto::{
    CheckAccessRequest, CheckAccessResponse, GrantModuleRequest, GrantPermissionRequest,
    ModulePermissionsResponse, ModuleQuery, PermissionGrantResponse, RevokeResponse,
    UserAccessResponse,
};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::response::ApiResponse;
use crate::state::AppState;

pub(crate) async fn user_access_of<S: AccessStore>(
    state: &AppState<S>,
    user_id: Uuid,
) -> Result<UserAccessResponse, ApiError> {
    let is_super_admin = state.resolver.is_super_admin(&user_id).await?;
    let modules = state.resolver.user_module_codes(&user_id).await?;
    Ok(UserAccessResponse {
        user_id,
        is_super_admin,
        modules: modules.into_iter().collect(),
    })
}

pub(crate) async fn module_permissions_of<S: AccessStore>(
    state: &AppState<S>,
    user_id: Uuid,
    module: String,
) -> Result<ModulePermissionsResponse, ApiError> {
    let permissions = state.resolver.user_module_permissions(&user_id, &module).await?;
    Ok(ModulePermissionsResponse { module, permissions })
}

/// GET /api/v1/access/users/{user_id}
pub async fn get_user_access<S: AccessStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserAccessResponse>>, ApiError> {
    let access = user_access_of(&state, user_id).await?;
    Ok(Json(ApiResponse::success(access)))
}

/// GET /api/v1/access/users/{user_id}/permissions?module={code}
pub async fn get_user_module_permissions<S: AccessStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ModuleQuery>,
) -> Result<Json<ApiResponse<ModulePermissionsResponse>>, ApiError> {
    let permissions = module_permissions_of(&state, user_id, query.module).await?;
    Ok(Json(ApiResponse::success(permissions)))
}

/// POST /api/v1/access/users/{user_id}/modules
pub async fn grant_module_access<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<GrantModuleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserModuleGrant>>), ApiError> {
    payload.validate()?;

    let grant = state
        .admin
        .grant_module_access(admin.user_id, user_id, payload.module_id, payload.expires_at)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(grant))))
}

/// DELETE /api/v1/access/users/{user_id}/modules/{module_id}
pub async fn revoke_module_access<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path((user_id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<RevokeResponse>>, ApiError> {
    let cascaded = state
        .admin
        .revoke_module_access(admin.user_id, user_id, module_id)
        .await?;

    Ok(Json(ApiResponse::success(RevokeResponse {
        revoked: true,
        cascaded,
    })))
}

/// POST /api/v1/access/users/{user_id}/permissions
pub async fn grant_permission<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<GrantPermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionGrantResponse>>), ApiError> {
    payload.validate()?;

    let outcome = state
        .admin
        .grant_permission(
            admin.user_id,
            user_id,
            payload.module_permission_id,
            payload.scope,
            payload.scope_id,
            payload.expires_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome.into()))))
}

/// DELETE /api/v1/access/users/{user_id}/permissions/{grant_id}
pub async fn revoke_permission<S: AccessStore>(
    State(state): State<AppState<S>>,
    admin: AuthenticatedUser,
    Path((user_id, grant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<UserPermissionGrant>>, ApiError> {
    let grant = state
        .admin
        .revoke_permission(admin.user_id, user_id, grant_id)
        .await?;

    Ok(Json(ApiResponse::success(grant)))
}

/// POST /api/v1/access/check
///
/// Answers for an arbitrary user; both parts given means both must hold.
pub async fn check_access<S: AccessStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<CheckAccessRequest>,
) -> Result<Json<ApiResponse<CheckAccessResponse>>, ApiError> {
    if payload.module.is_none() && payload.permission.is_none() {
        return Err(ApiError::BadRequest(
            "module or permission is required".to_string(),
        ));
    }

    let mut allowed = true;
    if let Some(module) = &payload.module {
        allowed = state.resolver.has_module_access(&payload.user_id, module).await?;
    }
    if allowed {
        if let Some(key) = &payload.permission {
            allowed = state
                .resolver
                .has_permission(&payload.user_id, key, payload.context.as_ref())
                .await?;
        }
    }

    Ok(Json(ApiResponse::success(CheckAccessResponse { allowed })))
}
