// ============================================================================
// Condo API - Router
// File: crates/condo-api/src/routes.rs
// ============================================================================

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use condo_core::repositories::AccessStore;

use crate::handlers::{access, health, me, pools};
use crate::middleware::{auth, guard, AccessGuard, AccessRequirement};
use crate::state::AppState;

/// Permission gating every administrative route.
pub const MANAGE_ACCESS_PERMISSION: &str = "accesos:manage";

/// Builds the full HTTP surface.
///
/// `/health` is public. Everything under `/api/v1` requires a bearer token;
/// `/api/v1/access/...` additionally requires [`MANAGE_ACCESS_PERMISSION`].
pub fn build_router<S: AccessStore>(state: AppState<S>) -> Router {
    let admin_guard = AccessGuard::new(
        state.checker.clone(),
        AccessRequirement::permission(MANAGE_ACCESS_PERMISSION),
    );

    let admin_routes = Router::new()
        .route("/users/{user_id}", get(access::get_user_access::<S>))
        .route("/users/{user_id}/modules", post(access::grant_module_access::<S>))
        .route(
            "/users/{user_id}/modules/{module_id}",
            delete(access::revoke_module_access::<S>),
        )
        .route(
            "/users/{user_id}/permissions",
            get(access::get_user_module_permissions::<S>).post(access::grant_permission::<S>),
        )
        .route(
            "/users/{user_id}/permissions/{grant_id}",
            delete(access::revoke_permission::<S>),
        )
        .route("/pools", post(pools::create_pool::<S>))
        .route("/pools/{pool_id}/members", post(pools::add_member::<S>))
        .route(
            "/pools/{pool_id}/members/{user_id}",
            delete(pools::remove_member::<S>),
        )
        .route("/pools/{pool_id}/modules", post(pools::grant_module_access::<S>))
        .route(
            "/pools/{pool_id}/modules/{module_id}",
            delete(pools::revoke_module_access::<S>),
        )
        .route("/pools/{pool_id}/permissions", post(pools::grant_permission::<S>))
        .route(
            "/pools/{pool_id}/permissions/{grant_id}",
            delete(pools::revoke_permission::<S>),
        )
        .route("/check", post(access::check_access::<S>))
        .route_layer(middleware::from_fn_with_state(admin_guard, guard::enforce));

    let self_routes = Router::new()
        .route("/access", get(me::my_access::<S>))
        .route("/access/{module_code}", get(me::my_module_permissions::<S>));

    let protected = Router::new()
        .nest("/api/v1/access", admin_routes)
        .nest("/api/v1/me", self_routes)
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(protected)
        .with_state(state)
}
