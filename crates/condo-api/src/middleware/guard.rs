// ============================================================================
// Condo API - Access Guard
// File: crates/condo-api/src/middleware/guard.rs
// ============================================================================
//! Route-level authorization.
//!
//! A guard is attached to a router with `from_fn_with_state(guard, enforce)`.
//! It runs after `require_auth`, evaluates the configured module and
//! permission requirements through an [`AccessChecker`], and marks requests
//! that must be narrowed to the caller's own records with an
//! [`OwnershipFilter`] extension.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{FromRequestParts, Query, RawPathParams, Request, State},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use condo_core::services::AccessChecker;
use condo_core::PermissionContext;
use condo_shared::constants::MAX_GUARDED_BODY_BYTES;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthenticatedUser;

const TENANT_KEYS: &[&str] = &["tenant_id", "tenantId"];
const OWNER_KEYS: &[&str] = &["owner_id", "ownerId"];
const RESOURCE_KEYS: &[&str] = &["id", "resource_id", "resourceId"];

/// What a route demands of its caller. Both parts are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirement {
    pub module: Option<String>,
    pub permission: Option<String>,
    pub check_ownership: bool,
}

impl AccessRequirement {
    pub fn module(code: impl Into<String>) -> Self {
        Self {
            module: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn permission(key: impl Into<String>) -> Self {
        Self {
            permission: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn and_permission(mut self, key: impl Into<String>) -> Self {
        self.permission = Some(key.into());
        self
    }

    pub fn with_ownership(mut self) -> Self {
        self.check_ownership = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.module.is_none() && self.permission.is_none()
    }
}

/// Handlers receiving this extension must only return records owned by `owner_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipFilter {
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    AllowOwnedOnly(OwnershipFilter),
}

#[derive(Clone)]
pub struct AccessGuard {
    checker: Arc<dyn AccessChecker>,
    requirement: Arc<AccessRequirement>,
}

impl AccessGuard {
    pub fn new(checker: Arc<dyn AccessChecker>, requirement: AccessRequirement) -> Self {
        Self {
            checker,
            requirement: Arc::new(requirement),
        }
    }

    pub fn requirement(&self) -> &AccessRequirement {
        &self.requirement
    }

    /// Decides a single request. Super-admins pass every requirement and are
    /// never narrowed by ownership.
    pub async fn authorize(
        &self,
        user: Option<AuthenticatedUser>,
        context: Option<PermissionContext>,
    ) -> Result<GuardDecision, ApiError> {
        let user = user.ok_or_else(|| {
            ApiError::Unauthorized("guarded route reached without an identity".to_string())
        })?;

        if self.requirement.is_empty() {
            return Ok(GuardDecision::Allow);
        }

        if self.checker.is_super_admin(user.user_id).await? {
            debug!("Super-admin {} bypasses guard", user.user_id);
            return Ok(GuardDecision::Allow);
        }

        if let Some(module) = &self.requirement.module {
            if !self.checker.has_module_access(user.user_id, module).await? {
                return Err(ApiError::AccessDenied(format!(
                    "user {} lacks module {}",
                    user.user_id, module
                )));
            }
        }

        if let Some(key) = &self.requirement.permission {
            if !self.checker.has_permission(user.user_id, key, context).await? {
                return Err(ApiError::AccessDenied(format!(
                    "user {} lacks permission {}",
                    user.user_id, key
                )));
            }
        }

        if self.requirement.check_ownership {
            return Ok(GuardDecision::AllowOwnedOnly(OwnershipFilter {
                owner_id: user.user_id,
            }));
        }
        Ok(GuardDecision::Allow)
    }
}

/// Guard middleware. The permission context is assembled from path
/// parameters, then query parameters, then a JSON body; the body is
/// restored for the handler.
pub async fn enforce(
    State(guard): State<AccessGuard>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request.extensions().get::<AuthenticatedUser>().copied();
    let (mut parts, body) = request.into_parts();

    let (context, body) = if user.is_some() && guard.requirement.permission.is_some() {
        assemble_context(&mut parts, body).await?
    } else {
        (None, body)
    };

    if let GuardDecision::AllowOwnedOnly(filter) = guard.authorize(user, context).await? {
        parts.extensions.insert(filter);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

async fn assemble_context(
    parts: &mut Parts,
    body: Body,
) -> Result<(Option<PermissionContext>, Body), ApiError> {
    // Lowest precedence first; later sources overwrite.
    let mut fields: HashMap<String, String> = HashMap::new();

    let body = if is_json(&parts.headers) {
        let bytes = to_bytes(body, MAX_GUARDED_BODY_BYTES)
            .await
            .map_err(|e| ApiError::BadRequest(format!("unreadable request body: {}", e)))?;
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&bytes) {
            for (key, value) in map {
                if let Some(text) = scalar_text(&value) {
                    fields.insert(key, text);
                }
            }
        }
        Body::from(bytes)
    } else {
        body
    };

    if let Ok(Query(query)) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
        fields.extend(query);
    }

    if let Ok(params) = RawPathParams::from_request_parts(parts, &()).await {
        for (key, value) in params.iter() {
            fields.insert(key.to_string(), value.to_string());
        }
    }

    Ok((context_from_fields(&fields), body))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `None` when no recognised key is present, so list-style requests are
/// evaluated without a context.
fn context_from_fields(fields: &HashMap<String, String>) -> Option<PermissionContext> {
    let pick = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| fields.get(*k))
            .filter(|v| !v.is_empty())
            .cloned()
    };

    let context = PermissionContext {
        tenant_id: pick(TENANT_KEYS),
        owner_id: pick(OWNER_KEYS).and_then(|v| Uuid::parse_str(&v).ok()),
        resource_id: pick(RESOURCE_KEYS),
    };
    (!context.is_empty()).then_some(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http;
    use async_trait::async_trait;
    use axum::{
        http::StatusCode,
        middleware,
        routing::{get, post},
        Router,
    };
    use condo_core::DomainError;
    use mockall::mock;
    use tower::ServiceExt;

    mock! {
        pub Checker {}

        #[async_trait]
        impl AccessChecker for Checker {
            async fn is_super_admin(&self, user_id: Uuid) -> Result<bool, DomainError>;
            async fn has_module_access(&self, user_id: Uuid, module_code: &str) -> Result<bool, DomainError>;
            async fn has_permission(
                &self,
                user_id: Uuid,
                permission_key: &str,
                context: Option<PermissionContext>,
            ) -> Result<bool, DomainError>;
        }
    }

    async fn ok() -> &'static str {
        "ok"
    }

    async fn echo(body: String) -> String {
        body
    }

    async fn owner(request: Request) -> String {
        request
            .extensions()
            .get::<OwnershipFilter>()
            .map(|f| f.owner_id.to_string())
            .unwrap_or_default()
    }

    fn app(checker: MockChecker, requirement: AccessRequirement) -> Router {
        let guard = AccessGuard::new(Arc::new(checker), requirement);
        Router::new()
            .route("/reportes", get(ok))
            .route("/condos/{tenant_id}/reportes", get(ok))
            .route("/objetivos", post(echo))
            .route("/mine", get(owner))
            .route_layer(middleware::from_fn_with_state(guard, enforce))
    }

    fn authed(mut request: Request, user_id: Uuid) -> Request {
        request
            .extensions_mut()
            .insert(AuthenticatedUser { user_id });
        request
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let response = app(MockChecker::new(), AccessRequirement::module("reportes"))
            .oneshot(http::Request::get("/reportes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_requirement_skips_checker() {
        let response = app(MockChecker::new(), AccessRequirement::default())
            .oneshot(authed(http::Request::get("/reportes").body(Body::empty()).unwrap(), Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_super_admin_bypasses_requirements() {
        let mut checker = MockChecker::new();
        checker.expect_is_super_admin().times(1).returning(|_| Ok(true));

        let requirement = AccessRequirement::module("reportes")
            .and_permission("reportes:export")
            .with_ownership();
        let response = app(checker, requirement)
            .oneshot(authed(http::Request::get("/mine").body(Body::empty()).unwrap(), Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_missing_module_is_denied_without_detail() {
        let mut checker = MockChecker::new();
        checker.expect_is_super_admin().returning(|_| Ok(false));
        checker
            .expect_has_module_access()
            .withf(|_, module| module.to_string() == "reportes")
            .returning(|_, _| Ok(false));

        let response = app(checker, AccessRequirement::module("reportes").and_permission("reportes:export"))
            .oneshot(authed(http::Request::get("/reportes").body(Body::empty()).unwrap(), Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_text(response).await;
        assert!(body.contains("ACCESS_DENIED"));
        assert!(!body.contains("reportes"));
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let mut checker = MockChecker::new();
        checker.expect_is_super_admin().returning(|_| Ok(false));
        checker.expect_has_permission().returning(|_, _, _| Ok(false));

        let response = app(checker, AccessRequirement::permission("reportes:export"))
            .oneshot(authed(http::Request::get("/reportes").body(Body::empty()).unwrap(), Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_context_without_known_keys_is_none() {
        let mut checker = MockChecker::new();
        checker.expect_is_super_admin().returning(|_| Ok(false));
        checker
            .expect_has_permission()
            .withf(|_, _, context| context.is_none())
            .times(1)
            .returning(|_, _, _| Ok(true));

        let response = app(checker, AccessRequirement::permission("reportes:export"))
            .oneshot(authed(http::Request::get("/reportes?page=2").body(Body::empty()).unwrap(), Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_path_tenant_overrides_query() {
        let mut checker = MockChecker::new();
        checker.expect_is_super_admin().returning(|_| Ok(false));
        checker
            .expect_has_permission()
            .withf(|_, key, context| {
                key.to_string() == "reportes:export"
                    && context.as_ref().and_then(|c| c.tenant_id.as_deref()) == Some("condo-1")
            })
            .times(1)
            .returning(|_, _, _| Ok(true));

        let response = app(checker, AccessRequirement::permission("reportes:export"))
            .oneshot(authed(
                http::Request::get("/condos/condo-1/reportes?tenant_id=condo-9")
                    .body(Body::empty())
                    .unwrap(),
                Uuid::new_v4(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_json_body_feeds_context_and_reaches_handler() {
        let owner_id = Uuid::new_v4();
        let mut checker = MockChecker::new();
        checker.expect_is_super_admin().returning(|_| Ok(false));
        checker
            .expect_has_permission()
            .withf(move |_, _, context| {
                context.as_ref().map_or(false, |c| {
                    c.tenant_id.as_deref() == Some("condo-2")
                        && c.owner_id == Some(owner_id)
                        && c.resource_id.as_deref() == Some("17")
                })
            })
            .times(1)
            .returning(|_, _, _| Ok(true));

        let payload = format!(r#"{{"tenantId":"condo-2","owner_id":"{}","id":17}}"#, owner_id);
        let response = app(checker, AccessRequirement::permission("objetivos:create"))
            .oneshot(authed(
                http::Request::post("/objetivos")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.clone()))
                    .unwrap(),
                Uuid::new_v4(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, payload);
    }

    #[tokio::test]
    async fn test_ownership_marker_attached() {
        let user_id = Uuid::new_v4();
        let mut checker = MockChecker::new();
        checker.expect_is_super_admin().returning(|_| Ok(false));
        checker.expect_has_module_access().returning(|_, _| Ok(true));

        let response = app(checker, AccessRequirement::module("reservas").with_ownership())
            .oneshot(authed(http::Request::get("/mine").body(Body::empty()).unwrap(), user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, user_id.to_string());
    }

    #[tokio::test]
    async fn test_checker_failure_is_internal_error() {
        let mut checker = MockChecker::new();
        checker
            .expect_is_super_admin()
            .returning(|_| Err(DomainError::DatabaseError("connection reset".into())));

        let response = app(checker, AccessRequirement::module("reportes"))
            .oneshot(authed(http::Request::get("/reportes").body(Body::empty()).unwrap(), Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_context_from_fields_ignores_bad_owner() {
        let mut fields = HashMap::new();
        fields.insert("owner_id".to_string(), "not-a-uuid".to_string());
        assert_eq!(context_from_fields(&fields), None);

        fields.insert("tenant_id".to_string(), "condo-1".to_string());
        assert_eq!(context_from_fields(&fields), Some(PermissionContext::for_tenant("condo-1")));
    }
}
