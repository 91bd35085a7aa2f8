//! API Middleware
//!
//! Principal resolution, role gating and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Principal, RequestContext, Role};
use crate::error::AppError;

use super::keys::hash_api_key;

// =========================================================================
// Principal resolution
// =========================================================================

/// Resolve the caller from the X-API-Key header.
///
/// A request without the header proceeds as anonymous and is left to the
/// role gate; a key that is present but unusable is rejected here.
pub async fn auth_middleware(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let principal = match headers.get("X-API-Key").and_then(|v| v.to_str().ok()) {
        None => Principal::Anonymous,
        Some(api_key) => resolve_principal(&pool, api_key).await?,
    };

    // Extract correlation ID or generate new one
    let correlation_id = headers
        .get("X-Correlation-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let context = RequestContext::new()
        .with_principal(principal)
        .with_correlation_id(correlation_id);

    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

async fn resolve_principal(pool: &PgPool, api_key: &str) -> Result<Principal, AppError> {
    let record: Option<(i64, String, String, bool, bool)> = sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.role, k.is_active, u.active
        FROM api_keys k
        JOIN users u ON u.id = k.user_id
        WHERE k.key_hash = $1
        "#,
    )
    .bind(hash_api_key(api_key))
    .fetch_optional(pool)
    .await?;

    let (user_id, username, role, key_active, user_active) =
        record.ok_or(AppError::InvalidApiKey)?;

    if !key_active {
        tracing::warn!(user_id, "Disabled API key presented");
        return Err(AppError::ApiKeyDisabled);
    }

    if !user_active {
        return Err(AppError::UserInactive);
    }

    let role: Role = role.parse()?;

    Ok(Principal::authenticated(user_id, username, role))
}

// =========================================================================
// Role gate
// =========================================================================

/// Reject the request unless the caller holds at least `required`.
///
/// Layered with `from_fn_with_state(Role::Admin, require_role)` and friends.
pub async fn require_role(
    State(required): State<Role>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let anonymous = Principal::Anonymous;
    let principal = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| &ctx.principal)
        .unwrap_or(&anonymous);

    if let Err(e) = principal.authorize(required) {
        tracing::warn!(
            uri = %request.uri(),
            required = %required,
            role = ?principal.role(),
            "Access denied"
        );
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request logging
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let headers = mask_headers_for_logging(request.headers());

    let (correlation_id, user_id) = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| (ctx.correlation_id, ctx.principal.user_id()))
        .unwrap_or((None, None));

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = ?correlation_id,
        user_id = ?user_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Extension, Router};
    use tower::util::ServiceExt;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("x-api-key", "cbo_secret".parse().unwrap());
        headers.insert("x-correlation-id", "abc".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let api_key = masked.iter().find(|(k, _)| k == "x-api-key");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let correlation = masked.iter().find(|(k, _)| k == "x-correlation-id");

        assert_eq!(api_key.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(correlation.unwrap().1, "abc");
    }

    fn gated(required: Role, context: Option<RequestContext>) -> Router {
        let router = Router::new()
            .route("/gated", get(|| async { "inside" }))
            .route_layer(middleware::from_fn_with_state(required, require_role));
        match context {
            Some(context) => router.layer(Extension(context)),
            None => router,
        }
    }

    async fn status_for(required: Role, context: Option<RequestContext>) -> StatusCode {
        let request = Request::builder().uri("/gated").body(Body::empty()).unwrap();
        gated(required, context).oneshot(request).await.unwrap().status()
    }

    fn as_role(role: Role) -> Option<RequestContext> {
        Some(RequestContext::new().with_principal(Principal::authenticated(1, "someone", role)))
    }

    #[tokio::test]
    async fn test_admin_gate() {
        assert_eq!(status_for(Role::Admin, as_role(Role::Admin)).await, StatusCode::OK);
        assert_eq!(
            status_for(Role::Admin, as_role(Role::Coordinator)).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_gate_rejects_anonymous() {
        assert_eq!(status_for(Role::FieldOfficer, None).await, StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(Role::FieldOfficer, Some(RequestContext::new())).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_coordinator_gate_admits_admin() {
        assert_eq!(status_for(Role::Coordinator, as_role(Role::Admin)).await, StatusCode::OK);
        assert_eq!(
            status_for(Role::Coordinator, as_role(Role::FieldOfficer)).await,
            StatusCode::FORBIDDEN
        );
    }
}
