//! Permission enforcement for API routes.
//!
//! API paths are excluded from the request gate, so this layer authenticates
//! the caller itself and answers with JSON errors instead of redirects:
//! `401` when no verifiable token is presented, `403` when the caller's roles
//! are not listed for the permission.

use axum::{
    body::Body,
    extract::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

use super::models::{AuthorizationDecision, IdentityClaims, Permission};
use super::resolver::Capabilities;
use crate::error::InnsightError;
use crate::middleware::auth::TokenVerifier;

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer that wraps services with permission enforcement.
///
/// # Example
///
/// ```rust,ignore
/// use innsight_core::rbac::{Permission, RequirePermissionLayer};
///
/// let app = Router::new()
///     .route("/api/ingest", post(ingest))
///     .layer(RequirePermissionLayer::new(verifier.clone(), Permission::IngestData));
/// ```
#[derive(Clone)]
pub struct RequirePermissionLayer {
    verifier: Arc<TokenVerifier>,
    permission: Permission,
}

impl RequirePermissionLayer {
    pub fn new(verifier: Arc<TokenVerifier>, permission: Permission) -> Self {
        Self {
            verifier,
            permission,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = RequirePermissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermissionService {
            inner,
            verifier: self.verifier.clone(),
            permission: self.permission,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Service that enforces a required permission per request.
#[derive(Clone)]
pub struct RequirePermissionService<S> {
    inner: S,
    verifier: Arc<TokenVerifier>,
    permission: Permission,
}

impl<S> Service<Request<Body>> for RequirePermissionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let verifier = self.verifier.clone();
        let permission = self.permission;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Claims may already be present when an outer layer verified them.
            let claims = match request.extensions().get::<IdentityClaims>().cloned() {
                Some(claims) => claims,
                None => match verifier.authenticate(request.headers()) {
                    Ok(claims) => claims,
                    Err(e) => return Ok(InnsightError::from(e).into_response()),
                },
            };

            let caps = Capabilities::from_claims(Some(claims.clone()));
            match caps.check_permission(permission) {
                AuthorizationDecision::Allow => {
                    request.extensions_mut().insert(claims);
                    inner.call(request).await
                }
                AuthorizationDecision::Deny(reason) => {
                    warn!(
                        subject = %claims.subject,
                        permission = %permission,
                        reason = %reason,
                        "Permission denied"
                    );
                    Ok(InnsightError::insufficient_role(permission).into_response())
                }
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::AuthConfig;
    use axum::{http::StatusCode, routing::post, Router};
    use tower::ServiceExt;

    fn verifier() -> Arc<TokenVerifier> {
        Arc::new(TokenVerifier::new(&AuthConfig::with_secret("test-secret")).unwrap())
    }

    fn app(verifier: Arc<TokenVerifier>) -> Router {
        Router::new()
            .route("/api/ingest", post(|| async { "accepted" }))
            .layer(RequirePermissionLayer::new(verifier, Permission::IngestData))
    }

    fn request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/api/ingest");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(verifier()).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let response = app(verifier()).oneshot(request(Some("not-a-jwt"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_viewer_is_forbidden() {
        let verifier = verifier();
        let token = verifier.issue_for("v1", vec!["viewer".into()]).unwrap();
        let response = app(verifier).oneshot(request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_roleless_token_is_forbidden_not_unauthorized() {
        let verifier = verifier();
        for roles in [vec![], vec!["superuser".to_string()]] {
            let token = verifier.issue_for("u1", roles).unwrap();
            let response = app(verifier.clone()).oneshot(request(Some(&token))).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn test_analyst_is_allowed() {
        let verifier = verifier();
        let token = verifier.issue_for("a1", vec!["analyst".into()]).unwrap();
        let response = app(verifier).oneshot(request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
