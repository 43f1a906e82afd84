//! Edge request gate.
//!
//! Runs before any page handler. For each request:
//!
//! 1. Excluded prefixes (API, assets, image optimisation, favicon) pass
//!    straight through.
//! 2. The route table decides which roles the path requires. None means the
//!    path is public.
//! 3. Otherwise the session token is verified. No verifiable token redirects
//!    to the login page with the original path and query in `from`.
//! 4. The token's raw role claims are tested for flat membership in the
//!    required list. A miss redirects to the landing page with
//!    `error=insufficient_permissions`.
//!
//! Step 4 does not apply the role hierarchy. Route tables list every admitted
//! role explicitly; see [`RoutePolicyTable`].
//!
//! # Example
//!
//! ```rust,ignore
//! use innsight_core::middleware::{GateConfig, RequestGateLayer};
//!
//! let app = Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .layer(RequestGateLayer::new(GateConfig::default(), verifier));
//! ```

use axum::{
    body::Body,
    extract::Request,
    response::{IntoResponse, Redirect, Response},
};
use futures::future::BoxFuture;
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::auth::{TokenError, TokenVerifier};
use crate::rbac::{normalize_path, IdentityClaims, Role, RoutePolicyTable};
use crate::telemetry::redact_tokens;

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// Gate configuration (`[gate]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Login page; receives `from`.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Landing page for authenticated callers who lack a role.
    #[serde(default = "default_denied_path")]
    pub denied_path: String,

    /// Value of the `error` marker on the denied redirect.
    #[serde(default = "default_denied_error")]
    pub denied_error: String,

    /// Prefixes that never pass through the gate.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// Route policy, most-specific-first.
    #[serde(default)]
    pub routes: RoutePolicyTable,
}

fn default_login_path() -> String {
    "/login".to_string()
}
fn default_denied_path() -> String {
    "/dashboard".to_string()
}
fn default_denied_error() -> String {
    "insufficient_permissions".to_string()
}
fn default_excluded_prefixes() -> Vec<String> {
    vec![
        "/api".to_string(),
        "/assets".to_string(),
        "/_image".to_string(),
        "/favicon.ico".to_string(),
    ]
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            denied_path: default_denied_path(),
            denied_error: default_denied_error(),
            excluded_prefixes: default_excluded_prefixes(),
            routes: RoutePolicyTable::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// States a request moves through at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Start,
    RolesRequired,
    TokenChecked,
    RoleChecked,
    Allowed,
    RedirectLogin,
    RedirectDenied,
}

/// Terminal result for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Path is outside the gate's reach.
    Excluded,
    /// No roles required.
    Public,
    /// Roles required and held.
    Allowed,
    RedirectLogin { location: String },
    RedirectDenied { location: String },
}

impl GateOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Excluded | Self::Public | Self::Allowed)
    }

    /// Redirect target, if any.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::RedirectLogin { location } | Self::RedirectDenied { location } => Some(location),
            _ => None,
        }
    }

    /// The terminal state of the gate state machine.
    pub fn state(&self) -> GateState {
        match self {
            Self::Excluded | Self::Public | Self::Allowed => GateState::Allowed,
            Self::RedirectLogin { .. } => GateState::RedirectLogin,
            Self::RedirectDenied { .. } => GateState::RedirectDenied,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excluded => "excluded",
            Self::Public => "public",
            Self::Allowed => "allowed",
            Self::RedirectLogin { .. } => "redirect_login",
            Self::RedirectDenied { .. } => "redirect_denied",
        }
    }
}

impl IntoResponse for GateOutcome {
    /// Redirects become `307 Temporary Redirect`. Allowing outcomes have no
    /// response of their own and render as an empty `200`.
    fn into_response(self) -> Response {
        match self.location() {
            Some(location) => Redirect::temporary(location).into_response(),
            None => ().into_response(),
        }
    }
}

/// Path-based authorization at the network edge.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    config: GateConfig,
}

impl RequestGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.config
            .excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn required_roles(&self, path: &str) -> &[Role] {
        self.config.routes.required_roles(path)
    }

    /// Decide a request. `claims` is the verified identity, or `None` when no
    /// token was presented or it failed verification.
    pub fn evaluate(&self, path_and_query: &str, claims: Option<&IdentityClaims>) -> GateOutcome {
        let mut state = GateState::Start;

        if self.is_excluded(path_and_query) {
            return GateOutcome::Excluded;
        }

        let required = self.required_roles(path_and_query);
        if required.is_empty() {
            return GateOutcome::Public;
        }
        advance(&mut state, GateState::RolesRequired);

        advance(&mut state, GateState::TokenChecked);
        let Some(claims) = claims else {
            advance(&mut state, GateState::RedirectLogin);
            return GateOutcome::RedirectLogin {
                location: self.login_location(path_and_query),
            };
        };

        advance(&mut state, GateState::RoleChecked);
        if required.iter().any(|role| claims.has_raw_role(*role)) {
            advance(&mut state, GateState::Allowed);
            GateOutcome::Allowed
        } else if self.landing_admits(claims) {
            advance(&mut state, GateState::RedirectDenied);
            GateOutcome::RedirectDenied {
                location: self.denied_location(),
            }
        } else {
            // The landing page would deny this caller too.
            advance(&mut state, GateState::RedirectLogin);
            GateOutcome::RedirectLogin {
                location: self.login_location(path_and_query),
            }
        }
    }

    /// Whether `path` passes the gate without a token.
    pub fn is_public(&self, path: &str) -> bool {
        self.is_excluded(path) || self.required_roles(path).is_empty()
    }

    /// Whether the gate lets `claims` into the denied landing page.
    fn landing_admits(&self, claims: &IdentityClaims) -> bool {
        let landing = &self.config.denied_path;
        self.is_public(landing)
            || self
                .required_roles(landing)
                .iter()
                .any(|role| claims.has_raw_role(*role))
    }

    /// `/login?from=<url-encoded path and query>`
    pub fn login_location(&self, path_and_query: &str) -> String {
        format!(
            "{}?from={}",
            self.config.login_path,
            urlencoding::encode(path_and_query)
        )
    }

    /// `/dashboard?error=insufficient_permissions`
    pub fn denied_location(&self) -> String {
        format!(
            "{}?error={}",
            self.config.denied_path,
            urlencoding::encode(&self.config.denied_error)
        )
    }
}

fn advance(state: &mut GateState, next: GateState) {
    tracing::trace!(from = ?*state, to = ?next, "Gate transition");
    *state = next;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer and Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer that places the request gate in front of every route.
#[derive(Clone)]
pub struct RequestGateLayer {
    gate: Arc<RequestGate>,
    verifier: Arc<TokenVerifier>,
}

impl RequestGateLayer {
    pub fn new(config: GateConfig, verifier: Arc<TokenVerifier>) -> Self {
        Self {
            gate: Arc::new(RequestGate::new(config)),
            verifier,
        }
    }

    pub fn from_gate(gate: Arc<RequestGate>, verifier: Arc<TokenVerifier>) -> Self {
        Self { gate, verifier }
    }
}

impl<S> Layer<S> for RequestGateLayer {
    type Service = RequestGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestGateService {
            inner,
            gate: self.gate.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

/// Service that enforces route policy per request.
#[derive(Clone)]
pub struct RequestGateService<S> {
    inner: S,
    gate: Arc<RequestGate>,
    verifier: Arc<TokenVerifier>,
}

impl<S> Service<Request<Body>> for RequestGateService<S>
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
        let gate = self.gate.clone();
        let verifier = self.verifier.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let path_and_query = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());

            // Public pages still learn who is calling when a valid token is present.
            let claims = if gate.is_excluded(&path_and_query) {
                None
            } else {
                match verifier.authenticate(request.headers()) {
                    Ok(claims) => Some(claims),
                    Err(TokenError::Missing) => None,
                    Err(e) => {
                        debug!(
                            path = %path_and_query,
                            reason = %redact_tokens(&e.to_string()),
                            "No verifiable identity"
                        );
                        None
                    }
                }
            };

            let outcome = gate.evaluate(&path_and_query, claims.as_ref());
            counter!("gate_decisions_total", "outcome" => outcome.label()).increment(1);

            match outcome {
                GateOutcome::Allowed | GateOutcome::Public => {
                    if let Some(claims) = claims {
                        request.extensions_mut().insert(claims);
                    }
                    inner.call(request).await
                }
                GateOutcome::Excluded => inner.call(request).await,
                GateOutcome::RedirectDenied { .. } => {
                    warn!(
                        path = %path_and_query,
                        subject = claims.as_ref().map(|c| c.subject.as_str()).unwrap_or_default(),
                        "Insufficient role for route"
                    );
                    Ok(outcome.into_response())
                }
                GateOutcome::RedirectLogin { .. } => {
                    debug!(path = %path_and_query, "Redirecting to login");
                    Ok(outcome.into_response())
                }
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
