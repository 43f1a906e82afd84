//! HTTP application surface.
//!
//! Page routes sit behind the request gate and return a JSON page model with
//! the caller's capabilities; rendering happens elsewhere. Each page also runs
//! a [`ViewGuard`] so a permissive route table cannot widen access to a page.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::middleware::{RequestGate, RequestGateLayer, TokenVerifier};
use crate::rbac::{
    Capabilities, CapabilitySnapshot, Navigator, Permission, Rendered, RequirePermissionLayer,
    Role, ViewGuard,
};
use crate::telemetry::MetricsRegistry;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub gate: Arc<RequestGate>,
    pub metrics: MetricsRegistry,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, gate: RequestGate, metrics: MetricsRegistry) -> Self {
        Self {
            verifier: Arc::new(verifier),
            gate: Arc::new(gate),
            metrics,
        }
    }
}

/// JSON page model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub page: String,
    pub capabilities: CapabilitySnapshot,
}

/// Build the full router with the gate and request tracing applied.
pub fn build_router(state: AppState) -> Router {
    let ingest = Router::new()
        .route("/api/ingest", post(ingest))
        .route_layer(RequirePermissionLayer::new(
            state.verifier.clone(),
            Permission::IngestData,
        ));

    Router::new()
        .route("/login", get(login))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/dashboard", get(dashboard))
        .route("/kpis", get(kpis))
        .route("/reports", get(reports))
        .route("/reports/new", get(new_report))
        .route("/ingest", get(ingest_page))
        .route("/admin", get(admin))
        .route("/api/session", get(session))
        .merge(ingest)
        .layer(RequestGateLayer::from_gate(
            state.gate.clone(),
            state.verifier.clone(),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Public routes
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub from: Option<String>,
}

/// GET /login
async fn login(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    Json(serde_json::json!({
        "page": "login",
        "from": query.from,
    }))
}

/// GET /health
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now(),
        })),
    )
}

/// GET /metrics
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Gated pages
// ═══════════════════════════════════════════════════════════════════════════════

async fn dashboard(caps: Capabilities) -> Response {
    guarded_page("dashboard", Role::Viewer, caps)
}

async fn kpis(caps: Capabilities) -> Response {
    guarded_page("kpis", Role::Viewer, caps)
}

async fn reports(caps: Capabilities) -> Response {
    guarded_page("reports", Role::Viewer, caps)
}

async fn new_report(caps: Capabilities) -> Response {
    guarded_page("reports/new", Role::Analyst, caps)
}

async fn ingest_page(caps: Capabilities) -> Response {
    guarded_page("ingest", Role::Analyst, caps)
}

async fn admin(caps: Capabilities) -> Response {
    guarded_page("admin", Role::Admin, caps)
}

/// Records where the guard wants to go; a server render answers it with a
/// redirect.
#[derive(Default)]
struct RedirectTarget(Option<String>);

impl Navigator for RedirectTarget {
    fn navigate(&mut self, path: &str) {
        self.0 = Some(path.to_string());
    }
}

fn guarded_page(page: &str, role: Role, caps: Capabilities) -> Response {
    let mut guard = ViewGuard::requiring(role);
    let mut target = RedirectTarget::default();

    let rendered = guard.render(caps.status(), &mut target, || PageView {
        page: page.to_string(),
        capabilities: caps.snapshot(),
    });

    match (rendered, target.0) {
        (Rendered::Content(view), _) => Json(view).into_response(),
        (Rendered::Placeholder(_), Some(location)) => {
            Redirect::temporary(&location).into_response()
        }
        (Rendered::Placeholder(text), None) => {
            Json(serde_json::json!({ "page": page, "placeholder": text })).into_response()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API
// ═══════════════════════════════════════════════════════════════════════════════

/// GET /api/session
///
/// API paths bypass the gate, so the token is verified here. An absent or
/// invalid token yields `authenticated: false`.
async fn session(State(state): State<AppState>, headers: HeaderMap) -> Json<CapabilitySnapshot> {
    let claims = state.verifier.authenticate(&headers).ok();
    Json(Capabilities::from_claims(claims).snapshot())
}

/// POST /api/ingest
async fn ingest(caps: Capabilities, body: String) -> impl IntoResponse {
    let subject = caps.claims().map(|c| c.subject.clone());
    tracing::info!(subject = ?subject, bytes = body.len(), "Ingest accepted");
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "accepted": true,
            "bytes": body.len(),
            "submitted_by": subject,
        })),
    )
}
