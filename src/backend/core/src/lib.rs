#![allow(clippy::result_large_err)]
//! # Innsight Core
//!
//! Role-based access control for the Innsight hospitality reporting portal.
//!
//! ## Architecture
//!
//! - **RBAC**: Role hierarchy, permission table, route policy, capability
//!   resolver and guarded views
//! - **Middleware**: Edge request gate and session token verification
//! - **App**: HTTP surface with gated pages and permission-guarded API routes
//! - **Telemetry**: Structured logging and Prometheus metrics
//!
//! Two layers enforce access independently. The request gate decides at the
//! edge using each route's declared role list; guarded views and the
//! capability resolver decide inside the application using the role
//! hierarchy.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rbac;
pub mod telemetry;

pub use error::{ErrorCode, InnsightError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{build_router, AppState, PageView};
    pub use crate::config::Config;
    pub use crate::error::{ErrorCode, InnsightError, Result};
    pub use crate::middleware::{
        AuthConfig, GateConfig, GateOutcome, RequestGate, RequestGateLayer, TokenClaims,
        TokenError, TokenVerifier,
    };
    pub use crate::rbac::{
        AuthStatus, AuthorizationDecision, Capabilities, CapabilitySnapshot, DenyReason,
        GuardState, IdentityClaims, Navigator, Permission, PermissionTable, Rendered,
        RequirePermissionLayer, Role, RoutePolicy, RoutePolicyTable, ViewGuard,
    };
}
