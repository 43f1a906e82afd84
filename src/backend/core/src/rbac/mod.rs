//! Role-based access control for the reporting portal.
//!
//! This module provides:
//! - **Roles**: the closed role set and its explicit subsumption table
//! - **Permission Table**: named permissions mapped to explicit role lists
//! - **Route Policy Table**: path prefixes mapped to the roles allowed in
//! - **Capability Resolver**: per-caller role and permission queries
//! - **View Guard**: render/placeholder/navigate decisions for protected views
//! - **Authorization Middleware**: Axum layer for permission checks on API routes
//!
//! Role checks follow the hierarchy (admin ⊇ analyst ⊇ viewer). Permission
//! checks and the request gate's route checks are flat membership against
//! explicitly authored role lists.
//!
//! # Usage
//!
//! ```rust,ignore
//! use innsight_core::rbac::{Capabilities, Permission, Role};
//!
//! let caps = Capabilities::from_claims(Some(claims));
//! if caps.has_role(Role::Analyst) && caps.has_permission(Permission::IngestData) {
//!     // show the upload form
//! }
//! ```

pub mod guard;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod resolver;
pub mod roles;
pub mod routes;

pub use guard::{GuardState, Navigator, Rendered, ViewGuard};
pub use middleware::{RequirePermissionLayer, RequirePermissionService};
pub use models::{AuthStatus, AuthorizationDecision, DenyReason, IdentityClaims, Permission};
pub use policy::{permission_allows, PermissionTable};
pub use resolver::{Capabilities, CapabilitySnapshot};
pub use roles::{role_satisfies, subsumed_roles, Role, RoleHierarchy};
pub use routes::{normalize_path, RoutePolicy, RoutePolicyTable};
