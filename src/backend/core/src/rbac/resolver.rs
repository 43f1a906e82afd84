//! Capability resolver: role and permission queries over a claims snapshot.
//!
//! Role queries are hierarchy-aware. Permission queries are flat membership
//! against the [`PermissionTable`]. Nothing is cached beyond the snapshot
//! the resolver was built from.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use super::models::{AuthStatus, AuthorizationDecision, DenyReason, IdentityClaims, Permission};
use super::policy::PermissionTable;
use super::roles::{Role, RoleHierarchy};

/// Read-only view over the caller's current session state.
#[derive(Debug, Clone)]
pub struct Capabilities {
    status: AuthStatus,
    held: Vec<Role>,
    table: &'static PermissionTable,
}

impl Capabilities {
    /// Resolve against the standard permission table.
    pub fn new(status: AuthStatus) -> Self {
        Self::with_table(status, PermissionTable::standard())
    }

    pub fn with_table(status: AuthStatus, table: &'static PermissionTable) -> Self {
        let held = status.claims().map(IdentityClaims::held_roles).unwrap_or_default();
        Self { status, held, table }
    }

    pub fn from_claims(claims: Option<IdentityClaims>) -> Self {
        Self::new(AuthStatus::from_claims(claims))
    }

    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.status.claims()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }

    /// Whether the caller holds `role` or a role that dominates it.
    pub fn has_role(&self, role: Role) -> bool {
        self.is_authenticated() && RoleHierarchy::role_satisfies(&self.held, role)
    }

    /// Whether the caller's raw roles appear in `permission`'s declared list.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_authenticated() && self.table.allows(&self.held, permission)
    }

    /// Permission check by wire name; unknown names are denied.
    pub fn has_permission_named(&self, name: &str) -> bool {
        self.is_authenticated() && self.table.allows_named(&self.held, name)
    }

    pub fn check_role(&self, role: Role) -> AuthorizationDecision {
        if !self.is_authenticated() {
            return AuthorizationDecision::Deny(DenyReason::Unauthenticated);
        }
        AuthorizationDecision::from_bool(self.has_role(role))
    }

    pub fn check_permission(&self, permission: Permission) -> AuthorizationDecision {
        if !self.is_authenticated() {
            return AuthorizationDecision::Deny(DenyReason::Unauthenticated);
        }
        AuthorizationDecision::from_bool(self.has_permission(permission))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_analyst(&self) -> bool {
        self.has_role(Role::Analyst)
    }

    pub fn is_viewer(&self) -> bool {
        self.has_role(Role::Viewer)
    }

    pub fn can_manage_users(&self) -> bool {
        self.has_permission(Permission::ManageUsers)
    }

    pub fn can_manage_roles(&self) -> bool {
        self.has_permission(Permission::ManageRoles)
    }

    pub fn can_ingest_data(&self) -> bool {
        self.has_permission(Permission::IngestData)
    }

    pub fn can_view_raw_data(&self) -> bool {
        self.has_permission(Permission::ViewRawData)
    }

    pub fn can_create_reports(&self) -> bool {
        self.has_permission(Permission::CreateReports)
    }

    pub fn can_view_all_reports(&self) -> bool {
        self.has_permission(Permission::ViewAllReports)
    }

    pub fn can_view_assigned_reports(&self) -> bool {
        self.has_permission(Permission::ViewAssignedReports)
    }

    pub fn can_manage_settings(&self) -> bool {
        self.has_permission(Permission::ManageSettings)
    }

    pub fn can_view_analytics(&self) -> bool {
        self.has_permission(Permission::ViewAnalytics)
    }

    /// Serializable projection for clients.
    pub fn snapshot(&self) -> CapabilitySnapshot {
        CapabilitySnapshot {
            authenticated: self.is_authenticated(),
            subject: self.claims().map(|c| c.subject.clone()),
            roles: Role::all().into_iter().filter(|r| self.has_role(*r)).collect(),
            permissions: Permission::all()
                .into_iter()
                .filter(|p| self.has_permission(*p))
                .collect(),
        }
    }
}

/// What a client needs to drive UI gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Roles satisfied, hierarchy applied.
    pub roles: Vec<Role>,
    /// Permissions held.
    pub permissions: Vec<Permission>,
}

/// Builds capabilities from the claims the request gate stored in request
/// extensions. A request without claims is unauthenticated.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Capabilities
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<IdentityClaims>().cloned();
        Ok(Capabilities::from_claims(claims))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(roles: &[&str]) -> Capabilities {
        Capabilities::from_claims(Some(IdentityClaims::new(
            "u1",
            roles.iter().map(|r| r.to_string()).collect(),
        )))
    }

    #[test]
    fn test_unauthenticated_has_nothing() {
        let c = Capabilities::from_claims(None);
        for role in Role::all() {
            assert!(!c.has_role(role));
        }
        for perm in Permission::all() {
            assert!(!c.has_permission(perm));
        }
        assert_eq!(
            c.check_role(Role::Viewer),
            AuthorizationDecision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_loading_has_nothing() {
        let c = Capabilities::new(AuthStatus::Loading);
        assert!(c.is_loading());
        assert!(!c.is_viewer());
        assert!(!c.can_view_assigned_reports());
    }

    #[test]
    fn test_role_checks_use_hierarchy() {
        let admin = caps(&["admin"]);
        assert!(admin.is_admin());
        assert!(admin.is_analyst());
        assert!(admin.is_viewer());

        let viewer = caps(&["viewer"]);
        assert!(viewer.is_viewer());
        assert!(!viewer.is_analyst());
        assert_eq!(
            viewer.check_role(Role::Admin),
            AuthorizationDecision::Deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn test_permission_checks_are_flat() {
        let table: &'static PermissionTable = Box::leak(Box::new(PermissionTable::from_entries([(
            Permission::CreateReports,
            vec![Role::Analyst],
        )])));

        let admin = Capabilities::with_table(
            AuthStatus::Authenticated(IdentityClaims::new("a", vec!["admin".into()])),
            table,
        );
        // Role check passes through the hierarchy...
        assert!(admin.has_role(Role::Analyst));
        // ...but the permission list does not name admin.
        assert!(!admin.has_permission(Permission::CreateReports));
    }

    #[test]
    fn test_analyst_capabilities() {
        let c = caps(&["analyst"]);
        assert!(c.can_ingest_data());
        assert!(c.can_create_reports());
        assert!(c.can_view_analytics());
        assert!(!c.can_manage_users());
        assert!(!c.can_manage_settings());
    }

    #[test]
    fn test_unknown_roles_grant_nothing() {
        let c = caps(&["superadmin", "root"]);
        assert!(c.is_authenticated());
        assert!(!c.is_viewer());
        assert!(!c.can_view_assigned_reports());
    }

    #[test]
    fn test_unknown_permission_name_denied() {
        let c = caps(&["admin"]);
        assert!(!c.has_permission_named("LAUNCH_MISSILES"));
        assert!(c.has_permission_named("MANAGE_SETTINGS"));
    }

    #[test]
    fn test_snapshot() {
        let snap = caps(&["analyst"]).snapshot();
        assert!(snap.authenticated);
        assert_eq!(snap.subject.as_deref(), Some("u1"));
        assert_eq!(snap.roles, vec![Role::Analyst, Role::Viewer]);
        assert!(snap.permissions.contains(&Permission::IngestData));
        assert!(!snap.permissions.contains(&Permission::ManageUsers));
    }

    #[tokio::test]
    async fn test_extractor_reads_request_extensions() {
        let mut request = axum::http::Request::builder()
            .uri("/dashboard")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(IdentityClaims::new("u2", vec!["viewer".into()]));
        let (mut parts, _) = request.into_parts();

        let c = Capabilities::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(c.is_viewer());

        let (mut bare, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        let c = Capabilities::from_request_parts(&mut bare, &()).await.unwrap();
        assert!(!c.is_authenticated());
    }
}
