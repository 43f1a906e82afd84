//! Permission table: which roles may exercise which named permission.
//!
//! Checks against this table are flat set membership. The hierarchy in
//! [`roles`](super::roles) is not consulted: every permission lists each role
//! it admits, and that list is the authority.

use metrics::counter;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

use super::models::Permission;
use super::roles::Role;

static STANDARD: OnceLock<PermissionTable> = OnceLock::new();

/// Immutable `Permission -> [Role]` mapping.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    entries: HashMap<Permission, Vec<Role>>,
}

impl PermissionTable {
    /// Build a table from explicit entries. Permissions left out are allowed
    /// to nobody.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Permission, Vec<Role>)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The process-wide table, built on first use and never mutated.
    pub fn standard() -> &'static PermissionTable {
        STANDARD.get_or_init(PermissionTable::default)
    }

    /// Roles declared for `permission`; empty when the permission has no entry.
    pub fn allowed_roles(&self, permission: Permission) -> &[Role] {
        self.entries
            .get(&permission)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True iff any role in `held` appears in the permission's declared list.
    pub fn allows(&self, held: &[Role], permission: Permission) -> bool {
        let allowed_roles = self.allowed_roles(permission);
        let allowed = held.iter().any(|r| allowed_roles.contains(r));

        debug!(permission = %permission, allowed, "Permission check");
        counter!(
            "permission_checks_total",
            "permission" => permission.as_str(),
            "allowed" => if allowed { "true" } else { "false" }
        )
        .increment(1);

        allowed
    }

    /// Check by wire name. An unknown name is a programming error and fails
    /// closed.
    pub fn allows_named(&self, held: &[Role], name: &str) -> bool {
        match Permission::parse(name) {
            Some(permission) => self.allows(held, permission),
            None => {
                warn!(permission = name, "Unknown permission name; denying");
                false
            }
        }
    }

    /// Entries in the canonical permission order.
    pub fn iter(&self) -> impl Iterator<Item = (Permission, &[Role])> + '_ {
        Permission::all()
            .into_iter()
            .map(move |p| (p, self.allowed_roles(p)))
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        use Permission::*;
        use Role::*;

        Self::from_entries([
            (ManageUsers, vec![Admin]),
            (ManageRoles, vec![Admin]),
            (ManageSettings, vec![Admin]),
            (IngestData, vec![Admin, Analyst]),
            (ViewRawData, vec![Admin, Analyst]),
            (CreateReports, vec![Admin, Analyst]),
            (ViewAllReports, vec![Admin, Analyst]),
            (ViewAnalytics, vec![Admin, Analyst]),
            (ViewAssignedReports, vec![Admin, Analyst, Viewer]),
        ])
    }
}

/// Check `permission` against the standard table.
pub fn permission_allows(held: &[Role], permission: Permission) -> bool {
    PermissionTable::standard().allows(held, permission)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_exhaustive() {
        let table = PermissionTable::default();
        for perm in Permission::all() {
            assert!(
                !table.allowed_roles(perm).is_empty(),
                "{perm} has no declared roles"
            );
        }
    }

    #[test]
    fn test_admin_only_permissions() {
        for perm in [Permission::ManageUsers, Permission::ManageRoles, Permission::ManageSettings] {
            assert!(permission_allows(&[Role::Admin], perm));
            assert!(!permission_allows(&[Role::Analyst], perm));
            assert!(!permission_allows(&[Role::Viewer], perm));
        }
    }

    #[test]
    fn test_analyst_can_ingest_viewer_cannot() {
        assert!(permission_allows(&[Role::Analyst], Permission::IngestData));
        assert!(permission_allows(&[Role::Analyst], Permission::ViewRawData));
        assert!(!permission_allows(&[Role::Viewer], Permission::IngestData));
        assert!(!permission_allows(&[Role::Viewer], Permission::ViewRawData));
    }

    #[test]
    fn test_viewer_sees_assigned_reports_only() {
        assert!(permission_allows(&[Role::Viewer], Permission::ViewAssignedReports));
        assert!(!permission_allows(&[Role::Viewer], Permission::ViewAllReports));
    }

    #[test]
    fn test_membership_is_flat_not_hierarchical() {
        // A permission declared only for analysts is not granted to an admin,
        // even though admin subsumes analyst in the role hierarchy.
        let table =
            PermissionTable::from_entries([(Permission::ViewAnalytics, vec![Role::Analyst])]);
        assert!(table.allows(&[Role::Analyst], Permission::ViewAnalytics));
        assert!(!table.allows(&[Role::Admin], Permission::ViewAnalytics));

        let admin_only =
            PermissionTable::from_entries([(Permission::ManageUsers, vec![Role::Admin])]);
        assert!(!admin_only.allows(&[Role::Analyst], Permission::ManageUsers));
    }

    #[test]
    fn test_missing_entry_allows_nobody() {
        let table = PermissionTable::from_entries([]);
        for role in Role::all() {
            assert!(!table.allows(&[role], Permission::ViewAssignedReports));
        }
    }

    #[test]
    fn test_unknown_name_fails_closed() {
        let table = PermissionTable::default();
        assert!(!table.allows_named(&[Role::Admin], "DROP_TABLES"));
        assert!(table.allows_named(&[Role::Admin], "MANAGE_USERS"));
    }

    #[test]
    fn test_empty_held_is_denied() {
        for perm in Permission::all() {
            assert!(!permission_allows(&[], perm));
        }
    }

    #[test]
    fn test_iter_follows_canonical_order() {
        let table = PermissionTable::default();
        let names: Vec<_> = table.iter().map(|(p, _)| p).collect();
        assert_eq!(names, Permission::all().to_vec());
    }
}
