//! The closed role set and its subsumption table.
//!
//! Innsight ships with three roles:
//!
//! | Role     | Subsumes                      |
//! |----------|-------------------------------|
//! | Admin    | admin, analyst, viewer        |
//! | Analyst  | analyst, viewer               |
//! | Viewer   | viewer                        |
//!
//! The hierarchy is an explicit table, not a numeric ordering. Every entry
//! already lists its full downward closure, so lookups never walk a chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A caller classification. The set is closed: there are no dynamic roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Analyst,
    Viewer,
}

impl Role {
    /// Parse a claim value. Matching is exact; anything else is an unknown
    /// role and yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "analyst" => Some(Self::Analyst),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    /// The identifier carried in tokens and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Analyst => "analyst",
            Self::Viewer => "viewer",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Analyst => "Analyst",
            Self::Viewer => "Viewer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Manages users, roles and settings; full reporting access",
            Self::Analyst => "Ingests data, creates reports and views analytics",
            Self::Viewer => "Views the reports assigned to them",
        }
    }

    /// All roles, most privileged first.
    pub fn all() -> [Role; 3] {
        [Self::Admin, Self::Analyst, Self::Viewer]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Hierarchy
// ═══════════════════════════════════════════════════════════════════════════════

const ADMIN_SUBSUMES: &[Role] = &[Role::Admin, Role::Analyst, Role::Viewer];
const ANALYST_SUBSUMES: &[Role] = &[Role::Analyst, Role::Viewer];
const VIEWER_SUBSUMES: &[Role] = &[Role::Viewer];

/// The single source of truth for "is role A at least as privileged as role B".
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleHierarchy;

impl RoleHierarchy {
    /// The fixed downward closure of `role`, inclusive of itself.
    pub fn subsumed_roles(role: Role) -> &'static [Role] {
        match role {
            Role::Admin => ADMIN_SUBSUMES,
            Role::Analyst => ANALYST_SUBSUMES,
            Role::Viewer => VIEWER_SUBSUMES,
        }
    }

    /// Whether `held` contains `required` or a role that dominates it.
    pub fn role_satisfies(held: &[Role], required: Role) -> bool {
        held.iter().any(|r| Self::subsumed_roles(*r).contains(&required))
    }
}

/// Free-function form of [`RoleHierarchy::subsumed_roles`].
pub fn subsumed_roles(role: Role) -> &'static [Role] {
    RoleHierarchy::subsumed_roles(role)
}

/// Free-function form of [`RoleHierarchy::role_satisfies`].
///
/// An empty `held` slice never satisfies anything.
pub fn role_satisfies(held: &[Role], required: Role) -> bool {
    RoleHierarchy::role_satisfies(held, required)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_satisfies_itself() {
        for role in Role::all() {
            assert!(role_satisfies(&[role], role), "{role} should satisfy itself");
        }
    }

    #[test]
    fn test_hierarchy_direction() {
        assert!(role_satisfies(&[Role::Admin], Role::Viewer));
        assert!(role_satisfies(&[Role::Admin], Role::Analyst));
        assert!(role_satisfies(&[Role::Analyst], Role::Viewer));
        assert!(!role_satisfies(&[Role::Viewer], Role::Admin));
        assert!(!role_satisfies(&[Role::Viewer], Role::Analyst));
        assert!(!role_satisfies(&[Role::Analyst], Role::Admin));
    }

    #[test]
    fn test_empty_held_never_satisfies() {
        for role in Role::all() {
            assert!(!role_satisfies(&[], role));
        }
    }

    #[test]
    fn test_any_held_role_can_satisfy() {
        assert!(role_satisfies(&[Role::Viewer, Role::Admin], Role::Analyst));
    }

    #[test]
    fn test_closures_are_exhaustive() {
        assert_eq!(subsumed_roles(Role::Admin), &[Role::Admin, Role::Analyst, Role::Viewer]);
        assert_eq!(subsumed_roles(Role::Analyst), &[Role::Analyst, Role::Viewer]);
        assert_eq!(subsumed_roles(Role::Viewer), &[Role::Viewer]);
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("analyst"), Some(Role::Analyst));
        assert_eq!(Role::parse("viewer"), Some(Role::Viewer));
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_serde_uses_lowercase_ids() {
        let json = serde_json::to_string(&Role::Analyst).unwrap();
        assert_eq!(json, "\"analyst\"");
        let role: Role = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(role, Role::Viewer);
    }
}
