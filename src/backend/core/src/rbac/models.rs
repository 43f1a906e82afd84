//! RBAC data models: permissions, identity claims, decisions and session status.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::roles::Role;

// ═══════════════════════════════════════════════════════════════════════════════
// Permission
// ═══════════════════════════════════════════════════════════════════════════════

/// A named capability. Each permission maps to an explicit role list in the
/// [`PermissionTable`](super::policy::PermissionTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ManageUsers,
    ManageRoles,
    IngestData,
    ViewRawData,
    CreateReports,
    ViewAllReports,
    ViewAssignedReports,
    ManageSettings,
    ViewAnalytics,
}

impl Permission {
    /// Parse the wire name (`"INGEST_DATA"`). Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|p| p.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageUsers => "MANAGE_USERS",
            Self::ManageRoles => "MANAGE_ROLES",
            Self::IngestData => "INGEST_DATA",
            Self::ViewRawData => "VIEW_RAW_DATA",
            Self::CreateReports => "CREATE_REPORTS",
            Self::ViewAllReports => "VIEW_ALL_REPORTS",
            Self::ViewAssignedReports => "VIEW_ASSIGNED_REPORTS",
            Self::ManageSettings => "MANAGE_SETTINGS",
            Self::ViewAnalytics => "VIEW_ANALYTICS",
        }
    }

    pub fn all() -> [Permission; 9] {
        [
            Self::ManageUsers,
            Self::ManageRoles,
            Self::IngestData,
            Self::ViewRawData,
            Self::CreateReports,
            Self::ViewAllReports,
            Self::ViewAssignedReports,
            Self::ManageSettings,
            Self::ViewAnalytics,
        ]
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Identity Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// The verified identity attached to the current caller.
///
/// Role strings are kept exactly as the identity layer issued them. Values
/// that are not a known [`Role`] are carried along but never satisfy a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (user id)
    pub subject: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Raw role claims
    #[serde(default)]
    pub roles: Vec<String>,
}

impl IdentityClaims {
    pub fn new(subject: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            name: None,
            roles,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Known roles among the raw claims. Unknown strings are dropped.
    pub fn held_roles(&self) -> Vec<Role> {
        let mut held = Vec::with_capacity(self.roles.len());
        for role in self.roles.iter().filter_map(|r| Role::parse(r)) {
            if !held.contains(&role) {
                held.push(role);
            }
        }
        held
    }

    /// Flat membership: whether `role` itself appears among the claims.
    /// No hierarchy expansion.
    pub fn has_raw_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decisions
// ═══════════════════════════════════════════════════════════════════════════════

/// Why a check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No verifiable identity where one is required.
    Unauthenticated,
    /// Identity present, required role or permission not held.
    InsufficientRole,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::InsufficientRole => f.write_str("insufficient_role"),
        }
    }
}

/// Output of a single authorization check. There are no partial states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum AuthorizationDecision {
    Allow,
    Deny(DenyReason),
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allow
        } else {
            Self::Deny(DenyReason::InsufficientRole)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session Status
// ═══════════════════════════════════════════════════════════════════════════════

/// What the identity layer currently knows about the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Identity resolution still in flight.
    Loading,
    Unauthenticated,
    Authenticated(IdentityClaims),
}

impl AuthStatus {
    pub fn from_claims(claims: Option<IdentityClaims>) -> Self {
        match claims {
            Some(claims) => Self::Authenticated(claims),
            None => Self::Unauthenticated,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn claims(&self) -> Option<&IdentityClaims> {
        match self {
            Self::Authenticated(claims) => Some(claims),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
