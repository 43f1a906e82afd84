//! Route policy table: which roles may enter which path prefix.
//!
//! Matching runs in two passes. An exact key match wins outright; otherwise
//! entries are scanned in declared order and the first key that is a prefix
//! of the path wins. The scan is not longest-prefix: a short prefix declared
//! before a longer one shadows it, so tables must be authored
//! most-specific-first.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::roles::Role;

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// Path prefix, e.g. `/reports/new`.
    pub prefix: String,
    /// Roles allowed to enter.
    pub roles: Vec<Role>,
}

impl RoutePolicy {
    pub fn new(prefix: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            prefix: prefix.into(),
            roles,
        }
    }
}

/// Ordered route table. Declared order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePolicyTable {
    entries: Vec<RoutePolicy>,
}

impl RoutePolicyTable {
    pub fn new(entries: Vec<RoutePolicy>) -> Self {
        Self { entries }
    }

    /// Append an entry after all existing ones.
    pub fn with_route(mut self, prefix: impl Into<String>, roles: Vec<Role>) -> Self {
        self.entries.push(RoutePolicy::new(prefix, roles));
        self
    }

    pub fn entries(&self) -> &[RoutePolicy] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Roles required to enter `path`. An empty slice means the path is public.
    pub fn required_roles(&self, path: &str) -> &[Role] {
        let path = normalize_path(path);

        if let Some(entry) = self.entries.iter().find(|e| e.prefix == path) {
            trace!(path, prefix = %entry.prefix, "Exact route match");
            return &entry.roles;
        }

        if let Some(entry) = self.entries.iter().find(|e| path.starts_with(e.prefix.as_str())) {
            trace!(path, prefix = %entry.prefix, "Prefix route match");
            return &entry.roles;
        }

        &[]
    }
}

impl Default for RoutePolicyTable {
    fn default() -> Self {
        use Role::*;

        Self::new(Vec::new())
            .with_route("/admin", vec![Admin])
            .with_route("/ingest", vec![Admin, Analyst])
            .with_route("/reports/new", vec![Admin, Analyst])
            .with_route("/dashboard", vec![Admin, Analyst, Viewer])
            .with_route("/kpis", vec![Admin, Analyst, Viewer])
            .with_route("/reports", vec![Admin, Analyst, Viewer])
    }
}

/// Strip the query string and fragment; they never take part in matching.
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use Role::*;

    #[test]
    fn test_exact_match() {
        let table = RoutePolicyTable::default();
        assert_eq!(table.required_roles("/admin"), &[Admin]);
        assert_eq!(table.required_roles("/kpis"), &[Admin, Analyst, Viewer]);
    }

    #[test]
    fn test_prefix_match() {
        let table = RoutePolicyTable::default();
        assert_eq!(table.required_roles("/admin/users"), &[Admin]);
        assert_eq!(table.required_roles("/reports/42"), &[Admin, Analyst, Viewer]);
    }

    #[test]
    fn test_unmatched_path_is_public() {
        let table = RoutePolicyTable::default();
        assert!(table.required_roles("/login").is_empty());
        assert!(table.required_roles("/").is_empty());
    }

    #[test]
    fn test_query_string_ignored() {
        let table = RoutePolicyTable::default();
        assert_eq!(table.required_roles("/admin?tab=users"), &[Admin]);
        assert_eq!(table.required_roles("/reports/new?draft=1#top"), &[Admin, Analyst]);
    }

    #[test]
    fn test_general_prefix_matches_when_no_specific_entry() {
        let table = RoutePolicyTable::new(Vec::new())
            .with_route("/admin", vec![Admin])
            .with_route("/reports", vec![Admin, Analyst, Viewer]);
        assert_eq!(table.required_roles("/reports/new"), &[Admin, Analyst, Viewer]);
    }

    #[test]
    fn test_specific_entry_declared_first_wins() {
        let table = RoutePolicyTable::new(Vec::new())
            .with_route("/reports/new", vec![Admin, Analyst])
            .with_route("/reports", vec![Admin, Analyst, Viewer]);
        assert_eq!(table.required_roles("/reports/new/draft"), &[Admin, Analyst]);
    }

    #[test]
    fn test_general_entry_declared_first_shadows_specific() {
        let table = RoutePolicyTable::new(Vec::new())
            .with_route("/reports", vec![Admin, Analyst, Viewer])
            .with_route("/reports/new", vec![Admin, Analyst]);
        // Prefix scan follows declared order.
        assert_eq!(table.required_roles("/reports/new/draft"), &[Admin, Analyst, Viewer]);
        // The exact pass still finds the later entry.
        assert_eq!(table.required_roles("/reports/new"), &[Admin, Analyst]);
    }

    #[test]
    fn test_prefix_is_plain_string_prefix() {
        let table = RoutePolicyTable::default();
        assert_eq!(table.required_roles("/administrator"), &[Admin]);
    }

    #[test]
    fn test_deserialize_preserves_order() {
        let json = r#"[
            {"prefix": "/reports/new", "roles": ["admin", "analyst"]},
            {"prefix": "/reports", "roles": ["admin", "analyst", "viewer"]}
        ]"#;
        let table: RoutePolicyTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.entries()[0].prefix, "/reports/new");
        assert_eq!(table.required_roles("/reports/new/x"), &[Admin, Analyst]);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b?c=d"), "/a/b");
        assert_eq!(normalize_path("/a#frag"), "/a");
        assert_eq!(normalize_path("/plain"), "/plain");
    }
}
