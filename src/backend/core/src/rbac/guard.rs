//! Guarded view: decides whether protected content, a placeholder, or a
//! navigation away is the right response to the current identity state.
//!
//! This is the in-application layer. It covers client-side navigations that
//! never reach the request gate, so it denies independently of it.
//!
//! The guard is a small state machine fed with [`AuthStatus`] events:
//!
//! ```text
//!            Loading                 Authenticated + role
//!   Pending ─────────▶ Pending ─────────────────────────▶ Granted
//!      │                                                     │
//!      │ Unauthenticated / missing role        Unauthenticated│
//!      ▼                                                     ▼
//!  Redirecting ◀─────────────────────────────────────────────┘
//! ```
//!
//! Navigation is a one-shot side effect: a guard asks its [`Navigator`] to
//! move at most once, however many times it is re-rendered.

use tracing::debug;

use super::models::AuthStatus;
use super::resolver::Capabilities;
use super::roles::Role;

/// Performs client-side navigation.
pub trait Navigator {
    fn navigate(&mut self, path: &str);
}

/// Guard lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Identity not resolved yet.
    Pending,
    /// Access denied; navigating to `target`.
    Redirecting { target: String },
    /// Protected content is being shown.
    Granted,
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Content(T),
    Placeholder(String),
}

impl<T> Rendered<T> {
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// Guard configuration and state for one protected view.
#[derive(Debug, Clone)]
pub struct ViewGuard {
    required_role: Option<Role>,
    fallback_path: String,
    login_path: String,
    placeholder: String,
    state: GuardState,
    navigated: bool,
}

impl Default for ViewGuard {
    fn default() -> Self {
        Self {
            required_role: None,
            fallback_path: "/dashboard".to_string(),
            login_path: "/login".to_string(),
            placeholder: "Loading...".to_string(),
            state: GuardState::Pending,
            navigated: false,
        }
    }
}

impl ViewGuard {
    /// A guard that only requires authentication.
    pub fn new() -> Self {
        Self::default()
    }

    /// A guard that requires `role` (or a role that dominates it).
    pub fn requiring(role: Role) -> Self {
        Self {
            required_role: Some(role),
            ..Self::default()
        }
    }

    pub fn fallback_path(mut self, path: impl Into<String>) -> Self {
        self.fallback_path = path.into();
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn required_role(&self) -> Option<Role> {
        self.required_role
    }

    /// Feed an identity event and advance the state machine.
    pub fn on_status(&mut self, status: &AuthStatus) -> &GuardState {
        let next = match status {
            // Keep showing content while a granted session refreshes.
            AuthStatus::Loading if self.state == GuardState::Granted => GuardState::Granted,
            AuthStatus::Loading => GuardState::Pending,
            AuthStatus::Unauthenticated => GuardState::Redirecting {
                target: self.login_path.clone(),
            },
            AuthStatus::Authenticated(_) => {
                let caps = Capabilities::new(status.clone());
                match self.required_role {
                    Some(role) if !caps.has_role(role) => GuardState::Redirecting {
                        target: self.fallback_path.clone(),
                    },
                    _ => GuardState::Granted,
                }
            }
        };

        if next != self.state {
            debug!(from = ?self.state, to = ?next, "View guard transition");
        }
        self.state = next;
        &self.state
    }

    /// Run one render pass. `content` is only built when access is granted;
    /// the navigator is called at most once over the guard's lifetime.
    pub fn render<T, N, F>(
        &mut self,
        status: &AuthStatus,
        navigator: &mut N,
        content: F,
    ) -> Rendered<T>
    where
        N: Navigator + ?Sized,
        F: FnOnce() -> T,
    {
        match self.on_status(status).clone() {
            GuardState::Granted => Rendered::Content(content()),
            GuardState::Pending => Rendered::Placeholder(self.placeholder.clone()),
            GuardState::Redirecting { target } => {
                if !self.navigated {
                    self.navigated = true;
                    navigator.navigate(&target);
                }
                Rendered::Placeholder(self.placeholder.clone())
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::models::IdentityClaims;

    #[derive(Default)]
    struct NavLog(Vec<String>);

    impl Navigator for NavLog {
        fn navigate(&mut self, path: &str) {
            self.0.push(path.to_string());
        }
    }

    fn authed(roles: &[&str]) -> AuthStatus {
        AuthStatus::Authenticated(IdentityClaims::new(
            "u1",
            roles.iter().map(|r| r.to_string()).collect(),
        ))
    }

    #[test]
    fn test_loading_renders_placeholder_without_navigation() {
        let mut guard = ViewGuard::requiring(Role::Analyst);
        let mut nav = NavLog::default();

        let out = guard.render(&AuthStatus::Loading, &mut nav, || "secret");
        assert_eq!(out, Rendered::Placeholder("Loading...".to_string()));
        assert!(nav.0.is_empty());
        assert_eq!(guard.state(), &GuardState::Pending);
    }

    #[test]
    fn test_no_flicker_after_resolution() {
        let mut guard = ViewGuard::requiring(Role::Viewer);
        let mut nav = NavLog::default();
        let mut builds = 0;
        let mut frames = Vec::new();

        for status in [
            AuthStatus::Loading,
            authed(&["viewer"]),
            authed(&["viewer"]),
            AuthStatus::Loading,
        ] {
            let out = guard.render(&status, &mut nav, || {
                builds += 1;
                "report"
            });
            frames.push(out.is_content());
        }

        // Placeholder while loading, then content with no flicker back.
        assert_eq!(frames, vec![false, true, true, true]);
        assert_eq!(builds, 3);
        assert!(nav.0.is_empty());
    }

    #[test]
    fn test_content_built_once_per_granted_transition() {
        let mut guard = ViewGuard::new();
        let mut nav = NavLog::default();
        let mut builds = 0;

        guard.render(&AuthStatus::Loading, &mut nav, || builds += 1);
        guard.render(&authed(&["viewer"]), &mut nav, || builds += 1);

        assert_eq!(builds, 1);
        assert_eq!(guard.state(), &GuardState::Granted);
    }

    #[test]
    fn test_unauthenticated_navigates_to_login() {
        let mut guard = ViewGuard::requiring(Role::Viewer);
        let mut nav = NavLog::default();

        let out = guard.render(&AuthStatus::Unauthenticated, &mut nav, || "secret");
        assert!(out.is_placeholder());
        assert_eq!(nav.0, vec!["/login".to_string()]);
    }

    #[test]
    fn test_missing_role_navigates_to_fallback() {
        let mut guard = ViewGuard::requiring(Role::Admin).fallback_path("/reports");
        let mut nav = NavLog::default();

        let out = guard.render(&authed(&["analyst"]), &mut nav, || "admin panel");
        assert!(out.is_placeholder());
        assert_eq!(nav.0, vec!["/reports".to_string()]);
        assert_eq!(
            guard.state(),
            &GuardState::Redirecting {
                target: "/reports".to_string()
            }
        );
    }

    #[test]
    fn test_default_fallback_is_dashboard() {
        let mut guard = ViewGuard::requiring(Role::Admin);
        let mut nav = NavLog::default();
        guard.render(&authed(&["viewer"]), &mut nav, || ());
        assert_eq!(nav.0, vec!["/dashboard".to_string()]);
    }

    #[test]
    fn test_navigation_fires_once() {
        let mut guard = ViewGuard::requiring(Role::Admin);
        let mut nav = NavLog::default();

        for _ in 0..5 {
            guard.render(&authed(&["viewer"]), &mut nav, || ());
        }
        guard.render(&AuthStatus::Unauthenticated, &mut nav, || ());

        assert_eq!(nav.0.len(), 1);
    }

    #[test]
    fn test_role_check_is_hierarchy_aware() {
        let mut guard = ViewGuard::requiring(Role::Viewer);
        let mut nav = NavLog::default();

        let out = guard.render(&authed(&["admin"]), &mut nav, || "ok");
        assert_eq!(out, Rendered::Content("ok"));
    }

    #[test]
    fn test_unknown_role_claims_are_denied() {
        let mut guard = ViewGuard::requiring(Role::Viewer);
        let mut nav = NavLog::default();

        let out = guard.render(&authed(&["owner"]), &mut nav, || "ok");
        assert!(out.is_placeholder());
        assert_eq!(nav.0, vec!["/dashboard".to_string()]);
    }

    #[test]
    fn test_logout_after_grant_redirects() {
        let mut guard = ViewGuard::new();
        let mut nav = NavLog::default();

        assert!(guard.render(&authed(&["viewer"]), &mut nav, || ()).is_content());
        assert!(guard.render(&AuthStatus::Unauthenticated, &mut nav, || ()).is_placeholder());
        assert_eq!(nav.0, vec!["/login".to_string()]);
    }

    #[test]
    fn test_custom_placeholder() {
        let mut guard = ViewGuard::new().placeholder("Checking access");
        let mut nav = NavLog::default();
        let out: Rendered<()> = guard.render(&AuthStatus::Loading, &mut nav, || ());
        assert_eq!(out, Rendered::Placeholder("Checking access".to_string()));
    }
}
