//! Offline policy inspection.
//!
//! Prints the role, permission and route tables, and evaluates gate and
//! permission decisions locally without contacting a server.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use innsight_core::middleware::{GateConfig, GateOutcome, RequestGate};
use innsight_core::rbac::{IdentityClaims, Permission, PermissionTable, Role, RoleHierarchy};

use super::config::load_value;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct RoutesArgs {
    /// Server configuration file whose `[gate]` section overrides the defaults
    #[arg(long)]
    server_config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Request path, optionally with a query string
    path: String,

    /// Role claim carried by the token (repeatable); none means no token
    #[arg(short, long = "role")]
    roles: Vec<String>,

    /// Server configuration file whose `[gate]` section overrides the defaults
    #[arg(long)]
    server_config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CanArgs {
    /// Permission name, e.g. INGEST_DATA
    permission: String,

    /// Held role (repeatable)
    #[arg(short, long = "role")]
    roles: Vec<String>,
}

// ── Table rows ──────────────────────────────────────────────────────────────

#[derive(Tabled, Serialize)]
struct RoleRow {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Satisfies")]
    satisfies: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled, Serialize)]
struct PermissionRow {
    #[tabled(rename = "Permission")]
    permission: String,
    #[tabled(rename = "Roles")]
    roles: String,
}

#[derive(Tabled, Serialize)]
struct RouteRow {
    #[tabled(rename = "#")]
    order: usize,
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Roles")]
    roles: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    path: String,
    roles: Vec<String>,
    required: Vec<Role>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

#[derive(Debug, Serialize)]
struct CanResult {
    permission: String,
    roles: Vec<String>,
    allowed: bool,
}

fn join_roles(roles: &[Role]) -> String {
    let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
    output::joined_or(&names, "")
}

// ── Commands ────────────────────────────────────────────────────────────────

pub fn roles(format: OutputFormat) -> Result<()> {
    let rows: Vec<RoleRow> = Role::all()
        .into_iter()
        .map(|role| RoleRow {
            role: role.to_string(),
            satisfies: join_roles(RoleHierarchy::subsumed_roles(role)),
            description: role.description().to_string(),
        })
        .collect();
    output::print_list(&rows, format)
}

pub fn permissions(format: OutputFormat) -> Result<()> {
    let rows: Vec<PermissionRow> = PermissionTable::standard()
        .iter()
        .map(|(permission, roles)| PermissionRow {
            permission: permission.to_string(),
            roles: join_roles(roles),
        })
        .collect();
    output::print_list(&rows, format)
}

pub fn routes(args: RoutesArgs, format: OutputFormat) -> Result<()> {
    let gate = load_gate_config(args.server_config)?;
    let rows: Vec<RouteRow> = gate
        .routes
        .entries()
        .iter()
        .enumerate()
        .map(|(i, route)| RouteRow {
            order: i + 1,
            prefix: route.prefix.clone(),
            roles: join_roles(&route.roles),
        })
        .collect();
    output::print_list(&rows, format)
}

pub fn check(args: CheckArgs, format: OutputFormat) -> Result<()> {
    let gate = RequestGate::new(load_gate_config(args.server_config)?);
    warn_unknown_roles(&args.roles);

    let result = evaluate(&gate, &args.path, &args.roles);

    match format {
        OutputFormat::Table => {
            output::print_header("Gate Decision");
            output::print_detail("Path", &result.path);
            let required: Vec<&str> = result.required.iter().map(Role::as_str).collect();
            output::print_detail("Token roles", &output::joined_or(&result.roles, "(no token)"));
            output::print_detail("Required", &output::joined_or(&required, "(public)"));
            match &result.location {
                Some(location) => output::print_decision(
                    false,
                    &format!("{} -> {}", result.outcome, location),
                ),
                None => output::print_decision(true, result.outcome),
            }
            Ok(())
        }
        _ => output::print_item(&result, format),
    }
}

pub fn can(args: CanArgs, format: OutputFormat) -> Result<()> {
    warn_unknown_roles(&args.roles);
    if Permission::parse(&args.permission).is_none() {
        output::print_warning(&format!(
            "Unknown permission '{}'; unknown permissions are always denied",
            args.permission
        ));
    }

    let held: Vec<Role> = args.roles.iter().filter_map(|r| Role::parse(r)).collect();
    let result = CanResult {
        allowed: PermissionTable::standard().allows_named(&held, &args.permission),
        permission: args.permission,
        roles: args.roles,
    };

    match format {
        OutputFormat::Table => {
            output::print_decision(
                result.allowed,
                &format!("{} for [{}]", result.permission, result.roles.join(", ")),
            );
            Ok(())
        }
        _ => output::print_item(&result, format),
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn evaluate(gate: &RequestGate, path: &str, roles: &[String]) -> CheckResult {
    let claims = (!roles.is_empty()).then(|| IdentityClaims::new("cli", roles.to_vec()));
    let outcome: GateOutcome = gate.evaluate(path, claims.as_ref());

    CheckResult {
        path: path.to_string(),
        roles: roles.to_vec(),
        required: gate.required_roles(path).to_vec(),
        outcome: outcome.label(),
        location: outcome.location().map(str::to_string),
    }
}

fn warn_unknown_roles(roles: &[String]) {
    for role in roles.iter().filter(|r| Role::parse(r).is_none()) {
        output::print_warning(&format!("Unknown role '{}' satisfies nothing", role));
    }
}

/// Read only the `[gate]` section, so no secret is needed to inspect routes.
fn load_gate_config(path: Option<PathBuf>) -> Result<GateConfig> {
    let path = path.or_else(|| load_value("server-config").map(PathBuf::from));
    let Some(path) = path else {
        return Ok(GateConfig::default());
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_gate_section(&content)
        .with_context(|| format!("Invalid [gate] section in {}", path.display()))
}

fn parse_gate_section(content: &str) -> Result<GateConfig> {
    let document: toml::Table = toml::from_str(content)?;
    match document.get("gate") {
        Some(section) => Ok(section.clone().try_into::<GateConfig>()?),
        None => Ok(GateConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_without_roles_is_login_redirect() {
        let result = evaluate(&RequestGate::default(), "/kpis?range=7d", &[]);
        assert_eq!(result.outcome, "redirect_login");
        assert_eq!(result.location.as_deref(), Some("/login?from=%2Fkpis%3Frange%3D7d"));
    }

    #[test]
    fn test_evaluate_with_role() {
        let gate = RequestGate::default();
        let result = evaluate(&gate, "/admin", &["analyst".to_string()]);
        assert_eq!(result.outcome, "redirect_denied");
        assert_eq!(result.required, vec![Role::Admin]);

        let result = evaluate(&gate, "/reports/new", &["analyst".to_string()]);
        assert_eq!(result.outcome, "allowed");
        assert!(result.location.is_none());
    }

    #[test]
    fn test_evaluate_unknown_role_on_landing_goes_to_login() {
        let result = evaluate(&RequestGate::default(), "/dashboard", &["superuser".to_string()]);
        assert_eq!(result.outcome, "redirect_login");
        assert_eq!(result.location.as_deref(), Some("/login?from=%2Fdashboard"));
    }

    #[test]
    fn test_parse_gate_section() {
        let gate = parse_gate_section(
            r#"
            [auth]
            jwt_secret = "unused"

            [gate]
            denied_path = "/home"

            [[gate.routes]]
            prefix = "/exports"
            roles = ["admin", "analyst"]
            "#,
        )
        .unwrap();
        assert_eq!(gate.denied_path, "/home");
        assert_eq!(gate.routes.entries().len(), 1);
        assert_eq!(gate.routes.required_roles("/exports/csv"), &[Role::Admin, Role::Analyst]);
    }

    #[test]
    fn test_missing_gate_section_uses_defaults() {
        let gate = parse_gate_section("[server]\nport = 8080\n").unwrap();
        assert_eq!(gate.routes.required_roles("/admin"), &[Role::Admin]);
    }
}
