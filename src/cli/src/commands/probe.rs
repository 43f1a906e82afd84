//! Probe a running server the way a browser would, without following
//! redirects.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ProbeArgs {
    /// Path to request, optionally with a query string
    path: String,

    /// Session token sent as a bearer credential
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Serialize)]
struct ProbeResult {
    path: String,
    status: u16,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<serde_json::Value>,
}

/// Name the gate outcome a response most likely came from.
fn classify(status: u16, location: Option<&str>) -> &'static str {
    match (status, location) {
        (307, Some(loc)) if loc.contains("error=") => "redirect_denied",
        (307, Some(_)) => "redirect_login",
        (200..=299, _) => "allowed",
        (401, _) => "unauthenticated",
        (403, _) => "forbidden",
        _ => "other",
    }
}

pub async fn execute(args: ProbeArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let path = if args.path.starts_with('/') {
        args.path
    } else {
        format!("/{}", args.path)
    };
    let resp = client.probe(&path, args.token.as_deref()).await?;

    let status = resp.status.as_u16();
    let result = ProbeResult {
        outcome: classify(status, resp.location.as_deref()),
        path,
        status,
        location: resp.location,
        body: resp.body,
    };

    match format {
        OutputFormat::Table => {
            output::print_header("Probe");
            output::print_detail("URL", &format!("{}{}", client.base_url(), result.path));
            output::print_detail("Status", &resp.status.to_string());
            if let Some(location) = &result.location {
                output::print_detail("Location", location);
            }
            output::print_detail("Outcome", result.outcome);
        }
        _ => output::print_item(&result, format)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(307, Some("/login?from=%2Fkpis")), "redirect_login");
        assert_eq!(
            classify(307, Some("/dashboard?error=insufficient_permissions")),
            "redirect_denied"
        );
        assert_eq!(classify(200, None), "allowed");
        assert_eq!(classify(403, None), "forbidden");
    }
}
