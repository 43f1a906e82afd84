//! Health check command.
//!
//! Queries the `/health` endpoint and, with a token, the caller's session
//! capabilities from `/api/session`.

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct HealthArgs {
    /// Also resolve this session token against the server
    #[arg(short, long)]
    token: Option<String>,
}

pub async fn execute(args: HealthArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: serde_json::Value = client.get_raw("/health").await?;
    let session = match args.token.as_deref() {
        Some(token) => client.probe("/api/session", Some(token)).await?.body,
        None => None,
    };

    match format {
        OutputFormat::Table => {
            let status = health
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");

            output::print_header("System Health");
            output::print_detail("Status", status);
            output::print_detail("API URL", client.base_url());

            if let Some(version) = health.get("version").and_then(|v| v.as_str()) {
                output::print_detail("Version", version);
            }

            if let Some(ts) = health.get("timestamp").and_then(|v| v.as_str()) {
                output::print_detail("Timestamp", ts);
            }

            if let Some(session) = &session {
                output::print_header("Session");
                let authenticated = session
                    .get("authenticated")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                output::print_detail("Authenticated", &authenticated.to_string());
                if let Some(subject) = session.get("subject").and_then(|v| v.as_str()) {
                    output::print_detail("Subject", subject);
                }
                for key in ["roles", "permissions"] {
                    let values: Vec<&str> = session
                        .get(key)
                        .and_then(|v| v.as_array())
                        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                        .unwrap_or_default();
                    output::print_detail(key, &values.join(", "));
                }
            }

            if status == "healthy" || status == "ok" {
                output::print_success("All systems operational");
            } else {
                output::print_error(&format!("System status: {}", status));
            }
        }
        _ => output::print_item(
            &serde_json::json!({ "health": health, "session": session }),
            format,
        )?,
    }

    Ok(())
}
