//! HTTP client for communicating with a running Innsight server.

use anyhow::{Context, Result};
use reqwest::{header, redirect, Client, StatusCode};

/// Result of a single un-followed request.
#[derive(Debug)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// HTTP client for the Innsight server.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client pointing at the given base URL.
    ///
    /// Redirects are never followed; the gate's redirects are what `probe`
    /// reports.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Return the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a raw GET request and return the full JSON value (for health endpoint).
    pub async fn get_raw(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// GET `path`, optionally with a bearer token, and report the raw outcome.
    pub async fn probe(&self, path: &str, token: Option<&str>) -> Result<ProbeResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.json::<serde_json::Value>().await.ok();

        Ok(ProbeResponse {
            status,
            location,
            body,
        })
    }
}
