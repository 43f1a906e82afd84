//! Session token verification.
//!
//! Features:
//! - JWT verification (HS256/HS384/HS512) with issuer, audience and leeway
//! - Token lookup from the `Authorization` header or the session cookie
//! - Development token issuance
//!
//! Credential checking and session issuance belong to the identity service.
//! This module only decides whether a presented token is genuine and what
//! roles it carries.
//!
//! # Example
//!
//! ```rust,ignore
//! use innsight_core::middleware::auth::{AuthConfig, TokenVerifier};
//!
//! let verifier = TokenVerifier::new(&AuthConfig::with_secret("your-secret-key"))?;
//! let claims = verifier.verify(token)?;
//! ```

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::rbac::IdentityClaims;
use crate::telemetry::logging::redact_tokens;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Token verification and issuance errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("No session token presented")]
    Missing,

    #[error("Session token has expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(String),

    #[error("Signing key error: {0}")]
    Key(String),

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// JWT Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role claims as issued; unknown values are tolerated.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl TokenClaims {
    pub fn new(subject: impl Into<String>, roles: Vec<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            email: None,
            name: None,
            roles,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: None,
            aud: None,
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// The identity handed to authorization decisions.
    pub fn into_identity(self) -> IdentityClaims {
        IdentityClaims {
            subject: self.sub,
            email: self.email,
            name: self.name,
            roles: self.roles,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// Token verification configuration (`[auth]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret. Required.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,

    #[serde(default)]
    pub issuer: Option<String>,

    #[serde(default)]
    pub audience: Option<String>,

    /// Leeway for expiration checks (in seconds)
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,

    /// Cookie carrying the session token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Lifetime of tokens issued by [`TokenVerifier::issue_for`]
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: std::time::Duration,
}

fn default_algorithm() -> Algorithm {
    Algorithm::HS256
}
fn default_leeway_secs() -> u64 {
    60
}
fn default_cookie_name() -> String {
    "innsight.session-token".to_string()
}
fn default_token_ttl() -> std::time::Duration {
    std::time::Duration::from_secs(8 * 60 * 60)
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            algorithm: default_algorithm(),
            issuer: None,
            audience: None,
            leeway_secs: default_leeway_secs(),
            cookie_name: default_cookie_name(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: Some(secret.into()),
            ..Self::default()
        }
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Verifier
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies session tokens and, for development, issues them.
pub struct TokenVerifier {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
    audience: Option<String>,
    cookie_name: String,
    token_ttl: std::time::Duration,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self, TokenError> {
        let secret = match config.algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => config
                .jwt_secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| TokenError::Key("auth.jwt_secret is required".into()))?,
            other => {
                return Err(TokenError::Key(format!(
                    "Unsupported JWT algorithm: {:?}",
                    other
                )));
            }
        };

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway_secs;
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        }

        Ok(Self {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            cookie_name: config.cookie_name.clone(),
            token_ttl: config.token_ttl,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Verify a raw token and return the identity it carries.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(token = %redact_tokens(token), error = %e, "Token verification failed");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;
        Ok(data.claims.into_identity())
    }

    /// Find the token in `headers` and verify it.
    ///
    /// The bearer token is tried first. If it fails verification and a
    /// session cookie is present, the cookie is tried; when both fail the
    /// bearer error is returned.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<IdentityClaims, TokenError> {
        let cookie = || cookie_value(headers, &self.cookie_name);
        match bearer_token(headers) {
            Some(bearer) => self.verify(&bearer).or_else(|err| match cookie() {
                Some(token) => {
                    debug!(error = %err, "Bearer token rejected, trying session cookie");
                    self.verify(&token).map_err(|_| err)
                }
                None => Err(err),
            }),
            None => self.verify(&cookie().ok_or(TokenError::Missing)?),
        }
    }

    /// Sign `claims`, stamping the configured issuer and audience.
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let mut claims = claims.clone();
        if claims.iss.is_none() {
            claims.iss = self.issuer.clone();
        }
        if claims.aud.is_none() {
            claims.aud = self.audience.clone();
        }
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Issue a token for `subject` with the configured lifetime.
    pub fn issue_for(&self, subject: &str, roles: Vec<String>) -> Result<String, TokenError> {
        let ttl = Duration::from_std(self.token_ttl)
            .map_err(|e| TokenError::Encoding(format!("token_ttl out of range: {}", e)))?;
        self.issue(&TokenClaims::new(subject, roles, ttl))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Token Extraction
// ═══════════════════════════════════════════════════════════════════════════════

/// Bearer token first, then the named session cookie. Does not verify; see
/// [`TokenVerifier::authenticate`] for the cookie fallback on a bad bearer.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()).map(str::to_string))
        .filter(|s| !s.is_empty())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
