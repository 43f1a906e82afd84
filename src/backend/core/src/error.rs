//! Error handling for Innsight Core.
//!
//! This module provides:
//! - A single error type with a stable, machine-readable code
//! - HTTP status code mapping for API responses
//! - User-friendly messages vs detailed internal messages
//! - Error logging with tracing integration
//!
//! Authorization failures on pages are answered with redirects by the request
//! gate; this type is what API routes return instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::middleware::auth::TokenError;
use crate::rbac::DenyReason;

/// A specialized Result type for Innsight operations.
pub type Result<T> = std::result::Result<T, InnsightError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authorization (4000-4099)
    Unauthenticated,
    InsufficientRole,
    InvalidToken,
    TokenExpired,

    // Configuration (5000-5099)
    ConfigurationError,
    MissingConfiguration,

    // Internal (9000-9099)
    InternalError,
}

impl ErrorCode {
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::Unauthenticated => 4000,
            Self::InsufficientRole => 4001,
            Self::InvalidToken => 4002,
            Self::TokenExpired => 4003,
            Self::ConfigurationError => 5000,
            Self::MissingConfiguration => 5001,
            Self::InternalError => 9000,
        }
    }

    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::InsufficientRole => StatusCode::FORBIDDEN,
            Self::ConfigurationError | Self::MissingConfiguration | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            4000..=4099 => "authorization",
            5000..=5099 => "configuration",
            _ => "internal",
        }
    }

    /// Wire form, e.g. `INSUFFICIENT_ROLE`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InsufficientRole => "INSUFFICIENT_ROLE",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::MissingConfiguration => "MISSING_CONFIGURATION",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Innsight Core.
#[derive(Error, Debug)]
pub struct InnsightError {
    code: ErrorCode,

    /// Safe to expose to clients
    user_message: Cow<'static, str>,

    /// For logging only
    internal_message: Option<String>,

    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for InnsightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl InnsightError {
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            source: None,
        }
    }

    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Authentication is required")
    }

    pub fn insufficient_role(required: impl fmt::Display) -> Self {
        Self::with_internal(
            ErrorCode::InsufficientRole,
            "You do not have permission to perform this action",
            format!("required: {}", required),
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::ConfigurationError,
            "The service is misconfigured",
            message,
        )
    }

    pub fn missing_configuration(key: &str) -> Self {
        Self::with_internal(
            ErrorCode::MissingConfiguration,
            "The service is misconfigured",
            format!("missing configuration value: {}", key),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(ErrorCode::InternalError, "An internal error occurred", message)
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Log this error. Client errors at `warn`, server errors at `error`.
    pub fn log(&self) {
        let status = self.http_status();
        if status.is_server_error() {
            error!(
                error_code = %self.code,
                category = self.code.category(),
                http_status = status.as_u16(),
                internal_message = ?self.internal_message,
                source = ?self.source,
                "Request failed"
            );
        } else {
            warn!(
                error_code = %self.code,
                category = self.code.category(),
                http_status = status.as_u16(),
                internal_message = ?self.internal_message,
                "Request rejected"
            );
        }
    }
}

impl From<DenyReason> for InnsightError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => Self::unauthenticated(),
            DenyReason::InsufficientRole => Self::new(
                ErrorCode::InsufficientRole,
                "You do not have permission to perform this action",
            ),
        }
    }
}

impl From<TokenError> for InnsightError {
    fn from(error: TokenError) -> Self {
        let (code, message) = match &error {
            TokenError::Missing => (ErrorCode::Unauthenticated, "Authentication is required"),
            TokenError::Expired => (ErrorCode::TokenExpired, "The session has expired"),
            TokenError::Invalid(_) => (ErrorCode::InvalidToken, "The provided token is invalid"),
            TokenError::Key(_) | TokenError::Encoding(_) => {
                (ErrorCode::InternalError, "An internal error occurred")
            }
        };
        Self::with_internal(code, message, error.to_string()).with_source(error)
    }
}

impl From<config::ConfigError> for InnsightError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string()).with_source(error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error body for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub numeric_code: u32,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&InnsightError> for ErrorResponse {
    fn from(error: &InnsightError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: error.code,
                numeric_code: error.code.numeric_code(),
                message: error.user_message.to_string(),
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

impl IntoResponse for InnsightError {
    fn into_response(self) -> Response {
        self.log();

        counter!(
            "innsight_errors_total",
            "code" => self.code.as_str(),
            "category" => self.code.category()
        )
        .increment(1);

        let status = self.http_status();
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::Unauthenticated.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::InsufficientRole.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorCode::MissingConfiguration.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::InvalidToken.category(), "authorization");
        assert_eq!(ErrorCode::ConfigurationError.category(), "configuration");
        assert_eq!(ErrorCode::InternalError.category(), "internal");
    }

    #[test]
    fn test_from_deny_reason() {
        let err = InnsightError::from(DenyReason::Unauthenticated);
        assert_eq!(err.code(), ErrorCode::Unauthenticated);
        let err = InnsightError::from(DenyReason::InsufficientRole);
        assert_eq!(err.code(), ErrorCode::InsufficientRole);
    }

    #[test]
    fn test_from_token_error() {
        assert_eq!(InnsightError::from(TokenError::Expired).code(), ErrorCode::TokenExpired);
        assert_eq!(
            InnsightError::from(TokenError::Invalid("bad signature".into())).code(),
            ErrorCode::InvalidToken
        );
    }

    #[test]
    fn test_display_includes_internal() {
        let err = InnsightError::insufficient_role("INGEST_DATA");
        let text = err.to_string();
        assert!(text.contains("INSUFFICIENT_ROLE"));
        assert!(text.contains("required: INGEST_DATA"));
        assert!(!err.user_message().contains("INGEST_DATA"));
    }

    #[test]
    fn test_error_response_shape() {
        let err = InnsightError::unauthenticated();
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
        assert_eq!(body["error"]["numeric_code"], 4000);
    }

    #[test]
    fn test_into_response_status() {
        let response = InnsightError::insufficient_role("MANAGE_USERS").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
