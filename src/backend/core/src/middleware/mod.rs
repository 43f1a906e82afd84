//! HTTP middleware for Innsight Core.
pub mod auth;
pub mod gate;

pub use auth::{extract_token, AuthConfig, TokenClaims, TokenError, TokenVerifier};
pub use gate::{
    GateConfig, GateOutcome, GateState, RequestGate, RequestGateLayer, RequestGateService,
};
