//! Request gating: decides whether an inbound request may be forwarded.

use std::panic::{self, AssertUnwindSafe};

use http::header::AUTHORIZATION;
use http::HeaderMap;

use crate::errors::AuthError;

pub mod discovery;
pub mod jwt;

pub use discovery::ServiceRegistry;
pub use jwt::{Claims, JwtValidator};

#[cfg(test)]
mod tests;

const BEARER_PREFIX: &str = "Bearer ";

/// The parts of an inbound request the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a> GateRequest<'a> {
    pub fn new(path: &'a str, headers: &'a HeaderMap) -> Self {
        Self { path, headers }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingCredential,
    InvalidCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(DenyReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Checks a raw bearer token.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<(), AuthError>;
}

impl<F> TokenValidator for F
where
    F: Fn(&str) -> Result<(), AuthError> + Send + Sync,
{
    fn validate(&self, token: &str) -> Result<(), AuthError> {
        self(token)
    }
}

pub fn is_public_path(path: &str, public_paths: &[String]) -> bool {
    public_paths.iter().any(|p| path.contains(p.as_str()))
}

/// First `Authorization` value with a leading `"Bearer "` removed.
/// Values without the prefix are returned unchanged.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::Missing)?;
    let raw = value
        .to_str()
        .map_err(|_| AuthError::Malformed("authorization header is not visible ASCII".to_string()))?;

    Ok(raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw))
}

/// Decides ALLOW or DENY for a single request.
///
/// Public paths are allowed without looking at headers. Everything else
/// needs a credential the validator accepts. Validator errors and panics
/// both deny.
pub fn decide<V>(request: &GateRequest<'_>, public_paths: &[String], validator: &V) -> GateDecision
where
    V: TokenValidator + ?Sized,
{
    if is_public_path(request.path, public_paths) {
        return GateDecision::Allow;
    }

    let token = match extract_token(request.headers) {
        Ok(token) => token,
        Err(AuthError::Missing) => {
            tracing::debug!(path = %request.path, "Missing Authorization header");
            return GateDecision::Deny(DenyReason::MissingCredential);
        }
        Err(e) => {
            tracing::debug!(path = %request.path, error = %e, "Unreadable Authorization header");
            return GateDecision::Deny(DenyReason::InvalidCredential);
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(|| validator.validate(token))) {
        Ok(Ok(())) => GateDecision::Allow,
        Ok(Err(e)) => {
            tracing::debug!(path = %request.path, error = %e, "Token validation failed");
            GateDecision::Deny(DenyReason::InvalidCredential)
        }
        Err(_) => {
            tracing::warn!(path = %request.path, "Token validator panicked");
            GateDecision::Deny(DenyReason::InvalidCredential)
        }
    }
}
