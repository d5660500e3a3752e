use thiserror::Error;

/// Failures raised by the gateway while routing and forwarding a request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
    #[error("HTTP Error: {0}")]
    Http(String),
    #[error("Request timed out")]
    Timeout,
    #[error("No route matches {0}")]
    RouteNotFound(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl warp::reject::Reject for GatewayError {}

/// Why a bearer credential was refused. Only ever logged.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    Missing,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token rejected: {0}")]
    Rejected(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => AuthError::Malformed(e.to_string()),
            _ => AuthError::Rejected(e.to_string()),
        }
    }
}

/// Errors of the restaurant data service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl warp::reject::Reject for ServiceError {}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingRequired(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
