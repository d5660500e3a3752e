pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod restaurant;
pub mod routes;
pub mod services;

pub use errors::{AuthError, ConfigError, GatewayError, ServiceError};
pub use models::{AppState, Route, RouteDefinition, UpstreamTarget};
pub use services::{decide, GateDecision, GateRequest, TokenValidator};
