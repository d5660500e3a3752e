use std::sync::Arc;
use std::time::Duration;

use hyper::client::HttpConnector;
use hyper::Client;

use crate::config::GatewayConfig;
use crate::errors::{ConfigError, GatewayError};
use crate::middleware::{FilterChain, JwtAuthenticationFilter};
use crate::services::{JwtValidator, ServiceRegistry, TokenValidator};

const LOAD_BALANCED_SCHEME: &str = "lb://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub id: String,
    /// `/prefix/**` or an exact path
    pub path: String,
    /// `lb://SERVICE-NAME` or an absolute base URL
    pub uri: String,
    pub authenticated: bool,
}

impl RouteDefinition {
    pub fn new(id: &str, path: &str, uri: &str, authenticated: bool) -> Self {
        Self {
            id: id.to_string(),
            path: path.to_string(),
            uri: uri.to_string(),
            authenticated,
        }
    }

    pub fn matches(&self, request_path: &str) -> bool {
        match self.path.strip_suffix("/**") {
            Some(base) => {
                request_path == base
                    || request_path
                        .strip_prefix(base)
                        .map_or(false, |rest| rest.starts_with('/'))
            }
            None => request_path == self.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamTarget {
    LoadBalanced(String),
    Direct(String),
}

impl UpstreamTarget {
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        if let Some(name) = uri.strip_prefix(LOAD_BALANCED_SCHEME) {
            let name = name.trim_end_matches('/');
            if name.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "routes",
                    reason: format!("{} names no service", uri),
                });
            }
            return Ok(UpstreamTarget::LoadBalanced(name.to_ascii_uppercase()));
        }

        if uri.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "routes",
                reason: format!("{} needs TLS, upstream client speaks plain http only", uri),
            });
        }

        if uri.starts_with("http://") {
            return Ok(UpstreamTarget::Direct(uri.trim_end_matches('/').to_string()));
        }

        Err(ConfigError::Invalid {
            key: "routes",
            reason: format!("unsupported route uri {}", uri),
        })
    }
}

pub struct Route {
    pub definition: RouteDefinition,
    pub target: UpstreamTarget,
    pub filters: FilterChain,
}

pub struct AppState {
    pub routes: Vec<Route>,
    pub registry: ServiceRegistry,
    pub client: Client<HttpConnector>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(routes: Vec<Route>, registry: ServiceRegistry, request_timeout: Duration) -> Self {
        Self {
            routes,
            registry,
            client: Client::new(),
            request_timeout,
        }
    }

    /// Builds routes, filter chains and the registry from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let validator: Arc<dyn TokenValidator> = Arc::new(JwtValidator::new(&config.jwt));
        Self::with_validator(config, validator)
    }

    pub fn with_validator(
        config: &GatewayConfig,
        validator: Arc<dyn TokenValidator>,
    ) -> Result<Self, ConfigError> {
        let registry = ServiceRegistry::new(&config.upstreams);
        let public_paths: Arc<[String]> = config.public_paths.clone().into();

        let mut routes = Vec::with_capacity(config.routes.len());
        for definition in &config.routes {
            let target = UpstreamTarget::parse(&definition.uri)?;
            if let UpstreamTarget::LoadBalanced(ref name) = target {
                if !registry.contains(name) {
                    tracing::warn!(route = %definition.id, service = %name, "Route targets a service with no instances");
                }
            }

            let mut filters = FilterChain::new();
            if definition.authenticated {
                filters = filters.with(JwtAuthenticationFilter::new(
                    public_paths.clone(),
                    validator.clone(),
                ));
            }

            routes.push(Route {
                definition: definition.clone(),
                target,
                filters,
            });
        }

        Ok(Self::new(routes, registry, config.request_timeout))
    }

    pub fn find_route(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.definition.matches(path))
    }

    /// Base URL of the instance that should receive a request for `route`.
    pub fn upstream_base<'a>(&'a self, route: &'a Route) -> Result<&'a str, GatewayError> {
        match route.target {
            UpstreamTarget::LoadBalanced(ref name) => self.registry.resolve(name),
            UpstreamTarget::Direct(ref base) => Ok(base.as_str()),
        }
    }
}
