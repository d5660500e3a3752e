use std::collections::HashMap;
use std::env;
use std::time::Duration;

use lazy_static::lazy_static;

use crate::errors::ConfigError;
use crate::models::RouteDefinition;

pub const DEFAULT_GATEWAY_HOST: &str = "127.0.0.1";
pub const DEFAULT_GATEWAY_PORT: u16 = 3030;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPSTREAMS: &str =
    "USER-SERVICE=http://localhost:8081;RESTAURANT-SERVICE=http://localhost:8082";

pub const DEFAULT_RESTAURANT_HOST: &str = "127.0.0.1";
pub const DEFAULT_RESTAURANT_PORT: u16 = 8082;
pub const DEFAULT_RESTAURANT_DB_PATH: &str = "./restaurants.db";

lazy_static! {
    /// Paths containing any of these substrings skip authentication.
    pub static ref DEFAULT_PUBLIC_PATHS: Vec<String> = vec![
        "/api/v1/auth/login".to_string(),
        "/api/v1/auth/register".to_string(),
        "/eureka".to_string(),
    ];

    /// Route table, checked in order.
    pub static ref DEFAULT_ROUTES: Vec<RouteDefinition> = vec![
        RouteDefinition::new("user-service", "/api/v1/user/**", "lb://USER-SERVICE", true),
        RouteDefinition::new("auth-service", "/api/v1/auth/**", "lb://USER-SERVICE", false),
        RouteDefinition::new(
            "restaurant-service",
            "/api/v2/restaurants/**",
            "lb://RESTAURANT-SERVICE",
            true,
        ),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    HS256,
    HS384,
    HS512,
}

impl std::str::FromStr for JwtAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(JwtAlgorithm::HS256),
            "HS384" => Ok(JwtAlgorithm::HS384),
            "HS512" => Ok(JwtAlgorithm::HS512),
            other => Err(ConfigError::Invalid {
                key: "JWT_ALGORITHM",
                reason: format!("unsupported algorithm {}", other),
            }),
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: JwtAlgorithm,
    /// Expected `iss` claim (None = not checked)
    pub issuer: Option<String>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub jwt: JwtConfig,
    pub public_paths: Vec<String>,
    pub routes: Vec<RouteDefinition>,
    /// Logical service name -> instance base URLs
    pub upstreams: HashMap<String, Vec<String>>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired("JWT_SECRET"))?;
        if secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "must not be empty".to_string(),
            });
        }

        let algorithm = match env::var("JWT_ALGORITHM") {
            Ok(value) => value.parse()?,
            Err(_) => JwtAlgorithm::HS256,
        };

        let issuer = env::var("JWT_ISSUER").ok().filter(|s| !s.trim().is_empty());

        let public_paths = match env::var("GATEWAY_PUBLIC_PATHS") {
            Ok(value) => parse_public_paths(&value)?,
            Err(_) => DEFAULT_PUBLIC_PATHS.clone(),
        };

        let upstreams = parse_upstreams(
            &env::var("GATEWAY_UPSTREAMS").unwrap_or_else(|_| DEFAULT_UPSTREAMS.to_string()),
        )?;

        Ok(Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| DEFAULT_GATEWAY_HOST.to_string()),
            port: parse_env("GATEWAY_PORT", DEFAULT_GATEWAY_PORT)?,
            request_timeout: Duration::from_secs(parse_env(
                "GATEWAY_REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )?),
            jwt: JwtConfig {
                secret,
                algorithm,
                issuer,
            },
            public_paths,
            routes: DEFAULT_ROUTES.clone(),
            upstreams,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RestaurantConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
}

impl RestaurantConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("RESTAURANT_HOST")
                .unwrap_or_else(|_| DEFAULT_RESTAURANT_HOST.to_string()),
            port: parse_env("RESTAURANT_PORT", DEFAULT_RESTAURANT_PORT)?,
            db_path: env::var("RESTAURANT_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_RESTAURANT_DB_PATH.to_string()),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Splits a comma separated list, dropping blanks. At least one path must remain.
pub fn parse_public_paths(raw: &str) -> Result<Vec<String>, ConfigError> {
    let paths: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    if paths.is_empty() {
        return Err(ConfigError::Invalid {
            key: "GATEWAY_PUBLIC_PATHS",
            reason: "at least one public path is required".to_string(),
        });
    }
    Ok(paths)
}

/// Parses `NAME=url[,url...];NAME=url`. Names are upper-cased.
pub fn parse_upstreams(raw: &str) -> Result<HashMap<String, Vec<String>>, ConfigError> {
    let mut upstreams = HashMap::new();

    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, urls) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
            key: "GATEWAY_UPSTREAMS",
            reason: format!("expected NAME=url in {:?}", entry),
        })?;

        let name = name.trim().to_ascii_uppercase();
        let instances: Vec<String> = urls
            .split(',')
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();

        if name.is_empty() || instances.is_empty() {
            return Err(ConfigError::Invalid {
                key: "GATEWAY_UPSTREAMS",
                reason: format!("service entry {:?} has no name or no instances", entry),
            });
        }

        upstreams.entry(name).or_insert_with(Vec::new).extend(instances);
    }

    Ok(upstreams)
}
