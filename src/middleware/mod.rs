use std::sync::Arc;

use hyper::StatusCode;

use crate::services::{decide, GateDecision, GateRequest, TokenValidator};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Continue,
    Respond(StatusCode),
}

/// A step in a route's request pipeline.
pub trait GatewayFilter: Send + Sync {
    fn name(&self) -> &'static str;
    fn filter(&self, request: &GateRequest<'_>) -> FilterOutcome;
}

/// Ordered filters; the first one that responds ends the chain.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn GatewayFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F: GatewayFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn run(&self, request: &GateRequest<'_>) -> FilterOutcome {
        for filter in &self.filters {
            if let FilterOutcome::Respond(status) = filter.filter(request) {
                tracing::debug!(filter = filter.name(), path = %request.path, %status, "Filter short-circuited request");
                return FilterOutcome::Respond(status);
            }
        }
        FilterOutcome::Continue
    }
}

pub struct JwtAuthenticationFilter {
    public_paths: Arc<[String]>,
    validator: Arc<dyn TokenValidator>,
}

impl JwtAuthenticationFilter {
    pub fn new(public_paths: Arc<[String]>, validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            public_paths,
            validator,
        }
    }
}

impl GatewayFilter for JwtAuthenticationFilter {
    fn name(&self) -> &'static str {
        "jwt-authentication"
    }

    fn filter(&self, request: &GateRequest<'_>) -> FilterOutcome {
        match decide(request, &self.public_paths, self.validator.as_ref()) {
            GateDecision::Allow => FilterOutcome::Continue,
            GateDecision::Deny(_) => FilterOutcome::Respond(StatusCode::UNAUTHORIZED),
        }
    }
}
