use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::GatewayError;

struct ServicePool {
    instances: Vec<String>,
    next: AtomicUsize,
}

/// Static registry of logical service names to instance base URLs.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServicePool>,
}

impl ServiceRegistry {
    pub fn new(upstreams: &HashMap<String, Vec<String>>) -> Self {
        let services = upstreams
            .iter()
            .filter(|(_, instances)| !instances.is_empty())
            .map(|(name, instances)| {
                (
                    name.to_ascii_uppercase(),
                    ServicePool {
                        instances: instances.clone(),
                        next: AtomicUsize::new(0),
                    },
                )
            })
            .collect();

        Self { services }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(&name.to_ascii_uppercase())
    }

    /// Picks the next instance of `name`, round-robin.
    pub fn resolve(&self, name: &str) -> Result<&str, GatewayError> {
        let pool = self
            .services
            .get(&name.to_ascii_uppercase())
            .ok_or_else(|| GatewayError::ServiceUnavailable(name.to_string()))?;

        let idx = pool.next.fetch_add(1, Ordering::Relaxed) % pool.instances.len();
        Ok(&pool.instances[idx])
    }
}
