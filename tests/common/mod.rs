//! Shared helpers for integration tests.

use std::sync::Arc;

use vitalyst_guard::{SecurityConfig, SecurityService};

/// Build a service from defaults adjusted by `tweak`.
pub fn service_with(tweak: impl FnOnce(&mut SecurityConfig)) -> SecurityService {
    let mut config = SecurityConfig::default();
    tweak(&mut config);
    SecurityService::from_config(Arc::new(config)).expect("valid config and entropy source")
}
