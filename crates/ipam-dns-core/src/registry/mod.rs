//! Plugin-based provider registry
//!
//! The registry allows record API providers to be registered at runtime,
//! so the daemon can build one from configuration without hard-coding the
//! list of providers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ipam_dns_core::registry::ProviderRegistry;
//! use ipam_dns_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! ipam_dns_provider_powerdns::register(&registry);
//!
//! let config = ProviderConfig::PowerDns { ... };
//! let api = registry.create_provider(&config)?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{RecordApi, RecordApiFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Provider registry for plugin-based record API creation
///
/// Maps provider type names to factory objects.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered record API factories
    providers: RwLock<HashMap<String, Box<dyn RecordApiFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record API factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "powerdns")
    /// - `factory`: Factory object for creating provider instances
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn RecordApiFactory>) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Create a record API client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RecordApi>)`: Created provider instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn RecordApi>> {
        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .map_err(|_| Error::config("Provider registry lock poisoned"))?;

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}
