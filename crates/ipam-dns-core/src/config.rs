//! Configuration types for the synchronizer
//!
//! Configuration is established once at startup and never mutated; the
//! engine and planner only ever read it.

use crate::reverse::{DEFAULT_IPV6_ZONE_NIBBLES, ReverseZoneResolver};
use serde::{Deserialize, Serialize};

/// Main synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Forward zone (e.g. "example.com."); names outside it get no A/AAAA
    pub domain: String,

    /// Never create or delete forward (A/AAAA) records
    #[serde(default)]
    pub skip_forward_record: bool,

    /// Never create or delete reverse (PTR) records
    #[serde(default)]
    pub skip_reverse_record: bool,

    /// Leading nibbles forming an IPv6 reverse zone (8 = /32)
    #[serde(default = "default_ipv6_zone_nibbles")]
    pub ipv6_zone_nibbles: usize,

    /// DNS management API configuration
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a configuration for `domain` with defaults everywhere else
    pub fn new(domain: impl Into<String>, provider: ProviderConfig) -> Self {
        Self {
            domain: domain.into(),
            skip_forward_record: false,
            skip_reverse_record: false,
            ipv6_zone_nibbles: default_ipv6_zone_nibbles(),
            provider,
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.trim().is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }

        ReverseZoneResolver::new(self.ipv6_zone_nibbles)?;

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.provider.validate()?;

        Ok(())
    }
}

/// DNS management API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// PowerDNS authoritative server HTTP API
    #[serde(rename = "powerdns")]
    PowerDns {
        /// Base URL of the API (e.g. "http://pdns:8081")
        api_url: String,
        /// Value of the `X-API-Key` header
        api_key: String,
        /// PowerDNS server id
        #[serde(default = "default_server_id")]
        server_id: String,
        /// Log changes instead of sending them
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::PowerDns {
                api_url,
                api_key,
                server_id,
                ..
            } => {
                if api_url.is_empty() {
                    return Err(crate::Error::config("PowerDNS API URL cannot be empty"));
                }
                if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "PowerDNS API URL must use http or https, got {}",
                        api_url
                    )));
                }
                if api_key.is_empty() {
                    return Err(crate::Error::config("PowerDNS API key cannot be empty"));
                }
                if server_id.is_empty() {
                    return Err(crate::Error::config("PowerDNS server id cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::PowerDns { .. } => "powerdns",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// Keeps the API key out of logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::PowerDns {
                api_url,
                server_id,
                dry_run,
                ..
            } => f
                .debug_struct("PowerDns")
                .field("api_url", api_url)
                .field("api_key", &"<REDACTED>")
                .field("server_id", server_id)
                .field("dry_run", dry_run)
                .finish(),
            ProviderConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the progress event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_ipv6_zone_nibbles() -> usize {
    DEFAULT_IPV6_ZONE_NIBBLES
}

fn default_server_id() -> String {
    "localhost".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
