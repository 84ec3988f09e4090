//! Daemon configuration
//!
//! All configuration comes from environment variables, read once at startup.

use anyhow::{Context, Result};
use ipam_dns_core::reverse::DEFAULT_IPV6_ZONE_NIBBLES;
use ipam_dns_core::{ProviderConfig, SyncConfig};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_LISTEN_ADDRESS: &str = ":8080";
const DEFAULT_SERVER_ID: &str = "localhost";
const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 60;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub listen_address: String,
    pub pdns_api_host: String,
    pub pdns_api_key: String,
    pub pdns_server_id: String,
    pub domain: String,
    pub secret: Option<String>,
    pub skip_forward_record: bool,
    pub skip_reverse_record: bool,
    pub ipv6_zone_nibbles: usize,
    pub pipeline_timeout_secs: u64,
    pub dry_run: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).unwrap_or_default();
        // Any non-empty value switches a flag on
        let flag = |name: &str| lookup(name).is_some_and(|v| !v.is_empty());

        Ok(Self {
            listen_address: lookup("LISTEN_ADDRESS")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string()),
            pdns_api_host: var("PDNS_API_HOST"),
            pdns_api_key: var("PDNS_API_KEY"),
            pdns_server_id: lookup("PDNS_SERVER_ID")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVER_ID.to_string()),
            domain: var("DOMAIN"),
            secret: lookup("SECRET").filter(|v| !v.is_empty()),
            skip_forward_record: flag("SKIP_FORWARD_RECORDS"),
            skip_reverse_record: flag("SKIP_REVERSE_RECORDS"),
            ipv6_zone_nibbles: parse_or(&lookup, "IPV6_ZONE_NIBBLES", DEFAULT_IPV6_ZONE_NIBBLES)?,
            pipeline_timeout_secs: parse_or(
                &lookup,
                "PIPELINE_TIMEOUT_SECS",
                DEFAULT_PIPELINE_TIMEOUT_SECS,
            )?,
            dry_run: flag("DRY_RUN"),
            log_level: lookup("LOG_LEVEL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.pdns_api_host.is_empty() || self.pdns_api_key.is_empty() || self.domain.is_empty() {
            anyhow::bail!("PDNS_API_HOST, PDNS_API_KEY or DOMAIN environment variables are empty");
        }

        if !self.pdns_api_host.starts_with("http://") && !self.pdns_api_host.starts_with("https://") {
            anyhow::bail!(
                "PDNS_API_HOST must use HTTP or HTTPS scheme. Got: {}",
                self.pdns_api_host
            );
        }

        // Check for obvious placeholder keys (common mistake)
        let key_lower = self.pdns_api_key.to_lowercase();
        if key_lower.contains("your_key") || key_lower.contains("replace_me") || key_lower == "changeme" {
            anyhow::bail!(
                "PDNS_API_KEY appears to be a placeholder. \
                Use the api-key configured on the PowerDNS server."
            );
        }

        validate_domain_name(&self.domain)?;

        if !self.listen_address.contains(':') {
            anyhow::bail!(
                "LISTEN_ADDRESS must include a port (e.g. :8080). Got: {}",
                self.listen_address
            );
        }

        if !(1..=600).contains(&self.pipeline_timeout_secs) {
            anyhow::bail!(
                "PIPELINE_TIMEOUT_SECS must be between 1 and 600 seconds. Got: {}",
                self.pipeline_timeout_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.sync_config()
            .validate()
            .context("IPV6_ZONE_NIBBLES or PowerDNS settings are not valid")?;

        Ok(())
    }

    /// Address to bind; a bare ":port" means all interfaces
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }

    /// Deadline for processing one webhook
    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }

    /// Build the core synchronizer configuration
    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(
            self.domain.clone(),
            ProviderConfig::PowerDns {
                api_url: self.pdns_api_host.clone(),
                api_key: self.pdns_api_key.clone(),
                server_id: self.pdns_server_id.clone(),
                dry_run: self.dry_run,
            },
        );
        config.skip_forward_record = self.skip_forward_record;
        config.skip_reverse_record = self.skip_reverse_record;
        config.ipv6_zone_nibbles = self.ipv6_zone_nibbles;
        config
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid number: {}", name, raw)),
        None => Ok(default),
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; a single trailing dot is allowed.
fn validate_domain_name(domain: &str) -> Result<()> {
    let name = domain.strip_suffix('.').unwrap_or(domain);

    if name.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if name.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            name.len(),
            domain
        );
    }

    for label in name.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PDNS_API_HOST", "http://pdns:8081"),
            ("PDNS_API_KEY", "4f2c0a1e9b"),
            ("DOMAIN", "example.com"),
        ]
    }

    #[test]
    fn defaults() {
        let config = load(&required()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.pdns_server_id, "localhost");
        assert!(!config.skip_forward_record);
        assert!(!config.skip_reverse_record);
        assert!(config.secret.is_none());
        assert_eq!(config.pipeline_timeout(), Duration::from_secs(60));
        assert_eq!(config.ipv6_zone_nibbles, DEFAULT_IPV6_ZONE_NIBBLES);
    }

    #[test]
    fn missing_required_variables_fail() {
        let config = load(&[("PDNS_API_HOST", "http://pdns:8081")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn any_value_enables_skip_flags() {
        let mut vars = required();
        vars.push(("SKIP_FORWARD_RECORDS", "no"));
        vars.push(("SKIP_REVERSE_RECORDS", ""));
        let config = load(&vars).unwrap();

        assert!(config.skip_forward_record);
        assert!(!config.skip_reverse_record);

        let sync = config.sync_config();
        assert!(sync.skip_forward_record);
        assert!(sync.validate().is_ok());
    }

    #[test]
    fn numeric_variables_are_checked() {
        let mut vars = required();
        vars.push(("IPV6_ZONE_NIBBLES", "eight"));
        assert!(load(&vars).is_err());

        let mut vars = required();
        vars.push(("IPV6_ZONE_NIBBLES", "40"));
        assert!(load(&vars).unwrap().validate().is_err());

        let mut vars = required();
        vars.push(("IPV6_ZONE_NIBBLES", "16"));
        let config = load(&vars).unwrap();
        config.validate().unwrap();
        assert_eq!(config.sync_config().ipv6_zone_nibbles, 16);
    }

    #[test]
    fn explicit_listen_address_is_kept() {
        let mut vars = required();
        vars.push(("LISTEN_ADDRESS", "127.0.0.1:9000"));
        assert_eq!(load(&vars).unwrap().bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn domain_names_are_validated() {
        assert!(validate_domain_name("example.com.").is_ok());
        assert!(validate_domain_name("ipam.example.com").is_ok());
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("bad..example.com").is_err());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("under_score.example.com").is_err());
    }

    #[test]
    fn rejects_non_http_api_host() {
        let mut vars = required();
        vars[0] = ("PDNS_API_HOST", "pdns:8081");
        assert!(load(&vars).unwrap().validate().is_err());
    }
}
