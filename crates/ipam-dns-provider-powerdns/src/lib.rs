// # PowerDNS Record API Provider
//
// This crate provides a PowerDNS implementation of `RecordApi` for the IPAM
// DNS synchronizer.
//
// - One HTTP request per record operation
// - Errors are returned to the engine as-is; no retry, no backoff
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 422, 429, 5xx)
// - Dry-run mode for safe testing
//
// ## Security Requirements
//
// - API key NEVER appears in logs
// - Provider MUST fail fast if the key is empty
//
// ## API Reference
//
// - PowerDNS HTTP API: https://doc.powerdns.com/authoritative/http-api/
// - Modify record sets: PATCH `/api/v1/servers/:server_id/zones/:zone_id`
//
// Both changetypes used here are idempotent: `REPLACE` overwrites the whole
// record set, and `DELETE` of an absent record set succeeds.

use async_trait::async_trait;
use ipam_dns_core::config::ProviderConfig;
use ipam_dns_core::traits::{RecordApi, RecordApiFactory};
use ipam_dns_core::{DnsName, Error, RecordType, Result};
use serde::Serialize;
use std::time::Duration;

/// Provider name used in errors and logs
const PROVIDER_NAME: &str = "powerdns";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-API-Key";

/// Record set change kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
enum ChangeType {
    Replace,
    Delete,
}

/// Body of a zone PATCH request
#[derive(Debug, Serialize)]
struct RrsetPatch {
    rrsets: Vec<Rrset>,
}

#[derive(Debug, Serialize)]
struct Rrset {
    name: String,
    #[serde(rename = "type")]
    record_type: RecordType,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    changetype: ChangeType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    records: Vec<RecordContent>,
}

#[derive(Debug, Serialize)]
struct RecordContent {
    content: String,
    disabled: bool,
}

impl RrsetPatch {
    fn replace(name: &DnsName, record_type: RecordType, ttl: u32, values: &[String]) -> Self {
        Self {
            rrsets: vec![Rrset {
                name: name.to_string(),
                record_type,
                ttl: Some(ttl),
                changetype: ChangeType::Replace,
                records: values
                    .iter()
                    .map(|value| RecordContent {
                        content: value.clone(),
                        disabled: false,
                    })
                    .collect(),
            }],
        }
    }

    fn delete(name: &DnsName, record_type: RecordType) -> Self {
        Self {
            rrsets: vec![Rrset {
                name: name.to_string(),
                record_type,
                ttl: None,
                changetype: ChangeType::Delete,
                records: Vec::new(),
            }],
        }
    }
}

/// PowerDNS record API provider
///
/// Stateless and single-shot: every method issues exactly one PATCH against
/// the zone.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider logs the PATCH it would send and
/// reports success without contacting the server.
pub struct PowerDnsProvider {
    /// Base URL of the API, without trailing slash
    api_url: String,

    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// PowerDNS server id (normally "localhost")
    server_id: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, log changes instead of sending them
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for PowerDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerDnsProvider")
            .field("api_url", &self.api_url)
            .field("api_key", &"<REDACTED>")
            .field("server_id", &self.server_id)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl PowerDnsProvider {
    /// Create a new PowerDNS provider
    ///
    /// # Parameters
    ///
    /// - `api_url`: Base URL of the API (e.g. "http://pdns:8081")
    /// - `api_key`: API key sent as `X-API-Key`
    /// - `server_id`: PowerDNS server id
    /// - `dry_run`: If true, log changes instead of sending them
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the key or URL is empty, or the HTTP client
    /// cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        server_id: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("PowerDNS API key cannot be empty"));
        }

        let api_url = api_url.into().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(Error::config("PowerDNS API URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url,
            api_key,
            server_id: server_id.into(),
            client,
            dry_run,
        })
    }

    /// URL of the zone resource
    fn zone_url(&self, zone: &DnsName) -> String {
        format!(
            "{}/api/v1/servers/{}/zones/{}",
            self.api_url, self.server_id, zone
        )
    }

    /// Send one PATCH with a single record set change
    ///
    /// # API Call
    ///
    /// ```http
    /// PATCH /api/v1/servers/localhost/zones/example.com.
    /// X-API-Key: <key>
    ///
    /// {"rrsets": [{"name": "host1.example.com.", "type": "A", "ttl": 86400,
    ///              "changetype": "REPLACE",
    ///              "records": [{"content": "203.0.113.5", "disabled": false}]}]}
    /// ```
    async fn patch_zone(&self, zone: &DnsName, patch: &RrsetPatch) -> Result<()> {
        let url = self.zone_url(zone);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH to {} with payload: {}",
                url,
                serde_json::to_string(patch)?
            );
            return Ok(());
        }

        let response = self
            .client
            .patch(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(patch)
            .send()
            .await
            .map_err(|e| Error::api(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(status_error(status.as_u16(), zone, &error_text))
    }
}

/// Map a non-success status to an API error
fn status_error(status: u16, zone: &DnsName, body: &str) -> Error {
    let message = match status {
        401 | 403 => format!(
            "Authentication failed: invalid API key or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Zone not found: {}", zone),
        422 => format!("Record set rejected for zone {}: {}", zone, body),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!("PowerDNS server error (transient): {} - {}", status, body),
        _ => format!("Zone update failed: {} - {}", status, body),
    };
    Error::api(PROVIDER_NAME, message)
}

#[async_trait]
impl RecordApi for PowerDnsProvider {
    async fn upsert(
        &self,
        zone: &DnsName,
        name: &DnsName,
        record_type: RecordType,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        tracing::debug!(
            "Replacing {} {} in {} with [{}] [mode: {}]",
            record_type,
            name,
            zone,
            values.join(", "),
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        self.patch_zone(zone, &RrsetPatch::replace(name, record_type, ttl, values))
            .await
    }

    async fn delete(&self, zone: &DnsName, name: &DnsName, record_type: RecordType) -> Result<()> {
        tracing::debug!(
            "Deleting {} {} from {} [mode: {}]",
            record_type,
            name,
            zone,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        self.patch_zone(zone, &RrsetPatch::delete(name, record_type))
            .await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating PowerDNS providers
pub struct PowerDnsFactory;

impl RecordApiFactory for PowerDnsFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn RecordApi>> {
        match config {
            ProviderConfig::PowerDns {
                api_url,
                api_key,
                server_id,
                dry_run,
            } => {
                if api_key.is_empty() {
                    return Err(Error::config("PowerDNS API key is required"));
                }

                if *dry_run {
                    tracing::warn!("PowerDNS provider running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(PowerDnsProvider::new(
                    api_url.clone(),
                    api_key.clone(),
                    server_id.clone(),
                    *dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for PowerDNS provider")),
        }
    }
}

/// Register the PowerDNS provider with a registry
///
/// # Example
///
/// ```rust
/// use ipam_dns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// ipam_dns_provider_powerdns::register(&registry);
/// assert!(registry.has_provider("powerdns"));
/// ```
pub fn register(registry: &ipam_dns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(PowerDnsFactory));
}
