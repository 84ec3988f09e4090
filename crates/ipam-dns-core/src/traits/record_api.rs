// # Record API Trait
//
// Defines the interface for writing record sets through a DNS server's
// management API.
//
// ## Implementations
//
// - PowerDNS: `ipam-dns-provider-powerdns` crate
//
// ## Usage
//
// ```rust,ignore
// use ipam_dns_core::{DnsName, RecordApi, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* RecordApi implementation */;
//
//     api.upsert(
//         &DnsName::from("example.com."),
//         &DnsName::from("host1.example.com."),
//         RecordType::A,
//         86400,
//         &["203.0.113.5".to_string()],
//     ).await?;
//
//     Ok(())
// }
// ```

use crate::name::DnsName;
use crate::planner::RecordType;
use async_trait::async_trait;

/// Trait for DNS management API clients
///
/// The engine calls these methods one at a time, in plan order, and stops at
/// the first error. Implementations perform a single API call per method and
/// never retry; a returned error is reported as the failure of that plan
/// step.
///
/// # Idempotency
///
/// Both methods must be idempotent: repeating a call with the same arguments
/// leaves the zone in the same state. Deleting a record set that does not
/// exist is a success.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Create or replace the record set `name`/`record_type` in `zone`
    ///
    /// # Parameters
    ///
    /// - `zone`: Zone holding the record set (canonical form)
    /// - `name`: Owner name (canonical form)
    /// - `record_type`: A, AAAA or PTR
    /// - `ttl`: TTL in seconds
    /// - `values`: Record contents, replacing any existing ones
    async fn upsert(
        &self,
        zone: &DnsName,
        name: &DnsName,
        record_type: RecordType,
        ttl: u32,
        values: &[String],
    ) -> Result<(), crate::Error>;

    /// Remove the record set `name`/`record_type` from `zone`
    async fn delete(
        &self,
        zone: &DnsName,
        name: &DnsName,
        record_type: RecordType,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing record API clients from configuration
pub trait RecordApiFactory: Send + Sync {
    /// Create a RecordApi instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed RecordApi trait object
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn RecordApi>, crate::Error>;
}
