//! Test doubles and common utilities for contract tests
//!
//! The doubles record every API call so tests can assert on the exact
//! sequence the engine produced.

#![allow(dead_code)]

use ipam_dns_core::error::{Error, Result};
use ipam_dns_core::{DnsName, ProviderConfig, RecordApi, RecordType, SyncConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Upsert {
        zone: String,
        name: String,
        record_type: RecordType,
        ttl: u32,
        values: Vec<String>,
    },
    Delete {
        zone: String,
        name: String,
        record_type: RecordType,
    },
}

impl ApiCall {
    pub fn upsert(zone: &str, name: &str, record_type: RecordType, value: &str) -> Self {
        Self::Upsert {
            zone: zone.to_string(),
            name: name.to_string(),
            record_type,
            ttl: 86400,
            values: vec![value.to_string()],
        }
    }

    pub fn delete(zone: &str, name: &str, record_type: RecordType) -> Self {
        Self::Delete {
            zone: zone.to_string(),
            name: name.to_string(),
            record_type,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Upsert { name, .. } | Self::Delete { name, .. } => name,
        }
    }
}

/// A RecordApi that records calls and can fail on a chosen call
pub struct RecordingApi {
    /// Recorded calls, in order
    calls: Arc<Mutex<Vec<ApiCall>>>,
    /// Number of calls attempted (including the failing one)
    attempts: Arc<AtomicUsize>,
    /// 1-based call number that fails, if any
    fail_on: Option<usize>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            fail_on: None,
        }
    }

    /// Fail the `call`-th API call (1-based)
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::new()
        }
    }

    /// Create a RecordingApi that shares its log with an existing one
    pub fn sharing_log_with(other: &Self) -> Self {
        Self {
            calls: Arc::clone(&other.calls),
            attempts: Arc::clone(&other.attempts),
            fail_on: other.fail_on,
        }
    }

    /// Successfully applied calls
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of attempted calls
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&self, call: ApiCall) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(attempt) {
            return Err(Error::api("recording", format!("injected failure on call {}", attempt)));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordApi for RecordingApi {
    async fn upsert(
        &self,
        zone: &DnsName,
        name: &DnsName,
        record_type: RecordType,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        // Yield so concurrent plans interleave in tests
        tokio::task::yield_now().await;
        self.record(ApiCall::Upsert {
            zone: zone.to_string(),
            name: name.to_string(),
            record_type,
            ttl,
            values: values.to_vec(),
        })
    }

    async fn delete(&self, zone: &DnsName, name: &DnsName, record_type: RecordType) -> Result<()> {
        tokio::task::yield_now().await;
        self.record(ApiCall::Delete {
            zone: zone.to_string(),
            name: name.to_string(),
            record_type,
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config(domain: &str) -> SyncConfig {
    SyncConfig::new(
        domain,
        ProviderConfig::Custom {
            factory: "recording".to_string(),
            config: serde_json::json!({}),
        },
    )
}
