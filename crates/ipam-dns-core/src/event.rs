//! Change events and webhook payload decoding
//!
//! The IPAM system posts a JSON document per address change:
//!
//! ```json
//! {
//!   "event": "updated",
//!   "request_id": "…",
//!   "data": { "address": "203.0.113.5/24", "dns_name": "host1.example.com" },
//!   "snapshots": { "prechange": { "address": "203.0.113.9/24", "dns_name": "oldhost.example.com" } }
//! }
//! ```
//!
//! [`WebhookPayload`] mirrors that shape loosely; [`ChangeEvent`] is the
//! validated form the planner consumes. A missing, `null` or empty address is
//! decoded as "no address".

use crate::address::{AddressFamily, AddressPrefix};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change reported by the IPAM system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A new address assignment
    Created,
    /// An existing assignment changed
    Updated,
    /// An assignment was removed
    Deleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

/// A validated address change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// What happened
    pub kind: EventKind,
    /// Address after the change (the removed address for `Deleted`)
    pub new_address: Option<AddressPrefix>,
    /// DNS name after the change
    pub new_name: Option<String>,
    /// Address before the change, if the IPAM system had one
    pub old_address: Option<AddressPrefix>,
    /// DNS name before the change
    pub old_name: Option<String>,
    /// IPAM request id, for log correlation
    pub request_id: Option<String>,
}

impl ChangeEvent {
    /// A `created` event without prior state
    pub fn created(address: AddressPrefix, name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Created,
            new_address: Some(address),
            new_name: Some(name.into()),
            old_address: None,
            old_name: None,
            request_id: None,
        }
    }

    /// An `updated` event from `old` to `new`
    pub fn updated(
        old_address: AddressPrefix,
        old_name: impl Into<String>,
        new_address: AddressPrefix,
        new_name: impl Into<String>,
    ) -> Self {
        Self {
            kind: EventKind::Updated,
            new_address: Some(new_address),
            new_name: Some(new_name.into()),
            old_address: Some(old_address),
            old_name: Some(old_name.into()),
            request_id: None,
        }
    }

    /// A `deleted` event for the given assignment
    pub fn deleted(address: AddressPrefix, name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Deleted,
            new_address: Some(address),
            new_name: Some(name.into()),
            old_address: None,
            old_name: None,
            request_id: None,
        }
    }

    /// Attach the IPAM request id
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Decode and validate a raw webhook body
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let payload: WebhookPayload = serde_json::from_slice(body)?;
        Self::try_from(payload)
    }
}

/// Raw webhook document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Event kind
    pub event: EventKind,

    /// IPAM object model (e.g. "ipaddress")
    #[serde(default)]
    pub model: Option<String>,

    /// IPAM request id
    #[serde(default)]
    pub request_id: Option<String>,

    /// Object state after the change
    #[serde(default)]
    pub data: Option<AssignmentPayload>,

    /// Object state snapshots
    #[serde(default)]
    pub snapshots: Option<SnapshotsPayload>,
}

/// Snapshot section of a webhook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotsPayload {
    /// Object state before the change
    #[serde(default)]
    pub prechange: Option<AssignmentPayload>,
}

/// Address/name pair as it appears in a webhook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentPayload {
    /// CIDR text
    #[serde(default)]
    pub address: Option<String>,

    /// Assigned DNS name, possibly empty
    #[serde(default)]
    pub dns_name: Option<String>,

    /// Declared address family
    #[serde(default)]
    pub family: Option<FamilyPayload>,
}

/// Address family in either of the forms IPAM payloads use
///
/// Live objects carry `{"value": 4, "label": "IPv4"}`; snapshots carry the
/// bare number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FamilyPayload {
    /// `{"value": 4, "label": "IPv4"}`
    Object {
        /// Numeric family
        value: u8,
    },
    /// `4`
    Number(u8),
}

impl FamilyPayload {
    fn value(&self) -> u8 {
        match self {
            Self::Object { value } | Self::Number(value) => *value,
        }
    }
}

impl AssignmentPayload {
    /// Parse the address, treating missing and empty values as absent
    fn parse_address(&self) -> Result<Option<AddressPrefix>> {
        let Some(raw) = self.address.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let prefix: AddressPrefix = raw.parse()?;

        if let Some(ref declared) = self.family {
            let declared = AddressFamily::from_number(declared.value())?;
            if declared != prefix.family() {
                return Err(Error::invalid_address(format!(
                    "'{}' is {} but the payload declares {}",
                    raw,
                    prefix.family(),
                    declared
                )));
            }
        }

        Ok(Some(prefix))
    }
}

impl TryFrom<WebhookPayload> for ChangeEvent {
    type Error = Error;

    fn try_from(payload: WebhookPayload) -> Result<Self> {
        let data = payload.data.unwrap_or_default();
        let prechange = payload
            .snapshots
            .and_then(|snapshots| snapshots.prechange)
            .unwrap_or_default();

        Ok(Self {
            kind: payload.event,
            new_address: data.parse_address()?,
            new_name: data.dns_name,
            old_address: prechange.parse_address()?,
            old_name: prechange.dns_name,
            request_id: payload.request_id,
        })
    }
}
