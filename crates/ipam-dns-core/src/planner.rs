//! Record planning
//!
//! Turns a [`ChangeEvent`] into an ordered [`ReconciliationPlan`]. Planning
//! never performs I/O; everything that can fail about an event fails here,
//! before the first API call.
//!
//! ## Ordering
//!
//! Records belonging to the previous state are deleted before the new ones
//! are written. Within each half, the PTR record comes first, then the
//! forward record:
//!
//! ```text
//! DELETE PTR (old)  ->  DELETE A/AAAA (old)  ->  UPSERT PTR (new)  ->  UPSERT A/AAAA (new)
//! ```

use crate::address::{AddressFamily, AddressPrefix};
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::event::{ChangeEvent, EventKind};
use crate::name::DnsName;
use crate::reverse::ReverseZoneResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// TTL for every record written, in seconds
pub const RECORD_TTL: u32 = 86400;

/// DNS record types managed by the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 forward record
    A,
    /// IPv6 forward record
    Aaaa,
    /// Reverse record
    Ptr,
}

impl RecordType {
    /// Forward record type for an address family
    pub fn forward_for(family: AddressFamily) -> Self {
        match family {
            AddressFamily::V4 => Self::A,
            AddressFamily::V6 => Self::Aaaa,
        }
    }

    /// Wire name of the type
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Ptr => "PTR",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change against the DNS management API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RecordOperation {
    /// Create or replace the record set
    Upsert {
        /// Zone holding the record
        zone: DnsName,
        /// Owner name
        name: DnsName,
        /// Record type
        record_type: RecordType,
        /// TTL in seconds
        ttl: u32,
        /// Record contents
        values: Vec<String>,
    },
    /// Remove the record set
    Delete {
        /// Zone holding the record
        zone: DnsName,
        /// Owner name
        name: DnsName,
        /// Record type
        record_type: RecordType,
    },
}

impl RecordOperation {
    /// Zone the operation applies to
    pub fn zone(&self) -> &DnsName {
        match self {
            Self::Upsert { zone, .. } | Self::Delete { zone, .. } => zone,
        }
    }

    /// Owner name of the record set
    pub fn name(&self) -> &DnsName {
        match self {
            Self::Upsert { name, .. } | Self::Delete { name, .. } => name,
        }
    }

    /// Record type
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Upsert { record_type, .. } | Self::Delete { record_type, .. } => *record_type,
        }
    }

    /// Whether this is a delete
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }
}

impl fmt::Display for RecordOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upsert {
                zone,
                name,
                record_type,
                ttl,
                values,
            } => write!(
                f,
                "UPSERT {} {} in {} (ttl {}) -> [{}]",
                record_type,
                name,
                zone,
                ttl,
                values.join(", ")
            ),
            Self::Delete {
                zone,
                name,
                record_type,
            } => write!(f, "DELETE {} {} in {}", record_type, name, zone),
        }
    }
}

/// Ordered list of operations for one event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    operations: Vec<RecordOperation>,
}

impl ReconciliationPlan {
    /// The operations, in execution order
    pub fn operations(&self) -> &[RecordOperation] {
        &self.operations
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the plan does nothing
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterate over the operations in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, RecordOperation> {
        self.operations.iter()
    }

    fn push(&mut self, operation: RecordOperation) {
        self.operations.push(operation);
    }
}

impl<'a> IntoIterator for &'a ReconciliationPlan {
    type Item = &'a RecordOperation;
    type IntoIter = std::slice::Iter<'a, RecordOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl From<Vec<RecordOperation>> for ReconciliationPlan {
    fn from(operations: Vec<RecordOperation>) -> Self {
        Self { operations }
    }
}

/// Builds [`ReconciliationPlan`]s from change events
///
/// Holds the read-only settings that shape every plan: the forward domain,
/// the skip flags and the reverse zone policy.
#[derive(Debug, Clone)]
pub struct RecordPlanner {
    domain: DnsName,
    skip_forward: bool,
    skip_reverse: bool,
    resolver: ReverseZoneResolver,
}

impl RecordPlanner {
    /// Create a planner
    ///
    /// # Parameters
    ///
    /// - `domain`: Forward zone; only names inside it get A/AAAA records
    /// - `skip_forward`: Never touch A/AAAA records
    /// - `skip_reverse`: Never touch PTR records
    pub fn new(domain: impl Into<DnsName>, skip_forward: bool, skip_reverse: bool) -> Self {
        Self {
            domain: domain.into(),
            skip_forward,
            skip_reverse,
            resolver: ReverseZoneResolver::default(),
        }
    }

    /// Create a planner from the synchronizer configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Ok(Self::new(
            config.domain.as_str(),
            config.skip_forward_record,
            config.skip_reverse_record,
        )
        .with_resolver(ReverseZoneResolver::new(config.ipv6_zone_nibbles)?))
    }

    /// Use a custom reverse zone resolver
    pub fn with_resolver(mut self, resolver: ReverseZoneResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Forward zone
    pub fn domain(&self) -> &DnsName {
        &self.domain
    }

    /// Plan the record changes for an event
    ///
    /// # Errors
    ///
    /// [`Error::InvalidAddress`] when the event carries no current address.
    /// No partial plan is returned.
    pub fn plan(&self, event: &ChangeEvent) -> Result<ReconciliationPlan> {
        let mut plan = ReconciliationPlan::default();

        let address = event.new_address.as_ref().ok_or_else(|| {
            Error::invalid_address(format!("{} event carries no address", event.kind))
        })?;
        let name = DnsName::normalize(event.new_name.as_deref().unwrap_or_default());

        if event.kind == EventKind::Deleted {
            self.push_removals(&mut plan, address, &name);
            debug!("Planned {} operation(s) for deleted {}", plan.len(), address);
            return Ok(plan);
        }

        if let (Some(old_address), Some(old_name)) = (&event.old_address, &event.old_name) {
            self.push_removals(&mut plan, old_address, &DnsName::normalize(old_name));
        }

        if name.is_empty() {
            debug!("{} has no DNS name, nothing to publish", address);
            return Ok(plan);
        }

        if !self.skip_reverse {
            let target = self.resolver.resolve(address);
            plan.push(RecordOperation::Upsert {
                zone: target.zone,
                name: target.record,
                record_type: RecordType::Ptr,
                ttl: RECORD_TTL,
                values: vec![name.to_string()],
            });
        }

        if !self.skip_forward {
            if name.is_within(&self.domain) {
                plan.push(RecordOperation::Upsert {
                    zone: self.domain.clone(),
                    name: name.clone(),
                    record_type: RecordType::forward_for(address.family()),
                    ttl: RECORD_TTL,
                    values: vec![address.addr().to_string()],
                });
            } else {
                debug!("{} is outside {}, no forward record", name, self.domain);
            }
        }

        debug!("Planned {} operation(s) for {} {}", plan.len(), event.kind, address);
        Ok(plan)
    }

    /// Deletes for a previously published address/name pair
    fn push_removals(&self, plan: &mut ReconciliationPlan, address: &AddressPrefix, name: &DnsName) {
        // Nothing was published for an unnamed address
        if name.is_empty() {
            return;
        }

        if !self.skip_reverse {
            let target = self.resolver.resolve(address);
            plan.push(RecordOperation::Delete {
                zone: target.zone,
                name: target.record,
                record_type: RecordType::Ptr,
            });
        }

        if !self.skip_forward && name.is_within(&self.domain) {
            plan.push(RecordOperation::Delete {
                zone: self.domain.clone(),
                name: name.clone(),
                record_type: RecordType::forward_for(address.family()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(text: &str) -> AddressPrefix {
        text.parse().unwrap()
    }

    fn planner() -> RecordPlanner {
        RecordPlanner::new("example.com.", false, false)
    }

    fn upsert(zone: &str, name: &str, record_type: RecordType, value: &str) -> RecordOperation {
        RecordOperation::Upsert {
            zone: zone.into(),
            name: name.into(),
            record_type,
            ttl: RECORD_TTL,
            values: vec![value.to_string()],
        }
    }

    fn delete(zone: &str, name: &str, record_type: RecordType) -> RecordOperation {
        RecordOperation::Delete {
            zone: zone.into(),
            name: name.into(),
            record_type,
        }
    }

    #[test]
    fn created_ipv4_event() {
        let event = ChangeEvent::created(prefix("203.0.113.5/24"), "host1.example.com");
        let plan = planner().plan(&event).unwrap();

        assert_eq!(
            plan.operations(),
            &[
                upsert(
                    "113.0.203.in-addr.arpa.",
                    "5.113.0.203.in-addr.arpa.",
                    RecordType::Ptr,
                    "host1.example.com."
                ),
                upsert("example.com.", "host1.example.com.", RecordType::A, "203.0.113.5"),
            ]
        );
    }

    #[test]
    fn updated_event_deletes_old_records_first() {
        let event = ChangeEvent::updated(
            prefix("203.0.113.9/24"),
            "oldhost.example.com",
            prefix("203.0.113.5/24"),
            "host1.example.com",
        );
        let plan = planner().plan(&event).unwrap();

        assert_eq!(
            plan.operations(),
            &[
                delete("113.0.203.in-addr.arpa.", "9.113.0.203.in-addr.arpa.", RecordType::Ptr),
                delete("example.com.", "oldhost.example.com.", RecordType::A),
                upsert(
                    "113.0.203.in-addr.arpa.",
                    "5.113.0.203.in-addr.arpa.",
                    RecordType::Ptr,
                    "host1.example.com."
                ),
                upsert("example.com.", "host1.example.com.", RecordType::A, "203.0.113.5"),
            ]
        );
    }

    #[test]
    fn ipv6_gets_aaaa_with_compressed_text() {
        let event = ChangeEvent::created(prefix("2001:db8:0:0::10/64"), "v6.example.com.");
        let plan = planner().plan(&event).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.operations()[0].zone().as_str(), "8.b.d.0.1.0.0.2.ip6.arpa.");
        assert_eq!(
            plan.operations()[1],
            upsert("example.com.", "v6.example.com.", RecordType::Aaaa, "2001:db8::10")
        );
    }

    #[test]
    fn old_family_picks_the_deleted_forward_type() {
        let event = ChangeEvent::updated(
            prefix("2001:db8::1/64"),
            "host.example.com",
            prefix("203.0.113.5/24"),
            "host.example.com",
        );
        let plan = planner().plan(&event).unwrap();

        assert_eq!(plan.operations()[1], delete("example.com.", "host.example.com.", RecordType::Aaaa));
        assert_eq!(plan.operations()[3].record_type(), RecordType::A);
    }

    #[test]
    fn skip_flags_gate_each_record_kind() {
        let event = ChangeEvent::updated(
            prefix("203.0.113.9/24"),
            "oldhost.example.com",
            prefix("203.0.113.5/24"),
            "host1.example.com",
        );

        let only_reverse = RecordPlanner::new("example.com.", true, false).plan(&event).unwrap();
        assert!(only_reverse.iter().all(|op| op.record_type() == RecordType::Ptr));
        assert_eq!(only_reverse.len(), 2);

        let only_forward = RecordPlanner::new("example.com.", false, true).plan(&event).unwrap();
        assert!(only_forward.iter().all(|op| op.record_type() == RecordType::A));
        assert_eq!(only_forward.len(), 2);

        let nothing = RecordPlanner::new("example.com.", true, true).plan(&event).unwrap();
        assert!(nothing.is_empty());
    }

    #[test]
    fn created_without_prior_state_has_no_deletes() {
        let event = ChangeEvent::created(prefix("198.51.100.20/24"), "web.example.com");
        for (skip_forward, skip_reverse, expected) in
            [(false, false, 2), (true, false, 1), (false, true, 1), (true, true, 0)]
        {
            let plan = RecordPlanner::new("example.com.", skip_forward, skip_reverse)
                .plan(&event)
                .unwrap();
            assert!(plan.iter().all(|op| !op.is_delete()));
            assert_eq!(plan.len(), expected);
        }
    }

    #[test]
    fn deleted_events_honor_skip_flags() {
        let event = ChangeEvent::deleted(prefix("2001:db8::5/64"), "v6.example.com");
        for (skip_forward, skip_reverse, expected) in
            [(false, false, 2), (true, false, 1), (false, true, 1), (true, true, 0)]
        {
            let plan = RecordPlanner::new("example.com.", skip_forward, skip_reverse)
                .plan(&event)
                .unwrap();
            assert!(plan.iter().all(|op| op.is_delete()));
            assert_eq!(plan.len(), expected);
            if skip_forward {
                assert!(plan.iter().all(|op| op.record_type() == RecordType::Ptr));
            }
            if skip_reverse {
                assert!(plan.iter().all(|op| op.record_type() == RecordType::Aaaa));
            }
        }

        let outside = ChangeEvent::deleted(prefix("2001:db8::5/64"), "routerexample.com");
        let plan = planner().plan(&outside).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan.operations()[0].is_delete());
        assert_eq!(plan.operations()[0].record_type(), RecordType::Ptr);
    }

    #[test]
    fn names_outside_the_domain_only_get_ptr() {
        let event = ChangeEvent::created(prefix("203.0.113.5/24"), "routerexample.com");
        let plan = planner().plan(&event).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.operations()[0].record_type(), RecordType::Ptr);

        let event = ChangeEvent::created(prefix("203.0.113.5/24"), "router.example.com");
        assert_eq!(planner().plan(&event).unwrap().len(), 2);
    }

    #[test]
    fn deleted_event_never_upserts() {
        let event = ChangeEvent::deleted(prefix("203.0.113.5/24"), "host1.example.com");
        let plan = planner().plan(&event).unwrap();

        assert_eq!(
            plan.operations(),
            &[
                delete("113.0.203.in-addr.arpa.", "5.113.0.203.in-addr.arpa.", RecordType::Ptr),
                delete("example.com.", "host1.example.com.", RecordType::A),
            ]
        );
    }

    #[test]
    fn deleted_event_ignores_prechange_snapshot() {
        let mut event = ChangeEvent::deleted(prefix("203.0.113.5/24"), "host1.example.com");
        event.old_address = Some(prefix("203.0.113.5/24"));
        event.old_name = Some("host1.example.com".to_string());

        assert_eq!(planner().plan(&event).unwrap().len(), 2);
    }

    #[test]
    fn empty_old_name_skips_deletes() {
        let event = ChangeEvent::updated(
            prefix("203.0.113.9/24"),
            "",
            prefix("203.0.113.5/24"),
            "host1.example.com",
        );
        let plan = planner().plan(&event).unwrap();
        assert!(plan.iter().all(|op| !op.is_delete()));
    }

    #[test]
    fn clearing_the_name_only_deletes() {
        let event = ChangeEvent::updated(
            prefix("203.0.113.5/24"),
            "host1.example.com",
            prefix("203.0.113.5/24"),
            "",
        );
        let plan = planner().plan(&event).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(RecordOperation::is_delete));
    }

    #[test]
    fn missing_address_fails_before_planning() {
        let mut event = ChangeEvent::created(prefix("203.0.113.5/24"), "host1.example.com");
        event.new_address = None;
        event.old_address = Some(prefix("203.0.113.9/24"));
        event.old_name = Some("oldhost.example.com".to_string());

        assert!(matches!(planner().plan(&event), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn operation_display_is_readable() {
        let op = delete("example.com.", "host.example.com.", RecordType::Aaaa);
        assert_eq!(op.to_string(), "DELETE AAAA host.example.com. in example.com.");
    }
}
