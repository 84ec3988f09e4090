// # ipam-dns-core
//
// Core library for the IPAM-to-DNS record synchronizer.
//
// ## Architecture Overview
//
// An IPAM system notifies us whenever an IP address assignment is created,
// updated or deleted. This library turns such a notification into the set of
// DNS record changes that keep the authoritative zones in line with it:
//
// - **AddressPrefix**: Parsed address + prefix length with its family
// - **ReverseZoneResolver**: Reverse zone and PTR owner name for an address
// - **DnsName**: Canonical (trailing-dot) DNS names
// - **RecordPlanner**: Ordered delete/upsert plan for a change event
// - **SyncEngine**: Applies a plan through a `RecordApi`, step by step
// - **ProviderRegistry**: Plugin-based registry for record API providers
//
// ## Design Principles
//
// 1. **Pure planning**: Everything up to the plan is side-effect free
// 2. **Delete before create**: Stale records are removed before new ones land
// 3. **Fail fast**: The first failing API call stops the plan
// 4. **Library-First**: The daemon is a thin layer over this crate

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod name;
pub mod planner;
pub mod registry;
pub mod reverse;
pub mod signature;
pub mod traits;

// Re-export core types for convenience
pub use address::{AddressFamily, AddressPrefix};
pub use config::{EngineConfig, ProviderConfig, SyncConfig};
pub use engine::{SyncEngine, SyncEvent};
pub use error::{Error, Result};
pub use event::{ChangeEvent, EventKind, WebhookPayload};
pub use name::DnsName;
pub use planner::{ReconciliationPlan, RecordOperation, RecordPlanner, RecordType, RECORD_TTL};
pub use registry::ProviderRegistry;
pub use reverse::{ReverseTarget, ReverseZoneResolver};
pub use traits::{RecordApi, RecordApiFactory};
