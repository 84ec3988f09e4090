//! Synchronization engine
//!
//! The SyncEngine is responsible for:
//! - Planning the record changes for a change event
//! - Applying the plan through a RecordApi, strictly in order
//! - Stopping at the first failed step and reporting which one failed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ ChangeEvent │──────────┐
//! └─────────────┘          │
//!                          ▼
//!                 ┌──────────────┐        ┌──────────────┐
//!                 │ RecordPlanner│──plan─▶│  SyncEngine  │
//!                 └──────────────┘        └──────────────┘
//!                                                 │
//!                               ┌─────────────────┴───────────┐
//!                               ▼                             ▼
//!                       ┌──────────────┐              ┌─────────────┐
//!                       │  RecordApi   │              │   Events    │
//!                       │ (one by one) │              │  (notify)   │
//!                       └──────────────┘              └─────────────┘
//! ```
//!
//! ## Consistency
//!
//! Applied steps are never rolled back. If an update fails after its deletes
//! went through, the name stays without records until the next event for
//! that address is processed.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::event::ChangeEvent;
use crate::planner::{ReconciliationPlan, RecordOperation, RecordPlanner};
use crate::traits::RecordApi;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A plan was computed for an event
    PlanBuilt {
        request_id: Option<String>,
        operations: usize,
    },

    /// A plan step succeeded
    OperationApplied {
        step: usize,
        operation: RecordOperation,
    },

    /// A plan step failed; the rest of the plan was abandoned
    OperationFailed {
        step: usize,
        operation: RecordOperation,
        error: String,
    },

    /// Every step of a plan succeeded
    PlanCompleted {
        request_id: Option<String>,
        applied: usize,
    },
}

/// Plan executor
///
/// Shared read-only between concurrent requests; every call to
/// [`SyncEngine::process`] owns its own plan and runs it sequentially.
/// Nothing orders the plans of different events against each other.
pub struct SyncEngine {
    /// Turns events into plans
    planner: RecordPlanner,

    /// DNS management API client
    api: Box<dyn RecordApi>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `api`: Record API implementation
    /// - `config`: Synchronizer configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        api: Box<dyn RecordApi>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let planner = RecordPlanner::from_config(config)?;
        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            planner,
            api,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// The planner this engine uses
    pub fn planner(&self) -> &RecordPlanner {
        &self.planner
    }

    /// Plan and apply the record changes for an event
    ///
    /// Planning errors abort before any API call. Returns the number of
    /// operations applied.
    pub async fn process(&self, event: &ChangeEvent) -> Result<usize> {
        let plan = self.planner.plan(event)?;

        debug!("Plan for {} event: {} operation(s)", event.kind, plan.len());
        self.emit_event(SyncEvent::PlanBuilt {
            request_id: event.request_id.clone(),
            operations: plan.len(),
        });

        let applied = self.execute(&plan).await?;

        self.emit_event(SyncEvent::PlanCompleted {
            request_id: event.request_id.clone(),
            applied,
        });
        Ok(applied)
    }

    /// Apply a plan, one operation at a time
    ///
    /// # Errors
    ///
    /// [`Error::StepFailed`] naming the first step whose API call failed.
    /// Later steps are not attempted and earlier ones are not undone.
    pub async fn execute(&self, plan: &ReconciliationPlan) -> Result<usize> {
        let total = plan.len();

        for (index, operation) in plan.iter().enumerate() {
            let step = index + 1;

            match self.apply(operation).await {
                Ok(()) => {
                    info!("[{}/{}] {}", step, total, operation);
                    self.emit_event(SyncEvent::OperationApplied {
                        step,
                        operation: operation.clone(),
                    });
                }
                Err(e) => {
                    error!("[{}/{}] {} failed: {}", step, total, operation, e);
                    if step < total {
                        warn!("Abandoning {} remaining operation(s)", total - step);
                    }
                    self.emit_event(SyncEvent::OperationFailed {
                        step,
                        operation: operation.clone(),
                        error: e.to_string(),
                    });
                    return Err(Error::StepFailed {
                        step,
                        total,
                        operation: operation.to_string(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(total)
    }

    /// Perform a single API call
    async fn apply(&self, operation: &RecordOperation) -> Result<()> {
        match operation {
            RecordOperation::Upsert {
                zone,
                name,
                record_type,
                ttl,
                values,
            } => {
                self.api
                    .upsert(zone, name, *record_type, *ttl, values)
                    .await
            }
            RecordOperation::Delete {
                zone,
                name,
                record_type,
            } => self.api.delete(zone, name, *record_type).await,
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: SyncEvent) {
        // A slow or absent consumer must never stall a plan
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::name::DnsName;
    use crate::planner::RecordType;
    use async_trait::async_trait;

    struct NoopApi;

    #[async_trait]
    impl RecordApi for NoopApi {
        async fn upsert(
            &self,
            _zone: &DnsName,
            _name: &DnsName,
            _record_type: RecordType,
            _ttl: u32,
            _values: &[String],
        ) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _zone: &DnsName, _name: &DnsName, _record_type: RecordType) -> Result<()> {
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "noop"
        }
    }

    fn config() -> SyncConfig {
        SyncConfig::new(
            "example.com.",
            ProviderConfig::Custom {
                factory: "noop".to_string(),
                config: serde_json::json!({}),
            },
        )
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = config();
        config.domain = String::new();
        assert!(SyncEngine::new(Box::new(NoopApi), &config).is_err());
    }

    #[tokio::test]
    async fn emits_progress_events() {
        let (engine, mut events) = SyncEngine::new(Box::new(NoopApi), &config()).unwrap();
        let event = ChangeEvent::created("203.0.113.5/24".parse().unwrap(), "host1.example.com")
            .with_request_id("req-1");

        assert_eq!(engine.process(&event).await.unwrap(), 2);

        assert_eq!(
            events.recv().await,
            Some(SyncEvent::PlanBuilt {
                request_id: Some("req-1".to_string()),
                operations: 2,
            })
        );
        assert!(matches!(events.recv().await, Some(SyncEvent::OperationApplied { step: 1, .. })));
        assert!(matches!(events.recv().await, Some(SyncEvent::OperationApplied { step: 2, .. })));
        assert_eq!(
            events.recv().await,
            Some(SyncEvent::PlanCompleted {
                request_id: Some("req-1".to_string()),
                applied: 2,
            })
        );
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_fail_processing() {
        let (engine, events) = SyncEngine::new(Box::new(NoopApi), &config()).unwrap();
        drop(events);

        let event = ChangeEvent::deleted("203.0.113.5/24".parse().unwrap(), "host1.example.com");
        assert_eq!(engine.process(&event).await.unwrap(), 2);
    }
}
