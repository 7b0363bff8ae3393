//! Domain event publishing over NATS.

use tracing::{debug, warn};
use crate::domain::events::DomainEvent;

/// Publishes events when a NATS client is configured; otherwise drops them.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Failures are logged and never returned.
    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        let Some(client) = &self.nats else {
            debug!(count = events.len(), "event publishing disabled");
            return;
        };
        for event in events {
            let payload = match serde_json::to_vec(&event) {
                Ok(p) => p,
                Err(e) => { warn!(error = %e, "failed to encode event"); continue; }
            };
            if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
                warn!(subject = event.subject(), error = %e, "failed to publish event");
            }
        }
    }
}
