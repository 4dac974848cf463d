//! Publishes domain events to NATS.
//!
//! Publishing is best effort: failures are logged and never fail the request
//! that raised the event.

use crate::domain::events::DomainEvent;

#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn disabled() -> Self { Self { client: None } }

    pub async fn connect(url: &str) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        tracing::info!(%url, "connected to NATS");
        Ok(Self { client: Some(client) })
    }

    pub fn is_enabled(&self) -> bool { self.client.is_some() }

    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.publish(event).await;
        }
    }

    pub async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        let Some(client) = &self.client else {
            tracing::debug!(%subject, "event publishing disabled");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(%subject, error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, error = %e, "failed to publish event");
        }
    }
}
