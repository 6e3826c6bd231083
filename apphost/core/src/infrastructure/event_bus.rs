// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for resource state changes
//
// In-memory streaming using tokio broadcast channels. The CLI subscribes to
// print resource status while the application runs.

use crate::domain::events::ResourceEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<ResourceEvent>>,
}

impl EventBus {
    /// Capacity determines how many events can be buffered before the oldest
    /// are dropped for slow receivers.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(256)
    }

    pub fn publish(&self, event: ResourceEvent) {
        debug!("Publishing event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            resource: None,
        }
    }

    /// Subscribe to the events of a single resource.
    pub fn subscribe_resource(&self, resource: impl Into<String>) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            resource: Some(resource.into()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<ResourceEvent>,
    resource: Option<String>,
}

impl EventReceiver {
    /// Receive the next matching event
    pub async fn recv(&mut self) -> Result<ResourceEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => EventBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            match &self.resource {
                Some(name) if event.resource() != name => continue,
                _ => return Ok(event),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        bus.publish(ResourceEvent::Healthy {
            resource: "keycloak".to_string(),
            at: Utc::now(),
        });

        let received = receiver.recv().await.unwrap();
        assert!(matches!(received, ResourceEvent::Healthy { ref resource, .. } if resource == "keycloak"));
    }

    #[tokio::test]
    async fn test_resource_filtering() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe_resource("keycloak");

        bus.publish(ResourceEvent::Stopped {
            resource: "apiservice".to_string(),
            at: Utc::now(),
        });
        bus.publish(ResourceEvent::Stopped {
            resource: "keycloak".to_string(),
            at: Utc::now(),
        });

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.resource(), "keycloak");
        assert_eq!(bus.subscriber_count(), 1);
    }
}
