//! Realtime Publisher module
//!
//! Serializes typed domain events, fans them out to their subscriber
//! groups in publish order, and appends an event-log entry per published
//! event. Failures never reach the caller: broadcast errors drop the
//! affected group from the log entry, and event-log errors only log.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::collaborators::{Broadcaster, EventPublisher};
use crate::domain::entities::EventLogEntry;
use crate::domain::events::DomainEvent;
use crate::domain::repositories::EventLogRepository;

pub struct RealtimePublisher {
    broadcaster: Arc<dyn Broadcaster>,
    event_log: Arc<dyn EventLogRepository>,
}

impl RealtimePublisher {
    pub fn new(broadcaster: Arc<dyn Broadcaster>, event_log: Arc<dyn EventLogRepository>) -> Self {
        Self {
            broadcaster,
            event_log,
        }
    }
}

#[async_trait]
impl EventPublisher for RealtimePublisher {
    async fn publish(&self, event: &DomainEvent, assignees: &[Uuid]) {
        // payloads stay small: IDs and windows only, recipients fetch
        // entity bodies over HTTP
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, event = event.event_name(), "event serialization failed");
                return;
            }
        };

        let mut delivered: Vec<String> = Vec::new();
        for group in event.target_groups(assignees) {
            match self
                .broadcaster
                .broadcast(&group, event.event_name(), &payload)
                .await
            {
                Ok(()) => delivered.push(group),
                Err(err) => warn!(error = %err, group, "broadcast failed"),
            }
        }

        if delivered.is_empty() {
            return;
        }
        let entry = EventLogEntry::new(
            event.event_name().to_string(),
            payload,
            Utc::now(),
            delivered,
        );
        if let Err(err) = self.event_log.append(entry).await {
            warn!(error = %err, event = event.event_name(), "event log append failed");
        }
    }
}
