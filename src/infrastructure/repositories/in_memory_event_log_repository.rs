//! In-Memory Event Log Repository implementation
//!
//! Append-only; entries are returned in append order.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::EventLogEntry;
use crate::domain::error::SchedulingError;
use crate::domain::repositories::EventLogRepository;

#[derive(Default)]
pub struct InMemoryEventLogRepository {
    entries: RwLock<Vec<EventLogEntry>>,
}

impl InMemoryEventLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventLogRepository for InMemoryEventLogRepository {
    async fn append(&self, entry: EventLogEntry) -> Result<(), SchedulingError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<EventLogEntry>, SchedulingError> {
        Ok(self.entries.read().await.clone())
    }

    async fn get_by_event_type(
        &self,
        event_type: &str,
    ) -> Result<Vec<EventLogEntry>, SchedulingError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }
}
