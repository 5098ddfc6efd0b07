use async_trait::async_trait;

use crate::domain::entities::EventLogEntry;
use crate::domain::error::SchedulingError;

#[async_trait]
pub trait EventLogRepository: Send + Sync {
    async fn append(&self, entry: EventLogEntry) -> Result<(), SchedulingError>;
    async fn get_all(&self) -> Result<Vec<EventLogEntry>, SchedulingError>;
    async fn get_by_event_type(
        &self,
        event_type: &str,
    ) -> Result<Vec<EventLogEntry>, SchedulingError>;
}
