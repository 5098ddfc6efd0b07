use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Job;
use crate::domain::error::SchedulingError;

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Job>, SchedulingError>;
    async fn get_all(&self) -> Result<Vec<Job>, SchedulingError>;
    async fn add(&self, job: Job) -> Result<(), SchedulingError>;
    /// Optimistic update; a stale `version` fails with `ConcurrencyConflict`
    async fn update(&self, job: Job) -> Result<Job, SchedulingError>;
    async fn delete(&self, id: Uuid) -> Result<(), SchedulingError>;
}
