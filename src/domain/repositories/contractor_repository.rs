use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Contractor;
use crate::domain::error::SchedulingError;

#[async_trait]
pub trait ContractorRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Contractor>, SchedulingError>;
    async fn get_all(&self) -> Result<Vec<Contractor>, SchedulingError>;
    /// Contractors whose normalized skill set contains all given skills
    async fn get_by_skills(&self, skills: &[String]) -> Result<Vec<Contractor>, SchedulingError>;
    async fn add(&self, contractor: Contractor) -> Result<(), SchedulingError>;
    /// Optimistic update; a stale `version` fails with `ConcurrencyConflict`
    async fn update(&self, contractor: Contractor) -> Result<Contractor, SchedulingError>;
    async fn delete(&self, id: Uuid) -> Result<(), SchedulingError>;
}
