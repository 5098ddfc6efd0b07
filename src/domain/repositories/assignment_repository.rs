use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Assignment;
use crate::domain::error::SchedulingError;
use crate::domain::value_objects::TimeWindow;

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Assignment>, SchedulingError>;
    async fn get_by_job(&self, job_id: Uuid) -> Result<Vec<Assignment>, SchedulingError>;
    async fn get_by_contractor(&self, contractor_id: Uuid)
        -> Result<Vec<Assignment>, SchedulingError>;
    /// Assignments of one contractor overlapping the given window
    async fn get_in_range(
        &self,
        contractor_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<Assignment>, SchedulingError>;
    async fn add(&self, assignment: Assignment) -> Result<(), SchedulingError>;
    /// Optimistic update; a stale `version` fails with `ConcurrencyConflict`
    async fn update(&self, assignment: Assignment) -> Result<Assignment, SchedulingError>;
    async fn delete(&self, id: Uuid) -> Result<(), SchedulingError>;
}
