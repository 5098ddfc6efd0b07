use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::AuditRecommendation;
use crate::domain::error::SchedulingError;

#[async_trait]
pub trait AuditRecommendationRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<AuditRecommendation>, SchedulingError>;
    async fn get_by_request_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<AuditRecommendation>, SchedulingError>;
    async fn add(&self, audit: AuditRecommendation) -> Result<(), SchedulingError>;
    /// Stamps the contractor chosen from this recommendation
    async fn mark_selected(
        &self,
        audit_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<(), SchedulingError>;
}
