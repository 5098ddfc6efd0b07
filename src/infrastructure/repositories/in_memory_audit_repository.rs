//! In-Memory Audit Recommendation Repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::AuditRecommendation;
use crate::domain::error::SchedulingError;
use crate::domain::repositories::AuditRecommendationRepository;

#[derive(Default)]
pub struct InMemoryAuditRepository {
    audits: RwLock<HashMap<Uuid, AuditRecommendation>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRecommendationRepository for InMemoryAuditRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<AuditRecommendation>, SchedulingError> {
        Ok(self.audits.read().await.get(&id).cloned())
    }

    async fn get_by_request_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<AuditRecommendation>, SchedulingError> {
        Ok(self
            .audits
            .read()
            .await
            .values()
            .find(|a| a.request_id == request_id)
            .cloned())
    }

    async fn add(&self, audit: AuditRecommendation) -> Result<(), SchedulingError> {
        self.audits.write().await.insert(audit.id, audit);
        Ok(())
    }

    async fn mark_selected(
        &self,
        audit_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<(), SchedulingError> {
        let mut store = self.audits.write().await;
        let audit = store
            .get_mut(&audit_id)
            .ok_or_else(|| SchedulingError::NotFound(format!("audit {audit_id}")))?;
        audit.select_contractor(contractor_id);
        Ok(())
    }
}
