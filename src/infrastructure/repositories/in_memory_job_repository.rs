//! In-Memory Job Repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::Job;
use crate::domain::error::SchedulingError;
use crate::domain::repositories::JobRepository;

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Job>, SchedulingError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Job>, SchedulingError> {
        Ok(self.jobs.read().await.values().cloned().collect())
    }

    async fn add(&self, job: Job) -> Result<(), SchedulingError> {
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn update(&self, mut job: Job) -> Result<Job, SchedulingError> {
        let mut store = self.jobs.write().await;
        let current = store
            .get(&job.id)
            .ok_or_else(|| SchedulingError::NotFound(format!("job {}", job.id)))?;
        if current.version != job.version {
            return Err(SchedulingError::ConcurrencyConflict(format!(
                "job {} version {} is stale (stored {})",
                job.id, job.version, current.version
            )));
        }
        job.version += 1;
        store.insert(job.id, job.clone());
        Ok(job)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SchedulingError> {
        self.jobs.write().await.remove(&id);
        Ok(())
    }
}
