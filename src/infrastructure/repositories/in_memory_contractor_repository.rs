//! In-Memory Contractor Repository implementation
//!
//! HashMap-backed implementation of the `ContractorRepository` trait with
//! optimistic concurrency on updates. Suitable for tests and the CLI
//! demo; production deployments plug a relational implementation behind
//! the same trait.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::Contractor;
use crate::domain::error::SchedulingError;
use crate::domain::repositories::ContractorRepository;

#[derive(Default)]
pub struct InMemoryContractorRepository {
    contractors: RwLock<HashMap<Uuid, Contractor>>,
}

impl InMemoryContractorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractorRepository for InMemoryContractorRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Contractor>, SchedulingError> {
        Ok(self.contractors.read().await.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Contractor>, SchedulingError> {
        Ok(self.contractors.read().await.values().cloned().collect())
    }

    async fn get_by_skills(&self, skills: &[String]) -> Result<Vec<Contractor>, SchedulingError> {
        Ok(self
            .contractors
            .read()
            .await
            .values()
            .filter(|c| c.has_all_skills(skills))
            .cloned()
            .collect())
    }

    async fn add(&self, contractor: Contractor) -> Result<(), SchedulingError> {
        self.contractors
            .write()
            .await
            .insert(contractor.id, contractor);
        Ok(())
    }

    async fn update(&self, mut contractor: Contractor) -> Result<Contractor, SchedulingError> {
        let mut store = self.contractors.write().await;
        let current = store.get(&contractor.id).ok_or_else(|| {
            SchedulingError::NotFound(format!("contractor {}", contractor.id))
        })?;
        if current.version != contractor.version {
            return Err(SchedulingError::ConcurrencyConflict(format!(
                "contractor {} version {} is stale (stored {})",
                contractor.id, contractor.version, current.version
            )));
        }
        contractor.version += 1;
        store.insert(contractor.id, contractor.clone());
        Ok(contractor)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SchedulingError> {
        self.contractors.write().await.remove(&id);
        Ok(())
    }
}
