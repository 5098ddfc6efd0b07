//! In-Memory Assignment Repository implementation
//!
//! Adds the job-id and time-range lookups the scheduling core needs on
//! top of the plain CRUD surface.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::Assignment;
use crate::domain::error::SchedulingError;
use crate::domain::repositories::AssignmentRepository;
use crate::domain::value_objects::TimeWindow;

#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    assignments: RwLock<HashMap<Uuid, Assignment>>,
}

impl InMemoryAssignmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Assignment>, SchedulingError> {
        Ok(self.assignments.read().await.get(&id).cloned())
    }

    async fn get_by_job(&self, job_id: Uuid) -> Result<Vec<Assignment>, SchedulingError> {
        let mut found: Vec<Assignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.window.start_utc());
        Ok(found)
    }

    async fn get_by_contractor(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<Assignment>, SchedulingError> {
        let mut found: Vec<Assignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|a| a.contractor_id == contractor_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.window.start_utc());
        Ok(found)
    }

    async fn get_in_range(
        &self,
        contractor_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<Assignment>, SchedulingError> {
        let mut found: Vec<Assignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|a| a.contractor_id == contractor_id && a.window.overlaps(window))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.window.start_utc());
        Ok(found)
    }

    async fn add(&self, assignment: Assignment) -> Result<(), SchedulingError> {
        self.assignments
            .write()
            .await
            .insert(assignment.id, assignment);
        Ok(())
    }

    async fn update(&self, mut assignment: Assignment) -> Result<Assignment, SchedulingError> {
        let mut store = self.assignments.write().await;
        let current = store.get(&assignment.id).ok_or_else(|| {
            SchedulingError::NotFound(format!("assignment {}", assignment.id))
        })?;
        if current.version != assignment.version {
            return Err(SchedulingError::ConcurrencyConflict(format!(
                "assignment {} version {} is stale (stored {})",
                assignment.id, assignment.version, current.version
            )));
        }
        assignment.version += 1;
        store.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SchedulingError> {
        self.assignments.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window(sh: u32, eh: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 1, 13, sh, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 13, eh, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_indexes_by_job_and_contractor() {
        let repo = InMemoryAssignmentRepository::new();
        let job_id = Uuid::new_v4();
        let contractor_id = Uuid::new_v4();

        repo.add(Assignment::pending(job_id, contractor_id, window(14, 15), None))
            .await
            .unwrap();
        repo.add(Assignment::pending(job_id, Uuid::new_v4(), window(9, 10), None))
            .await
            .unwrap();
        repo.add(Assignment::pending(
            Uuid::new_v4(),
            contractor_id,
            window(11, 12),
            None,
        ))
        .await
        .unwrap();

        assert_eq!(repo.get_by_job(job_id).await.unwrap().len(), 2);
        assert_eq!(repo.get_by_contractor(contractor_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_range_query_uses_half_open_overlap() {
        let repo = InMemoryAssignmentRepository::new();
        let contractor_id = Uuid::new_v4();
        repo.add(Assignment::pending(
            Uuid::new_v4(),
            contractor_id,
            window(9, 11),
            None,
        ))
        .await
        .unwrap();

        let touching = repo
            .get_in_range(contractor_id, &window(11, 13))
            .await
            .unwrap();
        assert!(touching.is_empty());

        let overlapping = repo
            .get_in_range(contractor_id, &window(10, 12))
            .await
            .unwrap();
        assert_eq!(overlapping.len(), 1);
    }

    #[tokio::test]
    async fn test_results_ordered_by_start() {
        let repo = InMemoryAssignmentRepository::new();
        let contractor_id = Uuid::new_v4();
        repo.add(Assignment::pending(Uuid::new_v4(), contractor_id, window(15, 16), None))
            .await
            .unwrap();
        repo.add(Assignment::pending(Uuid::new_v4(), contractor_id, window(9, 10), None))
            .await
            .unwrap();
        let all = repo.get_by_contractor(contractor_id).await.unwrap();
        assert!(all[0].window.start_utc() < all[1].window.start_utc());
    }
}
