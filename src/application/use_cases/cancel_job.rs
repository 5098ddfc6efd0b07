//! Cancel Job use case
//!
//! Cancels a job and every non-terminal assignment on it. Completed
//! assignments stay untouched as history. `JobCancelled` fans out to the
//! dispatch group and every formerly assigned contractor.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::domain::collaborators::EventPublisher;
use crate::domain::entities::Job;
use crate::domain::error::SchedulingError;
use crate::domain::repositories::{AssignmentRepository, JobRepository};

const DEFAULT_REASON: &str = "No reason provided";

#[derive(Debug, Clone)]
pub struct CancelJobRequest {
    pub job_id: Uuid,
    pub reason: Option<String>,
}

pub struct CancelJob {
    jobs: Arc<dyn JobRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl CancelJob {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            jobs,
            assignments,
            publisher,
        }
    }

    pub async fn execute(
        &self,
        request: CancelJobRequest,
        cancel: &CancellationToken,
    ) -> Result<Job, SchedulingError> {
        if cancel.is_cancelled() {
            return Err(SchedulingError::InvalidState(
                "cancellation aborted before commit".into(),
            ));
        }

        let mut job = self
            .jobs
            .get_by_id(request.job_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("job {}", request.job_id)))?;

        let reason = request
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REASON.to_string());
        job.cancel(reason)?;

        let mut cancelled_contractors: Vec<Uuid> = Vec::new();
        for mut assignment in self.assignments.get_by_job(job.id).await? {
            if assignment.status.is_terminal() {
                continue;
            }
            assignment.cancel()?;
            cancelled_contractors.push(assignment.contractor_id);
            self.assignments.update(assignment).await?;
        }

        let events = job.take_events();
        let job = self.jobs.update(job).await?;

        for event in &events {
            self.publisher.publish(event, &cancelled_contractors).await;
        }

        info!(job = %job.id, "job cancelled");
        Ok(job)
    }
}
