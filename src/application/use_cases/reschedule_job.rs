//! Reschedule Job use case
//!
//! Moves a job's service window after re-validating every currently
//! assigned contractor against the new window. A direct overlap with
//! another assignment surfaces `ConflictingAssignment` with the blocking
//! assignment's ID; other validation failures surface `InvalidState`.
//! Nothing is persisted unless every assignee fits.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::application::services::{AvailabilityEngine, FatigueCalculator};
use crate::domain::collaborators::EventPublisher;
use crate::domain::entities::{Assignment, Job};
use crate::domain::error::SchedulingError;
use crate::domain::repositories::{
    AssignmentRepository, ContractorRepository, JobRepository,
};
use crate::domain::value_objects::TimeWindow;

#[derive(Debug, Clone)]
pub struct RescheduleJobRequest {
    pub job_id: Uuid,
    pub new_window: TimeWindow,
}

pub struct RescheduleJob {
    jobs: Arc<dyn JobRepository>,
    contractors: Arc<dyn ContractorRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    publisher: Arc<dyn EventPublisher>,
    availability: AvailabilityEngine,
    fatigue: FatigueCalculator,
}

impl RescheduleJob {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        contractors: Arc<dyn ContractorRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        publisher: Arc<dyn EventPublisher>,
        availability: AvailabilityEngine,
        fatigue: FatigueCalculator,
    ) -> Self {
        Self {
            jobs,
            contractors,
            assignments,
            publisher,
            availability,
            fatigue,
        }
    }

    pub async fn execute(
        &self,
        request: RescheduleJobRequest,
        cancel: &CancellationToken,
    ) -> Result<Job, SchedulingError> {
        if cancel.is_cancelled() {
            return Err(SchedulingError::InvalidState(
                "reschedule cancelled before commit".into(),
            ));
        }

        let mut job = self
            .jobs
            .get_by_id(request.job_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("job {}", request.job_id)))?;
        if job.status.is_terminal() {
            return Err(SchedulingError::InvalidState(format!(
                "cannot reschedule a {:?} job",
                job.status
            )));
        }

        let job_assignments = self.assignments.get_by_job(job.id).await?;
        let mut active: Vec<Assignment> = job_assignments
            .into_iter()
            .filter(|a| !a.status.is_terminal())
            .collect();

        // validate every assignee before touching any state
        for assignment in &active {
            self.validate_assignee(&job, assignment, &request.new_window)
                .await?;
        }

        job.reschedule(request.new_window)?;
        for assignment in &mut active {
            assignment.reschedule(request.new_window)?;
        }

        let assignee_ids: Vec<Uuid> = active.iter().map(|a| a.contractor_id).collect();
        for assignment in active {
            self.assignments.update(assignment).await?;
        }
        let events = job.take_events();
        let job = self.jobs.update(job).await?;

        for event in &events {
            self.publisher.publish(event, &assignee_ids).await;
        }

        info!(job = %job.id, window = %request.new_window, "job rescheduled");
        Ok(job)
    }

    async fn validate_assignee(
        &self,
        job: &Job,
        assignment: &Assignment,
        new_window: &TimeWindow,
    ) -> Result<(), SchedulingError> {
        let contractor = self
            .contractors
            .get_by_id(assignment.contractor_id)
            .await?
            .ok_or_else(|| {
                SchedulingError::NotFound(format!("contractor {}", assignment.contractor_id))
            })?;

        let others: Vec<Assignment> = self
            .assignments
            .get_by_contractor(contractor.id)
            .await?
            .into_iter()
            .filter(|a| a.id != assignment.id)
            .collect();

        if let Some(conflict) = others
            .iter()
            .find(|a| a.status.blocks_schedule() && a.window.overlaps(new_window))
        {
            return Err(SchedulingError::ConflictingAssignment {
                conflicting_assignment_id: conflict.id,
            });
        }

        let blocking: Vec<TimeWindow> = others
            .iter()
            .filter(|a| a.status.blocks_schedule())
            .map(|a| a.window)
            .collect();
        let windows = self.availability.available(
            &contractor.working_hours,
            new_window,
            &blocking,
            new_window.duration_minutes(),
            &contractor.timezone,
            &job.timezone,
            contractor.calendar.as_ref(),
        )?;
        if windows.is_empty() {
            return Err(SchedulingError::InvalidState(format!(
                "contractor {} cannot take the new window {}",
                contractor.id, new_window
            )));
        }

        let assessment = self.fatigue.assess(
            new_window,
            new_window.duration_minutes(),
            &others,
            &contractor.timezone,
            job.priority.is_rush(),
        )?;
        if !assessment.is_feasible {
            return Err(SchedulingError::InvalidState(format!(
                "contractor {} would exceed fatigue limits: {}",
                contractor.id,
                assessment.reason.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Contractor, Job, JobPriority};
    use crate::domain::events::DomainEvent;
    use crate::domain::repositories::{
        AssignmentRepository as _, ContractorRepository as _, JobRepository as _,
    };
    use crate::domain::value_objects::{GeoLocation, WorkingHours};
    use crate::infrastructure::realtime::{RealtimePublisher, RecordingBroadcaster};
    use crate::infrastructure::repositories::{
        InMemoryAssignmentRepository, InMemoryContractorRepository, InMemoryEventLogRepository,
        InMemoryJobRepository,
    };
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

    struct Fixture {
        jobs: Arc<InMemoryJobRepository>,
        contractors: Arc<InMemoryContractorRepository>,
        assignments: Arc<InMemoryAssignmentRepository>,
        broadcaster: Arc<RecordingBroadcaster>,
        use_case: RescheduleJob,
    }

    fn fixture() -> Fixture {
        let jobs = Arc::new(InMemoryJobRepository::new());
        let contractors = Arc::new(InMemoryContractorRepository::new());
        let assignments = Arc::new(InMemoryAssignmentRepository::new());
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let publisher = Arc::new(RealtimePublisher::new(
            broadcaster.clone(),
            Arc::new(InMemoryEventLogRepository::new()),
        ));
        let use_case = RescheduleJob::new(
            jobs.clone(),
            contractors.clone(),
            assignments.clone(),
            publisher,
            AvailabilityEngine::new(),
            FatigueCalculator::default(),
        );
        Fixture {
            jobs,
            contractors,
            assignments,
            broadcaster,
            use_case,
        }
    }

    fn weekday_contractor() -> Contractor {
        let hours: Vec<WorkingHours> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .map(|day| {
            WorkingHours::new(
                day,
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                "UTC".into(),
            )
            .unwrap()
        })
        .collect();
        Contractor::new(
            "Xan".into(),
            GeoLocation::new(40.7, -74.0).unwrap(),
            "UTC".into(),
            hours,
            vec!["flooring".into()],
            80.0,
            3,
        )
        .unwrap()
    }

    fn job_with_window(window: TimeWindow) -> Job {
        Job::new(
            "flooring".into(),
            240,
            GeoLocation::new(40.7, -74.0).unwrap(),
            "UTC".into(),
            window,
            JobPriority::Normal,
            NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
            vec!["flooring".into()],
            "northeast".into(),
        )
        .unwrap()
    }

    fn tuesday(sh: u32, eh: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 1, 14, sh, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 14, eh, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_reschedule_into_conflict_keeps_state_intact() {
        // contractor X holds job A 09:00-13:00; job B sits at 14:00-18:00;
        // moving B onto 10:00-14:00 must surface A's assignment and leave
        // everything untouched
        let f = fixture();
        let x = weekday_contractor();
        f.contractors.add(x.clone()).await.unwrap();

        let job_a = job_with_window(tuesday(9, 13));
        let assignment_a = Assignment::pending(job_a.id, x.id, tuesday(9, 13), None);
        let a_id = assignment_a.id;
        f.jobs.add(job_a).await.unwrap();
        f.assignments.add(assignment_a).await.unwrap();

        let job_b = job_with_window(tuesday(14, 18));
        let assignment_b = Assignment::pending(job_b.id, x.id, tuesday(14, 18), None);
        let b_assignment_id = assignment_b.id;
        f.jobs.add(job_b.clone()).await.unwrap();
        f.assignments.add(assignment_b).await.unwrap();

        let result = f
            .use_case
            .execute(
                RescheduleJobRequest {
                    job_id: job_b.id,
                    new_window: tuesday(10, 14),
                },
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(SchedulingError::ConflictingAssignment {
                conflicting_assignment_id,
            }) => assert_eq!(conflicting_assignment_id, a_id),
            other => panic!("expected conflict, got {other:?}"),
        }

        // no state change anywhere
        let stored_b = f.jobs.get_by_id(job_b.id).await.unwrap().unwrap();
        assert_eq!(stored_b.service_window, tuesday(14, 18));
        let stored_assignment = f.assignments.get_by_id(b_assignment_id).await.unwrap().unwrap();
        assert_eq!(stored_assignment.window, tuesday(14, 18));
        assert!(f.broadcaster.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_reschedule_moves_job_and_assignments() {
        let f = fixture();
        let x = weekday_contractor();
        f.contractors.add(x.clone()).await.unwrap();

        let job = job_with_window(tuesday(9, 13));
        let assignment = Assignment::pending(job.id, x.id, tuesday(9, 13), None);
        let assignment_id = assignment.id;
        f.jobs.add(job.clone()).await.unwrap();
        f.assignments.add(assignment).await.unwrap();

        let updated = f
            .use_case
            .execute(
                RescheduleJobRequest {
                    job_id: job.id,
                    new_window: tuesday(13, 17),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(updated.service_window, tuesday(13, 17));

        let moved = f.assignments.get_by_id(assignment_id).await.unwrap().unwrap();
        assert_eq!(moved.window, tuesday(13, 17));

        // event carries both windows and reaches dispatch + contractor
        let sent = f.broadcaster.sent().await;
        assert_eq!(sent.len(), 2);
        let event: DomainEvent = serde_json::from_str(&sent[0].payload).unwrap();
        match event {
            DomainEvent::JobRescheduled {
                previous_start_utc,
                new_start_utc,
                ..
            } => {
                assert_eq!(previous_start_utc, tuesday(9, 13).start_utc());
                assert_eq!(new_start_utc, tuesday(13, 17).start_utc());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unassigned_job_reschedules_freely() {
        let f = fixture();
        let job = job_with_window(tuesday(9, 13));
        f.jobs.add(job.clone()).await.unwrap();

        let updated = f
            .use_case
            .execute(
                RescheduleJobRequest {
                    job_id: job.id,
                    new_window: tuesday(12, 16),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(updated.service_window, tuesday(12, 16));
    }

    #[tokio::test]
    async fn test_terminal_job_cannot_be_rescheduled() {
        let f = fixture();
        let mut job = job_with_window(tuesday(9, 13));
        job.cancel("done".into()).unwrap();
        job.take_events();
        f.jobs.add(job.clone()).await.unwrap();

        let result = f
            .use_case
            .execute(
                RescheduleJobRequest {
                    job_id: job.id,
                    new_window: tuesday(12, 16),
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(SchedulingError::InvalidState(_))));
    }
}
