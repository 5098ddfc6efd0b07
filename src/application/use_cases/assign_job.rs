//! Assign Job use case
//!
//! Binds a contractor to a job for a requested window after re-validating
//! availability, fatigue and direct overlaps. The assignment starts
//! `Pending` on the automatic path or `Confirmed` on the manual path;
//! events and the audit stamp happen after the transactional writes.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::services::{AvailabilityEngine, FatigueCalculator};
use crate::domain::collaborators::EventPublisher;
use crate::domain::entities::Assignment;
use crate::domain::error::SchedulingError;
use crate::domain::events::{AssignmentSource, DomainEvent};
use crate::domain::repositories::{
    AssignmentRepository, AuditRecommendationRepository, ContractorRepository, JobRepository,
};
use crate::domain::value_objects::TimeWindow;

#[derive(Debug, Clone)]
pub struct AssignJobRequest {
    pub job_id: Uuid,
    pub contractor_id: Uuid,
    pub window: TimeWindow,
    /// Manual assignments skip `Pending` and start `Confirmed`
    pub manual: bool,
    /// Audit record that justified this assignment
    pub audit_id: Option<Uuid>,
}

pub struct AssignJob {
    jobs: Arc<dyn JobRepository>,
    contractors: Arc<dyn ContractorRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    audits: Arc<dyn AuditRecommendationRepository>,
    publisher: Arc<dyn EventPublisher>,
    availability: AvailabilityEngine,
    fatigue: FatigueCalculator,
}

impl AssignJob {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        contractors: Arc<dyn ContractorRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        audits: Arc<dyn AuditRecommendationRepository>,
        publisher: Arc<dyn EventPublisher>,
        availability: AvailabilityEngine,
        fatigue: FatigueCalculator,
    ) -> Self {
        Self {
            jobs,
            contractors,
            assignments,
            audits,
            publisher,
            availability,
            fatigue,
        }
    }

    pub async fn execute(
        &self,
        request: AssignJobRequest,
        cancel: &CancellationToken,
    ) -> Result<Assignment, SchedulingError> {
        if cancel.is_cancelled() {
            return Err(SchedulingError::InvalidState(
                "assignment cancelled before commit".into(),
            ));
        }

        let mut job = self
            .jobs
            .get_by_id(request.job_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("job {}", request.job_id)))?;
        if job.status.is_terminal() {
            return Err(SchedulingError::InvalidState(format!(
                "cannot assign a {:?} job",
                job.status
            )));
        }
        let contractor = self
            .contractors
            .get_by_id(request.contractor_id)
            .await?
            .ok_or_else(|| {
                SchedulingError::NotFound(format!("contractor {}", request.contractor_id))
            })?;

        let existing = self.assignments.get_by_contractor(contractor.id).await?;

        // direct overlap beats the availability verdict so the caller
        // learns which assignment is in the way
        if let Some(conflict) = existing
            .iter()
            .find(|a| a.status.blocks_schedule() && a.window.overlaps(&request.window))
        {
            return Err(SchedulingError::ConflictingAssignment {
                conflicting_assignment_id: conflict.id,
            });
        }

        let blocking: Vec<TimeWindow> = existing
            .iter()
            .filter(|a| a.status != crate::domain::entities::AssignmentStatus::Cancelled)
            .map(|a| a.window)
            .collect();
        let windows = self.availability.available(
            &contractor.working_hours,
            &request.window,
            &blocking,
            request.window.duration_minutes(),
            &contractor.timezone,
            &job.timezone,
            contractor.calendar.as_ref(),
        )?;
        if windows.is_empty() {
            return Err(SchedulingError::NotAvailable(format!(
                "contractor {} has no availability for {}",
                contractor.id, request.window
            )));
        }

        let assessment = self.fatigue.assess(
            &request.window,
            request.window.duration_minutes(),
            &existing,
            &contractor.timezone,
            job.priority.is_rush(),
        )?;
        if !assessment.is_feasible {
            return Err(SchedulingError::NotAvailable(
                assessment
                    .reason
                    .unwrap_or_else(|| "fatigue limits exceeded".into()),
            ));
        }

        let assignment = if request.manual {
            Assignment::confirmed(job.id, contractor.id, request.window, request.audit_id)
        } else {
            Assignment::pending(job.id, contractor.id, request.window, request.audit_id)
        };
        let event = DomainEvent::JobAssigned {
            job_id: job.id,
            contractor_id: contractor.id,
            assignment_id: assignment.id,
            start_utc: request.window.start_utc(),
            end_utc: request.window.end_utc(),
            region: job.region.clone(),
            source: if request.manual {
                AssignmentSource::Manual
            } else {
                AssignmentSource::Auto
            },
            audit_id: request.audit_id,
        };
        job.attach_assignment(event, assignment.id);

        // transactional writes: assignment then job, optimistic versions
        self.assignments.add(assignment.clone()).await?;
        let events = job.take_events();
        self.jobs.update(job).await?;

        // post-commit side effects, best-effort
        if let Some(audit_id) = request.audit_id {
            if let Err(error) = self.audits.mark_selected(audit_id, contractor.id).await {
                warn!(%error, "could not stamp audit selection");
            }
        }
        for event in &events {
            self.publisher.publish(event, &[contractor.id]).await;
        }

        info!(
            assignment = %assignment.id,
            contractor = %contractor.id,
            "job assigned"
        );
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AssignmentStatus, AuditRecommendation, Contractor, Job, JobPriority};
    use crate::domain::repositories::{
        AssignmentRepository as _, AuditRecommendationRepository as _, ContractorRepository as _,
        EventLogRepository as _, JobRepository as _,
    };
    use crate::domain::value_objects::{GeoLocation, WorkingHours};
    use crate::infrastructure::realtime::{RealtimePublisher, RecordingBroadcaster};
    use crate::infrastructure::repositories::{
        InMemoryAssignmentRepository, InMemoryAuditRepository, InMemoryContractorRepository,
        InMemoryEventLogRepository, InMemoryJobRepository,
    };
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
    use serde_json::json;

    struct Fixture {
        jobs: Arc<InMemoryJobRepository>,
        contractors: Arc<InMemoryContractorRepository>,
        assignments: Arc<InMemoryAssignmentRepository>,
        audits: Arc<InMemoryAuditRepository>,
        event_log: Arc<InMemoryEventLogRepository>,
        broadcaster: Arc<RecordingBroadcaster>,
        use_case: AssignJob,
    }

    fn fixture() -> Fixture {
        let jobs = Arc::new(InMemoryJobRepository::new());
        let contractors = Arc::new(InMemoryContractorRepository::new());
        let assignments = Arc::new(InMemoryAssignmentRepository::new());
        let audits = Arc::new(InMemoryAuditRepository::new());
        let event_log = Arc::new(InMemoryEventLogRepository::new());
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let publisher = Arc::new(RealtimePublisher::new(
            broadcaster.clone(),
            event_log.clone(),
        ));
        let use_case = AssignJob::new(
            jobs.clone(),
            contractors.clone(),
            assignments.clone(),
            audits.clone(),
            publisher,
            AvailabilityEngine::new(),
            FatigueCalculator::default(),
        );
        Fixture {
            jobs,
            contractors,
            assignments,
            audits,
            event_log,
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
            "Dana".into(),
            GeoLocation::new(40.7, -74.0).unwrap(),
            "UTC".into(),
            hours,
            vec!["flooring".into()],
            80.0,
            3,
        )
        .unwrap()
    }

    fn monday_job() -> Job {
        Job::new(
            "flooring".into(),
            120,
            GeoLocation::new(40.7, -74.0).unwrap(),
            "UTC".into(),
            window(9, 0, 17, 0),
            JobPriority::Normal,
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            vec!["flooring".into()],
            "northeast".into(),
        )
        .unwrap()
    }

    fn window(sh: u32, sm: u32, eh: u32, em: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 1, 13, sh, sm, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 13, eh, em, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_assign_persists_and_publishes() {
        let f = fixture();
        let contractor = weekday_contractor();
        let job = monday_job();
        f.contractors.add(contractor.clone()).await.unwrap();
        f.jobs.add(job.clone()).await.unwrap();

        let assignment = f
            .use_case
            .execute(
                AssignJobRequest {
                    job_id: job.id,
                    contractor_id: contractor.id,
                    window: window(10, 0, 12, 0),
                    manual: false,
                    audit_id: None,
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(assignment.status, AssignmentStatus::Pending);
        assert!(f.assignments.get_by_id(assignment.id).await.unwrap().is_some());

        let stored_job = f.jobs.get_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored_job.assignment_ids, vec![assignment.id]);

        let sent = f.broadcaster.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].group, "dispatch/northeast");
        assert_eq!(sent[1].group, format!("contractor/{}", contractor.id));

        let log = f.event_log.get_all().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].event_type, "JobAssigned");
    }

    #[tokio::test]
    async fn test_manual_assignment_starts_confirmed_and_stamps_audit() {
        let f = fixture();
        let contractor = weekday_contractor();
        let job = monday_job();
        f.contractors.add(contractor.clone()).await.unwrap();
        f.jobs.add(job.clone()).await.unwrap();

        let audit = AuditRecommendation::new(
            Uuid::new_v4(),
            job.id,
            json!({}),
            json!([]),
            1,
            "dispatcher".into(),
            Utc::now(),
        );
        let audit_id = audit.id;
        f.audits.add(audit).await.unwrap();

        let assignment = f
            .use_case
            .execute(
                AssignJobRequest {
                    job_id: job.id,
                    contractor_id: contractor.id,
                    window: window(10, 0, 12, 0),
                    manual: true,
                    audit_id: Some(audit_id),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(assignment.status, AssignmentStatus::Confirmed);
        assert_eq!(assignment.source, AssignmentSource::Manual);

        let stamped = f.audits.get_by_id(audit_id).await.unwrap().unwrap();
        assert_eq!(stamped.selected_contractor_id, Some(contractor.id));
    }

    #[tokio::test]
    async fn test_overlap_surfaces_conflicting_assignment_id() {
        let f = fixture();
        let contractor = weekday_contractor();
        let job = monday_job();
        f.contractors.add(contractor.clone()).await.unwrap();
        f.jobs.add(job.clone()).await.unwrap();

        let existing = Assignment::pending(Uuid::new_v4(), contractor.id, window(10, 0, 12, 0), None);
        let existing_id = existing.id;
        f.assignments.add(existing).await.unwrap();

        let result = f
            .use_case
            .execute(
                AssignJobRequest {
                    job_id: job.id,
                    contractor_id: contractor.id,
                    window: window(11, 0, 13, 0),
                    manual: false,
                    audit_id: None,
                },
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(SchedulingError::ConflictingAssignment {
                conflicting_assignment_id,
            }) => assert_eq!(conflicting_assignment_id, existing_id),
            other => panic!("expected conflict, got {other:?}"),
        }
        // nothing published on failure
        assert!(f.broadcaster.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_window_outside_working_hours_is_not_available() {
        let f = fixture();
        let contractor = weekday_contractor();
        let job = monday_job();
        f.contractors.add(contractor.clone()).await.unwrap();
        f.jobs.add(job.clone()).await.unwrap();

        let result = f
            .use_case
            .execute(
                AssignJobRequest {
                    job_id: job.id,
                    contractor_id: contractor.id,
                    window: window(18, 0, 20, 0),
                    manual: false,
                    audit_id: None,
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(SchedulingError::NotAvailable(_))));
    }

    #[tokio::test]
    async fn test_terminal_job_rejects_assignment() {
        let f = fixture();
        let contractor = weekday_contractor();
        let mut job = monday_job();
        job.cancel("gone".into()).unwrap();
        job.take_events();
        f.contractors.add(contractor.clone()).await.unwrap();
        f.jobs.add(job.clone()).await.unwrap();

        let result = f
            .use_case
            .execute(
                AssignJobRequest {
                    job_id: job.id,
                    contractor_id: contractor.id,
                    window: window(10, 0, 12, 0),
                    manual: false,
                    audit_id: None,
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(SchedulingError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_cancellation_before_commit_changes_nothing() {
        let f = fixture();
        let contractor = weekday_contractor();
        let job = monday_job();
        f.contractors.add(contractor.clone()).await.unwrap();
        f.jobs.add(job.clone()).await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let result = f
            .use_case
            .execute(
                AssignJobRequest {
                    job_id: job.id,
                    contractor_id: contractor.id,
                    window: window(10, 0, 12, 0),
                    manual: false,
                    audit_id: None,
                },
                &token,
            )
            .await;
        assert!(result.is_err());
        assert!(f.assignments.get_by_contractor(contractor.id).await.unwrap().is_empty());
    }
}
