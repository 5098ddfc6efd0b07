//! Job entity module
//!
//! A job is a unit of field-service work: what it is, how long it takes,
//! where it happens, when it may be scheduled, and which contractors are
//! bound to it. Status changes follow a restricted graph and raise domain
//! events into the aggregate's outbox.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::contractor::normalize_skills;
use crate::domain::error::SchedulingError;
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{GeoLocation, TimeWindow};

/// Job urgency; rush jobs may exceed the soft daily-hours cap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobPriority {
    Normal,
    High,
    Rush,
}

impl JobPriority {
    pub fn is_rush(&self) -> bool {
        matches!(self, JobPriority::Rush)
    }
}

/// Job lifecycle states.
///
/// `Scheduled → InProgress → Completed`, with `Cancelled` reachable from
/// any non-terminal state. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

/// A unit of field-service work
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    /// Work duration in minutes, always positive
    pub duration_minutes: i64,
    pub location: GeoLocation,
    /// Resolved IANA timezone of the job site
    pub timezone: String,
    /// Outer `[start, end)` during which the job may be scheduled, UTC
    pub service_window: TimeWindow,
    pub priority: JobPriority,
    pub desired_date: NaiveDate,
    /// Normalized required skill tags
    pub required_skills: Vec<String>,
    pub status: JobStatus,
    /// Opaque routing key for dispatcher fan-out
    pub region: String,
    /// Ordered contractor assignments; at most one on the MVP path
    pub assignment_ids: Vec<Uuid>,
    /// Most recent recommendation-audit record, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_audit_id: Option<Uuid>,
    /// Optimistic-concurrency row version, bumped by the repository
    #[serde(default)]
    pub version: u64,
    /// Transient outbox, drained by mutation handlers after commit
    #[serde(skip)]
    pending_events: Vec<DomainEvent>,
}

impl Job {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_type: String,
        duration_minutes: i64,
        location: GeoLocation,
        timezone: String,
        service_window: TimeWindow,
        priority: JobPriority,
        desired_date: NaiveDate,
        required_skills: Vec<String>,
        region: String,
    ) -> Result<Self, SchedulingError> {
        if duration_minutes <= 0 {
            return Err(SchedulingError::InvalidArgument(format!(
                "job duration must be positive, got {duration_minutes}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            job_type,
            duration_minutes,
            location,
            timezone,
            service_window,
            priority,
            desired_date,
            required_skills: normalize_skills(&required_skills),
            status: JobStatus::Scheduled,
            region,
            assignment_ids: Vec::new(),
            latest_audit_id: None,
            version: 0,
            pending_events: Vec::new(),
        })
    }

    /// Binds an assignment to this job and queues the given event
    pub fn attach_assignment(&mut self, event: DomainEvent, assignment_id: Uuid) {
        self.assignment_ids.push(assignment_id);
        self.pending_events.push(event);
    }

    /// Moves the service window, raising `JobRescheduled`.
    ///
    /// Only non-terminal jobs can be rescheduled. Returns the previous
    /// window.
    pub fn reschedule(&mut self, new_window: TimeWindow) -> Result<TimeWindow, SchedulingError> {
        if self.status.is_terminal() {
            return Err(SchedulingError::InvalidState(format!(
                "cannot reschedule a {:?} job",
                self.status
            )));
        }
        let previous = self.service_window;
        self.service_window = new_window;
        self.pending_events.push(DomainEvent::JobRescheduled {
            job_id: self.id,
            previous_start_utc: previous.start_utc(),
            previous_end_utc: previous.end_utc(),
            new_start_utc: new_window.start_utc(),
            new_end_utc: new_window.end_utc(),
            region: self.region.clone(),
        });
        Ok(previous)
    }

    pub fn begin_progress(&mut self) -> Result<(), SchedulingError> {
        match self.status {
            JobStatus::Scheduled => {
                self.status = JobStatus::InProgress;
                Ok(())
            }
            other => Err(SchedulingError::InvalidState(format!(
                "cannot start a {:?} job",
                other
            ))),
        }
    }

    pub fn complete(&mut self) -> Result<(), SchedulingError> {
        match self.status {
            JobStatus::InProgress => {
                self.status = JobStatus::Completed;
                Ok(())
            }
            other => Err(SchedulingError::InvalidState(format!(
                "cannot complete a {:?} job",
                other
            ))),
        }
    }

    /// Cancels the job and raises `JobCancelled`
    pub fn cancel(&mut self, reason: String) -> Result<(), SchedulingError> {
        match self.status {
            JobStatus::Completed => Err(SchedulingError::InvalidState(
                "cannot cancel a completed job".into(),
            )),
            JobStatus::Cancelled => Err(SchedulingError::InvalidState(
                "job is already cancelled".into(),
            )),
            _ => {
                self.status = JobStatus::Cancelled;
                self.pending_events.push(DomainEvent::JobCancelled {
                    job_id: self.id,
                    reason,
                    region: self.region.clone(),
                });
                Ok(())
            }
        }
    }

    /// Records the audit trail entry backing the latest recommendation
    pub fn record_audit(&mut self, audit_id: Uuid) {
        self.latest_audit_id = Some(audit_id);
    }

    /// Drains the pending-event outbox
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn pending_event_count(&self) -> usize {
        self.pending_events.len()
    }
}
