//! Assignment entity module
//!
//! An assignment binds a job to a contractor for a concrete UTC window.
//! Its status machine is `Pending → Confirmed → InProgress → Completed`,
//! with `Cancelled` reachable from any non-terminal state. The time slot
//! is frozen once the assignment reaches a terminal state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::SchedulingError;
use crate::domain::events::AssignmentSource;
use crate::domain::value_objects::TimeWindow;

/// Assignment lifecycle states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssignmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Completed | AssignmentStatus::Cancelled)
    }

    /// Whether this assignment occupies the contractor's time for
    /// conflict detection: cancelled and completed work never blocks.
    pub fn blocks_schedule(&self) -> bool {
        !self.is_terminal()
    }
}

/// A job↔contractor binding with a concrete `[start, end)` window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub job_id: Uuid,
    pub contractor_id: Uuid,
    pub window: TimeWindow,
    pub status: AssignmentStatus,
    pub source: AssignmentSource,
    /// Audit record that justified this assignment, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<Uuid>,
    /// Optimistic-concurrency row version, bumped by the repository
    #[serde(default)]
    pub version: u64,
}

impl Assignment {
    /// Creates an assignment in `Pending` (automatic path)
    pub fn pending(
        job_id: Uuid,
        contractor_id: Uuid,
        window: TimeWindow,
        audit_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            contractor_id,
            window,
            status: AssignmentStatus::Pending,
            source: AssignmentSource::Auto,
            audit_id,
            version: 0,
        }
    }

    /// Creates an assignment directly in `Confirmed` (manual path)
    pub fn confirmed(
        job_id: Uuid,
        contractor_id: Uuid,
        window: TimeWindow,
        audit_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            contractor_id,
            window,
            status: AssignmentStatus::Confirmed,
            source: AssignmentSource::Manual,
            audit_id,
            version: 0,
        }
    }

    pub fn confirm(&mut self) -> Result<(), SchedulingError> {
        self.advance(AssignmentStatus::Pending, AssignmentStatus::Confirmed)
    }

    pub fn begin_progress(&mut self) -> Result<(), SchedulingError> {
        self.advance(AssignmentStatus::Confirmed, AssignmentStatus::InProgress)
    }

    pub fn complete(&mut self) -> Result<(), SchedulingError> {
        self.advance(AssignmentStatus::InProgress, AssignmentStatus::Completed)
    }

    /// Cancels from any non-terminal state
    pub fn cancel(&mut self) -> Result<(), SchedulingError> {
        if self.status.is_terminal() {
            return Err(SchedulingError::InvalidState(format!(
                "cannot cancel a {:?} assignment",
                self.status
            )));
        }
        self.status = AssignmentStatus::Cancelled;
        Ok(())
    }

    /// Moves the time slot; rejected once the assignment is terminal
    pub fn reschedule(&mut self, window: TimeWindow) -> Result<(), SchedulingError> {
        if self.status.is_terminal() {
            return Err(SchedulingError::InvalidState(format!(
                "cannot edit the slot of a {:?} assignment",
                self.status
            )));
        }
        self.window = window;
        Ok(())
    }

    fn advance(
        &mut self,
        expected: AssignmentStatus,
        next: AssignmentStatus,
    ) -> Result<(), SchedulingError> {
        if self.status != expected {
            return Err(SchedulingError::InvalidState(format!(
                "cannot move a {:?} assignment to {:?}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}
