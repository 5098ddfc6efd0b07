//! Domain events module
//!
//! Events raised by aggregates during mutations. Each aggregate buffers its
//! events in an in-memory outbox; mutation handlers drain the outbox after
//! the aggregate is persisted and hand the events to the realtime
//! publisher. The wire shape is internally tagged with a mandatory `type`
//! discriminator and camelCase keys; unknown fields are tolerated on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an assignment came to exist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentSource {
    Auto,
    Manual,
}

/// Domain event fanned out to realtime subscriber groups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DomainEvent {
    #[serde(rename_all = "camelCase")]
    RecommendationReady {
        job_id: Uuid,
        request_id: Uuid,
        region: String,
        config_version: u32,
        generated_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    JobAssigned {
        job_id: Uuid,
        contractor_id: Uuid,
        assignment_id: Uuid,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
        region: String,
        source: AssignmentSource,
        #[serde(skip_serializing_if = "Option::is_none")]
        audit_id: Option<Uuid>,
    },
    #[serde(rename_all = "camelCase")]
    JobRescheduled {
        job_id: Uuid,
        previous_start_utc: DateTime<Utc>,
        previous_end_utc: DateTime<Utc>,
        new_start_utc: DateTime<Utc>,
        new_end_utc: DateTime<Utc>,
        region: String,
    },
    #[serde(rename_all = "camelCase")]
    JobCancelled {
        job_id: Uuid,
        reason: String,
        region: String,
    },
}

impl DomainEvent {
    /// The `type` discriminator as published on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            DomainEvent::RecommendationReady { .. } => "RecommendationReady",
            DomainEvent::JobAssigned { .. } => "JobAssigned",
            DomainEvent::JobRescheduled { .. } => "JobRescheduled",
            DomainEvent::JobCancelled { .. } => "JobCancelled",
        }
    }

    /// Routing key of the regional dispatch group
    pub fn region(&self) -> &str {
        match self {
            DomainEvent::RecommendationReady { region, .. }
            | DomainEvent::JobAssigned { region, .. }
            | DomainEvent::JobRescheduled { region, .. }
            | DomainEvent::JobCancelled { region, .. } => region,
        }
    }

    /// Subscriber groups this event is delivered to.
    ///
    /// Every event reaches `dispatch/{region}`; assignment events also
    /// reach the bound contractor's group; reschedules and cancellations
    /// reach every currently assigned contractor's group.
    pub fn target_groups(&self, assigned_contractors: &[Uuid]) -> Vec<String> {
        let mut groups = vec![format!("dispatch/{}", self.region())];
        match self {
            DomainEvent::RecommendationReady { .. } => {}
            DomainEvent::JobAssigned { contractor_id, .. } => {
                groups.push(format!("contractor/{contractor_id}"));
            }
            DomainEvent::JobRescheduled { .. } | DomainEvent::JobCancelled { .. } => {
                for contractor_id in assigned_contractors {
                    groups.push(format!("contractor/{contractor_id}"));
                }
            }
        }
        groups
    }
}
