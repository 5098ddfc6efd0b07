//! Recommendation audit entity module
//!
//! An `AuditRecommendation` is an immutable snapshot of one recommendation
//! request: the request payload, the scored candidate set with rationale,
//! the config version in force, and the actor who asked. The only field
//! written after the fact is the selected contractor, stamped when an
//! assignment is created against the recommendation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable snapshot of a recommendation request and its outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecommendation {
    pub id: Uuid,
    /// Correlates the response, the audit record and the realtime event
    pub request_id: Uuid,
    pub job_id: Uuid,
    /// Original request payload, JSON
    pub request_payload: serde_json::Value,
    /// Candidate set with per-factor scores and rationale, JSON
    pub candidates: serde_json::Value,
    pub config_version: u32,
    /// Identity of the requesting actor
    pub actor: String,
    /// Filled in post-hoc when an assignment is created against this record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_contractor_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
}

impl AuditRecommendation {
    pub fn new(
        request_id: Uuid,
        job_id: Uuid,
        request_payload: serde_json::Value,
        candidates: serde_json::Value,
        config_version: u32,
        actor: String,
        created_at_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            job_id,
            request_payload,
            candidates,
            config_version,
            actor,
            selected_contractor_id: None,
            created_at_utc,
        }
    }

    /// Stamps the contractor ultimately chosen from this recommendation
    pub fn select_contractor(&mut self, contractor_id: Uuid) {
        self.selected_contractor_id = Some(contractor_id);
    }
}
