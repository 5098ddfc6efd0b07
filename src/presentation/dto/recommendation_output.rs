use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::{RankedCandidate, RecommendationResult};
use crate::domain::value_objects::GeneratedSlot;

/// Response shape for a recommendation request, camelCase on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOutput {
    pub request_id: Uuid,
    pub job_id: Uuid,
    pub config_version: u32,
    pub best_recommendation_contractor_id: Option<Uuid>,
    pub generated_at: String,
    pub candidates: Vec<CandidateOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOutput {
    pub contractor_id: Uuid,
    pub contractor_name: String,
    pub final_score: f64,
    pub availability_score: f64,
    pub rating_score: f64,
    pub distance_score: f64,
    pub rotation_boost: f64,
    pub rationale: String,
    pub degraded: bool,
    pub slots: Vec<GeneratedSlot>,
}

impl From<&RankedCandidate> for CandidateOutput {
    fn from(candidate: &RankedCandidate) -> Self {
        Self {
            contractor_id: candidate.contractor_id,
            contractor_name: candidate.contractor_name.clone(),
            final_score: candidate.final_score,
            availability_score: candidate.breakdown.availability,
            rating_score: candidate.breakdown.rating,
            distance_score: candidate.breakdown.distance,
            rotation_boost: candidate.breakdown.rotation_boost,
            rationale: candidate.rationale.clone(),
            degraded: candidate.degraded,
            slots: candidate.slots.clone(),
        }
    }
}

impl From<&RecommendationResult> for RecommendationOutput {
    fn from(result: &RecommendationResult) -> Self {
        Self {
            request_id: result.request_id,
            job_id: result.job_id,
            config_version: result.config_version,
            best_recommendation_contractor_id: result.best_recommendation_contractor_id,
            generated_at: result.generated_at.to_rfc3339(),
            candidates: result.candidates.iter().map(CandidateOutput::from).collect(),
        }
    }
}
