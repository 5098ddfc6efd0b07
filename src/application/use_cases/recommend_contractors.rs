//! Recommend Contractors use case
//!
//! The ranking pipeline: load the job, pull the skill-filtered candidate
//! pool, evaluate each contractor (availability, slots, factor scores),
//! rank with deterministic tie-breakers, persist the audit snapshot off
//! the response path and optionally publish `RecommendationReady`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::config::SchedulerConfig;
use crate::application::services::{
    rounded_2dp, AvailabilityEngine, FactorBreakdown, ScoringService, SlotGenerator, SlotRequest,
};
use crate::domain::collaborators::{DistanceCalc, EtaMatrix, EventPublisher};
use crate::domain::entities::{AuditRecommendation, Contractor, Job, WeightsConfig};
use crate::domain::error::SchedulingError;
use crate::domain::events::DomainEvent;
use crate::domain::repositories::{
    AssignmentRepository, AuditRecommendationRepository, ContractorRepository, JobRepository,
    WeightsConfigRepository,
};
use crate::domain::value_objects::{resolve_zone, GeneratedSlot, TimeWindow};

/// One recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub job_id: Uuid,
    pub max_results: usize,
    /// Identity of the requesting actor, recorded in the audit trail
    pub actor: String,
    /// Publish `RecommendationReady` after responding. Callers set this
    /// only for explicit recalculations so incidental reads cannot start
    /// fan-out loops.
    #[serde(default)]
    pub publish_event: bool,
}

/// One ranked candidate in the response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub contractor_id: Uuid,
    pub contractor_name: String,
    pub final_score: f64,
    pub breakdown: FactorBreakdown,
    pub rationale: String,
    pub slots: Vec<GeneratedSlot>,
    /// True when a routing fallback degraded the distance or ETA data
    pub degraded: bool,
}

/// The pipeline's response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub request_id: Uuid,
    pub job_id: Uuid,
    pub config_version: u32,
    pub candidates: Vec<RankedCandidate>,
    pub best_recommendation_contractor_id: Option<Uuid>,
    pub generated_at: DateTime<Utc>,
}

/// Internal per-candidate evaluation with tie-breaker metadata
struct CandidateEvaluation {
    candidate: RankedCandidate,
    earliest_start: DateTime<Utc>,
    same_day_utilization: f64,
    next_leg_travel_minutes: Option<f64>,
}

pub struct RecommendContractors {
    contractors: Arc<dyn ContractorRepository>,
    jobs: Arc<dyn JobRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    audits: Arc<dyn AuditRecommendationRepository>,
    weights: Arc<dyn WeightsConfigRepository>,
    distance: Arc<dyn DistanceCalc>,
    eta_matrix: Arc<dyn EtaMatrix>,
    publisher: Arc<dyn EventPublisher>,
    availability: AvailabilityEngine,
    slot_generator: SlotGenerator,
    scoring: ScoringService,
    config: SchedulerConfig,
}

impl RecommendContractors {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contractors: Arc<dyn ContractorRepository>,
        jobs: Arc<dyn JobRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        audits: Arc<dyn AuditRecommendationRepository>,
        weights: Arc<dyn WeightsConfigRepository>,
        distance: Arc<dyn DistanceCalc>,
        eta_matrix: Arc<dyn EtaMatrix>,
        publisher: Arc<dyn EventPublisher>,
        availability: AvailabilityEngine,
        slot_generator: SlotGenerator,
        scoring: ScoringService,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            contractors,
            jobs,
            assignments,
            audits,
            weights,
            distance,
            eta_matrix,
            publisher,
            availability,
            slot_generator,
            scoring,
            config,
        }
    }

    pub async fn execute(
        &self,
        request: RecommendationRequest,
        cancel: &CancellationToken,
    ) -> Result<RecommendationResult, SchedulingError> {
        let job = self
            .jobs
            .get_by_id(request.job_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("job {}", request.job_id)))?;

        let weights = self
            .weights
            .get_active()
            .await?
            .ok_or_else(|| SchedulingError::InvalidConfig("no active weights config".into()))?;

        let pool = self.contractors.get_by_skills(&job.required_skills).await?;
        debug!(candidates = pool.len(), job = %job.id, "candidate pool loaded");

        let mut evaluations: Vec<CandidateEvaluation> = Vec::new();
        for contractor in &pool {
            if cancel.is_cancelled() {
                return Err(SchedulingError::InvalidState(
                    "recommendation cancelled before completion".into(),
                ));
            }
            if !contractor.has_all_skills(&job.required_skills) {
                continue;
            }
            if let Some(evaluation) = self.evaluate(&job, contractor, &weights).await? {
                evaluations.push(evaluation);
            }
        }

        rank(&mut evaluations);
        let limit = request.max_results.min(self.config.scoring.max_results_cap);
        evaluations.truncate(limit);

        let request_id = Uuid::new_v4();
        let generated_at = Utc::now();
        let candidates: Vec<RankedCandidate> =
            evaluations.into_iter().map(|e| e.candidate).collect();
        let best = candidates.first().map(|c| c.contractor_id);

        let result = RecommendationResult {
            request_id,
            job_id: job.id,
            config_version: weights.version,
            candidates,
            best_recommendation_contractor_id: best,
            generated_at,
        };

        self.persist_audit_async(&request, &result, generated_at);

        if request.publish_event {
            let event = DomainEvent::RecommendationReady {
                job_id: job.id,
                request_id,
                region: job.region.clone(),
                config_version: weights.version,
                generated_at,
            };
            self.publisher.publish(&event, &[]).await;
        }

        info!(
            request_id = %request_id,
            candidates = result.candidates.len(),
            "recommendation completed"
        );
        Ok(result)
    }

    /// Runs one contractor through availability, slot generation and
    /// scoring; `None` means a hard filter dropped the candidate
    async fn evaluate(
        &self,
        job: &Job,
        contractor: &Contractor,
        weights: &WeightsConfig,
    ) -> Result<Option<CandidateEvaluation>, SchedulingError> {
        let assignments = self.assignments.get_by_contractor(contractor.id).await?;

        let eta = self
            .distance
            .eta(
                contractor.base_location.latitude,
                contractor.base_location.longitude,
                job.location.latitude,
                job.location.longitude,
            )
            .await;
        let distance = self
            .distance
            .distance(
                contractor.base_location.latitude,
                contractor.base_location.longitude,
                job.location.latitude,
                job.location.longitude,
            )
            .await;
        let degraded = eta.degraded || distance.degraded;
        let prev_eta = self.previous_job_eta(&assignments, job).await;

        let slot_request = SlotRequest {
            working_hours: &contractor.working_hours,
            service_window: &job.service_window,
            assignments: &assignments,
            job_duration_minutes: job.duration_minutes,
            contractor_zone: &contractor.timezone,
            job_zone: &job.timezone,
            calendar: contractor.calendar.as_ref(),
            base_eta_minutes: eta.minutes,
            prev_eta_minutes: prev_eta,
            rating: contractor.rating,
            is_rush: job.priority.is_rush(),
        };
        let slots = self.slot_generator.generate(&slot_request)?;
        if slots.is_empty() {
            debug!(contractor = %contractor.id, "no feasible slot, candidate skipped");
            return Ok(None);
        }

        let blocking: Vec<TimeWindow> = assignments
            .iter()
            .filter(|a| a.status.blocks_schedule())
            .map(|a| a.window)
            .collect();
        let windows = self.availability.available(
            &contractor.working_hours,
            &job.service_window,
            &blocking,
            job.duration_minutes,
            &contractor.timezone,
            &job.timezone,
            contractor.calendar.as_ref(),
        )?;
        let total_available_minutes: i64 = windows.iter().map(|w| w.duration_minutes()).sum();

        let assigned_minutes: i64 = assignments
            .iter()
            .filter(|a| a.status.blocks_schedule())
            .filter_map(|a| a.window.intersect(&job.service_window))
            .map(|w| w.duration_minutes())
            .sum();
        let utilization = utilization_ratio(assigned_minutes, total_available_minutes);

        let breakdown = FactorBreakdown {
            availability: self
                .scoring
                .availability_score(windows.len(), total_available_minutes),
            rating: contractor.rating,
            distance: self.scoring.distance_score(distance.meters.unwrap_or(f64::MAX)),
            rotation_boost: self.scoring.rotation_boost(utilization, &weights.rotation),
        };
        let final_score = self.scoring.final_score(&breakdown, weights);
        let rationale = self.scoring.rationale(&breakdown, weights);

        let earliest_start = slots
            .iter()
            .map(|s| s.overall_window.start_utc())
            .min()
            .expect("slots are non-empty");
        let same_day_utilization = self.same_day_utilization(
            earliest_start,
            &contractor.timezone,
            &assignments,
            &windows,
        )?;

        Ok(Some(CandidateEvaluation {
            candidate: RankedCandidate {
                contractor_id: contractor.id,
                contractor_name: contractor.name.clone(),
                final_score,
                breakdown,
                rationale,
                slots,
                degraded,
            },
            earliest_start,
            same_day_utilization,
            next_leg_travel_minutes: eta.minutes,
        }))
    }

    /// ETA of the job→job leg: from the site of the contractor's booking
    /// that ends last before the service window closes, via the cached
    /// matrix. Missing bookings, jobs or matrix routes yield `None`;
    /// matrix failures degrade silently.
    async fn previous_job_eta(
        &self,
        assignments: &[crate::domain::entities::Assignment],
        job: &Job,
    ) -> Option<f64> {
        let previous = assignments
            .iter()
            .filter(|a| a.status.blocks_schedule())
            .filter(|a| a.window.end_utc() <= job.service_window.end_utc())
            .max_by_key(|a| a.window.end_utc())?;
        let previous_job = match self.jobs.get_by_id(previous.job_id).await {
            Ok(Some(found)) => found,
            Ok(None) => return None,
            Err(error) => {
                debug!(%error, "previous job lookup failed");
                return None;
            }
        };

        let origins = [(
            previous_job.location.latitude,
            previous_job.location.longitude,
        )];
        let destinations = [(job.location.latitude, job.location.longitude)];
        match self.eta_matrix.etas(&origins, &destinations).await {
            Ok(etas) => etas.get(&(0, 0)).copied(),
            Err(error) => {
                debug!(%error, "eta matrix lookup failed");
                None
            }
        }
    }

    /// Assigned share of the contractor's local day holding `start`
    fn same_day_utilization(
        &self,
        start: DateTime<Utc>,
        contractor_zone: &str,
        assignments: &[crate::domain::entities::Assignment],
        windows: &[TimeWindow],
    ) -> Result<f64, SchedulingError> {
        let tz = resolve_zone(contractor_zone)?;
        let day = start.with_timezone(&tz).date_naive();
        let assigned: i64 = assignments
            .iter()
            .filter(|a| a.status.blocks_schedule())
            .filter(|a| a.window.start_utc().with_timezone(&tz).date_naive() == day)
            .map(|a| a.window.duration_minutes())
            .sum();
        let available: i64 = windows
            .iter()
            .filter(|w| w.start_utc().with_timezone(&tz).date_naive() == day)
            .map(|w| w.duration_minutes())
            .sum();
        Ok(utilization_ratio(assigned, available))
    }

    /// Persists the audit snapshot and stamps the job's audit reference
    /// without blocking the response
    fn persist_audit_async(
        &self,
        request: &RecommendationRequest,
        result: &RecommendationResult,
        generated_at: DateTime<Utc>,
    ) {
        let payload = json!({
            "jobId": request.job_id,
            "maxResults": request.max_results,
            "publishEvent": request.publish_event,
        });
        let candidates_json = match serde_json::to_value(&result.candidates) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "could not serialize candidates for audit");
                json!([])
            }
        };
        let audit = AuditRecommendation::new(
            result.request_id,
            result.job_id,
            payload,
            candidates_json,
            result.config_version,
            request.actor.clone(),
            generated_at,
        );
        let audit_id = audit.id;
        let audits = Arc::clone(&self.audits);
        let jobs = Arc::clone(&self.jobs);
        let job_id = result.job_id;
        tokio::spawn(async move {
            if let Err(error) = audits.add(audit).await {
                warn!(%error, "audit persistence failed");
                return;
            }
            match jobs.get_by_id(job_id).await {
                Ok(Some(mut job)) => {
                    job.record_audit(audit_id);
                    if let Err(error) = jobs.update(job).await {
                        warn!(%error, "could not stamp job audit reference");
                    }
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "could not load job for audit stamp"),
            }
        });
    }
}

fn utilization_ratio(assigned_minutes: i64, available_minutes: i64) -> f64 {
    let total = assigned_minutes + available_minutes;
    if total <= 0 {
        0.0
    } else {
        (assigned_minutes as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Orders candidates by rounded final score descending; groups tying at
/// two decimals fall through the tie-breakers: earliest feasible start,
/// lower same-day utilization, shortest next-leg travel (unknown last),
/// and finally the contractor ID for a fully deterministic order.
fn rank(evaluations: &mut [CandidateEvaluation]) {
    evaluations.sort_by(|a, b| {
        rounded_2dp(b.candidate.final_score)
            .cmp(&rounded_2dp(a.candidate.final_score))
            .then_with(|| a.earliest_start.cmp(&b.earliest_start))
            .then_with(|| {
                a.same_day_utilization
                    .partial_cmp(&b.same_day_utilization)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| {
                let travel_a = a.next_leg_travel_minutes.unwrap_or(f64::INFINITY);
                let travel_b = b.next_leg_travel_minutes.unwrap_or(f64::INFINITY);
                travel_a
                    .partial_cmp(&travel_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.candidate.contractor_id.cmp(&b.candidate.contractor_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::domain::value_objects::{GeneratedSlot, SlotType, TimeWindow};

    fn evaluation(
        score: f64,
        start_hour: u32,
        utilization: f64,
        travel: Option<f64>,
    ) -> CandidateEvaluation {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 1, 13, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 13, start_hour + 1, 0, 0).unwrap(),
        )
        .unwrap();
        CandidateEvaluation {
            candidate: RankedCandidate {
                contractor_id: Uuid::new_v4(),
                contractor_name: "c".into(),
                final_score: score,
                breakdown: FactorBreakdown {
                    availability: 0.0,
                    rating: 0.0,
                    distance: 0.0,
                    rotation_boost: 0.0,
                },
                rationale: String::new(),
                slots: vec![GeneratedSlot::single_day(
                    window,
                    chrono::NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
                    SlotType::Earliest,
                    50.0,
                )],
                degraded: false,
            },
            earliest_start: window.start_utc(),
            same_day_utilization: utilization,
            next_leg_travel_minutes: travel,
        }
    }

    #[test]
    fn test_rank_by_score_then_start() {
        let mut evals = vec![
            evaluation(70.0, 12, 0.5, None),
            evaluation(80.0, 14, 0.5, None),
            // ties with the first at 2dp but starts earlier
            evaluation(70.004, 9, 0.5, None),
        ];
        rank(&mut evals);
        assert_eq!(rounded_2dp(evals[0].candidate.final_score), 8000);
        assert_eq!(evals[1].earliest_start.to_rfc3339(), "2025-01-13T09:00:00+00:00");
        assert_eq!(evals[2].earliest_start.to_rfc3339(), "2025-01-13T12:00:00+00:00");
    }

    #[test]
    fn test_tie_breaks_on_utilization_then_travel() {
        let mut evals = vec![
            evaluation(70.0, 9, 0.8, Some(10.0)),
            evaluation(70.0, 9, 0.2, Some(50.0)),
            evaluation(70.0, 9, 0.2, Some(5.0)),
            evaluation(70.0, 9, 0.2, None),
        ];
        rank(&mut evals);
        // lower utilization first; among those, shorter travel; unknown
        // travel sorts last
        assert_eq!(evals[0].next_leg_travel_minutes, Some(5.0));
        assert_eq!(evals[1].next_leg_travel_minutes, Some(50.0));
        assert_eq!(evals[2].next_leg_travel_minutes, None);
        assert_eq!(evals[3].same_day_utilization, 0.8);
    }

    #[test]
    fn test_utilization_ratio_bounds() {
        assert_eq!(utilization_ratio(0, 0), 0.0);
        assert_eq!(utilization_ratio(0, 480), 0.0);
        assert_eq!(utilization_ratio(240, 240), 0.5);
        assert_eq!(utilization_ratio(480, 0), 1.0);
    }

    mod pipeline {
        use super::*;
        use crate::application::config::SchedulerConfig;
        use crate::application::services::{
            FatigueCalculator, SlotGenerator, TravelBufferService,
        };
        use crate::domain::entities::{Contractor, Job, JobPriority};
        use crate::domain::repositories::{
            AuditRecommendationRepository as _, ContractorRepository as _, JobRepository as _,
            WeightsConfigRepository as _,
        };
        use crate::domain::value_objects::{GeoLocation, WorkingHours};
        use crate::infrastructure::external::{
            CachedEtaMatrix, HaversineMatrixSource, ResilientDistanceCalc,
        };
        use crate::infrastructure::realtime::{RealtimePublisher, RecordingBroadcaster};
        use crate::infrastructure::repositories::{
            InMemoryAssignmentRepository, InMemoryAuditRepository, InMemoryContractorRepository,
            InMemoryEventLogRepository, InMemoryJobRepository, InMemoryWeightsConfigRepository,
        };
        use chrono::{NaiveDate, NaiveTime, Weekday};
        use std::time::Duration as StdDuration;

        struct Fixture {
            contractors: Arc<InMemoryContractorRepository>,
            jobs: Arc<InMemoryJobRepository>,
            audits: Arc<InMemoryAuditRepository>,
            broadcaster: Arc<RecordingBroadcaster>,
            pipeline: RecommendContractors,
        }

        fn fixture() -> Fixture {
            let config = SchedulerConfig::default();
            let contractors = Arc::new(InMemoryContractorRepository::new());
            let jobs = Arc::new(InMemoryJobRepository::new());
            let assignments = Arc::new(InMemoryAssignmentRepository::new());
            let audits = Arc::new(InMemoryAuditRepository::new());
            let weights = Arc::new(InMemoryWeightsConfigRepository::new());
            let broadcaster = Arc::new(RecordingBroadcaster::new());
            let publisher = Arc::new(RealtimePublisher::new(
                broadcaster.clone(),
                Arc::new(InMemoryEventLogRepository::new()),
            ));
            let pipeline = RecommendContractors::new(
                contractors.clone(),
                jobs.clone(),
                assignments,
                audits.clone(),
                weights.clone(),
                Arc::new(ResilientDistanceCalc::haversine_only(&config.scoring)),
                Arc::new(CachedEtaMatrix::new(
                    Arc::new(HaversineMatrixSource::default()),
                    config.matrix.clone(),
                )),
                publisher,
                AvailabilityEngine::new(),
                SlotGenerator::new(
                    AvailabilityEngine::new(),
                    TravelBufferService::new(config.buffer.clone()),
                    FatigueCalculator::new(config.fatigue.clone()),
                    config.buffer.clone(),
                ),
                ScoringService::new(config.scoring.clone()),
                config,
            );
            Fixture {
                contractors,
                jobs,
                audits,
                broadcaster,
                pipeline,
            }
        }

        async fn seed_weights(f: &Fixture) {
            f.pipeline
                .weights
                .add(crate::domain::entities::WeightsConfig::default_active())
                .await
                .unwrap();
        }

        fn contractor(name: &str, lat: f64, rating: f64, skills: Vec<String>) -> Contractor {
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
                name.into(),
                GeoLocation::new(lat, -74.0).unwrap(),
                "UTC".into(),
                hours,
                skills,
                rating,
                3,
            )
            .unwrap()
        }

        fn monday_job(required_skills: Vec<String>) -> Job {
            Job::new(
                "flooring".into(),
                120,
                GeoLocation::new(40.7, -74.0).unwrap(),
                "UTC".into(),
                TimeWindow::new(
                    Utc.with_ymd_and_hms(2025, 1, 13, 9, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2025, 1, 13, 17, 0, 0).unwrap(),
                )
                .unwrap(),
                JobPriority::Normal,
                NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
                required_skills,
                "northeast".into(),
            )
            .unwrap()
        }

        #[tokio::test]
        async fn test_identical_inputs_rank_identically() {
            let f = fixture();
            seed_weights(&f).await;
            // ~5.5 km and ~2.2 km north of the job site
            f.contractors
                .add(contractor("high-rating", 40.75, 80.0, vec!["flooring".into()]))
                .await
                .unwrap();
            f.contractors
                .add(contractor("nearby", 40.72, 60.0, vec!["flooring".into()]))
                .await
                .unwrap();
            let job = monday_job(vec!["flooring".into()]);
            f.jobs.add(job.clone()).await.unwrap();

            let request = RecommendationRequest {
                job_id: job.id,
                max_results: 5,
                actor: "test".into(),
                publish_event: false,
            };
            let first = f
                .pipeline
                .execute(request.clone(), &CancellationToken::new())
                .await
                .unwrap();
            let second = f
                .pipeline
                .execute(request, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(first.candidates.len(), 2);
            let ids = |r: &RecommendationResult| {
                r.candidates
                    .iter()
                    .map(|c| (c.contractor_id, rounded_2dp(c.final_score), c.rationale.clone()))
                    .collect::<Vec<_>>()
            };
            assert_eq!(ids(&first), ids(&second));
            assert_eq!(
                first.best_recommendation_contractor_id,
                second.best_recommendation_contractor_id
            );
        }

        #[tokio::test]
        async fn test_skill_filter_is_case_insensitive() {
            let f = fixture();
            seed_weights(&f).await;
            f.contractors
                .add(contractor("lower-case", 40.72, 70.0, vec!["hvac".into()]))
                .await
                .unwrap();
            f.contractors
                .add(contractor("unskilled", 40.72, 95.0, vec!["painting".into()]))
                .await
                .unwrap();
            let job = monday_job(vec!["HVAC".into()]);
            f.jobs.add(job.clone()).await.unwrap();

            let result = f
                .pipeline
                .execute(
                    RecommendationRequest {
                        job_id: job.id,
                        max_results: 5,
                        actor: "test".into(),
                        publish_event: false,
                    },
                    &CancellationToken::new(),
                )
                .await
                .unwrap();

            assert_eq!(result.candidates.len(), 1);
            assert_eq!(result.candidates[0].contractor_name, "lower-case");
        }

        #[tokio::test]
        async fn test_request_id_reaches_audit_and_event() {
            let f = fixture();
            seed_weights(&f).await;
            f.contractors
                .add(contractor("solo", 40.72, 70.0, vec!["flooring".into()]))
                .await
                .unwrap();
            let job = monday_job(vec!["flooring".into()]);
            f.jobs.add(job.clone()).await.unwrap();

            let result = f
                .pipeline
                .execute(
                    RecommendationRequest {
                        job_id: job.id,
                        max_results: 3,
                        actor: "dispatcher".into(),
                        publish_event: true,
                    },
                    &CancellationToken::new(),
                )
                .await
                .unwrap();

            // the RecommendationReady event goes to the dispatch group
            // only and carries the same request id
            let sent = f.broadcaster.sent().await;
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].group, "dispatch/northeast");
            let payload: serde_json::Value = serde_json::from_str(&sent[0].payload).unwrap();
            assert_eq!(payload["type"], "RecommendationReady");
            assert_eq!(payload["requestId"], result.request_id.to_string());

            // audit persistence is asynchronous; wait for it
            let mut audit = None;
            for _ in 0..100 {
                if let Some(found) = f
                    .audits
                    .get_by_request_id(result.request_id)
                    .await
                    .unwrap()
                {
                    audit = Some(found);
                    break;
                }
                tokio::time::sleep(StdDuration::from_millis(10)).await;
            }
            let audit = audit.expect("audit record persisted");
            assert_eq!(audit.config_version, result.config_version);
            assert_eq!(audit.actor, "dispatcher");
            assert!(audit.selected_contractor_id.is_none());

            // the job carries the audit reference once the stamp lands
            let mut stamped = false;
            for _ in 0..100 {
                let stored = f.jobs.get_by_id(job.id).await.unwrap().unwrap();
                if stored.latest_audit_id == Some(audit.id) {
                    stamped = true;
                    break;
                }
                tokio::time::sleep(StdDuration::from_millis(10)).await;
            }
            assert!(stamped, "job audit reference stamped");
        }

        #[tokio::test]
        async fn test_incidental_read_publishes_nothing() {
            let f = fixture();
            seed_weights(&f).await;
            f.contractors
                .add(contractor("solo", 40.72, 70.0, vec!["flooring".into()]))
                .await
                .unwrap();
            let job = monday_job(vec!["flooring".into()]);
            f.jobs.add(job.clone()).await.unwrap();

            f.pipeline
                .execute(
                    RecommendationRequest {
                        job_id: job.id,
                        max_results: 3,
                        actor: "reader".into(),
                        publish_event: false,
                    },
                    &CancellationToken::new(),
                )
                .await
                .unwrap();
            assert!(f.broadcaster.sent().await.is_empty());
        }

        #[tokio::test]
        async fn test_zero_availability_drops_candidate() {
            let f = fixture();
            seed_weights(&f).await;
            // weekend-only contractor cannot serve a Monday-only window
            let weekend_hours = vec![WorkingHours::new(
                Weekday::Sat,
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                "UTC".into(),
            )
            .unwrap()];
            let contractor = Contractor::new(
                "weekender".into(),
                GeoLocation::new(40.72, -74.0).unwrap(),
                "UTC".into(),
                weekend_hours,
                vec!["flooring".into()],
                90.0,
                3,
            )
            .unwrap();
            f.contractors.add(contractor).await.unwrap();
            let job = monday_job(vec!["flooring".into()]);
            f.jobs.add(job.clone()).await.unwrap();

            let result = f
                .pipeline
                .execute(
                    RecommendationRequest {
                        job_id: job.id,
                        max_results: 3,
                        actor: "test".into(),
                        publish_event: false,
                    },
                    &CancellationToken::new(),
                )
                .await
                .unwrap();
            assert!(result.candidates.is_empty());
            assert!(result.best_recommendation_contractor_id.is_none());
        }

        #[tokio::test]
        async fn test_missing_weights_is_invalid_config() {
            let f = fixture();
            let job = monday_job(vec![]);
            f.jobs.add(job.clone()).await.unwrap();
            let result = f
                .pipeline
                .execute(
                    RecommendationRequest {
                        job_id: job.id,
                        max_results: 3,
                        actor: "test".into(),
                        publish_event: false,
                    },
                    &CancellationToken::new(),
                )
                .await;
            assert!(matches!(result, Err(SchedulingError::InvalidConfig(_))));
        }
    }
}
