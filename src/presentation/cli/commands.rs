//! CLI Commands module
//!
//! Wires the in-memory infrastructure to the scheduling use cases and
//! drives them end to end: the demo command runs a built-in fleet through
//! recommend → assign → reschedule → cancel, the recommend command ranks
//! contractors for a job loaded from a JSON seed file.

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::config::SchedulerConfig;
use crate::application::services::{
    AvailabilityEngine, FatigueCalculator, ScoringService, SlotGenerator, TravelBufferService,
};
use crate::application::use_cases::{
    AssignJob, AssignJobRequest, CancelJob, CancelJobRequest, CreateJob, CreateJobRequest,
    RecommendContractors, RecommendationRequest, RecommendationResult, RescheduleJob,
    RescheduleJobRequest,
};
use crate::domain::entities::{Contractor, Job, JobPriority, SystemConfiguration, WeightsConfig};
use crate::domain::repositories::{
    ContractorRepository as _, EventLogRepository as _, JobRepository as _,
    SystemConfigurationRepository as _, WeightsConfigRepository as _,
};
use crate::domain::value_objects::{GeoLocation, TimeWindow, WorkingHours};
use crate::infrastructure::config::CachedWeightsConfigRepository;
use crate::infrastructure::external::{
    CachedEtaMatrix, HaversineMatrixSource, InMemoryAddressValidation, ResilientDistanceCalc,
    StaticTimezoneService, UniformSpeedProvider,
};
use crate::infrastructure::realtime::{RealtimePublisher, TracingBroadcaster};
use crate::infrastructure::repositories::{
    InMemoryAssignmentRepository, InMemoryAuditRepository, InMemoryContractorRepository,
    InMemoryEventLogRepository, InMemoryJobRepository, InMemorySystemConfigurationRepository,
    InMemoryWeightsConfigRepository,
};
use crate::presentation::dto::RecommendationOutput;

/// In-memory wiring of every repository and use case
pub struct SchedulerHarness {
    pub contractors: Arc<InMemoryContractorRepository>,
    pub jobs: Arc<InMemoryJobRepository>,
    pub assignments: Arc<InMemoryAssignmentRepository>,
    pub event_log: Arc<InMemoryEventLogRepository>,
    pub create: CreateJob,
    pub recommend: RecommendContractors,
    pub assign: AssignJob,
    pub reschedule: RescheduleJob,
    pub cancel: CancelJob,
}

impl SchedulerHarness {
    pub async fn new() -> Result<Self> {
        let config = SchedulerConfig::from_env();

        let contractors = Arc::new(InMemoryContractorRepository::new());
        let jobs = Arc::new(InMemoryJobRepository::new());
        let assignments = Arc::new(InMemoryAssignmentRepository::new());
        let audits = Arc::new(InMemoryAuditRepository::new());
        let event_log = Arc::new(InMemoryEventLogRepository::new());
        let weights = Arc::new(CachedWeightsConfigRepository::new(Arc::new(
            InMemoryWeightsConfigRepository::new(),
        )));
        weights
            .add(WeightsConfig::default_active())
            .await
            .context("loading default weights")?;

        let system_config = Arc::new(InMemorySystemConfigurationRepository::new());
        system_config
            .add(SystemConfiguration::new(
                1,
                vec!["flooring".into(), "hvac".into(), "tiling".into()],
                vec!["flooring".into(), "hvac".into(), "tiling".into()],
            ))
            .await
            .map_err(|e| anyhow!("{e}"))?;

        let distance = Arc::new(ResilientDistanceCalc::new(
            Some(Arc::new(UniformSpeedProvider::default())),
            config.resilience.clone(),
            &config.scoring,
        ));
        let publisher = Arc::new(RealtimePublisher::new(
            Arc::new(TracingBroadcaster::new()),
            event_log.clone(),
        ));

        let eta_matrix = Arc::new(CachedEtaMatrix::new(
            Arc::new(HaversineMatrixSource::default()),
            config.matrix.clone(),
        ));
        let recommend = RecommendContractors::new(
            contractors.clone(),
            jobs.clone(),
            assignments.clone(),
            audits.clone(),
            weights.clone(),
            distance,
            eta_matrix,
            publisher.clone(),
            AvailabilityEngine::new(),
            SlotGenerator::new(
                AvailabilityEngine::new(),
                TravelBufferService::new(config.buffer.clone()),
                FatigueCalculator::new(config.fatigue.clone()),
                config.buffer.clone(),
            ),
            ScoringService::new(config.scoring.clone()),
            config.clone(),
        );
        let assign = AssignJob::new(
            jobs.clone(),
            contractors.clone(),
            assignments.clone(),
            audits,
            publisher.clone(),
            AvailabilityEngine::new(),
            FatigueCalculator::new(config.fatigue.clone()),
        );
        let reschedule = RescheduleJob::new(
            jobs.clone(),
            contractors.clone(),
            assignments.clone(),
            publisher.clone(),
            AvailabilityEngine::new(),
            FatigueCalculator::new(config.fatigue.clone()),
        );
        let cancel = CancelJob::new(jobs.clone(), assignments.clone(), publisher);
        let create = CreateJob::new(
            jobs.clone(),
            system_config,
            Arc::new(StaticTimezoneService::north_america()),
            Arc::new(InMemoryAddressValidation::new()),
        );

        Ok(Self {
            contractors,
            jobs,
            assignments,
            event_log,
            create,
            recommend,
            assign,
            reschedule,
            cancel,
        })
    }
}

/// Seed file shape for the recommend command
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedBundle {
    contractors: Vec<Contractor>,
    job: Job,
}

pub struct DemoCommand;

impl DemoCommand {
    pub async fn execute(as_json: bool) -> Result<()> {
        let harness = SchedulerHarness::new().await?;
        let job = seed_demo_fleet(&harness).await?;
        let cancel_token = CancellationToken::new();

        let result = harness
            .recommend
            .execute(
                RecommendationRequest {
                    job_id: job.id,
                    max_results: 3,
                    actor: "demo".into(),
                    publish_event: true,
                },
                &cancel_token,
            )
            .await
            .map_err(|e| anyhow!("recommendation failed: {e}"))?;

        if as_json {
            let output = RecommendationOutput::from(&result);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_summary(&result);
        }

        let Some(best) = result.best_recommendation_contractor_id else {
            println!("No feasible candidate; stopping after the recommendation.");
            return Ok(());
        };
        let slot = result.candidates[0]
            .slots
            .first()
            .ok_or_else(|| anyhow!("best candidate has no slot"))?
            .overall_window;

        let assignment = harness
            .assign
            .execute(
                AssignJobRequest {
                    job_id: job.id,
                    contractor_id: best,
                    window: slot,
                    manual: false,
                    audit_id: None,
                },
                &cancel_token,
            )
            .await
            .map_err(|e| anyhow!("assignment failed: {e}"))?;
        println!(
            "Assigned job to {} for {} (assignment {})",
            result.candidates[0].contractor_name, slot, assignment.id
        );

        let shifted = TimeWindow::new(
            slot.start_utc() + Duration::days(1),
            slot.end_utc() + Duration::days(1),
        )
        .map_err(|e| anyhow!("{e}"))?;
        harness
            .reschedule
            .execute(
                RescheduleJobRequest {
                    job_id: job.id,
                    new_window: shifted,
                },
                &cancel_token,
            )
            .await
            .map_err(|e| anyhow!("reschedule failed: {e}"))?;
        println!("Rescheduled job to {shifted}");

        harness
            .cancel
            .execute(
                CancelJobRequest {
                    job_id: job.id,
                    reason: Some("demo complete".into()),
                },
                &cancel_token,
            )
            .await
            .map_err(|e| anyhow!("cancel failed: {e}"))?;

        let entries = harness
            .event_log
            .get_all()
            .await
            .map_err(|e| anyhow!("{e}"))?;
        println!("Published {} events:", entries.len());
        for entry in entries {
            println!("  {} -> {}", entry.event_type, entry.published_to.join(", "));
        }
        Ok(())
    }
}

pub struct RecommendCommand;

impl RecommendCommand {
    pub async fn execute(input: &Path, max_results: usize) -> Result<()> {
        let raw = fs::read_to_string(input)
            .with_context(|| format!("reading seed file {}", input.display()))?;
        let bundle: SeedBundle = serde_json::from_str(&raw).context("parsing seed file")?;
        info!(
            contractors = bundle.contractors.len(),
            job = %bundle.job.id,
            "seed bundle loaded"
        );

        let harness = SchedulerHarness::new().await?;
        let job_id = bundle.job.id;
        harness
            .jobs
            .add(bundle.job)
            .await
            .map_err(|e| anyhow!("{e}"))?;
        for contractor in bundle.contractors {
            harness
                .contractors
                .add(contractor)
                .await
                .map_err(|e| anyhow!("{e}"))?;
        }

        let result = harness
            .recommend
            .execute(
                RecommendationRequest {
                    job_id,
                    max_results,
                    actor: "cli".into(),
                    publish_event: false,
                },
                &CancellationToken::new(),
            )
            .await
            .map_err(|e| anyhow!("recommendation failed: {e}"))?;

        let output = RecommendationOutput::from(&result);
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

fn print_summary(result: &RecommendationResult) {
    println!("Request {} (weights v{})", result.request_id, result.config_version);
    println!("{} candidate(s):", result.candidates.len());
    for (rank, candidate) in result.candidates.iter().enumerate() {
        println!(
            "  {}. {}: score {:.2}{}",
            rank + 1,
            candidate.contractor_name,
            candidate.final_score,
            if candidate.degraded { " (degraded)" } else { "" }
        );
        println!("     {}", candidate.rationale);
        for slot in &candidate.slots {
            println!(
                "     {:?} slot {} (confidence {:.0})",
                slot.slot_type, slot.overall_window, slot.confidence
            );
        }
    }
}

/// Three contractors around New York and one flooring job on a Monday
async fn seed_demo_fleet(harness: &SchedulerHarness) -> Result<Job> {
    let weekdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];
    let hours = |start: u32, end: u32| -> Result<Vec<WorkingHours>> {
        weekdays
            .iter()
            .map(|&day| {
                WorkingHours::new(
                    day,
                    NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
                    "America/New_York".into(),
                )
                .map_err(|e| anyhow!("{e}"))
            })
            .collect()
    };

    let fleet = [
        ("Avery", 40.7128, -74.0060, 88.0, hours(9, 17)?),
        ("Blake", 40.6782, -73.9442, 72.0, hours(8, 16)?),
        ("Casey", 40.7357, -74.1724, 94.0, hours(10, 18)?),
    ];
    for (name, lat, lng, rating, working_hours) in fleet {
        let contractor = Contractor::new(
            name.into(),
            GeoLocation::new(lat, lng).map_err(|e| anyhow!("{e}"))?,
            "America/New_York".into(),
            working_hours,
            vec!["flooring".into(), "tiling".into()],
            rating,
            3,
        )
        .map_err(|e| anyhow!("{e}"))?;
        harness
            .contractors
            .add(contractor)
            .await
            .map_err(|e| anyhow!("{e}"))?;
    }

    // 2025-06-02 is a Monday; the create use case resolves the timezone
    // from the job site
    let job = harness
        .create
        .execute(
            CreateJobRequest {
                job_type: "flooring".into(),
                duration_minutes: 120,
                location: Some(GeoLocation::new(40.7484, -73.9857).map_err(|e| anyhow!("{e}"))?),
                address: None,
                place_id: None,
                timezone: None,
                service_window: TimeWindow::new(
                    Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2025, 6, 2, 21, 0, 0).unwrap(),
                )
                .map_err(|e| anyhow!("{e}"))?,
                priority: JobPriority::Normal,
                desired_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                required_skills: vec!["Flooring".into()],
                region: "northeast".into(),
            },
            &CancellationToken::new(),
        )
        .await
        .map_err(|e| anyhow!("job creation failed: {e}"))?;
    Ok(job)
}
