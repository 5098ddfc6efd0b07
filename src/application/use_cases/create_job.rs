//! Create Job use case
//!
//! Validates a new job against the system configuration's catalogs,
//! resolves its location (geocoding a partial address when no
//! coordinates are given) and its IANA timezone, and persists it in
//! `Scheduled`.

use chrono::NaiveDate;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::collaborators::{AddressValidation, TimezoneService};
use crate::domain::entities::{Job, JobPriority};
use crate::domain::error::SchedulingError;
use crate::domain::repositories::{JobRepository, SystemConfigurationRepository};
use crate::domain::value_objects::{resolve_zone, GeoLocation, TimeWindow};

#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    pub job_type: String,
    pub duration_minutes: i64,
    /// Coordinates when already known; otherwise `address` is geocoded
    pub location: Option<GeoLocation>,
    pub address: Option<String>,
    pub place_id: Option<String>,
    /// IANA zone when already known; resolved from the location otherwise
    pub timezone: Option<String>,
    pub service_window: TimeWindow,
    pub priority: JobPriority,
    pub desired_date: NaiveDate,
    pub required_skills: Vec<String>,
    pub region: String,
}

pub struct CreateJob {
    jobs: Arc<dyn JobRepository>,
    system_config: Arc<dyn SystemConfigurationRepository>,
    timezones: Arc<dyn TimezoneService>,
    addresses: Arc<dyn AddressValidation>,
}

impl CreateJob {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        system_config: Arc<dyn SystemConfigurationRepository>,
        timezones: Arc<dyn TimezoneService>,
        addresses: Arc<dyn AddressValidation>,
    ) -> Self {
        Self {
            jobs,
            system_config,
            timezones,
            addresses,
        }
    }

    pub async fn execute(
        &self,
        request: CreateJobRequest,
        cancel: &CancellationToken,
    ) -> Result<Job, SchedulingError> {
        if cancel.is_cancelled() {
            return Err(SchedulingError::InvalidState(
                "job creation cancelled before commit".into(),
            ));
        }

        if let Some(config) = self.system_config.get_current().await? {
            if !config.is_job_type_allowed(&request.job_type) {
                return Err(SchedulingError::InvalidArgument(format!(
                    "job type not allowed: {}",
                    request.job_type
                )));
            }
            for skill in &request.required_skills {
                if !config.is_skill_allowed(skill) {
                    return Err(SchedulingError::InvalidArgument(format!(
                        "skill not allowed: {skill}"
                    )));
                }
            }
        }

        let location = match request.location {
            Some(location) => location,
            None => {
                let partial = request.address.as_deref().ok_or_else(|| {
                    SchedulingError::InvalidArgument(
                        "either coordinates or an address is required".into(),
                    )
                })?;
                self.addresses
                    .validate(partial, request.place_id.as_deref())
                    .await?
            }
        };

        let timezone = match request.timezone {
            Some(zone) => {
                resolve_zone(&zone)?;
                zone
            }
            None => {
                self.timezones
                    .get_timezone(location.latitude, location.longitude)
                    .await?
            }
        };
        let location = location.with_timezone(timezone.clone());

        let job = Job::new(
            request.job_type,
            request.duration_minutes,
            location,
            timezone,
            request.service_window,
            request.priority,
            request.desired_date,
            request.required_skills,
            request.region,
        )?;
        self.jobs.add(job.clone()).await?;

        info!(job = %job.id, job_type = %job.job_type, "job created");
        Ok(job)
    }
}
