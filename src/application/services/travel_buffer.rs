//! Travel-Buffer service module
//!
//! Deterministic buffer sizing from a travel ETA. The buffer covers
//! travel plus preparation time inserted between two time-adjacent
//! commitments; all three legs (base→first job, job→job, last job→base)
//! share the same formula.

use crate::application::config::BufferConfig;
use crate::domain::error::SchedulingError;

/// Sizes travel buffers from ETA estimates
pub struct TravelBufferService {
    config: BufferConfig,
}

impl TravelBufferService {
    pub fn new(config: BufferConfig) -> Self {
        Self { config }
    }

    /// Buffer before the first job of the day, from the base-location ETA
    pub fn base_to_first(
        &self,
        eta_minutes: f64,
        regional_multiplier: Option<f64>,
    ) -> Result<i64, SchedulingError> {
        self.buffer_minutes(eta_minutes, regional_multiplier)
    }

    /// Buffer between two consecutive jobs
    pub fn between_jobs(
        &self,
        eta_minutes: f64,
        regional_multiplier: Option<f64>,
    ) -> Result<i64, SchedulingError> {
        self.buffer_minutes(eta_minutes, regional_multiplier)
    }

    /// Buffer after the last job of the day, back to base
    pub fn last_to_base(
        &self,
        eta_minutes: f64,
        regional_multiplier: Option<f64>,
    ) -> Result<i64, SchedulingError> {
        self.buffer_minutes(eta_minutes, regional_multiplier)
    }

    /// Buffer the scheduler falls back to when no ETA estimate exists
    pub fn default_buffer(&self) -> i64 {
        self.config.default_minutes
    }

    /// `clamp(round(eta × multiplier × ratio), min, max)` minutes.
    ///
    /// The regional multiplier is applied before clamping.
    fn buffer_minutes(
        &self,
        eta_minutes: f64,
        regional_multiplier: Option<f64>,
    ) -> Result<i64, SchedulingError> {
        if eta_minutes < 0.0 {
            return Err(SchedulingError::InvalidArgument(format!(
                "negative ETA: {eta_minutes}"
            )));
        }
        let multiplier = regional_multiplier.unwrap_or(1.0);
        if multiplier <= 0.0 {
            return Err(SchedulingError::InvalidArgument(format!(
                "regional multiplier must be positive, got {multiplier}"
            )));
        }
        let raw = (eta_minutes * multiplier * self.config.ratio).round() as i64;
        Ok(raw.clamp(self.config.min_minutes, self.config.max_minutes))
    }
}

impl Default for TravelBufferService {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}
