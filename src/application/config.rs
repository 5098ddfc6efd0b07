//! Scheduler configuration module
//!
//! All tunables of the scheduling core live in one immutable
//! `SchedulerConfig` value, loaded at startup and replaced atomically on
//! reload. Values can be overridden from environment variables or use the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::env;

/// Travel-buffer sizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BufferConfig {
    /// Fraction of the ETA converted into buffer minutes
    pub ratio: f64,
    /// Lower clamp, minutes
    pub min_minutes: i64,
    /// Upper clamp, minutes
    pub max_minutes: i64,
    /// Buffer assumed when no ETA estimate is available, minutes
    pub default_minutes: i64,
    /// Padding added to the minimum-window requirement for quarter-hour
    /// rounding, minutes
    pub rounding_pad_minutes: i64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            ratio: 0.25,
            min_minutes: 10,
            max_minutes: 45,
            default_minutes: 15,
            rounding_pad_minutes: 15,
        }
    }
}

/// Daily-hours and consecutive-job limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FatigueConfig {
    /// Absolute daily cap, minutes
    pub hard_stop_minutes: i64,
    /// Soft cap waived for rush jobs, minutes
    pub soft_cap_minutes: i64,
    /// Longest allowed chain of back-to-back jobs
    pub max_consecutive_jobs: usize,
    /// Gap below which two jobs count as back-to-back, minutes
    pub min_break_minutes: i64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            hard_stop_minutes: 12 * 60,
            soft_cap_minutes: 10 * 60,
            max_consecutive_jobs: 4,
            min_break_minutes: 15,
        }
    }
}

/// External-call resilience settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff, milliseconds
    pub backoff_base_ms: u64,
    /// Hard per-call timeout, milliseconds
    pub timeout_ms: u64,
    /// Consecutive failures that open the circuit
    pub circuit_failure_threshold: u32,
    /// How long an open circuit rejects calls, seconds
    pub circuit_open_seconds: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 200,
            timeout_ms: 3_500,
            circuit_failure_threshold: 5,
            circuit_open_seconds: 30,
        }
    }
}

/// ETA-matrix batching and caching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatrixConfig {
    /// Coordinate pairs per upstream batch
    pub batch_size: usize,
    /// Concurrent batches in flight
    pub max_concurrency: usize,
    /// Cache entry lifetime, seconds
    pub cache_ttl_seconds: u64,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            max_concurrency: 4,
            cache_ttl_seconds: 15 * 60,
        }
    }
}

/// The scheduler's single immutable configuration value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub buffer: BufferConfig,
    pub fatigue: FatigueConfig,
    pub resilience: ResilienceConfig,
    pub matrix: MatrixConfig,
    pub scoring: ScoringConfig,
}

/// Scoring-pipeline shape parameters (the weights themselves are the
/// versioned `WeightsConfig` aggregate)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Hard ceiling on returned candidates
    pub max_results_cap: usize,
    /// Distance beyond which the distance score is zero, meters
    pub distance_cutoff_meters: f64,
    /// Exponential-decay constant of the distance score, meters
    pub distance_decay_meters: f64,
    /// Fallback road speed for ETA estimation, km/h
    pub fallback_speed_kmh: f64,
    /// Maximum rationale length, characters
    pub rationale_max_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_results_cap: 50,
            distance_cutoff_meters: 100_000.0,
            distance_decay_meters: 15_000.0,
            fallback_speed_kmh: 50.0,
            rationale_max_chars: 200,
        }
    }
}

impl SchedulerConfig {
    /// Loads the configuration, letting environment variables override
    /// individual defaults. Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_i64("SCHED_BUFFER_MIN_MINUTES") {
            config.buffer.min_minutes = v;
        }
        if let Some(v) = env_i64("SCHED_BUFFER_MAX_MINUTES") {
            config.buffer.max_minutes = v;
        }
        if let Some(v) = env_f64("SCHED_BUFFER_RATIO") {
            config.buffer.ratio = v;
        }
        if let Some(v) = env_i64("SCHED_HARD_STOP_MINUTES") {
            config.fatigue.hard_stop_minutes = v;
        }
        if let Some(v) = env_i64("SCHED_SOFT_CAP_MINUTES") {
            config.fatigue.soft_cap_minutes = v;
        }
        if let Some(v) = env_u64("SCHED_API_TIMEOUT_MS") {
            config.resilience.timeout_ms = v;
        }
        if let Some(v) = env_u64("SCHED_ETA_CACHE_TTL_SECONDS") {
            config.matrix.cache_ttl_seconds = v;
        }
        config
    }
}

fn env_i64(key: &str) -> Option<i64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_operating_limits() {
        let config = SchedulerConfig::default();
        assert_eq!(config.buffer.min_minutes, 10);
        assert_eq!(config.buffer.max_minutes, 45);
        assert_eq!(config.buffer.ratio, 0.25);
        assert_eq!(config.fatigue.hard_stop_minutes, 720);
        assert_eq!(config.fatigue.soft_cap_minutes, 600);
        assert_eq!(config.fatigue.max_consecutive_jobs, 4);
        assert_eq!(config.fatigue.min_break_minutes, 15);
        assert_eq!(config.resilience.timeout_ms, 3_500);
        assert_eq!(config.resilience.circuit_failure_threshold, 5);
        assert_eq!(config.matrix.batch_size, 25);
        assert_eq!(config.matrix.max_concurrency, 4);
        assert_eq!(config.matrix.cache_ttl_seconds, 900);
        assert_eq!(config.scoring.fallback_speed_kmh, 50.0);
    }
}
