//! Fatigue Calculator service module
//!
//! Enforces the combined workload constraints on a proposed slot: the
//! absolute daily hard stop, the soft daily cap waived for rush jobs, and
//! the consecutive-jobs rule requiring a minimum break after a chain of
//! back-to-back assignments.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::application::config::FatigueConfig;
use crate::domain::entities::{Assignment, AssignmentStatus};
use crate::domain::error::SchedulingError;
use crate::domain::value_objects::{resolve_zone, DailyWindow, TimeWindow};

/// Outcome of a fatigue check
#[derive(Debug, Clone, PartialEq)]
pub struct FatigueAssessment {
    pub is_feasible: bool,
    /// Human-readable reason when infeasible
    pub reason: Option<String>,
    /// Break the contractor must take before the proposed start, minutes
    pub required_break_minutes: Option<i64>,
}

impl FatigueAssessment {
    fn feasible() -> Self {
        Self {
            is_feasible: true,
            reason: None,
            required_break_minutes: None,
        }
    }

    fn infeasible(reason: String) -> Self {
        Self {
            is_feasible: false,
            reason: Some(reason),
            required_break_minutes: None,
        }
    }
}

/// Checks proposed slots against daily-hours and consecutive-job limits
pub struct FatigueCalculator {
    config: FatigueConfig,
}

impl FatigueCalculator {
    pub fn new(config: FatigueConfig) -> Self {
        Self { config }
    }

    /// Assesses a proposed `[start, end)` slot.
    ///
    /// Daily totals are kept in contractor-local days, keyed by the local
    /// date each assignment starts on. Cancelled assignments never count;
    /// completed work still does.
    pub fn assess(
        &self,
        proposed: &TimeWindow,
        proposed_duration_minutes: i64,
        assignments: &[Assignment],
        contractor_zone: &str,
        is_rush: bool,
    ) -> Result<FatigueAssessment, SchedulingError> {
        let tz = resolve_zone(contractor_zone)?;

        let day_total = self.daily_total_minutes(
            proposed.start_utc(),
            proposed_duration_minutes,
            assignments,
            tz,
        );
        if day_total > self.config.hard_stop_minutes {
            return Ok(FatigueAssessment::infeasible(format!(
                "daily hard stop exceeded: {:.1}h of {:.0}h",
                day_total as f64 / 60.0,
                self.config.hard_stop_minutes as f64 / 60.0
            )));
        }
        if day_total > self.config.soft_cap_minutes && !is_rush {
            return Ok(FatigueAssessment::infeasible(format!(
                "daily soft cap exceeded: {:.1}h of {:.0}h",
                day_total as f64 / 60.0,
                self.config.soft_cap_minutes as f64 / 60.0
            )));
        }

        let chain = self.consecutive_chain_length(proposed.start_utc(), assignments);
        if chain > self.config.max_consecutive_jobs {
            return Ok(FatigueAssessment {
                is_feasible: false,
                reason: Some(format!(
                    "consecutive jobs limit exceeded: {} back-to-back without a break",
                    chain
                )),
                required_break_minutes: Some(self.config.min_break_minutes),
            });
        }

        Ok(FatigueAssessment::feasible())
    }

    /// Assesses a multi-day slot by checking each day's piece against that
    /// day's workload
    pub fn assess_span(
        &self,
        daily_windows: &[DailyWindow],
        assignments: &[Assignment],
        contractor_zone: &str,
        is_rush: bool,
    ) -> Result<FatigueAssessment, SchedulingError> {
        for piece in daily_windows {
            let assessment = self.assess(
                &piece.window,
                piece.window.duration_minutes(),
                assignments,
                contractor_zone,
                is_rush,
            )?;
            if !assessment.is_feasible {
                return Ok(assessment);
            }
        }
        Ok(FatigueAssessment::feasible())
    }

    /// Minutes already worked on the proposal's local start date plus the
    /// proposal itself
    fn daily_total_minutes(
        &self,
        proposed_start: DateTime<Utc>,
        proposed_duration_minutes: i64,
        assignments: &[Assignment],
        tz: Tz,
    ) -> i64 {
        let day = local_start_date(proposed_start, tz);
        let existing: i64 = assignments
            .iter()
            .filter(|a| a.status != AssignmentStatus::Cancelled)
            .filter(|a| local_start_date(a.window.start_utc(), tz) == day)
            .map(|a| a.window.duration_minutes())
            .sum();
        existing + proposed_duration_minutes
    }

    /// Length of the back-to-back chain ending at the proposed start,
    /// including the proposal itself.
    ///
    /// Walks backward: an assignment whose end is within
    /// `min_break_minutes` of the cursor extends the chain, and the walk
    /// continues from that assignment's start.
    fn consecutive_chain_length(
        &self,
        proposed_start: DateTime<Utc>,
        assignments: &[Assignment],
    ) -> usize {
        let mut active: Vec<&Assignment> = assignments
            .iter()
            .filter(|a| a.status != AssignmentStatus::Cancelled)
            .collect();
        active.sort_by_key(|a| std::cmp::Reverse(a.window.end_utc()));

        let mut chain = 1;
        let mut cursor = proposed_start;
        loop {
            let previous = active.iter().find(|a| {
                let gap = (cursor - a.window.end_utc()).num_minutes();
                (0..self.config.min_break_minutes).contains(&gap)
            });
            match previous {
                Some(a) => {
                    chain += 1;
                    cursor = a.window.start_utc();
                }
                None => break,
            }
        }
        chain
    }
}

fn local_start_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

impl Default for FatigueCalculator {
    fn default() -> Self {
        Self::new(FatigueConfig::default())
    }
}
