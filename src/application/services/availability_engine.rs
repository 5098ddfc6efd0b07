//! Availability Engine service module
//!
//! Expands a contractor's weekly working hours across a service window in
//! contractor-local time, applies calendar exceptions, subtracts the
//! blocking windows of existing bookings and yields the usable sub-windows
//! in UTC.

use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::debug;

use crate::domain::error::SchedulingError;
use crate::domain::value_objects::{
    local_to_utc, merge_windows, resolve_zone, ContractorCalendar, TimeWindow, WorkingHours,
};

/// Pure availability calculation; no I/O, deterministic for a given input
pub struct AvailabilityEngine;

impl AvailabilityEngine {
    pub fn new() -> Self {
        Self
    }

    /// Enumerates the usable sub-windows of `service_window`.
    ///
    /// The result is ordered ascending by start, pairwise disjoint, and
    /// every window is at least `min_minutes` long.
    ///
    /// Walks each contractor-local calendar date in the span: holidays are
    /// skipped, an `Override` exception replaces the weekly entries for
    /// its date, weekly entries materialize on their weekday (entries
    /// whose end is at or before their start wrap past midnight). The
    /// per-day pieces are clipped to the service window, unioned, and the
    /// blocking windows are subtracted by splitting around each overlap;
    /// windows that merely touch a blocker are left intact.
    #[allow(clippy::too_many_arguments)]
    pub fn available(
        &self,
        working_hours: &[WorkingHours],
        service_window: &TimeWindow,
        blocking: &[TimeWindow],
        min_minutes: i64,
        contractor_zone: &str,
        job_zone: &str,
        calendar: Option<&ContractorCalendar>,
    ) -> Result<Vec<TimeWindow>, SchedulingError> {
        let contractor_tz = resolve_zone(contractor_zone)?;
        // the job zone is part of the contract; reject unknown zones at
        // the boundary even though expansion runs in the contractor zone
        resolve_zone(job_zone)?;

        let local_start = service_window
            .start_utc()
            .with_timezone(&contractor_tz)
            .date_naive();
        let local_end = (service_window.end_utc() - Duration::minutes(1))
            .with_timezone(&contractor_tz)
            .date_naive();
        // start one day early so overnight entries spilling into the
        // window are not missed
        let mut date = local_start.pred_opt().unwrap_or(local_start);

        let mut pieces: Vec<TimeWindow> = Vec::new();
        while date <= local_end {
            self.collect_day(
                &mut pieces,
                date,
                working_hours,
                service_window,
                contractor_tz,
                calendar,
            )?;
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        let mut available = merge_windows(pieces);
        for blocker in blocking {
            available = available
                .into_iter()
                .flat_map(|window| window.subtract(blocker))
                .collect();
        }

        available.retain(|window| window.duration_minutes() >= min_minutes);
        available.sort_by_key(|window| window.start_utc());

        debug!(
            windows = available.len(),
            min_minutes, "availability computed"
        );
        Ok(available)
    }

    /// Collects the clipped working windows of one local date
    fn collect_day(
        &self,
        pieces: &mut Vec<TimeWindow>,
        date: NaiveDate,
        working_hours: &[WorkingHours],
        service_window: &TimeWindow,
        contractor_tz: Tz,
        calendar: Option<&ContractorCalendar>,
    ) -> Result<(), SchedulingError> {
        if let Some(calendar) = calendar {
            if calendar.is_holiday(date) {
                return Ok(());
            }
        }

        let override_entry = calendar.and_then(|c| c.override_for(date));
        let entries: Vec<&WorkingHours> = match override_entry {
            Some(hours) => vec![hours],
            None => working_hours
                .iter()
                .filter(|entry| entry.day_of_week == date.weekday())
                .collect(),
        };

        for entry in entries {
            let tz = if entry.iana_zone.is_empty() {
                contractor_tz
            } else {
                resolve_zone(&entry.iana_zone)?
            };

            let start_local = date.and_time(entry.start_local);
            let end_date = if entry.wraps_past_midnight() {
                match date.succ_opt() {
                    Some(next) => next,
                    None => continue,
                }
            } else {
                date
            };
            let end_local = end_date.and_time(entry.end_local);

            // local times skipped by a DST transition yield no instant
            let (Some(start_utc), Some(end_utc)) =
                (local_to_utc(start_local, tz), local_to_utc(end_local, tz))
            else {
                continue;
            };
            if start_utc >= end_utc {
                continue;
            }
            let window = TimeWindow::new(start_utc, end_utc)?;
            if let Some(clipped) = window.intersect(service_window) {
                pieces.push(clipped);
            }
        }
        Ok(())
    }
}

impl Default for AvailabilityEngine {
    fn default() -> Self {
        Self::new()
    }
}
