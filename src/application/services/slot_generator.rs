//! Slot Generator service module
//!
//! Turns the availability engine's sub-windows into up to three labeled
//! offers: the earliest feasible start, the window with the lowest travel
//! ETA, and the window with the highest confidence score. When the job
//! does not fit in a single workday, a split across two or three
//! consecutive working days is attempted instead.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use tracing::debug;

use crate::application::config::BufferConfig;
use crate::application::services::availability_engine::AvailabilityEngine;
use crate::application::services::fatigue_calculator::FatigueCalculator;
use crate::application::services::travel_buffer::TravelBufferService;
use crate::domain::entities::Assignment;
use crate::domain::error::SchedulingError;
use crate::domain::value_objects::{
    local_to_utc, resolve_zone, round_up_to_quarter_hour, ContractorCalendar, DailyWindow,
    GeneratedSlot, SlotType, TimeWindow, WorkingHours,
};

/// Everything the generator needs to know about one candidate pairing
pub struct SlotRequest<'a> {
    pub working_hours: &'a [WorkingHours],
    pub service_window: &'a TimeWindow,
    pub assignments: &'a [Assignment],
    pub job_duration_minutes: i64,
    pub contractor_zone: &'a str,
    pub job_zone: &'a str,
    pub calendar: Option<&'a ContractorCalendar>,
    /// ETA from the contractor's base to the job site, minutes
    pub base_eta_minutes: Option<f64>,
    /// ETA from the previous job to this job site, minutes
    pub prev_eta_minutes: Option<f64>,
    /// Contractor rating; 50 when unknown
    pub rating: f64,
    pub is_rush: bool,
}

/// Produces up to three labeled slot offers per contractor
pub struct SlotGenerator {
    availability: AvailabilityEngine,
    buffer: TravelBufferService,
    fatigue: FatigueCalculator,
    buffer_config: BufferConfig,
}

impl SlotGenerator {
    pub fn new(
        availability: AvailabilityEngine,
        buffer: TravelBufferService,
        fatigue: FatigueCalculator,
        buffer_config: BufferConfig,
    ) -> Self {
        Self {
            availability,
            buffer,
            fatigue,
            buffer_config,
        }
    }

    /// Generates up to three slots, deduplicated by `(start, type)`.
    ///
    /// When no single-day window can hold the job, a 2- then 3-day split
    /// is attempted and at most one multi-day slot is returned. Every
    /// candidate passes the fatigue check; infeasible ones are dropped.
    pub fn generate(&self, req: &SlotRequest<'_>) -> Result<Vec<GeneratedSlot>, SchedulingError> {
        let tz = resolve_zone(req.contractor_zone)?;
        let (buffer_minutes, known_eta) = self.estimate_buffer(req)?;
        let min_minutes =
            buffer_minutes + req.job_duration_minutes + self.buffer_config.rounding_pad_minutes;

        let blocking: Vec<TimeWindow> = req
            .assignments
            .iter()
            .filter(|a| a.status.blocks_schedule())
            .map(|a| a.window)
            .collect();

        let windows = self.availability.available(
            req.working_hours,
            req.service_window,
            &blocking,
            min_minutes,
            req.contractor_zone,
            req.job_zone,
            req.calendar,
        )?;

        if windows.is_empty() {
            debug!("no single-day window fits, attempting multi-day split");
            return self.multi_day_split(req, &blocking, known_eta, tz);
        }

        let mut slots: Vec<GeneratedSlot> = Vec::with_capacity(3);
        let mut seen: HashSet<(DateTime<Utc>, SlotType)> = HashSet::new();

        // earliest feasible start
        if let Some(slot) =
            self.slot_in_window(&windows[0], req, buffer_minutes, known_eta, SlotType::Earliest, tz)?
        {
            self.push_deduped(&mut slots, &mut seen, slot);
        }

        // lowest applicable travel ETA, earliest start on ties
        let lowest_travel = windows.iter().min_by(|a, b| {
            let eta_a = self.applicable_eta(a, req, tz).unwrap_or(f64::INFINITY);
            let eta_b = self.applicable_eta(b, req, tz).unwrap_or(f64::INFINITY);
            eta_a
                .partial_cmp(&eta_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.start_utc().cmp(&b.start_utc()))
        });
        if let Some(window) = lowest_travel {
            if let Some(slot) = self.slot_in_window(
                window,
                req,
                buffer_minutes,
                known_eta,
                SlotType::LowestTravel,
                tz,
            )? {
                self.push_deduped(&mut slots, &mut seen, slot);
            }
        }

        // highest confidence
        let highest_confidence = windows.iter().max_by(|a, b| {
            let conf_a = self.window_confidence(a, req, tz);
            let conf_b = self.window_confidence(b, req, tz);
            conf_a
                .partial_cmp(&conf_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.start_utc().cmp(&a.start_utc()))
        });
        if let Some(window) = highest_confidence {
            if let Some(slot) = self.slot_in_window(
                window,
                req,
                buffer_minutes,
                known_eta,
                SlotType::HighestConfidence,
                tz,
            )? {
                self.push_deduped(&mut slots, &mut seen, slot);
            }
        }

        Ok(slots)
    }

    /// Buffer size and whether a real ETA estimate backs it.
    ///
    /// Prefers the base→first leg, then the job→job leg, then the
    /// configured default. The default widens the minimum-window
    /// requirement but does not push the slot start.
    fn estimate_buffer(
        &self,
        req: &SlotRequest<'_>,
    ) -> Result<(i64, Option<f64>), SchedulingError> {
        if let Some(eta) = req.base_eta_minutes {
            Ok((self.buffer.base_to_first(eta, None)?, Some(eta)))
        } else if let Some(eta) = req.prev_eta_minutes {
            Ok((self.buffer.between_jobs(eta, None)?, Some(eta)))
        } else {
            Ok((self.buffer.default_buffer(), None))
        }
    }

    /// Materializes a concrete slot inside an availability window,
    /// dropping it when the fatigue check fails
    fn slot_in_window(
        &self,
        window: &TimeWindow,
        req: &SlotRequest<'_>,
        buffer_minutes: i64,
        known_eta: Option<f64>,
        slot_type: SlotType,
        tz: Tz,
    ) -> Result<Option<GeneratedSlot>, SchedulingError> {
        let raw_start = if known_eta.is_some() {
            window.start_utc() + Duration::minutes(buffer_minutes)
        } else {
            window.start_utc()
        };
        let start = round_up_to_quarter_hour(raw_start);
        let end = start + Duration::minutes(req.job_duration_minutes);
        if end > window.end_utc() {
            return Ok(None);
        }
        let slot_window = TimeWindow::new(start, end)?;

        let assessment = self.fatigue.assess(
            &slot_window,
            req.job_duration_minutes,
            req.assignments,
            req.contractor_zone,
            req.is_rush,
        )?;
        if !assessment.is_feasible {
            debug!(reason = ?assessment.reason, "slot dropped by fatigue check");
            return Ok(None);
        }

        let confidence = confidence_score(
            window.duration_minutes(),
            self.applicable_eta(window, req, tz).unwrap_or(0.0),
            req.rating,
        );
        let date = start.with_timezone(&tz).date_naive();
        Ok(Some(GeneratedSlot::single_day(
            slot_window,
            date,
            slot_type,
            confidence,
        )))
    }

    fn push_deduped(
        &self,
        slots: &mut Vec<GeneratedSlot>,
        seen: &mut HashSet<(DateTime<Utc>, SlotType)>,
        slot: GeneratedSlot,
    ) {
        if seen.insert((slot.overall_window.start_utc(), slot.slot_type)) {
            slots.push(slot);
        }
    }

    /// The travel leg that applies to a window: job→job when a booking
    /// earlier the same local day precedes it, base→first otherwise
    fn applicable_eta(&self, window: &TimeWindow, req: &SlotRequest<'_>, tz: Tz) -> Option<f64> {
        let day = window.start_utc().with_timezone(&tz).date_naive();
        let preceded_same_day = req
            .assignments
            .iter()
            .filter(|a| a.status.blocks_schedule())
            .any(|a| {
                a.window.end_utc() <= window.start_utc()
                    && a.window.end_utc().with_timezone(&tz).date_naive() == day
            });
        if preceded_same_day {
            req.prev_eta_minutes
        } else {
            req.base_eta_minutes
        }
    }

    fn window_confidence(&self, window: &TimeWindow, req: &SlotRequest<'_>, tz: Tz) -> f64 {
        confidence_score(
            window.duration_minutes(),
            self.applicable_eta(window, req, tz).unwrap_or(0.0),
            req.rating,
        )
    }

    /// Attempts 2- then 3-day splits over runs of consecutive working
    /// dates, yielding at most one multi-day slot
    fn multi_day_split(
        &self,
        req: &SlotRequest<'_>,
        blocking: &[TimeWindow],
        known_eta: Option<f64>,
        tz: Tz,
    ) -> Result<Vec<GeneratedSlot>, SchedulingError> {
        let dates = self.working_dates(req, tz);
        for span in 2..=3usize {
            for run in consecutive_runs(&dates) {
                for offset in 0..run.len().saturating_sub(span - 1) {
                    let candidate = &run[offset..offset + span];
                    if let Some(slot) =
                        self.try_split(req, candidate, blocking, known_eta, tz)?
                    {
                        return Ok(vec![slot]);
                    }
                }
            }
        }
        Ok(Vec::new())
    }

    /// Local dates inside the service window that have working hours
    fn working_dates(&self, req: &SlotRequest<'_>, tz: Tz) -> Vec<NaiveDate> {
        let first = req.service_window.start_utc().with_timezone(&tz).date_naive();
        let last = (req.service_window.end_utc() - Duration::minutes(1))
            .with_timezone(&tz)
            .date_naive();

        let mut dates = Vec::new();
        let mut date = first;
        while date <= last {
            let is_holiday = req
                .calendar
                .map(|c| c.is_holiday(date))
                .unwrap_or(false);
            let has_hours = req
                .calendar
                .and_then(|c| c.override_for(date))
                .is_some()
                || req
                    .working_hours
                    .iter()
                    .any(|entry| entry.day_of_week == date.weekday());
            if !is_holiday && has_hours {
                dates.push(date);
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        dates
    }

    /// Splits the duration evenly across the candidate dates (the last
    /// day takes the remainder); every piece must start at the local
    /// working start, fit its day, stay inside the service window and
    /// avoid existing bookings
    fn try_split(
        &self,
        req: &SlotRequest<'_>,
        dates: &[NaiveDate],
        blocking: &[TimeWindow],
        known_eta: Option<f64>,
        tz: Tz,
    ) -> Result<Option<GeneratedSlot>, SchedulingError> {
        let span = dates.len() as i64;
        let per_day = req.job_duration_minutes / span;
        if per_day == 0 {
            return Ok(None);
        }

        let mut pieces: Vec<DailyWindow> = Vec::with_capacity(dates.len());
        for (index, date) in dates.iter().enumerate() {
            let piece_minutes = if index == dates.len() - 1 {
                req.job_duration_minutes - per_day * (span - 1)
            } else {
                per_day
            };
            match self.day_piece(req, *date, piece_minutes, blocking, tz)? {
                Some(piece) => pieces.push(piece),
                None => return Ok(None),
            }
        }

        let assessment =
            self.fatigue
                .assess_span(&pieces, req.assignments, req.contractor_zone, req.is_rush)?;
        if !assessment.is_feasible {
            debug!(reason = ?assessment.reason, "multi-day split dropped by fatigue check");
            return Ok(None);
        }

        let overall = TimeWindow::new(
            pieces[0].window.start_utc(),
            pieces[pieces.len() - 1].window.end_utc(),
        )?;
        let confidence = confidence_score(
            req.job_duration_minutes,
            known_eta.unwrap_or(0.0),
            req.rating,
        );
        Ok(Some(GeneratedSlot::multi_day(
            overall,
            pieces,
            SlotType::Earliest,
            confidence,
        )))
    }

    /// One day's piece of a multi-day split, or `None` when no entry on
    /// that date can hold it
    fn day_piece(
        &self,
        req: &SlotRequest<'_>,
        date: NaiveDate,
        piece_minutes: i64,
        blocking: &[TimeWindow],
        tz: Tz,
    ) -> Result<Option<DailyWindow>, SchedulingError> {
        let override_entry = req.calendar.and_then(|c| c.override_for(date));
        let mut entries: Vec<&WorkingHours> = match override_entry {
            Some(hours) => vec![hours],
            None => req
                .working_hours
                .iter()
                .filter(|entry| entry.day_of_week == date.weekday())
                .collect(),
        };
        entries.sort_by_key(|entry| entry.start_local);

        for entry in entries {
            let entry_tz = if entry.iana_zone.is_empty() {
                tz
            } else {
                resolve_zone(&entry.iana_zone)?
            };
            let Some(entry_start) = local_to_utc(date.and_time(entry.start_local), entry_tz)
            else {
                continue;
            };
            let end_date = if entry.wraps_past_midnight() {
                match date.succ_opt() {
                    Some(next) => next,
                    None => continue,
                }
            } else {
                date
            };
            let Some(entry_end) = local_to_utc(end_date.and_time(entry.end_local), entry_tz)
            else {
                continue;
            };

            let start = round_up_to_quarter_hour(entry_start);
            let end = start + Duration::minutes(piece_minutes);
            if end > entry_end {
                continue;
            }
            let window = TimeWindow::new(start, end)?;
            if !req.service_window.covers(&window) {
                continue;
            }
            if blocking.iter().any(|b| b.overlaps(&window)) {
                continue;
            }
            return Ok(Some(DailyWindow { date, window }));
        }
        Ok(None)
    }
}

/// `clamp(50 + 0.2·min(100, minutes/10) + 0.2·max(0, 100 − eta/2)
/// + 0.6·rating, 0, 100)`
fn confidence_score(window_minutes: i64, eta_minutes: f64, rating: f64) -> f64 {
    let width = (window_minutes as f64 / 10.0).min(100.0);
    let travel = (100.0 - eta_minutes / 2.0).max(0.0);
    (50.0 + 0.2 * width + 0.2 * travel + 0.6 * rating).clamp(0.0, 100.0)
}

/// Splits an ascending date list into runs of consecutive days
fn consecutive_runs(dates: &[NaiveDate]) -> Vec<Vec<NaiveDate>> {
    let mut runs: Vec<Vec<NaiveDate>> = Vec::new();
    for &date in dates {
        match runs.last_mut() {
            Some(run) if run.last().and_then(|d| d.succ_opt()) == Some(date) => run.push(date),
            _ => runs.push(vec![date]),
        }
    }
    runs
}
