//! Working hours and contractor calendar value objects
//!
//! A contractor's weekly schedule is a set of `WorkingHours` entries, one
//! or more per weekday, each expressed as local wall-clock times in an
//! IANA zone. `ContractorCalendar` layers date-specific holidays and
//! overrides on top of the weekly pattern.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::error::SchedulingError;

/// One weekly working-hours entry in contractor-local time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub day_of_week: Weekday,
    pub start_local: NaiveTime,
    pub end_local: NaiveTime,
    /// IANA zone the local times are expressed in
    pub iana_zone: String,
}

impl WorkingHours {
    /// Creates an entry, failing when `start >= end`.
    ///
    /// Entries that wrap past midnight are modelled with
    /// [`WorkingHours::overnight`] instead, which permits `end <= start`.
    pub fn new(
        day_of_week: Weekday,
        start_local: NaiveTime,
        end_local: NaiveTime,
        iana_zone: String,
    ) -> Result<Self, SchedulingError> {
        if start_local >= end_local {
            return Err(SchedulingError::InvalidArgument(format!(
                "working hours start {} is not before end {}",
                start_local, end_local
            )));
        }
        Ok(Self {
            day_of_week,
            start_local,
            end_local,
            iana_zone,
        })
    }

    /// Creates an entry whose end wraps past midnight into the next day
    pub fn overnight(
        day_of_week: Weekday,
        start_local: NaiveTime,
        end_local: NaiveTime,
        iana_zone: String,
    ) -> Self {
        Self {
            day_of_week,
            start_local,
            end_local,
            iana_zone,
        }
    }

    /// Whether this entry spills into the following day
    pub fn wraps_past_midnight(&self) -> bool {
        self.end_local <= self.start_local
    }
}

/// Kind of a calendar exception
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CalendarExceptionKind {
    /// The whole date is skipped
    Holiday,
    /// The date uses the attached hours instead of the weekly pattern
    Override,
}

/// A date-specific deviation from the weekly schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarException {
    pub date: NaiveDate,
    pub kind: CalendarExceptionKind,
    /// Present only for `Override` exceptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_hours: Option<WorkingHours>,
}

impl CalendarException {
    /// A full-day holiday; never carries hours
    pub fn holiday(date: NaiveDate) -> Self {
        Self {
            date,
            kind: CalendarExceptionKind::Holiday,
            override_hours: None,
        }
    }

    /// A one-off schedule replacing the weekly entries for `date`
    pub fn override_hours(date: NaiveDate, hours: WorkingHours) -> Self {
        Self {
            date,
            kind: CalendarExceptionKind::Override,
            override_hours: Some(hours),
        }
    }
}

/// Holidays and per-date overrides layered over a weekly schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractorCalendar {
    pub holidays: Vec<NaiveDate>,
    pub exceptions: Vec<CalendarException>,
    /// Minimum daily break the contractor takes, minutes
    #[serde(default = "default_daily_break_minutes")]
    pub daily_break_minutes: i64,
}

fn default_daily_break_minutes() -> i64 {
    30
}

impl ContractorCalendar {
    pub fn new() -> Self {
        Self {
            holidays: Vec::new(),
            exceptions: Vec::new(),
            daily_break_minutes: default_daily_break_minutes(),
        }
    }

    /// Whether the date is skipped entirely (holiday list or Holiday
    /// exception; a Holiday exception never carries hours)
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
            || self
                .exceptions
                .iter()
                .any(|e| e.date == date && e.kind == CalendarExceptionKind::Holiday)
    }

    /// The override hours for `date`, when an Override exception exists
    pub fn override_for(&self, date: NaiveDate) -> Option<&WorkingHours> {
        self.exceptions
            .iter()
            .find(|e| e.date == date && e.kind == CalendarExceptionKind::Override)
            .and_then(|e| e.override_hours.as_ref())
    }
}
