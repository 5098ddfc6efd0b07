//! Time Window value object module
//!
//! A `TimeWindow` is a half-open UTC interval `[start, end)`. All interval
//! arithmetic in the scheduling core (overlap detection, clipping against
//! service windows, subtracting bookings) goes through this type so the
//! half-open convention is applied consistently: windows that merely touch
//! (`[a,b)` and `[b,c)`) do not overlap.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::SchedulingError;

/// A half-open UTC time interval `[start_utc, end_utc)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new window, failing when `start >= end`
    pub fn new(start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> Result<Self, SchedulingError> {
        if start_utc >= end_utc {
            return Err(SchedulingError::InvalidArgument(format!(
                "invalid range: start {} is not before end {}",
                start_utc, end_utc
            )));
        }
        Ok(Self { start_utc, end_utc })
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start_utc
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end_utc
    }

    /// Window length in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end_utc - self.start_utc).num_minutes()
    }

    /// Half-open overlap test; adjacent windows do not overlap
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start_utc < other.end_utc && self.end_utc > other.start_utc
    }

    /// Whether the instant falls inside the window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_utc && instant < self.end_utc
    }

    /// Whether `other` lies entirely inside this window
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start_utc <= other.start_utc && other.end_utc <= self.end_utc
    }

    /// Intersection of two windows, if non-empty
    pub fn intersect(&self, other: &TimeWindow) -> Option<TimeWindow> {
        let start = self.start_utc.max(other.start_utc);
        let end = self.end_utc.min(other.end_utc);
        if start < end {
            Some(TimeWindow {
                start_utc: start,
                end_utc: end,
            })
        } else {
            None
        }
    }

    /// Removes `other` from this window, splitting around the overlap.
    ///
    /// Returns zero, one or two remaining pieces. A window that only
    /// touches `other` at an endpoint is returned unchanged.
    pub fn subtract(&self, other: &TimeWindow) -> Vec<TimeWindow> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if self.start_utc < other.start_utc {
            pieces.push(TimeWindow {
                start_utc: self.start_utc,
                end_utc: other.start_utc,
            });
        }
        if other.end_utc < self.end_utc {
            pieces.push(TimeWindow {
                start_utc: other.end_utc,
                end_utc: self.end_utc,
            });
        }
        pieces
    }

    /// Shifts the start forward, keeping the end fixed
    pub fn with_start(&self, start_utc: DateTime<Utc>) -> Result<TimeWindow, SchedulingError> {
        TimeWindow::new(start_utc, self.end_utc)
    }

    /// Gap in minutes between the end of `earlier` and the start of this
    /// window; negative when the two overlap.
    pub fn gap_after_minutes(&self, earlier: &TimeWindow) -> i64 {
        (self.start_utc - earlier.end_utc).num_minutes()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {})", self.start_utc, self.end_utc)
    }
}

/// Merges overlapping and adjacent windows into a disjoint ascending list
pub fn merge_windows(mut windows: Vec<TimeWindow>) -> Vec<TimeWindow> {
    if windows.is_empty() {
        return windows;
    }
    windows.sort_by_key(|w| w.start_utc);
    let mut merged: Vec<TimeWindow> = vec![windows[0]];
    for window in windows.into_iter().skip(1) {
        let last = merged.last_mut().expect("merged is never empty");
        if window.start_utc <= last.end_utc {
            last.end_utc = last.end_utc.max(window.end_utc);
        } else {
            merged.push(window);
        }
    }
    merged
}

/// Rounds an instant forward to the next quarter-hour boundary.
///
/// Instants already on a boundary are returned unchanged; sub-minute
/// precision is dropped first since all scheduling arithmetic is
/// minute-precise.
pub fn round_up_to_quarter_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    match instant.duration_trunc(Duration::minutes(15)) {
        Ok(floor) if floor == instant => instant,
        Ok(floor) => floor + Duration::minutes(15),
        Err(_) => instant,
    }
}
