//! Timezone resolution and local/UTC conversion helpers
//!
//! The domain accepts IANA identifiers exclusively; any platform-specific
//! zone naming is translated before it reaches this boundary. DST gaps
//! (spring-forward local times that do not exist) resolve to no instant,
//! and ambiguous fall-back times resolve to the earlier offset.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::domain::error::SchedulingError;

/// Parses an IANA timezone identifier, e.g. `America/New_York`
pub fn resolve_zone(identifier: &str) -> Result<Tz, SchedulingError> {
    identifier.parse::<Tz>().map_err(|_| {
        SchedulingError::InvalidArgument(format!("unknown timezone: {identifier}"))
    })
}

/// Converts a naive local datetime in `zone` to UTC.
///
/// Returns `None` for local times skipped by a DST transition; ambiguous
/// times map to the earliest valid instant.
pub fn local_to_utc(local: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Converts a UTC instant to the wall clock of `zone`
pub fn utc_to_local(instant: DateTime<Utc>, zone: Tz) -> DateTime<Tz> {
    instant.with_timezone(&zone)
}
