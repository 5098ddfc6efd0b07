//! Value objects for the scheduling domain

pub mod generated_slot;
pub mod geo_location;
pub mod time_window;
pub mod working_hours;
pub mod zone;

pub use generated_slot::{DailyWindow, GeneratedSlot, SlotType};
pub use geo_location::{haversine_meters, GeoLocation};
pub use time_window::{merge_windows, round_up_to_quarter_hour, TimeWindow};
pub use working_hours::{
    CalendarException, CalendarExceptionKind, ContractorCalendar, WorkingHours,
};
pub use zone::{local_to_utc, resolve_zone, utc_to_local};
