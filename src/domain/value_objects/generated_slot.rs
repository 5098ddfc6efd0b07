//! Generated slot value object module
//!
//! A `GeneratedSlot` is one concrete offer produced by the slot generator:
//! an overall window, the per-day pieces the work occupies, a label saying
//! why this slot was picked, and a confidence score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::time_window::TimeWindow;

/// Why a slot was selected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotType {
    /// Soonest feasible start
    Earliest,
    /// Minimizes the applicable travel ETA
    LowestTravel,
    /// Maximizes the confidence score
    HighestConfidence,
}

/// One day's portion of a slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyWindow {
    /// Contractor-local calendar date of this piece
    pub date: NaiveDate,
    pub window: TimeWindow,
}

/// A concrete schedulable offer.
///
/// Every slot carries at least one daily window; single-day slots carry
/// exactly one covering the whole offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSlot {
    pub overall_window: TimeWindow,
    pub daily_windows: Vec<DailyWindow>,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    /// Confidence in `[0, 100]`
    pub confidence: f64,
}

impl GeneratedSlot {
    /// A slot whose work fits inside a single day
    pub fn single_day(window: TimeWindow, date: NaiveDate, slot_type: SlotType, confidence: f64) -> Self {
        Self {
            overall_window: window,
            daily_windows: vec![DailyWindow { date, window }],
            slot_type,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    /// A slot split across consecutive days
    pub fn multi_day(
        overall_window: TimeWindow,
        daily_windows: Vec<DailyWindow>,
        slot_type: SlotType,
        confidence: f64,
    ) -> Self {
        debug_assert!(!daily_windows.is_empty());
        Self {
            overall_window,
            daily_windows,
            slot_type,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    /// Total worked minutes across all daily windows
    pub fn worked_minutes(&self) -> i64 {
        self.daily_windows
            .iter()
            .map(|d| d.window.duration_minutes())
            .sum()
    }

    pub fn is_multi_day(&self) -> bool {
        self.daily_windows.len() > 1
    }
}
