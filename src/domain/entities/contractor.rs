//! Contractor entity module
//!
//! A contractor is a workforce member with a base location, a weekly
//! working-hours schedule, normalized skill tags, an optional calendar of
//! holidays and overrides, a rating and a daily job cap.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::SchedulingError;
use crate::domain::value_objects::{ContractorCalendar, GeoLocation, WorkingHours};

/// A workforce member that jobs can be matched against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contractor {
    pub id: Uuid,
    pub name: String,
    /// Base location; its timezone field carries the resolved IANA zone
    pub base_location: GeoLocation,
    /// Resolved IANA timezone of the base location
    pub timezone: String,
    /// Weekly schedule; at least one entry
    pub working_hours: Vec<WorkingHours>,
    /// Normalized skill tags: trimmed, lower-cased, deduplicated
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<ContractorCalendar>,
    /// Rating in `[0, 100]`
    pub rating: f64,
    pub max_jobs_per_day: u32,
    /// Optimistic-concurrency row version, bumped by the repository
    #[serde(default)]
    pub version: u64,
}

impl Contractor {
    /// Creates a contractor, enforcing the aggregate invariants:
    /// a non-empty schedule, valid coordinates (checked by `GeoLocation`),
    /// a rating within `[0, 100]`, and skills normalized on write.
    pub fn new(
        name: String,
        base_location: GeoLocation,
        timezone: String,
        working_hours: Vec<WorkingHours>,
        skills: Vec<String>,
        rating: f64,
        max_jobs_per_day: u32,
    ) -> Result<Self, SchedulingError> {
        if working_hours.is_empty() {
            return Err(SchedulingError::InvalidArgument(
                "contractor requires at least one working-hours entry".into(),
            ));
        }
        if !(0.0..=100.0).contains(&rating) {
            return Err(SchedulingError::InvalidArgument(format!(
                "rating {} outside [0, 100]",
                rating
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            base_location,
            timezone,
            working_hours,
            skills: normalize_skills(&skills),
            calendar: None,
            rating,
            max_jobs_per_day,
            version: 0,
        })
    }

    pub fn with_calendar(mut self, calendar: ContractorCalendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Replaces the skill set, normalizing on write
    pub fn set_skills(&mut self, skills: &[String]) {
        self.skills = normalize_skills(skills);
    }

    /// Case-insensitive superset check against a required skill set
    pub fn has_all_skills(&self, required: &[String]) -> bool {
        normalize_skills(required)
            .iter()
            .all(|needed| self.skills.iter().any(|have| have == needed))
    }
}

/// Trims, lower-cases and deduplicates skill tags, dropping empties
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let tag = skill.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    fn weekday_hours() -> Vec<WorkingHours> {
        vec![WorkingHours::new(
            Weekday::Mon,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            "America/New_York".into(),
        )
        .unwrap()]
    }

    fn contractor(skills: Vec<String>) -> Contractor {
        Contractor::new(
            "Dana".into(),
            GeoLocation::new(40.7128, -74.0060).unwrap(),
            "America/New_York".into(),
            weekday_hours(),
            skills,
            80.0,
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_requires_working_hours() {
        let result = Contractor::new(
            "Dana".into(),
            GeoLocation::new(40.7128, -74.0060).unwrap(),
            "America/New_York".into(),
            vec![],
            vec![],
            80.0,
            3,
        );
        assert!(matches!(result, Err(SchedulingError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_rating_out_of_range() {
        let result = Contractor::new(
            "Dana".into(),
            GeoLocation::new(40.7128, -74.0060).unwrap(),
            "America/New_York".into(),
            weekday_hours(),
            vec![],
            100.5,
            3,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_skills_normalized_on_write() {
        let c = contractor(vec![
            "  HVAC ".into(),
            "hvac".into(),
            "Flooring".into(),
            "".into(),
        ]);
        assert_eq!(c.skills, vec!["hvac".to_string(), "flooring".to_string()]);
    }

    #[test]
    fn test_skill_check_is_case_insensitive() {
        let c = contractor(vec!["hvac".into(), "flooring".into()]);
        assert!(c.has_all_skills(&["HVAC".to_string()]));
        assert!(c.has_all_skills(&["Flooring".to_string(), "hvac".to_string()]));
        assert!(!c.has_all_skills(&["plumbing".to_string()]));
    }
}
