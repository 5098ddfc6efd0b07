//! Event log entity module
//!
//! Append-only record of every outbound realtime event: what was
//! published, when, and to which subscriber groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One published realtime event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventLogEntry {
    pub id: Uuid,
    /// The event's `type` discriminator, e.g. `JobAssigned`
    pub event_type: String,
    /// Serialized payload exactly as broadcast
    pub payload_json: String,
    pub published_at_utc: DateTime<Utc>,
    /// Every group the event was delivered to, each listed once
    pub published_to: Vec<String>,
}

impl EventLogEntry {
    pub fn new(
        event_type: String,
        payload_json: String,
        published_at_utc: DateTime<Utc>,
        published_to: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            payload_json,
            published_at_utc,
            published_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_keeps_groups() {
        let entry = EventLogEntry::new(
            "JobAssigned".into(),
            "{}".into(),
            Utc::now(),
            vec!["dispatch/west".into(), "contractor/abc".into()],
        );
        assert_eq!(entry.published_to.len(), 2);
        assert_eq!(entry.event_type, "JobAssigned");
    }
}
