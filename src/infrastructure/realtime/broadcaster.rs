//! Broadcaster implementations
//!
//! The transport itself (SignalR-equivalent) lives outside the core; the
//! implementations here serve structured logging, tests and the CLI demo.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::collaborators::Broadcaster;
use crate::domain::error::SchedulingError;

/// Emits every broadcast as a structured log line
#[derive(Default)]
pub struct TracingBroadcaster;

impl TracingBroadcaster {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Broadcaster for TracingBroadcaster {
    async fn broadcast(
        &self,
        group: &str,
        event_name: &str,
        payload: &str,
    ) -> Result<(), SchedulingError> {
        info!(group, event = event_name, payload, "broadcast");
        Ok(())
    }
}

/// One delivered message, recorded for assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRecord {
    pub group: String,
    pub event_name: String,
    pub payload: String,
}

/// Records every broadcast; individual groups can be made to fail to
/// exercise partial-delivery paths
#[derive(Default)]
pub struct RecordingBroadcaster {
    sent: RwLock<Vec<BroadcastRecord>>,
    failing_groups: RwLock<HashSet<String>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_group(&self, group: &str) {
        self.failing_groups.write().await.insert(group.to_string());
    }

    pub async fn sent(&self) -> Vec<BroadcastRecord> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn broadcast(
        &self,
        group: &str,
        event_name: &str,
        payload: &str,
    ) -> Result<(), SchedulingError> {
        if self.failing_groups.read().await.contains(group) {
            return Err(SchedulingError::UpstreamUnavailable(format!(
                "group {group} unreachable"
            )));
        }
        self.sent.write().await.push(BroadcastRecord {
            group: group.to_string(),
            event_name: event_name.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_broadcaster_captures_messages() {
        let broadcaster = RecordingBroadcaster::new();
        broadcaster
            .broadcast("dispatch/west", "JobAssigned", "{}")
            .await
            .unwrap();
        let sent = broadcaster.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].group, "dispatch/west");
    }

    #[tokio::test]
    async fn test_failing_group_errors() {
        let broadcaster = RecordingBroadcaster::new();
        broadcaster.fail_group("contractor/x").await;
        let result = broadcaster.broadcast("contractor/x", "JobAssigned", "{}").await;
        assert!(result.is_err());
        assert!(broadcaster.sent().await.is_empty());
    }
}
