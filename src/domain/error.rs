//! Scheduling error taxonomy
//!
//! All domain and application operations report failures through the
//! `SchedulingError` enum so callers can branch on the failure kind
//! instead of parsing message strings.

use thiserror::Error;
use uuid::Uuid;

/// Typed failures surfaced by the scheduling core
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// A referenced aggregate does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input: bad time window, negative duration, unknown zone
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// State-machine violation, e.g. cancelling a completed job
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The availability engine or fatigue calculator rejected the slot
    #[error("not available: {0}")]
    NotAvailable(String),

    /// Direct overlap with an existing assignment
    #[error("conflicting assignment: {conflicting_assignment_id}")]
    ConflictingAssignment { conflicting_assignment_id: Uuid },

    /// Weights or system configuration out of range at load time
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// External service circuit-open or retries exhausted
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Optimistic-concurrency lost update at the repository layer
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),
}

impl SchedulingError {
    /// Returns the conflicting assignment ID when this is a conflict error
    pub fn conflicting_assignment(&self) -> Option<Uuid> {
        match self {
            SchedulingError::ConflictingAssignment {
                conflicting_assignment_id,
            } => Some(*conflicting_assignment_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_assignment_accessor() {
        let id = Uuid::new_v4();
        let err = SchedulingError::ConflictingAssignment {
            conflicting_assignment_id: id,
        };
        assert_eq!(err.conflicting_assignment(), Some(id));
        assert!(SchedulingError::NotFound("job".into())
            .conflicting_assignment()
            .is_none());
    }

    #[test]
    fn test_display_includes_reason() {
        let err = SchedulingError::NotAvailable("daily hard stop exceeded".into());
        assert!(err.to_string().contains("hard stop"));
    }
}
