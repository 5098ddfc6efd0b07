//! External collaborator contracts
//!
//! Narrow traits for the services the core consumes but does not own:
//! routing/distance providers, the ETA matrix, timezone lookup, address
//! validation and the realtime broadcast sink. Infrastructure supplies
//! resilient implementations with fallbacks; results that came from a
//! fallback are flagged `degraded`.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::error::SchedulingError;
use crate::domain::value_objects::GeoLocation;

/// Where a distance/ETA figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// The primary routing provider
    Primary,
    /// Great-circle fallback
    Haversine,
}

/// A distance lookup result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceResult {
    pub meters: Option<f64>,
    /// True when the primary provider failed and a fallback was used
    pub degraded: bool,
    pub source: RouteSource,
}

/// A travel-time lookup result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtaResult {
    pub minutes: Option<f64>,
    pub degraded: bool,
    pub source: RouteSource,
}

/// Distance and travel-time estimation between coordinate pairs
#[async_trait]
pub trait DistanceCalc: Send + Sync {
    async fn distance(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> DistanceResult;

    async fn eta(&self, from_lat: f64, from_lng: f64, to_lat: f64, to_lng: f64) -> EtaResult;
}

/// Batched many-to-many travel-time lookups
#[async_trait]
pub trait EtaMatrix: Send + Sync {
    /// ETA minutes for every `(origin index, destination index)` pair the
    /// backend could resolve
    async fn etas(
        &self,
        origins: &[(f64, f64)],
        destinations: &[(f64, f64)],
    ) -> Result<HashMap<(usize, usize), f64>, SchedulingError>;
}

/// IANA timezone lookup for a coordinate
#[async_trait]
pub trait TimezoneService: Send + Sync {
    async fn get_timezone(&self, lat: f64, lng: f64) -> Result<String, SchedulingError>;
}

/// Address validation and geocoding
#[async_trait]
pub trait AddressValidation: Send + Sync {
    async fn validate(
        &self,
        partial: &str,
        place_id: Option<&str>,
    ) -> Result<GeoLocation, SchedulingError>;
}

/// Realtime broadcast sink, one call per subscriber group
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(
        &self,
        group: &str,
        event_name: &str,
        payload: &str,
    ) -> Result<(), SchedulingError>;
}

/// Fan-out of domain events to their subscriber groups.
///
/// Implementations must never propagate failures to the caller; broadcast
/// and event-log errors are logged and swallowed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &crate::domain::events::DomainEvent, assignees: &[uuid::Uuid]);
}
