//! Distance and ETA calculation module
//!
//! Wraps a primary routing provider with the resilience policy and falls
//! back to Haversine arithmetic when the provider fails or none is
//! configured. Fallback results after a provider failure are flagged
//! `degraded`; ETA falls back to great-circle distance at a configured
//! road speed.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::application::config::{ResilienceConfig, ScoringConfig};
use crate::domain::collaborators::{DistanceCalc, DistanceResult, EtaResult, RouteSource};
use crate::domain::error::SchedulingError;
use crate::domain::value_objects::haversine_meters;
use crate::infrastructure::external::resilience::ResiliencePolicy;

/// Low-level routing provider (OpenRouteService or equivalent)
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn distance_meters(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Result<f64, SchedulingError>;

    async fn eta_minutes(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Result<f64, SchedulingError>;
}

/// A provider that derives road figures from great-circle distance at a
/// uniform speed; useful for demos and tests
pub struct UniformSpeedProvider {
    pub speed_kmh: f64,
    /// Road distance as a multiple of the great-circle distance
    pub road_factor: f64,
}

impl Default for UniformSpeedProvider {
    fn default() -> Self {
        Self {
            speed_kmh: 40.0,
            road_factor: 1.3,
        }
    }
}

#[async_trait]
impl RouteProvider for UniformSpeedProvider {
    async fn distance_meters(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Result<f64, SchedulingError> {
        Ok(haversine_meters(from_lat, from_lng, to_lat, to_lng) * self.road_factor)
    }

    async fn eta_minutes(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Result<f64, SchedulingError> {
        let meters = self
            .distance_meters(from_lat, from_lng, to_lat, to_lng)
            .await?;
        Ok(meters / 1000.0 / self.speed_kmh * 60.0)
    }
}

/// `DistanceCalc` implementation with resilience and Haversine fallback
pub struct ResilientDistanceCalc {
    provider: Option<Arc<dyn RouteProvider>>,
    policy: ResiliencePolicy,
    fallback_speed_kmh: f64,
}

impl ResilientDistanceCalc {
    pub fn new(
        provider: Option<Arc<dyn RouteProvider>>,
        resilience: ResilienceConfig,
        scoring: &ScoringConfig,
    ) -> Self {
        Self {
            provider,
            policy: ResiliencePolicy::new(resilience),
            fallback_speed_kmh: scoring.fallback_speed_kmh,
        }
    }

    /// A calculator with no primary provider; everything is Haversine
    pub fn haversine_only(scoring: &ScoringConfig) -> Self {
        Self::new(None, ResilienceConfig::default(), scoring)
    }

    /// `ceil(km / speed · 60)` minutes from great-circle distance
    fn fallback_eta_minutes(&self, meters: f64) -> f64 {
        (meters / 1000.0 / self.fallback_speed_kmh * 60.0).ceil()
    }
}

#[async_trait]
impl DistanceCalc for ResilientDistanceCalc {
    async fn distance(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> DistanceResult {
        if let Some(provider) = &self.provider {
            let provider = Arc::clone(provider);
            let attempt = self
                .policy
                .execute("distance", || {
                    let provider = Arc::clone(&provider);
                    async move {
                        provider
                            .distance_meters(from_lat, from_lng, to_lat, to_lng)
                            .await
                    }
                })
                .await;
            match attempt {
                Ok(meters) => {
                    return DistanceResult {
                        meters: Some(meters),
                        degraded: false,
                        source: RouteSource::Primary,
                    }
                }
                Err(error) => {
                    debug!(%error, "primary distance lookup failed, using haversine");
                    return DistanceResult {
                        meters: Some(haversine_meters(from_lat, from_lng, to_lat, to_lng)),
                        degraded: true,
                        source: RouteSource::Haversine,
                    };
                }
            }
        }
        DistanceResult {
            meters: Some(haversine_meters(from_lat, from_lng, to_lat, to_lng)),
            degraded: false,
            source: RouteSource::Haversine,
        }
    }

    async fn eta(&self, from_lat: f64, from_lng: f64, to_lat: f64, to_lng: f64) -> EtaResult {
        if let Some(provider) = &self.provider {
            let provider = Arc::clone(provider);
            let attempt = self
                .policy
                .execute("eta", || {
                    let provider = Arc::clone(&provider);
                    async move { provider.eta_minutes(from_lat, from_lng, to_lat, to_lng).await }
                })
                .await;
            match attempt {
                Ok(minutes) => {
                    return EtaResult {
                        minutes: Some(minutes),
                        degraded: false,
                        source: RouteSource::Primary,
                    }
                }
                Err(error) => {
                    debug!(%error, "primary ETA lookup failed, using haversine");
                    let meters = haversine_meters(from_lat, from_lng, to_lat, to_lng);
                    return EtaResult {
                        minutes: Some(self.fallback_eta_minutes(meters)),
                        degraded: true,
                        source: RouteSource::Haversine,
                    };
                }
            }
        }
        let meters = haversine_meters(from_lat, from_lng, to_lat, to_lng);
        EtaResult {
            minutes: Some(self.fallback_eta_minutes(meters)),
            degraded: false,
            source: RouteSource::Haversine,
        }
    }
}
