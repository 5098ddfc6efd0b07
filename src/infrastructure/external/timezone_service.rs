//! Timezone lookup module
//!
//! Resolves a coordinate to an IANA timezone identifier. The in-memory
//! implementation answers from a seeded table of reference points by
//! nearest great-circle distance; production deployments wrap the real
//! lookup API behind the same trait.

use async_trait::async_trait;

use crate::domain::collaborators::TimezoneService;
use crate::domain::error::SchedulingError;
use crate::domain::value_objects::{haversine_meters, resolve_zone};

/// One reference point of the seeded lookup table
#[derive(Debug, Clone)]
pub struct TimezoneAnchor {
    pub latitude: f64,
    pub longitude: f64,
    pub zone: String,
}

/// Nearest-anchor timezone lookup over a seeded table
pub struct StaticTimezoneService {
    anchors: Vec<TimezoneAnchor>,
    default_zone: String,
}

impl StaticTimezoneService {
    /// Builds the service, validating every anchor zone up front
    pub fn new(anchors: Vec<TimezoneAnchor>, default_zone: String) -> Result<Self, SchedulingError> {
        for anchor in &anchors {
            resolve_zone(&anchor.zone)?;
        }
        resolve_zone(&default_zone)?;
        Ok(Self {
            anchors,
            default_zone,
        })
    }

    /// A table covering the demo's operating regions
    pub fn north_america() -> Self {
        let anchors = vec![
            TimezoneAnchor {
                latitude: 40.7128,
                longitude: -74.0060,
                zone: "America/New_York".into(),
            },
            TimezoneAnchor {
                latitude: 41.8781,
                longitude: -87.6298,
                zone: "America/Chicago".into(),
            },
            TimezoneAnchor {
                latitude: 39.7392,
                longitude: -104.9903,
                zone: "America/Denver".into(),
            },
            TimezoneAnchor {
                latitude: 34.0522,
                longitude: -118.2437,
                zone: "America/Los_Angeles".into(),
            },
        ];
        Self::new(anchors, "UTC".into()).expect("static anchor table is valid")
    }
}

#[async_trait]
impl TimezoneService for StaticTimezoneService {
    async fn get_timezone(&self, lat: f64, lng: f64) -> Result<String, SchedulingError> {
        let nearest = self.anchors.iter().min_by(|a, b| {
            let da = haversine_meters(lat, lng, a.latitude, a.longitude);
            let db = haversine_meters(lat, lng, b.latitude, b.longitude);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(nearest
            .map(|anchor| anchor.zone.clone())
            .unwrap_or_else(|| self.default_zone.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_nearest_anchor_wins() {
        let service = StaticTimezoneService::north_america();
        // Newark is closest to the New York anchor
        let zone = service.get_timezone(40.7357, -74.1724).await.unwrap();
        assert_eq!(zone, "America/New_York");
        // Pasadena is closest to Los Angeles
        let zone = service.get_timezone(34.1478, -118.1445).await.unwrap();
        assert_eq!(zone, "America/Los_Angeles");
    }

    #[tokio::test]
    async fn test_empty_table_falls_back_to_default() {
        let service = StaticTimezoneService::new(vec![], "UTC".into()).unwrap();
        assert_eq!(service.get_timezone(0.0, 0.0).await.unwrap(), "UTC");
    }

    #[test]
    fn test_invalid_anchor_zone_rejected() {
        let result = StaticTimezoneService::new(
            vec![TimezoneAnchor {
                latitude: 0.0,
                longitude: 0.0,
                zone: "Central Standard Time".into(),
            }],
            "UTC".into(),
        );
        assert!(matches!(result, Err(SchedulingError::InvalidArgument(_))));
    }
}
