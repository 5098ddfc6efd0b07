//! Geo Location value object module
//!
//! Coordinates with an optional structured address and resolved IANA
//! timezone, plus the great-circle distance used as the routing fallback.

use serde::{Deserialize, Serialize};

use crate::domain::error::SchedulingError;

/// Mean Earth radius in meters
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A geographic point with optional address and resolved timezone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Structured, validated address text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Resolved IANA timezone identifier, e.g. `America/New_York`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl GeoLocation {
    /// Creates a location, validating coordinate ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SchedulingError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SchedulingError::InvalidArgument(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SchedulingError::InvalidArgument(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            address: None,
            timezone: None,
        })
    }

    pub fn with_address(mut self, address: String) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_timezone(mut self, timezone: String) -> Self {
        self.timezone = Some(timezone);
        self
    }

    /// Haversine great-circle distance to another point, in meters.
    ///
    /// Symmetric, non-negative, zero for coincident points.
    pub fn haversine_distance_meters(&self, other: &GeoLocation) -> f64 {
        haversine_meters(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Haversine distance between two coordinate pairs in degrees, in meters
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lng2 - lng1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        assert!(GeoLocation::new(91.0, 0.0).is_err());
        assert!(GeoLocation::new(-91.0, 0.0).is_err());
        assert!(GeoLocation::new(0.0, 181.0).is_err());
        assert!(GeoLocation::new(0.0, -181.0).is_err());
        assert!(GeoLocation::new(40.7128, -74.0060).is_ok());
    }

    #[test]
    fn test_coincident_points_are_zero_distance() {
        let a = GeoLocation::new(40.7128, -74.0060).unwrap();
        assert_eq!(a.haversine_distance_meters(&a), 0.0);
    }

    #[test]
    fn test_known_distance_new_york_to_philadelphia() {
        // NYC City Hall to Philadelphia City Hall, ~129.5 km great-circle
        let nyc = GeoLocation::new(40.7128, -74.0060).unwrap();
        let philly = GeoLocation::new(39.9526, -75.1652).unwrap();
        let meters = nyc.haversine_distance_meters(&philly);
        assert!(
            (meters - 129_500.0).abs() / 129_500.0 < 0.05,
            "distance {} outside 5% of reference",
            meters
        );
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric_and_non_negative(
            lat1 in -90.0f64..90.0,
            lng1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0,
            lng2 in -180.0f64..180.0,
        ) {
            let forward = haversine_meters(lat1, lng1, lat2, lng2);
            let backward = haversine_meters(lat2, lng2, lat1, lng1);
            prop_assert!(forward >= 0.0);
            prop_assert!((forward - backward).abs() < 1e-6);
        }
    }
}
