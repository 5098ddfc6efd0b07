//! Address validation module
//!
//! Resolves a partial address or place ID to a structured, geocoded
//! location. The in-memory implementation answers from a registry of
//! known places; production deployments wrap the Places API behind the
//! same trait.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::collaborators::AddressValidation;
use crate::domain::error::SchedulingError;
use crate::domain::value_objects::GeoLocation;

struct KnownPlace {
    place_id: String,
    location: GeoLocation,
}

/// Registry-backed address validation
#[derive(Default)]
pub struct InMemoryAddressValidation {
    places: RwLock<HashMap<String, KnownPlace>>,
}

impl InMemoryAddressValidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a known address with its place ID and location
    pub async fn register(&self, address: &str, place_id: &str, location: GeoLocation) {
        self.places.write().await.insert(
            address.trim().to_lowercase(),
            KnownPlace {
                place_id: place_id.to_string(),
                location,
            },
        );
    }
}

#[async_trait]
impl AddressValidation for InMemoryAddressValidation {
    async fn validate(
        &self,
        partial: &str,
        place_id: Option<&str>,
    ) -> Result<GeoLocation, SchedulingError> {
        let places = self.places.read().await;

        if let Some(wanted_id) = place_id {
            if let Some(place) = places.values().find(|p| p.place_id == wanted_id) {
                return Ok(place.location.clone());
            }
            return Err(SchedulingError::NotFound(format!("place {wanted_id}")));
        }

        let needle = partial.trim().to_lowercase();
        if needle.is_empty() {
            return Err(SchedulingError::InvalidArgument("empty address".into()));
        }
        places
            .iter()
            .find(|(address, _)| address.contains(&needle))
            .map(|(address, place)| {
                place
                    .location
                    .clone()
                    .with_address(address.clone())
            })
            .ok_or_else(|| SchedulingError::NotFound(format!("address matching '{partial}'")))
    }
}
