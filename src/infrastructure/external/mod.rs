//! External collaborator implementations with resilience and fallbacks

pub mod address_validation;
pub mod distance;
pub mod eta_matrix;
pub mod resilience;
pub mod timezone_service;

pub use address_validation::InMemoryAddressValidation;
pub use distance::{ResilientDistanceCalc, RouteProvider, UniformSpeedProvider};
pub use eta_matrix::{CachedEtaMatrix, EtaMatrixSource, HaversineMatrixSource};
pub use resilience::{CircuitBreaker, ResiliencePolicy};
pub use timezone_service::{StaticTimezoneService, TimezoneAnchor};
