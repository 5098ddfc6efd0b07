//! Application services: the pure scheduling computations

pub mod availability_engine;
pub mod fatigue_calculator;
pub mod scoring;
pub mod slot_generator;
pub mod travel_buffer;

pub use availability_engine::AvailabilityEngine;
pub use fatigue_calculator::{FatigueAssessment, FatigueCalculator};
pub use scoring::{rounded_2dp, FactorBreakdown, ScoringService};
pub use slot_generator::{SlotGenerator, SlotRequest};
pub use travel_buffer::TravelBufferService;
