pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::entities;
pub use domain::value_objects;
pub use application::use_cases;
pub use application::services;
pub use domain::SchedulingError;
