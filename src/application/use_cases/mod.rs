//! Application use cases: the mutation handlers and the ranking pipeline

pub mod assign_job;
pub mod cancel_job;
pub mod create_job;
pub mod recommend_contractors;
pub mod reschedule_job;

pub use assign_job::{AssignJob, AssignJobRequest};
pub use cancel_job::{CancelJob, CancelJobRequest};
pub use create_job::{CreateJob, CreateJobRequest};
pub use recommend_contractors::{
    RankedCandidate, RecommendContractors, RecommendationRequest, RecommendationResult,
};
pub use reschedule_job::{RescheduleJob, RescheduleJobRequest};
