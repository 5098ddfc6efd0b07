pub mod recommendation_output;

pub use recommendation_output::{CandidateOutput, RecommendationOutput};
