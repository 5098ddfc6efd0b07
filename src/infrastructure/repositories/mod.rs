//! In-memory repository implementations
//!
//! HashMap-backed stores behind the domain repository traits, with
//! optimistic versioning on updates. Used by tests and the CLI demo.

pub mod in_memory_assignment_repository;
pub mod in_memory_audit_repository;
pub mod in_memory_config_repository;
pub mod in_memory_contractor_repository;
pub mod in_memory_event_log_repository;
pub mod in_memory_job_repository;

pub use in_memory_assignment_repository::InMemoryAssignmentRepository;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_config_repository::{
    InMemorySystemConfigurationRepository, InMemoryWeightsConfigRepository,
};
pub use in_memory_contractor_repository::InMemoryContractorRepository;
pub use in_memory_event_log_repository::InMemoryEventLogRepository;
pub use in_memory_job_repository::InMemoryJobRepository;
