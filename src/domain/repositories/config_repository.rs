use async_trait::async_trait;

use crate::domain::entities::{SystemConfiguration, WeightsConfig};
use crate::domain::error::SchedulingError;

#[async_trait]
pub trait SystemConfigurationRepository: Send + Sync {
    async fn get_current(&self) -> Result<Option<SystemConfiguration>, SchedulingError>;
    async fn add(&self, config: SystemConfiguration) -> Result<(), SchedulingError>;
}

#[async_trait]
pub trait WeightsConfigRepository: Send + Sync {
    /// The single active weight set, if any
    async fn get_active(&self) -> Result<Option<WeightsConfig>, SchedulingError>;
    async fn get_by_version(&self, version: u32) -> Result<Option<WeightsConfig>, SchedulingError>;
    /// Adds a version after validation; fails `InvalidConfig` on bad weights
    async fn add(&self, config: WeightsConfig) -> Result<(), SchedulingError>;
    /// Makes `version` the single active set
    async fn set_active(&self, version: u32) -> Result<(), SchedulingError>;
}
