//! In-Memory configuration repositories
//!
//! `InMemoryWeightsConfigRepository` validates weight sets on write and
//! maintains the exactly-one-active invariant; the system-configuration
//! store keeps the highest version as current.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{SystemConfiguration, WeightsConfig};
use crate::domain::error::SchedulingError;
use crate::domain::repositories::{SystemConfigurationRepository, WeightsConfigRepository};

#[derive(Default)]
pub struct InMemorySystemConfigurationRepository {
    configs: RwLock<Vec<SystemConfiguration>>,
}

impl InMemorySystemConfigurationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SystemConfigurationRepository for InMemorySystemConfigurationRepository {
    async fn get_current(&self) -> Result<Option<SystemConfiguration>, SchedulingError> {
        Ok(self
            .configs
            .read()
            .await
            .iter()
            .max_by_key(|c| c.version)
            .cloned())
    }

    async fn add(&self, config: SystemConfiguration) -> Result<(), SchedulingError> {
        self.configs.write().await.push(config);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryWeightsConfigRepository {
    configs: RwLock<HashMap<u32, WeightsConfig>>,
}

impl InMemoryWeightsConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository pre-loaded with the stock active weight set
    pub async fn with_defaults() -> Result<Self, SchedulingError> {
        let repo = Self::new();
        repo.add(WeightsConfig::default_active()).await?;
        Ok(repo)
    }
}

#[async_trait]
impl WeightsConfigRepository for InMemoryWeightsConfigRepository {
    async fn get_active(&self) -> Result<Option<WeightsConfig>, SchedulingError> {
        Ok(self
            .configs
            .read()
            .await
            .values()
            .find(|c| c.is_active)
            .cloned())
    }

    async fn get_by_version(&self, version: u32) -> Result<Option<WeightsConfig>, SchedulingError> {
        Ok(self.configs.read().await.get(&version).cloned())
    }

    async fn add(&self, config: WeightsConfig) -> Result<(), SchedulingError> {
        config.validate()?;
        let mut store = self.configs.write().await;
        if config.is_active {
            for existing in store.values_mut() {
                existing.is_active = false;
            }
        }
        store.insert(config.version, config);
        Ok(())
    }

    async fn set_active(&self, version: u32) -> Result<(), SchedulingError> {
        let mut store = self.configs.write().await;
        if !store.contains_key(&version) {
            return Err(SchedulingError::NotFound(format!(
                "weights config version {version}"
            )));
        }
        for (v, config) in store.iter_mut() {
            config.is_active = *v == version;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_weights_rejected_on_write() {
        let repo = InMemoryWeightsConfigRepository::new();
        let mut config = WeightsConfig::default_active();
        config.availability_weight = 2.0;
        assert!(matches!(
            repo.add(config).await,
            Err(SchedulingError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_exactly_one_active() {
        let repo = InMemoryWeightsConfigRepository::with_defaults().await.unwrap();
        let mut second = WeightsConfig::default_active();
        second.version = 2;
        repo.add(second).await.unwrap();

        let active = repo.get_active().await.unwrap().unwrap();
        assert_eq!(active.version, 2);

        repo.set_active(1).await.unwrap();
        let active = repo.get_active().await.unwrap().unwrap();
        assert_eq!(active.version, 1);
        assert!(!repo.get_by_version(2).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_set_active_unknown_version() {
        let repo = InMemoryWeightsConfigRepository::new();
        assert!(matches!(
            repo.set_active(9).await,
            Err(SchedulingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_system_configuration_current_is_highest_version() {
        let repo = InMemorySystemConfigurationRepository::new();
        repo.add(SystemConfiguration::new(1, vec!["flooring".into()], vec![]))
            .await
            .unwrap();
        repo.add(SystemConfiguration::new(3, vec!["hvac".into()], vec![]))
            .await
            .unwrap();
        let current = repo.get_current().await.unwrap().unwrap();
        assert_eq!(current.version, 3);
    }
}
