//! Weights-config cache module
//!
//! Decorates any `WeightsConfigRepository` with an in-process cache of
//! the active weight set. The cache is safe under parallel request
//! execution and is invalidated whenever a write changes the active
//! version.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::entities::WeightsConfig;
use crate::domain::error::SchedulingError;
use crate::domain::repositories::WeightsConfigRepository;

pub struct CachedWeightsConfigRepository {
    inner: Arc<dyn WeightsConfigRepository>,
    active: RwLock<Option<WeightsConfig>>,
}

impl CachedWeightsConfigRepository {
    pub fn new(inner: Arc<dyn WeightsConfigRepository>) -> Self {
        Self {
            inner,
            active: RwLock::new(None),
        }
    }

    pub async fn invalidate(&self) {
        *self.active.write().await = None;
    }
}

#[async_trait]
impl WeightsConfigRepository for CachedWeightsConfigRepository {
    async fn get_active(&self) -> Result<Option<WeightsConfig>, SchedulingError> {
        if let Some(cached) = self.active.read().await.clone() {
            return Ok(Some(cached));
        }
        let loaded = self.inner.get_active().await?;
        if let Some(config) = &loaded {
            debug!(version = config.version, "weights config cached");
            *self.active.write().await = Some(config.clone());
        }
        Ok(loaded)
    }

    async fn get_by_version(&self, version: u32) -> Result<Option<WeightsConfig>, SchedulingError> {
        self.inner.get_by_version(version).await
    }

    async fn add(&self, config: WeightsConfig) -> Result<(), SchedulingError> {
        self.inner.add(config).await?;
        self.invalidate().await;
        Ok(())
    }

    async fn set_active(&self, version: u32) -> Result<(), SchedulingError> {
        self.inner.set_active(version).await?;
        self.invalidate().await;
        Ok(())
    }
}
