//! Cached ETA matrix module
//!
//! Many-to-many travel-time lookups with batching, bounded concurrency
//! and an in-process cache. Cache keys round coordinates onto a ~100 m
//! grid so nearby origins share entries; entries expire after the
//! configured TTL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::application::config::MatrixConfig;
use crate::domain::collaborators::EtaMatrix;
use crate::domain::error::SchedulingError;

/// Upstream many-to-many ETA backend; one call per batch of pairs
#[async_trait]
pub trait EtaMatrixSource: Send + Sync {
    /// ETA minutes per pair, `None` where the backend has no route
    async fn batch_etas(
        &self,
        pairs: &[((f64, f64), (f64, f64))],
    ) -> Result<Vec<Option<f64>>, SchedulingError>;
}

/// A matrix source deriving travel minutes from great-circle distance at
/// a uniform speed; useful for demos and tests
pub struct HaversineMatrixSource {
    pub speed_kmh: f64,
}

impl Default for HaversineMatrixSource {
    fn default() -> Self {
        Self { speed_kmh: 40.0 }
    }
}

#[async_trait]
impl EtaMatrixSource for HaversineMatrixSource {
    async fn batch_etas(
        &self,
        pairs: &[((f64, f64), (f64, f64))],
    ) -> Result<Vec<Option<f64>>, SchedulingError> {
        Ok(pairs
            .iter()
            .map(|((from_lat, from_lng), (to_lat, to_lng))| {
                let meters = crate::domain::value_objects::haversine_meters(
                    *from_lat, *from_lng, *to_lat, *to_lng,
                );
                Some((meters / 1000.0 / self.speed_kmh * 60.0).ceil())
            })
            .collect())
    }
}

/// Coordinates rounded onto a fixed grid for cache keying
type GridKey = (i64, i64, i64, i64);

const GRID_SCALE: f64 = 1_000.0;

fn grid_key(origin: (f64, f64), dest: (f64, f64)) -> GridKey {
    (
        (origin.0 * GRID_SCALE).round() as i64,
        (origin.1 * GRID_SCALE).round() as i64,
        (dest.0 * GRID_SCALE).round() as i64,
        (dest.1 * GRID_SCALE).round() as i64,
    )
}

struct CacheEntry {
    minutes: f64,
    stored_at: Instant,
}

/// `EtaMatrix` implementation with TTL cache and batched upstream calls
pub struct CachedEtaMatrix {
    source: Arc<dyn EtaMatrixSource>,
    config: MatrixConfig,
    cache: Mutex<HashMap<GridKey, CacheEntry>>,
    semaphore: Arc<Semaphore>,
}

impl CachedEtaMatrix {
    pub fn new(source: Arc<dyn EtaMatrixSource>, config: MatrixConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
        Self {
            source,
            config,
            cache: Mutex::new(HashMap::new()),
            semaphore,
        }
    }

    fn cache_lookup(&self, key: &GridKey) -> Option<f64> {
        let cache = self.cache.lock().expect("cache lock poisoned");
        cache.get(key).and_then(|entry| {
            if entry.stored_at.elapsed().as_secs() < self.config.cache_ttl_seconds {
                Some(entry.minutes)
            } else {
                None
            }
        })
    }

    fn cache_store(&self, key: GridKey, minutes: f64) {
        let mut cache = self.cache.lock().expect("cache lock poisoned");
        cache.insert(
            key,
            CacheEntry {
                minutes,
                stored_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl EtaMatrix for CachedEtaMatrix {
    async fn etas(
        &self,
        origins: &[(f64, f64)],
        destinations: &[(f64, f64)],
    ) -> Result<HashMap<(usize, usize), f64>, SchedulingError> {
        let mut resolved: HashMap<(usize, usize), f64> = HashMap::new();
        let mut misses: Vec<((usize, usize), ((f64, f64), (f64, f64)))> = Vec::new();

        for (i, origin) in origins.iter().enumerate() {
            for (j, dest) in destinations.iter().enumerate() {
                let key = grid_key(*origin, *dest);
                match self.cache_lookup(&key) {
                    Some(minutes) => {
                        resolved.insert((i, j), minutes);
                    }
                    None => misses.push(((i, j), (*origin, *dest))),
                }
            }
        }
        debug!(
            hits = resolved.len(),
            misses = misses.len(),
            "eta matrix lookup"
        );
        if misses.is_empty() {
            return Ok(resolved);
        }

        let mut tasks: JoinSet<Result<Vec<((usize, usize), ((f64, f64), (f64, f64)), Option<f64>)>, SchedulingError>> =
            JoinSet::new();
        for chunk in misses.chunks(self.config.batch_size) {
            let chunk: Vec<_> = chunk.to_vec();
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&self.semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| SchedulingError::UpstreamUnavailable("matrix pool closed".into()))?;
                let pairs: Vec<_> = chunk.iter().map(|(_, pair)| *pair).collect();
                let minutes = source.batch_etas(&pairs).await?;
                Ok(chunk
                    .into_iter()
                    .zip(minutes)
                    .map(|((index, pair), value)| (index, pair, value))
                    .collect())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let batch = joined
                .map_err(|e| SchedulingError::UpstreamUnavailable(format!("matrix task: {e}")))?;
            match batch {
                Ok(rows) => {
                    for (index, pair, value) in rows {
                        if let Some(minutes) = value {
                            self.cache_store(grid_key(pair.0, pair.1), minutes);
                            resolved.insert(index, minutes);
                        }
                    }
                }
                Err(error) => {
                    // a failed batch degrades the matrix, it does not
                    // fail the whole lookup
                    warn!(%error, "eta matrix batch failed");
                }
            }
        }

        Ok(resolved)
    }
}
