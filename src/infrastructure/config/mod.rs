//! Configuration caching infrastructure

pub mod weights_cache;

pub use weights_cache::CachedWeightsConfigRepository;
