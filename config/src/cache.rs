//! # Resolution Cache & Lifecycle
//!
//! [`ConfigResolver`] owns the resolution pipeline (source resolution,
//! fragment loading, merging, validation) and memoizes fully validated
//! results per source key.
//!
//! # Caching Rules
//! - Only successful resolutions are cached; a failure is re-attempted on
//!   every call, so a corrected fragment is picked up without an explicit
//!   reload
//! - Cache keys are `"legacy"` or `"<tenant>-<mode>"`, so different
//!   tenant/mode combinations coexist in one resolver
//! - Cached configs are shared as `Arc`s; repeated hits hand out the same
//!   allocation

use crate::fragment::load_fragment;
use crate::merge::merge_layers;
use crate::resolver::{ConfigSource, ResolverSignals, resolve_source};
use crate::schema::ValidatedConfig;
use crate::validate::validate;
use dashmap::DashMap;
use errors::ConfigError;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct CacheEntry {
    config: Arc<ValidatedConfig>,

    /// Human-readable description of the fragment path(s) the entry was
    /// built from.
    source: String
}

/// Resolves, validates and caches configurations for one set of signals.
#[derive(Debug)]
pub struct ConfigResolver {
    signals: ResolverSignals,
    cache: DashMap<String, CacheEntry>
}

impl ConfigResolver {
    pub fn new(signals: ResolverSignals) -> Self {
        Self {
            signals,
            cache: DashMap::new()
        }
    }

    /// Build a resolver from the `REPKIT_*` process environment.
    pub fn from_env() -> Self {
        Self::new(ResolverSignals::from_env())
    }

    pub fn signals(&self) -> &ResolverSignals {
        &self.signals
    }

    /// Resolve the configuration for the current signals.
    ///
    /// Serves from the cache when the source key was resolved before;
    /// otherwise runs the full pipeline and caches the validated result.
    /// Failures are never cached.
    pub fn resolve(&self) -> Result<Arc<ValidatedConfig>, ConfigError> {
        let source = resolve_source(&self.signals)?;
        let key = source.key();

        if let Some(entry) = self.cache.get(&key) {
            debug!(%key, "configuration cache hit");
            return Ok(Arc::clone(&entry.config));
        }

        let config = Arc::new(self.load(&source)?);
        let described = source.describe();
        // Two threads racing on a cold key both validated the same
        // fragments; last write wins and both hand out equal configs.
        self.cache.insert(
            key.clone(),
            CacheEntry {
                config: Arc::clone(&config),
                source: described.clone()
            }
        );
        info!(%key, source = %described, "configuration resolved");
        Ok(config)
    }

    /// Drop the cached entry for the current signals and resolve afresh.
    pub fn reload(&self) -> Result<Arc<ValidatedConfig>, ConfigError> {
        let source = resolve_source(&self.signals)?;
        if self.cache.remove(&source.key()).is_some() {
            debug!(key = %source.key(), "cached configuration discarded for reload");
        }
        self.resolve()
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// The source description a cache key was resolved from, if cached.
    pub fn resolved_source(&self, key: &str) -> Option<String> {
        self.cache.get(key).map(|entry| entry.source.clone())
    }

    fn load(&self, source: &ConfigSource) -> Result<ValidatedConfig, ConfigError> {
        let merged = match source {
            ConfigSource::Legacy { path } => load_fragment(path)?,
            ConfigSource::Hierarchical {
                defaults,
                base,
                override_layer,
                ..
            } => {
                let defaults_layer = match defaults {
                    Some(path) => load_fragment(path)?,
                    None => Value::Object(Map::new())
                };
                let base_layer = load_fragment(base)?;
                let override_value = load_fragment(override_layer)?;
                merge_layers([&defaults_layer, &base_layer, &override_value])
            }
        };
        validate(&merged)
    }
}
