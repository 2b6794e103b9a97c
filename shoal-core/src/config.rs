//! Configuration types

use serde::{Deserialize, Serialize};

use crate::enums::{CacheMode, TransactionMode};
use crate::error::{ConfigError, ShoalError, ShoalResult};

/// Loader gate configuration, read once when the cache starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub cache_mode: CacheMode,
    pub transaction_mode: TransactionMode,
    /// Count decisions per skip reason.
    #[serde(default = "default_stats_enabled")]
    pub stats_enabled: bool,
}

fn default_stats_enabled() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_mode: CacheMode::Distributed,
            transaction_mode: TransactionMode::NonTransactional,
            stats_enabled: true,
        }
    }
}

impl LoaderConfig {
    /// Create a new loader config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache mode.
    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    /// Set the transaction mode.
    pub fn with_transaction_mode(mut self, transaction_mode: TransactionMode) -> Self {
        self.transaction_mode = transaction_mode;
        self
    }

    /// Enable or disable decision statistics.
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats_enabled = enabled;
        self
    }

    pub fn is_transactional(&self) -> bool {
        self.transaction_mode.is_transactional()
    }

    pub fn is_distributed(&self) -> bool {
        self.cache_mode.is_distributed()
    }

    /// Parse and validate a JSON document.
    pub fn from_json(input: &str) -> ShoalResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Build from `SHOAL_CACHE_MODE`, `SHOAL_TRANSACTION_MODE` and
    /// `SHOAL_STATS_ENABLED`, falling back to defaults for unset variables.
    pub fn from_env() -> ShoalResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`LoaderConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> ShoalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(mode) = lookup("SHOAL_CACHE_MODE") {
            config.cache_mode = mode.parse()?;
        }
        if let Some(mode) = lookup("SHOAL_TRANSACTION_MODE") {
            config.transaction_mode = mode.parse()?;
        }
        if let Some(stats) = lookup("SHOAL_STATS_ENABLED") {
            config.stats_enabled = stats == "true" || stats == "1";
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// A transactional cache must be clustered; a local transactional cache
    /// has nothing for the gate to decide.
    pub fn validate(&self) -> ShoalResult<()> {
        if self.is_transactional() && !self.cache_mode.is_clustered() {
            return Err(ShoalError::Config(ConfigError::IncompatibleOptions {
                option_a: "transaction_mode=transactional".to_string(),
                option_b: "cache_mode=local".to_string(),
            }));
        }
        Ok(())
    }
}

/// Shape of the reference consistent hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashConfig {
    /// Owners per key, primary included.
    pub num_owners: usize,
    /// Number of hash segments keys are bucketed into.
    pub num_segments: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            num_owners: 2,
            num_segments: 256,
        }
    }
}

impl HashConfig {
    pub fn new(num_owners: usize, num_segments: usize) -> Self {
        Self {
            num_owners,
            num_segments,
        }
    }

    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(ShoalError::Config) if invalid.
    pub fn validate(&self) -> ShoalResult<()> {
        if self.num_owners == 0 {
            return Err(ShoalError::Config(ConfigError::InvalidValue {
                field: "num_owners".to_string(),
                value: self.num_owners.to_string(),
                reason: "num_owners must be greater than 0".to_string(),
            }));
        }

        if self.num_segments == 0 {
            return Err(ShoalError::Config(ConfigError::InvalidValue {
                field: "num_segments".to_string(),
                value: self.num_segments.to_string(),
                reason: "num_segments must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        assert!(LoaderConfig::default().validate().is_ok());
        assert!(HashConfig::default().validate().is_ok());
    }

    #[test]
    fn test_local_transactional_rejected() {
        let config = LoaderConfig::new()
            .with_cache_mode(CacheMode::Local)
            .with_transaction_mode(TransactionMode::Transactional);
        assert!(matches!(
            config.validate(),
            Err(ShoalError::Config(ConfigError::IncompatibleOptions { .. }))
        ));
    }

    #[test]
    fn test_from_json() {
        let config = LoaderConfig::from_json(
            r#"{"cache_mode":"replicated","transaction_mode":"transactional"}"#,
        )
        .unwrap();
        assert_eq!(config.cache_mode, CacheMode::Replicated);
        assert!(config.is_transactional());
        assert!(config.stats_enabled);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = LoaderConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ShoalError::Config(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("SHOAL_CACHE_MODE", "dist"),
            ("SHOAL_TRANSACTION_MODE", "tx"),
            ("SHOAL_STATS_ENABLED", "0"),
        ]
        .into_iter()
        .collect();
        let config = LoaderConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert!(config.is_distributed());
        assert!(config.is_transactional());
        assert!(!config.stats_enabled);
    }

    #[test]
    fn test_from_lookup_defaults_when_unset() {
        let config = LoaderConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn test_hash_config_rejects_zero() {
        assert!(HashConfig::new(0, 16).validate().is_err());
        assert!(HashConfig::new(2, 0).validate().is_err());
    }
}
