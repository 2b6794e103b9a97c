//! Enum types shared across the workspace

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// How much of the prior value a write command needs.
///
/// Declared once when a command is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    /// The write never needs the previous value.
    DontLoad,
    /// Only the primary owner needs the previous value.
    Primary,
    /// Every owner needs the previous value, because the new value is
    /// computed from it (functional and delta writes).
    Owner,
}

impl LoadType {
    pub const ALL: [LoadType; 3] = [LoadType::DontLoad, LoadType::Primary, LoadType::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::DontLoad => "DONT_LOAD",
            LoadType::Primary => "PRIMARY",
            LoadType::Owner => "OWNER",
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replication mode of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Single node, no clustering.
    Local,
    /// Every member holds every key.
    Replicated,
    /// Members hold nothing durable for each other, writes only invalidate.
    Invalidation,
    /// Each key is held by a subset of members chosen by the consistent hash.
    #[default]
    Distributed,
}

impl CacheMode {
    /// True when only a subset of members owns each key.
    pub fn is_distributed(&self) -> bool {
        matches!(self, CacheMode::Distributed)
    }

    pub fn is_clustered(&self) -> bool {
        !matches!(self, CacheMode::Local)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Local => "local",
            CacheMode::Replicated => "replicated",
            CacheMode::Invalidation => "invalidation",
            CacheMode::Distributed => "distributed",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(CacheMode::Local),
            "replicated" | "repl" => Ok(CacheMode::Replicated),
            "invalidation" => Ok(CacheMode::Invalidation),
            "distributed" | "dist" => Ok(CacheMode::Distributed),
            other => Err(ConfigError::InvalidValue {
                field: "cache_mode".to_string(),
                value: other.to_string(),
                reason: "expected one of local, replicated, invalidation, distributed"
                    .to_string(),
            }),
        }
    }
}

/// Transaction mode of the cache, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    #[default]
    NonTransactional,
    Transactional,
}

impl TransactionMode {
    pub fn is_transactional(&self) -> bool {
        matches!(self, TransactionMode::Transactional)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionMode::NonTransactional => "non_transactional",
            TransactionMode::Transactional => "transactional",
        }
    }
}

impl FromStr for TransactionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "non_transactional" | "none" | "non_tx" => Ok(TransactionMode::NonTransactional),
            "transactional" | "tx" => Ok(TransactionMode::Transactional),
            other => Err(ConfigError::InvalidValue {
                field: "transaction_mode".to_string(),
                value: other.to_string(),
                reason: "expected transactional or non_transactional".to_string(),
            }),
        }
    }
}

/// Kind of write carried by a command. Informative only; the gate decides on
/// [`LoadType`] and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Put,
    PutIfAbsent,
    Replace,
    Remove,
    Compute,
    ReadWriteKey,
    PutMap,
}

impl CommandKind {
    /// The load type a command of this kind declares unless told otherwise.
    pub fn default_load_type(&self) -> LoadType {
        match self {
            CommandKind::Put | CommandKind::Remove | CommandKind::PutMap => LoadType::DontLoad,
            CommandKind::PutIfAbsent | CommandKind::Replace => LoadType::Primary,
            CommandKind::Compute | CommandKind::ReadWriteKey => LoadType::Owner,
        }
    }
}
