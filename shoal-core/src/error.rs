//! Error types for SHOAL operations
//!
//! The load gate itself never fails. Errors only surface where configuration
//! is parsed and where topology snapshots are built or published.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },

    #[error("Failed to parse configuration: {reason}")]
    ParseFailed { reason: String },
}

/// Topology construction and publication errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Topology has no members")]
    NoMembers,

    #[error("Invalid owner count {num_owners}: must be at least 1")]
    InvalidOwnerCount { num_owners: usize },

    #[error("Invalid segment count {num_segments}: must be at least 1")]
    InvalidSegmentCount { num_segments: usize },

    #[error("Duplicate member in topology: {member}")]
    DuplicateMember { member: String },

    #[error("Stale topology {offered}: current topology is {current}")]
    StaleTopology { offered: u32, current: u32 },

    #[error("No rebalance in progress for topology {topology_id}")]
    NoPendingRebalance { topology_id: u32 },

    #[error("Owner {member} is not a member of the topology")]
    UnknownOwner { member: String },
}

/// Master error type for all SHOAL errors.
#[derive(Debug, Clone, Error)]
pub enum ShoalError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),
}

/// Result type alias for SHOAL operations.
pub type ShoalResult<T> = Result<T, ShoalError>;

// =============================================================================
// TESTS
// =============================================================================
