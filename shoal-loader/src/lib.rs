//! SHOAL Loader - Cache-Load Gate
//!
//! Decides, for every write reaching a cache node, whether the entry's
//! previous value must first be loaded from the backing store. The decision
//! combines the cache's transaction mode, this node's role for the key in the
//! current topology, and the command's declared load type and flags.
//!
//! The gate performs no I/O. When it answers "load", the enclosing loader
//! stage does the fetch before the write continues.

pub mod clustered;
pub mod decision;
pub mod policy;
pub mod stats;

pub use clustered::{ownership_rule, ClusteredLoadGate, OwnershipVerdict};
pub use decision::{LoadDecision, SkipReason};
pub use policy::{BaseLoadPolicy, LoadGate, LoadPolicy, LocalLoadGate};
pub use stats::{LoadGateStats, LoadGateStatsSnapshot};
