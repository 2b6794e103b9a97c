//! SHOAL Topology - Ownership Views
//!
//! Immutable topology snapshots, the reference consistent hash, the
//! topology gate and the ownership oracle. Snapshots are published by
//! swapping an `Arc`; nothing here blocks or performs I/O.

pub mod gate;
pub mod hash;
pub mod ownership;
pub mod topology;

pub use gate::{TopologyGate, TopologyManager};
pub use hash::{ConsistentHash, OwnerList};
pub use ownership::{LiveOwnership, OwnershipOracle, PinnedOwnership};
pub use topology::CacheTopology;
