//! Versioned cache topology snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shoal_core::{CacheKey, NodeAddress};

use crate::hash::{ConsistentHash, OwnerList};

/// One immutable view of the cluster's ownership.
///
/// A snapshot is never changed after it is published; a topology change
/// produces a new snapshot that replaces the old one wholesale. Every answer
/// derived from one snapshot is therefore mutually consistent.
#[derive(Debug, Clone)]
pub struct CacheTopology {
    topology_id: u32,
    rebalance_id: u32,
    read_ch: Arc<ConsistentHash>,
    /// Target layout while a rebalance is moving data.
    pending_ch: Option<Arc<ConsistentHash>>,
    join_complete: bool,
    installed_at: DateTime<Utc>,
}

impl CacheTopology {
    pub fn new(topology_id: u32, read_ch: ConsistentHash) -> Self {
        Self {
            topology_id,
            rebalance_id: 0,
            read_ch: Arc::new(read_ch),
            pending_ch: None,
            join_complete: false,
            installed_at: Utc::now(),
        }
    }

    pub fn with_join_complete(mut self, join_complete: bool) -> Self {
        self.join_complete = join_complete;
        self
    }

    pub fn with_pending(mut self, pending_ch: ConsistentHash) -> Self {
        self.pending_ch = Some(Arc::new(pending_ch));
        self
    }

    pub fn with_rebalance_id(mut self, rebalance_id: u32) -> Self {
        self.rebalance_id = rebalance_id;
        self
    }

    pub fn topology_id(&self) -> u32 {
        self.topology_id
    }

    pub fn rebalance_id(&self) -> u32 {
        self.rebalance_id
    }

    pub fn installed_at(&self) -> DateTime<Utc> {
        self.installed_at
    }

    /// Whether this node has received its share of data for this topology.
    pub fn is_join_complete(&self) -> bool {
        self.join_complete
    }

    pub fn is_rebalancing(&self) -> bool {
        self.pending_ch.is_some()
    }

    /// Hash used for reads and for load decisions. Lags the write hash
    /// while a rebalance is in progress.
    pub fn read_ch(&self) -> &ConsistentHash {
        &self.read_ch
    }

    pub fn pending_ch(&self) -> Option<&ConsistentHash> {
        self.pending_ch.as_deref()
    }

    /// Hash writes are routed by: the pending layout during a rebalance,
    /// otherwise the read layout.
    pub fn write_ch(&self) -> &ConsistentHash {
        self.pending_ch.as_deref().unwrap_or(&self.read_ch)
    }

    pub fn members(&self) -> &[NodeAddress] {
        self.write_ch().members()
    }

    pub fn read_owners(&self, key: &CacheKey) -> OwnerList {
        self.read_ch.locate_owners(key)
    }

    pub fn write_owners(&self, key: &CacheKey) -> OwnerList {
        self.write_ch().locate_owners(key)
    }

    pub fn is_read_owner(&self, address: &NodeAddress, key: &CacheKey) -> bool {
        self.read_ch.is_key_local_to_node(address, key)
    }

    /// Successor snapshot: next topology id, rebalance state carried over.
    pub(crate) fn successor(&self) -> Self {
        Self {
            topology_id: self.topology_id.wrapping_add(1),
            installed_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Successor that promotes the pending hash to the read hash.
    pub(crate) fn promote_pending(&self) -> Option<Self> {
        let pending = self.pending_ch.clone()?;
        Some(Self {
            topology_id: self.topology_id.wrapping_add(1),
            rebalance_id: self.rebalance_id,
            read_ch: pending,
            pending_ch: None,
            join_complete: self.join_complete,
            installed_at: Utc::now(),
        })
    }
}
