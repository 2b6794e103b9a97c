//! Topology gate: join readiness and the current read topology.
//!
//! Readers load one `Arc<CacheTopology>` and answer every question from it.
//! The membership subsystem publishes replacements through
//! [`TopologyManager`]; publication swaps the reference, it never edits a
//! published snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use shoal_core::{CacheKey, NodeAddress, ShoalResult, TopologyError};
use tracing::debug;

use crate::hash::ConsistentHash;
use crate::topology::CacheTopology;

/// Read access to the current topology snapshot.
///
/// Implementations must be cheap, non-blocking and safe to call from many
/// threads at once.
pub trait TopologyGate: Send + Sync {
    /// The snapshot backing every other answer.
    fn current_topology(&self) -> Arc<CacheTopology>;

    /// False until this node has received its data for the latest join or
    /// rebalance. Loads must not be attempted while false.
    fn join_complete(&self) -> bool {
        self.current_topology().is_join_complete()
    }

    /// Whether the read hash maps `key` to `address`.
    fn is_key_local(&self, address: &NodeAddress, key: &CacheKey) -> bool {
        self.current_topology().is_read_owner(address, key)
    }
}

impl<G: TopologyGate + ?Sized> TopologyGate for Arc<G> {
    fn current_topology(&self) -> Arc<CacheTopology> {
        (**self).current_topology()
    }
}

/// Holder of the published topology snapshot.
pub struct TopologyManager {
    current: ArcSwap<CacheTopology>,
}

impl TopologyManager {
    pub fn new(initial: CacheTopology) -> Self {
        debug!(
            topology_id = initial.topology_id(),
            join_complete = initial.is_join_complete(),
            "Initial cache topology"
        );
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Publish a topology received from the coordinator.
    ///
    /// Rejects topologies older than the current one. A topology with the
    /// same id replaces the current one.
    pub fn install(&self, topology: CacheTopology) -> ShoalResult<Arc<CacheTopology>> {
        let offered = Arc::new(topology);
        loop {
            let current = self.current.load_full();
            if offered.topology_id() < current.topology_id() {
                return Err(TopologyError::StaleTopology {
                    offered: offered.topology_id(),
                    current: current.topology_id(),
                }
                .into());
            }
            let prev = self.current.compare_and_swap(&current, Arc::clone(&offered));
            if Arc::ptr_eq(&*prev, &current) {
                debug!(
                    topology_id = offered.topology_id(),
                    rebalance_id = offered.rebalance_id(),
                    join_complete = offered.is_join_complete(),
                    rebalancing = offered.is_rebalancing(),
                    "Installed cache topology"
                );
                return Ok(offered);
            }
        }
    }

    /// Mark the local join complete on the current topology.
    pub fn mark_join_complete(&self) -> Arc<CacheTopology> {
        self.update(|current| Some(current.clone().with_join_complete(true)))
            .unwrap_or_else(|| self.current.load_full())
    }

    /// Start moving data towards `pending`. Loads and locality keep using the
    /// old read hash until [`TopologyManager::finish_rebalance`]. The local
    /// node is not join-complete again until its share has arrived.
    pub fn begin_rebalance(&self, pending: ConsistentHash) -> Arc<CacheTopology> {
        self.update(|current| {
            Some(
                current
                    .successor()
                    .with_pending(pending.clone())
                    .with_rebalance_id(current.rebalance_id().wrapping_add(1))
                    .with_join_complete(false),
            )
        })
        .unwrap_or_else(|| self.current.load_full())
    }

    /// Promote the pending hash to the read hash.
    pub fn finish_rebalance(&self) -> ShoalResult<Arc<CacheTopology>> {
        self.update(CacheTopology::promote_pending).ok_or_else(|| {
            TopologyError::NoPendingRebalance {
                topology_id: self.current.load().topology_id(),
            }
            .into()
        })
    }

    /// CAS loop publishing `f(current)`. `None` from `f` leaves the snapshot
    /// untouched and is returned as-is.
    fn update<F>(&self, f: F) -> Option<Arc<CacheTopology>>
    where
        F: Fn(&CacheTopology) -> Option<CacheTopology>,
    {
        loop {
            let current = self.current.load_full();
            let next = Arc::new(f(current.as_ref())?);
            let prev = self.current.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*prev, &current) {
                debug!(
                    topology_id = next.topology_id(),
                    rebalance_id = next.rebalance_id(),
                    join_complete = next.is_join_complete(),
                    rebalancing = next.is_rebalancing(),
                    "Published cache topology"
                );
                return Some(next);
            }
        }
    }
}

impl TopologyGate for TopologyManager {
    fn current_topology(&self) -> Arc<CacheTopology> {
        self.current.load_full()
    }
}

impl std::fmt::Debug for TopologyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.load();
        f.debug_struct("TopologyManager")
            .field("topology_id", &current.topology_id())
            .field("join_complete", &current.is_join_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::{HashConfig, ShoalError};

    fn nodes(n: usize) -> Vec<NodeAddress> {
        (0..n).map(|i| NodeAddress::generate(format!("node-{i}"))).collect()
    }

    fn topology(id: u32, members: &[NodeAddress]) -> CacheTopology {
        let ch = ConsistentHash::distributed(members.to_vec(), HashConfig::new(2, 16)).unwrap();
        CacheTopology::new(id, ch)
    }

    #[test]
    fn test_join_complete_flow() {
        let members = nodes(2);
        let manager = TopologyManager::new(topology(1, &members));
        assert!(!manager.join_complete());

        let published = manager.mark_join_complete();
        assert!(published.is_join_complete());
        assert!(manager.join_complete());
        assert_eq!(published.topology_id(), 1);
    }

    #[test]
    fn test_install_rejects_stale() {
        let members = nodes(2);
        let manager = TopologyManager::new(topology(5, &members));
        let err = manager.install(topology(4, &members)).unwrap_err();
        assert!(matches!(
            err,
            ShoalError::Topology(TopologyError::StaleTopology {
                offered: 4,
                current: 5
            })
        ));
        assert!(manager.install(topology(6, &members)).is_ok());
        assert_eq!(manager.current_topology().topology_id(), 6);
    }

    #[test]
    fn test_held_snapshot_survives_install() {
        let members = nodes(3);
        let manager = TopologyManager::new(topology(1, &members[..1]));
        let held = manager.current_topology();

        manager.install(topology(2, &members)).unwrap();
        assert_eq!(held.topology_id(), 1);
        assert_eq!(held.read_ch().members().len(), 1);
        assert_eq!(manager.current_topology().read_ch().members().len(), 3);
    }

    #[test]
    fn test_rebalance_keeps_read_hash_until_finished() {
        let members = nodes(3);
        let manager = TopologyManager::new(topology(1, &members[..2]).with_join_complete(true));
        let pending = ConsistentHash::distributed(members.clone(), HashConfig::new(2, 16)).unwrap();

        let during = manager.begin_rebalance(pending.clone());
        assert!(during.is_rebalancing());
        assert!(!during.is_join_complete());
        assert_eq!(during.read_ch().members().len(), 2);
        assert_eq!(during.topology_id(), 2);

        let after = manager.finish_rebalance().unwrap();
        assert_eq!(after.read_ch(), &pending);
        assert_eq!(after.topology_id(), 3);
    }

    #[test]
    fn test_finish_without_rebalance_fails() {
        let manager = TopologyManager::new(topology(1, &nodes(1)));
        assert!(matches!(
            manager.finish_rebalance(),
            Err(ShoalError::Topology(TopologyError::NoPendingRebalance { topology_id: 1 }))
        ));
    }

    #[test]
    fn test_is_key_local_uses_read_hash() {
        let members = nodes(2);
        let read = ConsistentHash::from_segments(members.clone(), vec![vec![members[0].clone()]])
            .unwrap();
        let pending =
            ConsistentHash::from_segments(members.clone(), vec![vec![members[1].clone()]])
                .unwrap();
        let manager = TopologyManager::new(CacheTopology::new(1, read).with_pending(pending));
        let key = CacheKey::from("k");

        assert!(manager.is_key_local(&members[0], &key));
        assert!(!manager.is_key_local(&members[1], &key));
    }
}
