//! Ownership oracle: this node's role for a key.

use std::sync::Arc;

use shoal_core::{CacheKey, NodeAddress};

use crate::gate::TopologyGate;
use crate::hash::OwnerList;
use crate::topology::CacheTopology;

/// Read-only view answering "what is this node for key K".
///
/// Every answer from one oracle value must come from a single topology;
/// [`PinnedOwnership`] guarantees that, [`LiveOwnership`] does so per call.
pub trait OwnershipOracle {
    fn local_address(&self) -> &NodeAddress;

    /// Ordered owners of `key`; empty when the topology records none.
    fn owners(&self, key: &CacheKey) -> OwnerList;

    fn is_primary_owner(&self, key: &CacheKey) -> bool {
        self.owners(key).primary() == Some(self.local_address())
    }

    /// Index of this node in the owner list, -1 when it is not an owner.
    fn owner_index(&self, key: &CacheKey) -> i32 {
        self.owners(key).index_of(self.local_address())
    }

    fn is_owner(&self, key: &CacheKey) -> bool {
        self.owner_index(key) >= 0
    }
}

/// Ownership answers pinned to one borrowed snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PinnedOwnership<'a> {
    topology: &'a CacheTopology,
    local: &'a NodeAddress,
}

impl<'a> PinnedOwnership<'a> {
    pub fn new(topology: &'a CacheTopology, local: &'a NodeAddress) -> Self {
        Self { topology, local }
    }

    pub fn topology(&self) -> &'a CacheTopology {
        self.topology
    }
}

impl OwnershipOracle for PinnedOwnership<'_> {
    fn local_address(&self) -> &NodeAddress {
        self.local
    }

    /// Owners come from the write hash, so a node that is gaining a key in
    /// a rebalance already sees itself as owner.
    fn owners(&self, key: &CacheKey) -> OwnerList {
        self.topology.write_owners(key)
    }
}

/// Ownership answers against whatever snapshot is current at call time.
///
/// Use [`LiveOwnership::pin`] when several answers must agree.
pub struct LiveOwnership<G: TopologyGate> {
    gate: Arc<G>,
    local: NodeAddress,
}

impl<G: TopologyGate> LiveOwnership<G> {
    pub fn new(gate: Arc<G>, local: NodeAddress) -> Self {
        Self { gate, local }
    }

    /// Load the current snapshot for use with [`PinnedOwnership::new`].
    pub fn pin(&self) -> Arc<CacheTopology> {
        self.gate.current_topology()
    }
}

impl<G: TopologyGate> OwnershipOracle for LiveOwnership<G> {
    fn local_address(&self) -> &NodeAddress {
        &self.local
    }

    fn owners(&self, key: &CacheKey) -> OwnerList {
        self.gate.current_topology().write_owners(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::TopologyManager;
    use crate::hash::ConsistentHash;

    fn nodes(n: usize) -> Vec<NodeAddress> {
        (0..n).map(|i| NodeAddress::generate(format!("node-{i}"))).collect()
    }

    fn single_segment(members: &[NodeAddress], owners: &[usize]) -> ConsistentHash {
        let owners = owners.iter().map(|&i| members[i].clone()).collect();
        ConsistentHash::from_segments(members.to_vec(), vec![owners]).unwrap()
    }

    #[test]
    fn test_pinned_roles() {
        let members = nodes(3);
        let topology = CacheTopology::new(1, single_segment(&members, &[1, 2]));
        let key = CacheKey::from("k");

        let primary = PinnedOwnership::new(&topology, &members[1]);
        assert!(primary.is_primary_owner(&key));
        assert_eq!(primary.owner_index(&key), 0);

        let backup = PinnedOwnership::new(&topology, &members[2]);
        assert!(!backup.is_primary_owner(&key));
        assert_eq!(backup.owner_index(&key), 1);
        assert!(backup.is_owner(&key));

        let outsider = PinnedOwnership::new(&topology, &members[0]);
        assert_eq!(outsider.owner_index(&key), -1);
        assert!(!outsider.is_owner(&key));
    }

    #[test]
    fn test_empty_segment_is_not_owned() {
        let members = nodes(2);
        let topology = CacheTopology::new(1, single_segment(&members, &[]));
        let oracle = PinnedOwnership::new(&topology, &members[0]);
        let key = CacheKey::from("k");
        assert!(oracle.owners(&key).is_empty());
        assert!(!oracle.is_primary_owner(&key));
        assert_eq!(oracle.owner_index(&key), -1);
    }

    #[test]
    fn test_pinned_owners_follow_pending_hash() {
        let members = nodes(2);
        let topology = CacheTopology::new(1, single_segment(&members, &[0]))
            .with_pending(single_segment(&members, &[1, 0]));
        let oracle = PinnedOwnership::new(&topology, &members[1]);
        assert!(oracle.is_primary_owner(&CacheKey::from("k")));
    }

    #[test]
    fn test_live_ownership_tracks_installs() {
        let members = nodes(2);
        let manager = Arc::new(TopologyManager::new(CacheTopology::new(
            1,
            single_segment(&members, &[0, 1]),
        )));
        let oracle = LiveOwnership::new(Arc::clone(&manager), members[1].clone());
        let key = CacheKey::from("k");
        assert_eq!(oracle.owner_index(&key), 1);

        manager
            .install(CacheTopology::new(2, single_segment(&members, &[1, 0])))
            .unwrap();
        assert!(oracle.is_primary_owner(&key));
        assert_eq!(oracle.pin().topology_id(), 2);
    }
}
