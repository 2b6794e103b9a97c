//! Reference segmented consistent hash.
//!
//! Keys are bucketed into a fixed number of segments by a BLAKE3 digest of
//! the key bytes. Each segment carries an ordered [`OwnerList`]; index 0 is the
//! primary owner. Production deployments compute ownership elsewhere; this
//! implementation exists so the gate has a concrete, deterministic mapping.

use std::fmt;
use std::sync::Arc;

use shoal_core::{CacheKey, HashConfig, NodeAddress, ShoalResult, TopologyError};

/// Ordered owners of a key. Index 0 is the primary, the rest are backups.
///
/// Cheap to clone; the list is never mutated after construction.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OwnerList(Arc<[NodeAddress]>);

impl OwnerList {
    pub fn new(owners: Vec<NodeAddress>) -> Self {
        Self(Arc::from(owners))
    }

    /// No owners recorded.
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn primary(&self) -> Option<&NodeAddress> {
        self.0.first()
    }

    pub fn backups(&self) -> &[NodeAddress] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Position of `address` in the list, or -1 when it is not an owner.
    pub fn index_of(&self, address: &NodeAddress) -> i32 {
        self.0
            .iter()
            .position(|owner| owner == address)
            .map(|idx| idx as i32)
            .unwrap_or(-1)
    }

    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.0.contains(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeAddress> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[NodeAddress] {
        &self.0
    }
}

impl fmt::Debug for OwnerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|a| a.name())).finish()
    }
}

impl fmt::Display for OwnerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|a| a.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Mapping from key to ordered owner list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistentHash {
    members: Vec<NodeAddress>,
    segment_owners: Vec<OwnerList>,
    replicated: bool,
}

impl ConsistentHash {
    /// Distributed layout: each segment is owned by `num_owners` consecutive
    /// members, starting at `segment % members`.
    pub fn distributed(members: Vec<NodeAddress>, config: HashConfig) -> ShoalResult<Self> {
        if config.num_owners == 0 {
            return Err(TopologyError::InvalidOwnerCount {
                num_owners: config.num_owners,
            }
            .into());
        }
        if config.num_segments == 0 {
            return Err(TopologyError::InvalidSegmentCount {
                num_segments: config.num_segments,
            }
            .into());
        }
        check_members(&members)?;

        let n = members.len();
        let owners_per_segment = config.num_owners.min(n);
        let segment_owners = (0..config.num_segments)
            .map(|segment| {
                let owners = (0..owners_per_segment)
                    .map(|offset| members[(segment + offset) % n].clone())
                    .collect();
                OwnerList::new(owners)
            })
            .collect();

        Ok(Self {
            members,
            segment_owners,
            replicated: false,
        })
    }

    /// Replicated layout: every member owns every segment, primaries rotate.
    pub fn replicated(members: Vec<NodeAddress>, num_segments: usize) -> ShoalResult<Self> {
        if num_segments == 0 {
            return Err(TopologyError::InvalidSegmentCount { num_segments }.into());
        }
        check_members(&members)?;

        let n = members.len();
        let segment_owners = (0..num_segments)
            .map(|segment| {
                let owners = (0..n).map(|offset| members[(segment + offset) % n].clone()).collect();
                OwnerList::new(owners)
            })
            .collect();

        Ok(Self {
            members,
            segment_owners,
            replicated: true,
        })
    }

    /// Explicit layout. Owners must be members and appear at most once per
    /// segment; segments may be empty while ownership is still unknown.
    pub fn from_segments(
        members: Vec<NodeAddress>,
        segments: Vec<Vec<NodeAddress>>,
    ) -> ShoalResult<Self> {
        if segments.is_empty() {
            return Err(TopologyError::InvalidSegmentCount { num_segments: 0 }.into());
        }
        check_members(&members)?;

        let mut segment_owners = Vec::with_capacity(segments.len());
        for owners in segments {
            for (idx, owner) in owners.iter().enumerate() {
                if !members.contains(owner) {
                    return Err(TopologyError::UnknownOwner {
                        member: owner.name().to_string(),
                    }
                    .into());
                }
                if owners[..idx].contains(owner) {
                    return Err(TopologyError::DuplicateMember {
                        member: owner.name().to_string(),
                    }
                    .into());
                }
            }
            segment_owners.push(OwnerList::new(owners));
        }

        Ok(Self {
            members,
            segment_owners,
            replicated: false,
        })
    }

    pub fn members(&self) -> &[NodeAddress] {
        &self.members
    }

    pub fn num_segments(&self) -> usize {
        self.segment_owners.len()
    }

    pub fn is_replicated(&self) -> bool {
        self.replicated
    }

    /// Segment a key hashes to.
    pub fn segment_of(&self, key: &CacheKey) -> usize {
        let digest = blake3::hash(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        (u64::from_le_bytes(prefix) % self.segment_owners.len() as u64) as usize
    }

    pub fn segment_owners(&self, segment: usize) -> OwnerList {
        self.segment_owners
            .get(segment)
            .cloned()
            .unwrap_or_else(OwnerList::empty)
    }

    pub fn locate_owners(&self, key: &CacheKey) -> OwnerList {
        self.segment_owners(self.segment_of(key))
    }

    pub fn locate_primary(&self, key: &CacheKey) -> Option<NodeAddress> {
        self.locate_owners(key).primary().cloned()
    }

    pub fn is_key_local_to_node(&self, address: &NodeAddress, key: &CacheKey) -> bool {
        self.locate_owners(key).contains(address)
    }

    /// Segments in which `address` is primary or backup.
    pub fn segments_for_owner(&self, address: &NodeAddress) -> Vec<usize> {
        self.segment_owners
            .iter()
            .enumerate()
            .filter(|(_, owners)| owners.contains(address))
            .map(|(segment, _)| segment)
            .collect()
    }

    pub fn primary_segments_for_owner(&self, address: &NodeAddress) -> Vec<usize> {
        self.segment_owners
            .iter()
            .enumerate()
            .filter(|(_, owners)| owners.primary() == Some(address))
            .map(|(segment, _)| segment)
            .collect()
    }
}

fn check_members(members: &[NodeAddress]) -> ShoalResult<()> {
    if members.is_empty() {
        return Err(TopologyError::NoMembers.into());
    }
    for (idx, member) in members.iter().enumerate() {
        if members[..idx].contains(member) {
            return Err(TopologyError::DuplicateMember {
                member: member.name().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::ShoalError;

    fn members(n: usize) -> Vec<NodeAddress> {
        (0..n).map(|i| NodeAddress::generate(format!("node-{i}"))).collect()
    }

    #[test]
    fn test_owner_list_index_of() {
        let nodes = members(3);
        let owners = OwnerList::new(vec![nodes[1].clone(), nodes[2].clone()]);
        assert_eq!(owners.index_of(&nodes[1]), 0);
        assert_eq!(owners.index_of(&nodes[2]), 1);
        assert_eq!(owners.index_of(&nodes[0]), -1);
        assert_eq!(owners.primary(), Some(&nodes[1]));
        assert_eq!(owners.backups(), &nodes[2..3]);
    }

    #[test]
    fn test_empty_owner_list() {
        let owners = OwnerList::empty();
        assert!(owners.is_empty());
        assert!(owners.primary().is_none());
        assert!(owners.backups().is_empty());
        assert_eq!(owners.index_of(&NodeAddress::generate("x")), -1);
    }

    #[test]
    fn test_distributed_owner_count() {
        let nodes = members(5);
        let ch = ConsistentHash::distributed(nodes.clone(), HashConfig::new(2, 16)).unwrap();
        for segment in 0..ch.num_segments() {
            let owners = ch.segment_owners(segment);
            assert_eq!(owners.len(), 2);
            assert_eq!(owners.primary(), Some(&nodes[segment % 5]));
        }
    }

    #[test]
    fn test_distributed_caps_owners_at_cluster_size() {
        let ch = ConsistentHash::distributed(members(2), HashConfig::new(3, 4)).unwrap();
        assert_eq!(ch.segment_owners(0).len(), 2);
    }

    #[test]
    fn test_replicated_every_member_owns_every_key() {
        let nodes = members(3);
        let ch = ConsistentHash::replicated(nodes.clone(), 8).unwrap();
        let key = CacheKey::from("k");
        for node in &nodes {
            assert!(ch.is_key_local_to_node(node, &key));
        }
        assert!(ch.is_replicated());
    }

    #[test]
    fn test_segment_of_is_deterministic() {
        let ch = ConsistentHash::distributed(members(3), HashConfig::default()).unwrap();
        let key = CacheKey::from("user:7");
        assert_eq!(ch.segment_of(&key), ch.segment_of(&key.clone()));
        assert!(ch.segment_of(&key) < ch.num_segments());
    }

    #[test]
    fn test_rejects_empty_and_duplicate_members() {
        assert!(matches!(
            ConsistentHash::distributed(vec![], HashConfig::default()),
            Err(ShoalError::Topology(TopologyError::NoMembers))
        ));
        let node = NodeAddress::generate("dup");
        assert!(matches!(
            ConsistentHash::distributed(vec![node.clone(), node], HashConfig::default()),
            Err(ShoalError::Topology(TopologyError::DuplicateMember { .. }))
        ));
    }

    #[test]
    fn test_distributed_rejects_zero_owners_and_segments() {
        assert!(matches!(
            ConsistentHash::distributed(members(3), HashConfig::new(0, 16)),
            Err(ShoalError::Topology(TopologyError::InvalidOwnerCount { num_owners: 0 }))
        ));
        assert!(matches!(
            ConsistentHash::distributed(members(3), HashConfig::new(2, 0)),
            Err(ShoalError::Topology(TopologyError::InvalidSegmentCount { num_segments: 0 }))
        ));
    }

    #[test]
    fn test_from_segments_allows_empty_segment() {
        let nodes = members(2);
        let ch = ConsistentHash::from_segments(nodes.clone(), vec![vec![], vec![nodes[1].clone()]])
            .unwrap();
        assert!(ch.segment_owners(0).is_empty());
        assert_eq!(ch.primary_segments_for_owner(&nodes[1]), vec![1]);
        assert!(ch.segments_for_owner(&nodes[0]).is_empty());
    }

    #[test]
    fn test_from_segments_rejects_foreign_owner() {
        let nodes = members(2);
        let stranger = NodeAddress::generate("stranger");
        assert!(matches!(
            ConsistentHash::from_segments(nodes, vec![vec![stranger]]),
            Err(ShoalError::Topology(TopologyError::UnknownOwner { .. }))
        ));
    }
}
