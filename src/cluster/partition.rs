//! Partition snapshots.
//!
//! A snapshot is the read-only view of one partition that the polling loop
//! hands to an operator. It must stay internally consistent for the duration
//! of a single `check` or `influence` call.

use serde::{Deserialize, Serialize};

use super::{PartitionId, PeerId, StoreId};

/// One replica of a partition, hosted on a store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Peer {
    /// Peer identifier.
    pub id: PeerId,
    /// Store hosting the peer.
    pub store_id: StoreId,
}

/// Observed state of a partition at one instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionSnapshot {
    /// Partition identifier.
    pub id: PartitionId,
    /// Current leader, if one is elected.
    #[serde(default)]
    pub leader: Option<Peer>,
    /// All replicas, leader included.
    #[serde(default)]
    pub peers: Vec<Peer>,
    /// Replicas that have not caught up with the leader yet.
    #[serde(default)]
    pub pending_peers: Vec<Peer>,
    /// Approximate partition size, in the scheduler's size unit.
    #[serde(default)]
    pub approximate_size: i64,
}

impl Peer {
    /// Creates a new peer.
    #[must_use]
    pub const fn new(id: PeerId, store_id: StoreId) -> Self {
        Self { id, store_id }
    }
}

impl PartitionSnapshot {
    /// Creates an empty snapshot with no replicas.
    #[must_use]
    pub const fn new(id: PartitionId, approximate_size: i64) -> Self {
        Self {
            id,
            leader: None,
            peers: Vec::new(),
            pending_peers: Vec::new(),
            approximate_size,
        }
    }

    /// Adds a replica.
    #[must_use]
    pub fn with_peer(mut self, peer: Peer) -> Self {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
        }
        self
    }

    /// Adds a replica and makes it the leader.
    #[must_use]
    pub fn with_leader(mut self, peer: Peer) -> Self {
        self = self.with_peer(peer);
        self.leader = Some(peer);
        self
    }

    /// Adds a replica that is still catching up.
    #[must_use]
    pub fn with_pending(mut self, peer: Peer) -> Self {
        self = self.with_peer(peer);
        if !self.pending_peers.contains(&peer) {
            self.pending_peers.push(peer);
        }
        self
    }

    /// Returns the store hosting the leader.
    #[must_use]
    pub fn leader_store_id(&self) -> Option<StoreId> {
        self.leader.map(|l| l.store_id)
    }

    /// Returns the replica hosted on `store_id`.
    #[must_use]
    pub fn store_peer(&self, store_id: StoreId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.store_id == store_id)
    }

    /// Returns the pending replica with id `peer_id`.
    #[must_use]
    pub fn pending_peer(&self, peer_id: PeerId) -> Option<&Peer> {
        self.pending_peers.iter().find(|p| p.id == peer_id)
    }

    /// Returns the non-leader replicas, ordered by store id.
    #[must_use]
    pub fn followers(&self) -> Vec<&Peer> {
        let leader_id = self.leader.map(|l| l.id);
        let mut followers: Vec<&Peer> = self
            .peers
            .iter()
            .filter(|p| Some(p.id) != leader_id)
            .collect();
        followers.sort_by_key(|p| p.store_id);
        followers
    }

    /// Picks a follower to take over leadership.
    ///
    /// Selection is pinned to the lowest store id so that operators built
    /// from the same snapshot are identical across runs.
    #[must_use]
    pub fn follower(&self) -> Option<&Peer> {
        self.follower_excluding(&[])
    }

    /// Picks the lowest-store follower not hosted on any of `stores`.
    #[must_use]
    pub fn follower_excluding(&self, stores: &[StoreId]) -> Option<&Peer> {
        self.followers()
            .into_iter()
            .find(|p| !stores.contains(&p.store_id))
    }

    /// Returns the stores hosting a replica, in ascending order.
    #[must_use]
    pub fn store_ids(&self) -> Vec<StoreId> {
        let mut stores: Vec<StoreId> = self.peers.iter().map(|p| p.store_id).collect();
        stores.sort_unstable();
        stores
    }
}

impl std::fmt::Display for PartitionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "partition {} [", self.id)?;
        for (i, peer) in self.peers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}@{}", peer.id, peer.store_id)?;
            if self.leader.is_some_and(|l| l.id == peer.id) {
                write!(f, "*")?;
            }
            if self.pending_peer(peer.id).is_some() {
                write!(f, "~")?;
            }
        }
        write!(f, "] size {}", self.approximate_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_replicas() -> PartitionSnapshot {
        PartitionSnapshot::new(1, 100)
            .with_leader(Peer::new(11, 1))
            .with_peer(Peer::new(13, 3))
            .with_peer(Peer::new(12, 2))
    }

    #[test]
    fn test_follower_is_lowest_store() {
        let snapshot = three_replicas();
        assert_eq!(snapshot.follower().map(|p| p.store_id), Some(2));
        assert_eq!(
            snapshot.follower_excluding(&[2]).map(|p| p.store_id),
            Some(3)
        );
        assert!(snapshot.follower_excluding(&[2, 3]).is_none());
    }

    #[test]
    fn test_single_replica_has_no_follower() {
        let snapshot = PartitionSnapshot::new(1, 10).with_leader(Peer::new(11, 1));
        assert!(snapshot.follower().is_none());
        assert_eq!(snapshot.leader_store_id(), Some(1));
    }

    #[test]
    fn test_lookups() {
        let snapshot = three_replicas().with_pending(Peer::new(14, 4));
        assert_eq!(snapshot.store_peer(4).map(|p| p.id), Some(14));
        assert!(snapshot.pending_peer(14).is_some());
        assert!(snapshot.pending_peer(12).is_none());
        assert!(snapshot.store_peer(9).is_none());
        assert_eq!(snapshot.store_ids(), vec![1, 2, 3, 4]);
        assert_eq!(snapshot.to_string(), "partition 1 [11@1*, 13@3, 12@2, 14@4~] size 100");
    }

    #[test]
    fn test_parse_yaml_snapshot() {
        let yaml = r"
id: 5
leader: { id: 51, store_id: 1 }
peers:
  - { id: 51, store_id: 1 }
  - { id: 52, store_id: 2 }
approximate_size: 64
";
        let snapshot: PartitionSnapshot = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(snapshot.id, 5);
        assert_eq!(snapshot.leader_store_id(), Some(1));
        assert!(snapshot.pending_peers.is_empty());
        assert_eq!(snapshot.follower().map(|p| p.id), Some(52));
    }
}
