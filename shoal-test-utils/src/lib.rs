//! SHOAL Test Utilities
//!
//! Centralized test infrastructure for the SHOAL workspace:
//! - Proptest generators for commands, flags and configurations
//! - Cluster and topology fixtures
//! - Custom assertions for load decisions
//! - A tracing subscriber for test output

// Re-export core types for convenience
pub use shoal_core::{
    CacheKey, CacheMode, CommandFlags, CommandKind, HashConfig, InvocationContext, LoadType,
    LoaderConfig, NodeAddress, ShoalError, ShoalResult, TopologyError, TransactionMode,
    WriteCommand,
};
pub use shoal_loader::{ClusteredLoadGate, LoadDecision, LoadGate, SkipReason};
pub use shoal_topology::{
    CacheTopology, ConsistentHash, OwnershipOracle, PinnedOwnership, TopologyGate,
    TopologyManager,
};

use std::sync::Arc;

/// Install a fmt subscriber honouring `RUST_LOG`, once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating SHOAL inputs.

    use super::*;
    use proptest::prelude::*;

    /// Generate a LoadType variant.
    pub fn arb_load_type() -> impl Strategy<Value = LoadType> {
        prop_oneof![
            Just(LoadType::DontLoad),
            Just(LoadType::Primary),
            Just(LoadType::Owner),
        ]
    }

    /// Generate any combination of command flags.
    pub fn arb_command_flags() -> impl Strategy<Value = CommandFlags> {
        any::<u16>().prop_map(CommandFlags::from_bits_truncate)
    }

    /// Generate a CommandKind variant.
    pub fn arb_command_kind() -> impl Strategy<Value = CommandKind> {
        prop_oneof![
            Just(CommandKind::Put),
            Just(CommandKind::PutIfAbsent),
            Just(CommandKind::Replace),
            Just(CommandKind::Remove),
            Just(CommandKind::Compute),
            Just(CommandKind::ReadWriteKey),
            Just(CommandKind::PutMap),
        ]
    }

    pub fn arb_cache_mode() -> impl Strategy<Value = CacheMode> {
        prop_oneof![
            Just(CacheMode::Replicated),
            Just(CacheMode::Invalidation),
            Just(CacheMode::Distributed),
        ]
    }

    pub fn arb_transaction_mode() -> impl Strategy<Value = TransactionMode> {
        prop_oneof![
            Just(TransactionMode::NonTransactional),
            Just(TransactionMode::Transactional),
        ]
    }

    /// Generate a valid clustered loader configuration.
    pub fn arb_loader_config() -> impl Strategy<Value = LoaderConfig> {
        (arb_cache_mode(), arb_transaction_mode()).prop_map(|(cache_mode, transaction_mode)| {
            LoaderConfig::new()
                .with_cache_mode(cache_mode)
                .with_transaction_mode(transaction_mode)
        })
    }

    /// Generate a short printable key.
    pub fn arb_key() -> impl Strategy<Value = CacheKey> {
        "[a-z0-9:]{1,16}".prop_map(CacheKey::from)
    }

    /// Generate a single-key write command with arbitrary load type and flags.
    pub fn arb_write_command() -> impl Strategy<Value = WriteCommand> {
        (arb_command_kind(), arb_key(), arb_load_type(), arb_command_flags()).prop_map(
            |(kind, key, load_type, flags)| {
                WriteCommand::single(kind, key)
                    .with_load_type(load_type)
                    .with_flags(flags)
            },
        )
    }

    /// Generate an owner layout for a cluster of `size` members: the owner
    /// indices in order, each member at most once.
    pub fn arb_owner_layout(size: usize) -> impl Strategy<Value = Vec<usize>> {
        Just((0..size).collect::<Vec<usize>>())
            .prop_shuffle()
            .prop_flat_map(move |order| (Just(order), 0..=size))
            .prop_map(|(order, count)| order.into_iter().take(count).collect())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built clusters and commands for common testing scenarios.

    use super::*;

    /// Generate `n` member addresses named `node-0` .. `node-{n-1}`.
    pub fn members(n: usize) -> Vec<NodeAddress> {
        (0..n)
            .map(|i| NodeAddress::new(uuid::Uuid::now_v7(), format!("node-{i}")))
            .collect()
    }

    /// Single-segment hash: every key is owned by `owners` (indices into
    /// `members`, primary first).
    pub fn single_segment_hash(members: &[NodeAddress], owners: &[usize]) -> ConsistentHash {
        let owners = owners.iter().map(|&i| members[i].clone()).collect();
        match ConsistentHash::from_segments(members.to_vec(), vec![owners]) {
            Ok(ch) => ch,
            Err(e) => panic!("invalid fixture layout: {e}"),
        }
    }

    /// A cluster whose topology can be swapped under running gates.
    pub struct ClusterFixture {
        pub members: Vec<NodeAddress>,
        pub manager: Arc<TopologyManager>,
    }

    impl ClusterFixture {
        /// `size` members, every key owned by `owners`, join complete.
        pub fn new(size: usize, owners: &[usize]) -> Self {
            Self::with_join(size, owners, true)
        }

        pub fn with_join(size: usize, owners: &[usize], join_complete: bool) -> Self {
            let members = members(size);
            let topology = CacheTopology::new(1, single_segment_hash(&members, owners))
                .with_join_complete(join_complete);
            Self {
                manager: Arc::new(TopologyManager::new(topology)),
                members,
            }
        }

        /// Publish a new layout with the next topology id.
        pub fn reassign(&self, owners: &[usize]) -> Arc<CacheTopology> {
            let current = self.manager.current_topology();
            let next = CacheTopology::new(
                current.topology_id() + 1,
                single_segment_hash(&self.members, owners),
            )
            .with_join_complete(current.is_join_complete());
            match self.manager.install(next) {
                Ok(topology) => topology,
                Err(e) => panic!("fixture install failed: {e}"),
            }
        }

        /// Gate running on member `local`.
        pub fn gate(&self, local: usize, config: LoaderConfig) -> ClusteredLoadGate<TopologyManager> {
            ClusteredLoadGate::new(
                config,
                self.members[local].clone(),
                Arc::clone(&self.manager),
            )
        }

        /// Context for a write replicated from member `origin`.
        pub fn remote_ctx(&self, origin: usize) -> InvocationContext {
            InvocationContext::remote(self.members[origin].clone())
        }
    }

    /// Non-transactional distributed configuration.
    pub fn dist_config() -> LoaderConfig {
        LoaderConfig::new()
            .with_cache_mode(CacheMode::Distributed)
            .with_transaction_mode(TransactionMode::NonTransactional)
    }

    /// Transactional distributed configuration.
    pub fn tx_config() -> LoaderConfig {
        dist_config().with_transaction_mode(TransactionMode::Transactional)
    }

    /// Single-key command on key `"k"`.
    pub fn command(load_type: LoadType, flags: CommandFlags) -> WriteCommand {
        WriteCommand::single(CommandKind::Put, "k")
            .with_load_type(load_type)
            .with_flags(flags)
    }

    pub fn key() -> CacheKey {
        CacheKey::from("k")
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for load decisions and topology errors.

    use super::*;

    /// Assert that a decision loads.
    #[track_caller]
    pub fn assert_loads(decision: LoadDecision) {
        assert!(decision.is_load(), "Expected load, got {}", decision);
    }

    /// Assert that a decision skips for `reason`.
    #[track_caller]
    pub fn assert_skips(decision: LoadDecision, reason: SkipReason) {
        assert_eq!(
            decision,
            LoadDecision::Skip(reason),
            "Expected skip ({}), got {}",
            reason,
            decision
        );
    }

    /// Assert that a ShoalResult is a Topology error.
    #[track_caller]
    pub fn assert_topology_error<T: std::fmt::Debug>(result: &ShoalResult<T>) {
        match result {
            Err(ShoalError::Topology(_)) => {}
            other => panic!("Expected Topology error, got: {:?}", other),
        }
    }
}

// ============================================================================
// SELF TESTS
// ============================================================================
