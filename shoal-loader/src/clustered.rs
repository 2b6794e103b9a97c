//! Ownership-aware load gate for clustered caches.
//!
//! A write reaching this gate is checked in three stages, all against the
//! same topology snapshot:
//!
//! 1. readiness: join complete, entry not already in context, key local to
//!    the read hash (distributed caches only);
//! 2. the ownership rule for the command's [`LoadType`], which differs
//!    between transactional and non-transactional caches;
//! 3. the wrapped base policy.
//!
//! Stage 2 can only add reasons to skip. A `CACHE_MODE_LOCAL` command ends at
//! stage 2 with "skip iff `SKIP_CACHE_LOAD`".

use std::sync::Arc;

use shoal_core::{
    CacheKey, CommandFlags, InvocationContext, LoadType, LoaderConfig, NodeAddress, WriteCommand,
};
use shoal_topology::{CacheTopology, OwnershipOracle, PinnedOwnership, TopologyGate};
use tracing::{debug, trace};

use crate::decision::{LoadDecision, SkipReason};
use crate::policy::{BaseLoadPolicy, LoadGate, LoadPolicy};
use crate::stats::LoadGateStats;

/// Outcome of the ownership rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipVerdict {
    /// Skip, whatever the base policy says.
    Skip(SkipReason),
    /// Forced-local command: this is the final answer.
    Final(LoadDecision),
    /// No ownership objection; ask the base policy.
    Delegate,
}

/// The ownership rule for one key.
///
/// Pure: the answer depends only on the arguments, and `ownership` is read
/// for at most one question.
pub fn ownership_rule<O: OwnershipOracle + ?Sized>(
    transactional: bool,
    command: &WriteCommand,
    key: &CacheKey,
    origin_local: bool,
    ownership: &O,
) -> OwnershipVerdict {
    if transactional {
        // OWNER writes compute the new value from the old one, so every owner
        // loads. For the other types the originator already saw the value.
        if !origin_local && command.load_type() != LoadType::Owner {
            return OwnershipVerdict::Skip(SkipReason::RemoteTransactional);
        }
        return OwnershipVerdict::Delegate;
    }

    match command.load_type() {
        LoadType::DontLoad => OwnershipVerdict::Skip(SkipReason::DontLoad),
        LoadType::Primary => {
            if let Some(verdict) = forced_local(command) {
                return verdict;
            }
            if !ownership.is_primary_owner(key) {
                return OwnershipVerdict::Skip(SkipReason::NotPrimaryOwner);
            }
            OwnershipVerdict::Delegate
        }
        LoadType::Owner => {
            if let Some(verdict) = forced_local(command) {
                return verdict;
            }
            let index = ownership.owner_index(key);
            if index != 0 && (index < 0 || origin_local) {
                let reason = if index < 0 {
                    SkipReason::NotOwner
                } else {
                    SkipReason::BackupOriginLocal
                };
                return OwnershipVerdict::Skip(reason);
            }
            OwnershipVerdict::Delegate
        }
    }
}

fn forced_local(command: &WriteCommand) -> Option<OwnershipVerdict> {
    if !command.has_flag(CommandFlags::CACHE_MODE_LOCAL) {
        return None;
    }
    let decision = if command.has_flag(CommandFlags::SKIP_CACHE_LOAD) {
        LoadDecision::Skip(SkipReason::SkipLoadFlag)
    } else {
        LoadDecision::Load
    };
    Some(OwnershipVerdict::Final(decision))
}

/// Load gate for clustered caches.
///
/// Construct once per cache; `config` is fixed for the gate's lifetime.
pub struct ClusteredLoadGate<G: TopologyGate, P: LoadPolicy = BaseLoadPolicy> {
    config: LoaderConfig,
    local: NodeAddress,
    topology: Arc<G>,
    base: P,
    stats: Option<Arc<LoadGateStats>>,
}

impl<G: TopologyGate> ClusteredLoadGate<G, BaseLoadPolicy> {
    pub fn new(config: LoaderConfig, local: NodeAddress, topology: Arc<G>) -> Self {
        Self::with_policy(config, local, topology, BaseLoadPolicy)
    }
}

impl<G: TopologyGate, P: LoadPolicy> ClusteredLoadGate<G, P> {
    pub fn with_policy(
        config: LoaderConfig,
        local: NodeAddress,
        topology: Arc<G>,
        base: P,
    ) -> Self {
        debug!(
            local = %local,
            cache_mode = %config.cache_mode,
            transactional = config.is_transactional(),
            "Clustered load gate started"
        );
        let stats = config.stats_enabled.then(|| Arc::new(LoadGateStats::new()));
        Self {
            config,
            local,
            topology,
            base,
            stats,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn local_address(&self) -> &NodeAddress {
        &self.local
    }

    pub fn topology(&self) -> &G {
        &self.topology
    }

    /// Counters, when enabled in the configuration.
    pub fn stats(&self) -> Option<&Arc<LoadGateStats>> {
        self.stats.as_ref()
    }

    /// Readiness check: join complete, no value already in context and, for
    /// distributed caches, the key is in this node's read hash. Forced-local
    /// PRIMARY and OWNER writes in a non-transactional cache skip the
    /// read-hash test, never the join test. Transactional caches always
    /// apply it.
    pub fn can_load(
        &self,
        topology: &CacheTopology,
        command: &WriteCommand,
        key: &CacheKey,
        ctx: &InvocationContext,
    ) -> Result<(), SkipReason> {
        if !topology.is_join_complete() {
            return Err(SkipReason::JoinIncomplete);
        }
        if ctx.has_entry_value(key) {
            return Err(SkipReason::AlreadyInContext);
        }
        if self.config.is_distributed()
            && !self.bypasses_locality(command)
            && !topology.is_read_owner(&self.local, key)
        {
            trace!(
                command_id = %command.command_id(),
                key = %key,
                topology_id = topology.topology_id(),
                "Skip load, key is not local to the read hash"
            );
            return Err(SkipReason::KeyNotLocal);
        }
        Ok(())
    }

    /// The cases where the ownership rule ends in a forced-local verdict.
    fn bypasses_locality(&self, command: &WriteCommand) -> bool {
        !self.config.is_transactional()
            && command.load_type() != LoadType::DontLoad
            && command.has_flag(CommandFlags::CACHE_MODE_LOCAL)
    }

    /// Decide for `key` against a snapshot the caller already holds.
    pub fn decide_in(
        &self,
        topology: &CacheTopology,
        command: &WriteCommand,
        key: &CacheKey,
        ctx: &InvocationContext,
    ) -> LoadDecision {
        let decision = self.evaluate(topology, command, key, ctx);
        if let Some(stats) = &self.stats {
            stats.record(decision);
        }
        decision
    }

    fn evaluate(
        &self,
        topology: &CacheTopology,
        command: &WriteCommand,
        key: &CacheKey,
        ctx: &InvocationContext,
    ) -> LoadDecision {
        if let Err(reason) = self.can_load(topology, command, key, ctx) {
            return LoadDecision::Skip(reason);
        }

        let ownership = PinnedOwnership::new(topology, &self.local);
        match ownership_rule(
            self.config.is_transactional(),
            command,
            key,
            ctx.is_origin_local(),
            &ownership,
        ) {
            OwnershipVerdict::Skip(reason) => {
                if reason.is_ownership() {
                    trace!(
                        command_id = %command.command_id(),
                        key = %key,
                        reason = %reason,
                        owners = %ownership.owners(key),
                        "Skip load for command"
                    );
                }
                LoadDecision::Skip(reason)
            }
            OwnershipVerdict::Final(decision) => decision,
            OwnershipVerdict::Delegate => self.base.skip_for_write(command, key, ctx).into(),
        }
    }

    /// All keys of `command` decided against one snapshot.
    pub fn plan(
        &self,
        command: &WriteCommand,
        ctx: &InvocationContext,
    ) -> Vec<(CacheKey, LoadDecision)> {
        let topology = self.topology.current_topology();
        command
            .keys()
            .iter()
            .map(|key| (key.clone(), self.decide_in(&topology, command, key, ctx)))
            .collect()
    }
}

impl<G: TopologyGate, P: LoadPolicy> LoadGate for ClusteredLoadGate<G, P> {
    fn decide(
        &self,
        command: &WriteCommand,
        key: &CacheKey,
        ctx: &InvocationContext,
    ) -> LoadDecision {
        let topology = self.topology.current_topology();
        self.decide_in(&topology, command, key, ctx)
    }

    fn keys_to_load(&self, command: &WriteCommand, ctx: &InvocationContext) -> Vec<CacheKey> {
        self.plan(command, ctx)
            .into_iter()
            .filter(|(_, decision)| decision.is_load())
            .map(|(key, _)| key)
            .collect()
    }

    fn should_load(&self, command: &WriteCommand, ctx: &InvocationContext) -> bool {
        let topology = self.topology.current_topology();
        command
            .keys()
            .iter()
            .any(|key| self.decide_in(&topology, command, key, ctx).is_load())
    }
}

impl<G: TopologyGate, P: LoadPolicy> std::fmt::Debug for ClusteredLoadGate<G, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusteredLoadGate")
            .field("config", &self.config)
            .field("local", &self.local)
            .finish()
    }
}
