//! Base load policy and the gate contract.
//!
//! The base policy is what a non-clustered cache applies: load unless the
//! command never needs the previous value or the caller forbids loading.
//! Clustered gates wrap it and only ever add reasons to skip.

use shoal_core::{CacheKey, CommandFlags, InvocationContext, LoadType, WriteCommand};

use crate::decision::{LoadDecision, SkipReason};

/// Per-command skip rule consulted once readiness checks have passed.
pub trait LoadPolicy: Send + Sync {
    /// Reason to skip loading `key` for `command`, or `None` to load.
    fn skip_for_write(
        &self,
        command: &WriteCommand,
        key: &CacheKey,
        ctx: &InvocationContext,
    ) -> Option<SkipReason>;
}

/// Always load unless explicitly skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseLoadPolicy;

impl LoadPolicy for BaseLoadPolicy {
    fn skip_for_write(
        &self,
        command: &WriteCommand,
        _key: &CacheKey,
        _ctx: &InvocationContext,
    ) -> Option<SkipReason> {
        if command.load_type() == LoadType::DontLoad {
            return Some(SkipReason::DontLoad);
        }
        if command.has_flag(CommandFlags::SKIP_CACHE_LOAD) {
            return Some(SkipReason::SkipLoadFlag);
        }
        None
    }
}

/// Decides, per write, whether the store must be read first.
pub trait LoadGate: Send + Sync {
    /// Decision for one affected key.
    fn decide(
        &self,
        command: &WriteCommand,
        key: &CacheKey,
        ctx: &InvocationContext,
    ) -> LoadDecision;

    /// Affected keys that must be loaded before `command` is applied.
    fn keys_to_load(&self, command: &WriteCommand, ctx: &InvocationContext) -> Vec<CacheKey> {
        command
            .keys()
            .iter()
            .filter(|key| self.decide(command, key, ctx).is_load())
            .cloned()
            .collect()
    }

    /// True when at least one affected key must be loaded.
    fn should_load(&self, command: &WriteCommand, ctx: &InvocationContext) -> bool {
        command
            .keys()
            .iter()
            .any(|key| self.decide(command, key, ctx).is_load())
    }
}

/// Gate for caches without clustering: the base policy plus the context
/// entry check.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLoadGate<P: LoadPolicy = BaseLoadPolicy> {
    policy: P,
}

impl<P: LoadPolicy> LocalLoadGate<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }
}

impl<P: LoadPolicy> LoadGate for LocalLoadGate<P> {
    fn decide(
        &self,
        command: &WriteCommand,
        key: &CacheKey,
        ctx: &InvocationContext,
    ) -> LoadDecision {
        if ctx.has_entry_value(key) {
            return LoadDecision::Skip(SkipReason::AlreadyInContext);
        }
        self.policy.skip_for_write(command, key, ctx).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::CommandKind;

    fn command(load_type: LoadType) -> WriteCommand {
        WriteCommand::single(CommandKind::Put, "k").with_load_type(load_type)
    }

    #[test]
    fn test_base_policy_table() {
        let key = CacheKey::from("k");
        let ctx = InvocationContext::local();
        let base = BaseLoadPolicy;

        assert_eq!(
            base.skip_for_write(&command(LoadType::DontLoad), &key, &ctx),
            Some(SkipReason::DontLoad)
        );
        assert_eq!(base.skip_for_write(&command(LoadType::Primary), &key, &ctx), None);
        assert_eq!(base.skip_for_write(&command(LoadType::Owner), &key, &ctx), None);
        assert_eq!(
            base.skip_for_write(
                &command(LoadType::Owner).with_flags(CommandFlags::SKIP_CACHE_LOAD),
                &key,
                &ctx
            ),
            Some(SkipReason::SkipLoadFlag)
        );
    }

    #[test]
    fn test_local_gate_skips_entries_in_context() {
        let gate = LocalLoadGate::<BaseLoadPolicy>::default();
        let cmd = WriteCommand::multi(CommandKind::PutMap, ["a", "b"])
            .with_load_type(LoadType::Primary);
        let ctx = InvocationContext::local().with_entry("a");

        assert_eq!(
            gate.decide(&cmd, &CacheKey::from("a"), &ctx),
            LoadDecision::Skip(SkipReason::AlreadyInContext)
        );
        assert_eq!(gate.keys_to_load(&cmd, &ctx), vec![CacheKey::from("b")]);
        assert!(gate.should_load(&cmd, &ctx));
    }

    #[test]
    fn test_local_gate_commands_without_keys_never_load() {
        let gate = LocalLoadGate::<BaseLoadPolicy>::default();
        let cmd = WriteCommand::multi(CommandKind::PutMap, Vec::<CacheKey>::new())
            .with_load_type(LoadType::Owner);
        assert!(!gate.should_load(&cmd, &InvocationContext::local()));
    }
}
