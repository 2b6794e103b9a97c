//! Decision outcomes and skip reasons.

use std::fmt;

pub(crate) const REASON_COUNT: usize = 9;

/// Why the gate decided not to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// This node has not finished its join or rebalance.
    JoinIncomplete,
    /// Distributed cache and the read hash does not map the key here.
    KeyNotLocal,
    /// The entry already holds a value in the invocation context.
    AlreadyInContext,
    /// Transactional write replicated from the originator.
    RemoteTransactional,
    /// The command never needs the previous value.
    DontLoad,
    /// The caller set `SKIP_CACHE_LOAD`.
    SkipLoadFlag,
    /// `PRIMARY` load type and this node is not the primary owner.
    NotPrimaryOwner,
    /// `OWNER` load type and this node does not own the key.
    NotOwner,
    /// `OWNER` load type, this node is a backup and the write started here.
    BackupOriginLocal,
}

impl SkipReason {
    pub const ALL: [SkipReason; REASON_COUNT] = [
        SkipReason::JoinIncomplete,
        SkipReason::KeyNotLocal,
        SkipReason::AlreadyInContext,
        SkipReason::RemoteTransactional,
        SkipReason::DontLoad,
        SkipReason::SkipLoadFlag,
        SkipReason::NotPrimaryOwner,
        SkipReason::NotOwner,
        SkipReason::BackupOriginLocal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::JoinIncomplete => "join_incomplete",
            SkipReason::KeyNotLocal => "key_not_local",
            SkipReason::AlreadyInContext => "already_in_context",
            SkipReason::RemoteTransactional => "remote_transactional",
            SkipReason::DontLoad => "dont_load",
            SkipReason::SkipLoadFlag => "skip_load_flag",
            SkipReason::NotPrimaryOwner => "not_primary_owner",
            SkipReason::NotOwner => "not_owner",
            SkipReason::BackupOriginLocal => "backup_origin_local",
        }
    }

    /// True for reasons derived from ownership rather than readiness or flags.
    pub fn is_ownership(&self) -> bool {
        matches!(
            self,
            SkipReason::KeyNotLocal
                | SkipReason::NotPrimaryOwner
                | SkipReason::NotOwner
                | SkipReason::BackupOriginLocal
        )
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one load decision for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadDecision {
    Load,
    Skip(SkipReason),
}

impl LoadDecision {
    pub fn is_load(&self) -> bool {
        matches!(self, LoadDecision::Load)
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            LoadDecision::Load => None,
            LoadDecision::Skip(reason) => Some(*reason),
        }
    }
}

impl From<Option<SkipReason>> for LoadDecision {
    fn from(reason: Option<SkipReason>) -> Self {
        reason.map_or(LoadDecision::Load, LoadDecision::Skip)
    }
}

impl fmt::Display for LoadDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadDecision::Load => f.write_str("load"),
            LoadDecision::Skip(reason) => write!(f, "skip ({})", reason),
        }
    }
}
