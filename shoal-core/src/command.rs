//! Write commands as seen by the load gate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{CommandKind, LoadType};
use crate::flags::CommandFlags;
use crate::identity::CacheKey;

/// A write entering the cache.
///
/// Only the parts the load gate reads are modelled here: the affected keys,
/// the declared [`LoadType`] and the caller's [`CommandFlags`]. The value
/// payload travels elsewhere. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCommand {
    command_id: Uuid,
    kind: CommandKind,
    keys: Vec<CacheKey>,
    load_type: LoadType,
    flags: CommandFlags,
}

impl WriteCommand {
    /// Single-key command with the kind's default load type.
    pub fn single(kind: CommandKind, key: impl Into<CacheKey>) -> Self {
        Self {
            command_id: Uuid::now_v7(),
            kind,
            keys: vec![key.into()],
            load_type: kind.default_load_type(),
            flags: CommandFlags::empty(),
        }
    }

    /// Multi-key command. Duplicate keys are collapsed, first occurrence wins.
    pub fn multi<I, K>(kind: CommandKind, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<CacheKey>,
    {
        let mut unique: Vec<CacheKey> = Vec::new();
        for key in keys {
            let key = key.into();
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        Self {
            command_id: Uuid::now_v7(),
            kind,
            keys: unique,
            load_type: kind.default_load_type(),
            flags: CommandFlags::empty(),
        }
    }

    /// Override the declared load type.
    pub fn with_load_type(mut self, load_type: LoadType) -> Self {
        self.load_type = load_type;
        self
    }

    /// Add flags to the command.
    pub fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn command_id(&self) -> Uuid {
        self.command_id
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn keys(&self) -> &[CacheKey] {
        &self.keys
    }

    /// The first affected key, if any.
    pub fn key(&self) -> Option<&CacheKey> {
        self.keys.first()
    }

    pub fn affects_key(&self, key: &CacheKey) -> bool {
        self.keys.contains(key)
    }

    pub fn load_type(&self) -> LoadType {
        self.load_type
    }

    pub fn flags(&self) -> CommandFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: CommandFlags) -> bool {
        self.flags.contains(flag)
    }
}
