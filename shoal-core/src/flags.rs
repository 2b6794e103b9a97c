//! Per-command override flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags a caller attaches to a write command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u16 {
        /// Treat the command as node-local regardless of topology
        const CACHE_MODE_LOCAL = 0b0000_0001;
        /// Never load from the store, even when otherwise required
        const SKIP_CACHE_LOAD = 0b0000_0010;
        /// Do not fetch the value from other members
        const SKIP_REMOTE_LOOKUP = 0b0000_0100;
        /// Caller does not read the previous value
        const IGNORE_RETURN_VALUES = 0b0000_1000;
        /// Acquire the write lock even for reads
        const FORCE_WRITE_LOCK = 0b0001_0000;
        /// Command was issued by state transfer
        const PUT_FOR_STATE_TRANSFER = 0b0010_0000;
    }
}

impl Default for CommandFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// Manual serde implementation for CommandFlags (bitflags 2.x + serde)
impl Serialize for CommandFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CommandFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u16::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid CommandFlags bits: {:#06x}", bits))
        })
    }
}
