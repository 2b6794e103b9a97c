//! SHOAL Core - Data Types
//!
//! Commands, contexts, identities, configuration and errors shared by the
//! topology and loader crates. No decision logic lives here.

pub mod command;
pub mod config;
pub mod context;
pub mod enums;
pub mod error;
pub mod flags;
pub mod identity;

pub use command::WriteCommand;
pub use config::{HashConfig, LoaderConfig};
pub use context::InvocationContext;
pub use enums::{CacheMode, CommandKind, LoadType, TransactionMode};
pub use error::{ConfigError, ShoalError, ShoalResult, TopologyError};
pub use flags::CommandFlags;
pub use identity::{CacheKey, NodeAddress};
