//! Per-operation invocation context

use std::collections::HashSet;
use uuid::Uuid;

use crate::identity::{CacheKey, NodeAddress};

/// Execution context of one cache operation.
///
/// Created when the operation starts and dropped when it ends; never
/// shared between operations.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    origin_local: bool,
    origin: Option<NodeAddress>,
    transaction_id: Option<Uuid>,
    /// Keys whose entries were already looked up with a value present.
    loaded: HashSet<CacheKey>,
}

impl InvocationContext {
    /// Context for an operation invoked by the application on this node.
    pub fn local() -> Self {
        Self {
            origin_local: true,
            ..Self::default()
        }
    }

    /// Context for an operation replicated from another member.
    pub fn remote(origin: NodeAddress) -> Self {
        Self {
            origin_local: false,
            origin: Some(origin),
            ..Self::default()
        }
    }

    /// Attach the surrounding transaction.
    pub fn in_transaction(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Record that the entry for `key` is already in context with a value.
    pub fn with_entry(mut self, key: impl Into<CacheKey>) -> Self {
        self.loaded.insert(key.into());
        self
    }

    /// Record an entry found during execution.
    pub fn put_entry(&mut self, key: CacheKey) {
        self.loaded.insert(key);
    }

    pub fn is_origin_local(&self) -> bool {
        self.origin_local
    }

    /// Member that invoked the operation, when it was not this node.
    pub fn origin(&self) -> Option<&NodeAddress> {
        self.origin.as_ref()
    }

    pub fn transaction_id(&self) -> Option<Uuid> {
        self.transaction_id
    }

    pub fn is_in_tx_scope(&self) -> bool {
        self.transaction_id.is_some()
    }

    /// True when the entry for `key` already holds a value in this context.
    pub fn has_entry_value(&self, key: &CacheKey) -> bool {
        self.loaded.contains(key)
    }
}
