//! # Storage Module
//!
//! Durable conversation logs.
//!
//! ## Storage Contract
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CONVERSATION STORE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  One log per conversation key (sorted pair of handles).                │
//! │                                                                         │
//! │  load(key)  ──► ordered Vec<Message>, empty if never persisted         │
//! │  save(key)  ──► full-log overwrite, atomic from the caller's view      │
//! │                                                                         │
//! │  Policy: last-writer-wins per key. Exactly one writer context (the     │
//! │  active session) exists at a time by construction; concurrent          │
//! │  sessions for the same pair are out of scope.                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations report failures honestly; the *engine* owns the failure
//! policy (read errors degrade to an empty log, write errors are logged and
//! swallowed). Keeping policy out of the adapters lets a real network-backed
//! message transport slot in behind the same trait.

mod file_store;

pub use file_store::{list_keys, FileStore};

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::chat::{ConversationKey, Message};
use crate::error::Result;

/// Durable keyed log of messages per conversation pair
pub trait ConversationStore: Send + Sync {
    /// Load the log for a key; empty if the pair has never been persisted
    fn load(&self, key: &ConversationKey) -> Result<Vec<Message>>;

    /// Overwrite the full log for a key
    ///
    /// Concurrent partial writes must never be observable by a subsequent
    /// `load`.
    fn save(&self, key: &ConversationKey, messages: &[Message]) -> Result<()>;
}

/// In-memory conversation store for tests and demos
#[derive(Default)]
pub struct MemoryStore {
    logs: RwLock<HashMap<ConversationKey, Vec<Message>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn load(&self, key: &ConversationKey) -> Result<Vec<Message>> {
        Ok(self.logs.read().get(key).cloned().unwrap_or_default())
    }

    fn save(&self, key: &ConversationKey, messages: &[Message]) -> Result<()> {
        self.logs.write().insert(key.clone(), messages.to_vec());
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
