//! # Ambience Core
//!
//! The chat session engine behind Ambience, a demo peer-to-peer chat
//! application gated by a name-registration step: a user claims a unique
//! human-readable handle, links it to a wallet-style identity, and can then
//! exchange text messages with other registered handles.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       AMBIENCE CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Presentation layer (excluded; consumes snapshots only)                │
//! │        │                                                               │
//! │        │  open_conversation / send / simulate_typing                   │
//! │        ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────┐      │
//! │  │                     Chat Session Engine                      │      │
//! │  │                                                              │      │
//! │  │  session state machine · send pipeline · typing indicator   │      │
//! │  │  snapshot feed {messages, currentUser, partner,              │      │
//! │  │                 isLoading, isTyping}                         │      │
//! │  └───┬──────────────┬──────────────┬──────────────┬────────────┘      │
//! │      │              │              │              │                   │
//! │      ▼              ▼              ▼              ▼                   │
//! │  ┌────────┐   ┌──────────┐   ┌──────────┐   ┌───────────────┐        │
//! │  │Registry│   │ Identity │   │ Storage  │   │ Partner       │        │
//! │  │        │   │ Provider │   │          │   │ Activity      │        │
//! │  │ handle │   │ (wallet  │   │ per-pair │   │ Simulator     │        │
//! │  │ → owner│   │ session) │   │ JSON log │   │ (stand-in for │        │
//! │  │ record │   │          │   │          │   │  a transport) │        │
//! │  └────────┘   └──────────┘   └──────────┘   └───────────────┘        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`registry`] - Handle registration boundary (name → identity record)
//! - [`identity`] - Identity resolution, wallet session, presence
//! - [`content`] - Content reference resolution (avatar refs → URLs)
//! - [`storage`] - Durable conversation logs behind a swappable adapter
//! - [`chat`] - Message model, session engine, partner simulator
//! - [`time`] - Clock utilities
//!
//! ## Design Notes
//!
//! There is no real network transport, signing, or registration consensus
//! in this crate: durable local storage stands in for a message transport,
//! and the partner's side of a conversation is simulated. Each of those
//! stand-ins lives behind a trait ([`storage::ConversationStore`],
//! [`chat::PartnerActivity`], [`registry::Registry`],
//! [`identity::IdentityProvider`]) so that real implementations can be
//! substituted without touching the engine's state machine.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod chat;
pub mod content;
pub mod error;
pub mod identity;
pub mod registry;
pub mod storage;
/// Clock utilities.
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use chat::{
    ChatConfig, ChatEngine, ChatSnapshot, ConversationKey, Message, MessageKind, MessageStatus,
    PartnerActivity, RandomPartner, SessionPhase,
};
pub use content::{ContentResolver, LocalContentStore};
pub use error::{Error, Result};
pub use identity::{Identity, IdentityProvider, IdentityResolver, LocalWallet, Presence};
pub use registry::{InMemoryRegistry, Registry, RegistryRecord};
pub use storage::{ConversationStore, FileStore, MemoryStore};

/// Returns the version of Ambience Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
