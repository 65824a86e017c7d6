//! # Identity Module
//!
//! Resolved chat identities and the boundaries they come from.
//!
//! ## Identity Resolution
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       IDENTITY RESOLUTION                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  IdentityProvider ──► current_owner_id() ──┐                           │
//! │  (wallet session)                          │                           │
//! │                                            ▼                           │
//! │                              ┌───────────────────────┐                 │
//! │   resolve_self(owner_id) ───►│   IdentityResolver    │                 │
//! │   resolve_partner(handle) ──►│                       │                 │
//! │                              │  Registry lookup      │                 │
//! │                              │  + record cache       │                 │
//! │                              │  + presence synthesis │                 │
//! │                              └───────────┬───────────┘                 │
//! │                                          │                             │
//! │                                          ▼                             │
//! │                              Identity { id, handle,                    │
//! │                                display_name, avatar_ref,               │
//! │                                is_online, last_seen_at }               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An [`Identity`] is a registry record joined with session-derived presence.
//! Presence is cosmetic: it is synthesized fresh on every resolution and is
//! never persisted, and nothing in message ordering or the delivery state
//! machine depends on it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::chat::simulator::PartnerActivity;
use crate::error::{Error, Result};
use crate::registry::{Registry, RegistryRecord};

/// A resolved chat identity
///
/// Everything except `is_online` and `last_seen_at` comes from the registry
/// record and is immutable after registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Owner key (wallet address)
    pub id: String,
    /// Unique registered handle
    pub handle: String,
    /// Human-readable display name
    pub display_name: String,
    /// Opaque content reference for the avatar (may be empty)
    pub avatar_ref: String,
    /// Whether the user currently appears online (session-derived)
    pub is_online: bool,
    /// When the user was last seen, Unix millis (session-derived)
    pub last_seen_at: i64,
}

impl Identity {
    /// Join a registry record with a presence value
    pub fn from_record(record: RegistryRecord, presence: Presence) -> Self {
        Self {
            id: record.owner_id,
            handle: record.handle,
            display_name: record.display_name,
            avatar_ref: record.avatar_ref,
            is_online: presence.is_online,
            last_seen_at: presence.last_seen_at,
        }
    }
}

/// Session-derived liveness for an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    /// Whether the user currently appears online
    pub is_online: bool,
    /// When the user was last seen (Unix millis)
    pub last_seen_at: i64,
}

impl Presence {
    /// Presence for the active user: online, seen now
    pub fn active_now() -> Self {
        Self {
            is_online: true,
            last_seen_at: crate::time::now_timestamp_millis(),
        }
    }
}

/// Identity provider boundary
///
/// Supplies the active user's owner key. Backed by the wallet session:
/// connecting yields an owner id, disconnecting clears it.
pub trait IdentityProvider: Send + Sync {
    /// The currently connected owner key, if any
    fn current_owner_id(&self) -> Option<String>;
}

/// Wallet-session identity provider for the demo
///
/// Holds the connected owner key behind a lock so connect/disconnect from
/// the presentation layer is immediately visible to the engine.
#[derive(Default)]
pub struct LocalWallet {
    owner: RwLock<Option<String>>,
}

impl LocalWallet {
    /// Create a disconnected wallet session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an already-connected wallet session
    pub fn connected(owner_id: impl Into<String>) -> Self {
        Self {
            owner: RwLock::new(Some(owner_id.into())),
        }
    }

    /// Connect with the given owner key
    pub fn connect(&self, owner_id: impl Into<String>) {
        let owner_id = owner_id.into();
        tracing::debug!("Wallet connected: {}", owner_id);
        *self.owner.write() = Some(owner_id);
    }

    /// Disconnect the wallet session
    pub fn disconnect(&self) {
        tracing::debug!("Wallet disconnected");
        *self.owner.write() = None;
    }
}

impl IdentityProvider for LocalWallet {
    fn current_owner_id(&self) -> Option<String> {
        self.owner.read().clone()
    }
}

/// Resolves owner keys and handles into [`Identity`] values
///
/// Registry records are cached for the lifetime of the resolver; presence is
/// re-synthesized on every resolution, so a cached record never freezes a
/// partner's online state.
pub struct IdentityResolver {
    registry: Arc<dyn Registry>,
    activity: Arc<dyn PartnerActivity>,
    cache: RwLock<HashMap<String, RegistryRecord>>,
}

impl IdentityResolver {
    /// Create a resolver over the given registry and activity simulator
    pub fn new(registry: Arc<dyn Registry>, activity: Arc<dyn PartnerActivity>) -> Self {
        Self {
            registry,
            activity,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the active user's identity from their owner key
    ///
    /// Absent when the owner has no registered handle; sends then fail with
    /// [`Error::NoIdentity`](crate::Error::NoIdentity). The active user is
    /// always presented as online.
    pub fn resolve_self(&self, owner_id: &str) -> Option<Identity> {
        let record = self.registry.find_by_owner(owner_id)?;
        if !record.active {
            return None;
        }
        Some(Identity::from_record(record, Presence::active_now()))
    }

    /// Resolve a conversation partner's identity from their handle
    ///
    /// Inactive registrations are treated as not found. Partner presence is
    /// synthesized by the activity simulator on each call.
    pub fn resolve_partner(&self, handle: &str) -> Option<Identity> {
        // Bind the cache lookup so the read guard is released before the
        // miss path takes the write lock; matching on the temporary would
        // hold the read guard across the write and self-deadlock.
        let cached = self.cache.read().get(handle).cloned();
        let record = match cached {
            Some(record) => record,
            None => {
                let record = self.registry.find_by_handle(handle)?;
                self.cache
                    .write()
                    .insert(handle.to_string(), record.clone());
                record
            }
        };

        if !record.active {
            tracing::debug!("Handle '{}' is registered but inactive", handle);
            return None;
        }

        Some(Identity::from_record(record, self.activity.presence()))
    }

    /// Resolve a partner, treating absence as an error
    ///
    /// Convenience for callers (e.g. a directory view following a link)
    /// that want a hard [`Error::PartnerNotFound`] instead of the engine's
    /// absent-partner degradation.
    pub fn resolve_partner_required(&self, handle: &str) -> Result<Identity> {
        self.resolve_partner(handle)
            .ok_or_else(|| Error::PartnerNotFound(handle.to_string()))
    }

    /// Drop the cached record for one handle
    pub fn invalidate(&self, handle: &str) {
        self.cache.write().remove(handle);
    }

    /// Drop all cached records
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::simulator::ReplyPlan;
    use crate::registry::InMemoryRegistry;

    /// Activity stub with a fixed presence value
    struct FixedPresence(Presence);

    impl PartnerActivity for FixedPresence {
        fn presence(&self) -> Presence {
            self.0
        }

        fn plan_reply(&self) -> Option<ReplyPlan> {
            None
        }
    }

    fn resolver_with(registry: Arc<InMemoryRegistry>, presence: Presence) -> IdentityResolver {
        IdentityResolver::new(registry, Arc::new(FixedPresence(presence)))
    }

    #[test]
    fn test_resolve_self() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register("0xBOB", "bob", "Bob", "").unwrap();

        let resolver = resolver_with(
            registry,
            Presence {
                is_online: false,
                last_seen_at: 0,
            },
        );

        let me = resolver.resolve_self("0xbob").unwrap();
        assert_eq!(me.handle, "bob");
        // Self presence ignores the simulator: always online, seen now
        assert!(me.is_online);
        assert!(me.last_seen_at > 0);

        assert!(resolver.resolve_self("0xunknown").is_none());
    }

    #[test]
    fn test_resolve_partner_uses_synthesized_presence() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register("0xA", "alice", "Alice", "QmPic").unwrap();

        let presence = Presence {
            is_online: true,
            last_seen_at: 12345,
        };
        let resolver = resolver_with(registry, presence);

        let partner = resolver.resolve_partner("alice").unwrap();
        assert_eq!(partner.id, "0xA");
        assert_eq!(partner.display_name, "Alice");
        assert_eq!(partner.avatar_ref, "QmPic");
        assert!(partner.is_online);
        assert_eq!(partner.last_seen_at, 12345);
    }

    #[test]
    fn test_unknown_partner_is_absent() {
        let registry = Arc::new(InMemoryRegistry::new());
        let resolver = resolver_with(registry, Presence::active_now());
        assert!(resolver.resolve_partner("ghost").is_none());

        let err = resolver.resolve_partner_required("ghost").unwrap_err();
        assert!(matches!(err, Error::PartnerNotFound(h) if h == "ghost"));
    }

    #[test]
    fn test_inactive_partner_is_absent() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register("0xA", "alice", "Alice", "").unwrap();

        let resolver = resolver_with(registry.clone(), Presence::active_now());
        assert!(resolver.resolve_partner("alice").is_some());

        // Deactivate by replacing the resolver's view through the cache:
        // an inactive cached record must still resolve as absent.
        resolver.cache.write().get_mut("alice").unwrap().active = false;
        assert!(resolver.resolve_partner("alice").is_none());
    }

    #[test]
    fn test_cache_does_not_freeze_presence() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register("0xA", "alice", "Alice", "").unwrap();

        let resolver = resolver_with(
            registry,
            Presence {
                is_online: true,
                last_seen_at: 777,
            },
        );

        // First resolution populates the cache
        let first = resolver.resolve_partner("alice").unwrap();
        // Second resolution hits the cache but re-derives presence
        let second = resolver.resolve_partner("alice").unwrap();
        assert_eq!(first.last_seen_at, 777);
        assert_eq!(second.last_seen_at, 777);
        assert_eq!(first.handle, second.handle);
    }

    #[test]
    fn test_wallet_connect_disconnect() {
        let wallet = LocalWallet::new();
        assert!(wallet.current_owner_id().is_none());

        wallet.connect("0xBOB");
        assert_eq!(wallet.current_owner_id().as_deref(), Some("0xBOB"));

        wallet.disconnect();
        assert!(wallet.current_owner_id().is_none());
    }
}
