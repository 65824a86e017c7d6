//! # Registry Module
//!
//! The name registry maps unique human-readable handles to wallet-style
//! owner identities. Claiming a handle is the gate for chatting: only
//! registered handles can open conversations or be resolved as partners.
//!
//! ## Registration Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       HANDLE REGISTRATION                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Validate                                                           │
//! │     handle: lowercase, [a-z0-9-], at least 3 characters                │
//! │     display name: at least 2 characters                                │
//! │                                                                         │
//! │  2. Availability check                                                 │
//! │     is_available(handle) — a handle can be claimed exactly once        │
//! │                                                                         │
//! │  3. Record                                                             │
//! │     RegistryRecord {                                                   │
//! │       owner_id, handle, display_name,                                  │
//! │       avatar_ref, registered_at, active                                │
//! │     }                                                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry is an external collaborator of the chat engine: in the demo
//! it is [`InMemoryRegistry`], in production it would be a name-service
//! contract. Consensus and finality of registration are out of scope; the
//! trait models the observable contract only.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum length for a handle
pub const MIN_HANDLE_LENGTH: usize = 3;

/// Minimum length for a display name
pub const MIN_DISPLAY_NAME_LENGTH: usize = 2;

/// A registered handle and the identity it is bound to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryRecord {
    /// Owner key (wallet address) that claimed the handle
    pub owner_id: String,
    /// The unique registered handle
    pub handle: String,
    /// Human-readable display name
    pub display_name: String,
    /// Opaque content reference for the avatar (may be empty)
    pub avatar_ref: String,
    /// When the handle was registered (Unix millis)
    pub registered_at: i64,
    /// Whether the registration is active
    pub active: bool,
}

/// Validate a handle against the registration rules
///
/// Handles are lowercase, drawn from `[a-z0-9-]`, and at least
/// [`MIN_HANDLE_LENGTH`] characters long.
pub fn validate_handle(handle: &str) -> Result<()> {
    if handle.len() < MIN_HANDLE_LENGTH {
        return Err(Error::InvalidHandle(format!(
            "handle must be at least {} characters",
            MIN_HANDLE_LENGTH
        )));
    }

    if !handle
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(Error::InvalidHandle(
            "handle may only contain lowercase letters, digits and '-'".into(),
        ));
    }

    Ok(())
}

/// Name registry boundary
///
/// Maps handles to identity records. The chat engine only reads from it;
/// the registration flow writes through [`Registry::register`].
pub trait Registry: Send + Sync {
    /// Register a new handle for the given owner
    ///
    /// Fails with [`Error::NameTaken`] if the handle is already claimed and
    /// [`Error::InvalidHandle`] if validation fails. Registration performs
    /// no normalization; callers submit handles already lowercased.
    fn register(
        &self,
        owner_id: &str,
        handle: &str,
        display_name: &str,
        avatar_ref: &str,
    ) -> Result<RegistryRecord>;

    /// Check whether a handle can still be claimed
    fn is_available(&self, handle: &str) -> bool;

    /// Look up the record for a handle
    ///
    /// Returns inactive records too; callers that only care about live
    /// users filter on [`RegistryRecord::active`].
    fn find_by_handle(&self, handle: &str) -> Option<RegistryRecord>;

    /// Look up the record owned by the given owner key
    ///
    /// Owner comparison is case-insensitive, since wallet addresses are
    /// routinely presented in mixed case.
    fn find_by_owner(&self, owner_id: &str) -> Option<RegistryRecord>;

    /// List every registration, in registration order
    fn list_all(&self) -> Vec<RegistryRecord>;
}

/// In-memory registry used by the demo and by tests
///
/// Stands in for the on-chain name service. One record per handle, append
/// order preserved for directory listing.
#[derive(Default)]
pub struct InMemoryRegistry {
    records: RwLock<Vec<RegistryRecord>>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl Registry for InMemoryRegistry {
    fn register(
        &self,
        owner_id: &str,
        handle: &str,
        display_name: &str,
        avatar_ref: &str,
    ) -> Result<RegistryRecord> {
        validate_handle(handle)?;

        if display_name.trim().len() < MIN_DISPLAY_NAME_LENGTH {
            return Err(Error::InvalidHandle(format!(
                "display name must be at least {} characters",
                MIN_DISPLAY_NAME_LENGTH
            )));
        }

        let mut records = self.records.write();
        if records.iter().any(|r| r.handle == handle) {
            return Err(Error::NameTaken(handle.to_string()));
        }

        let record = RegistryRecord {
            owner_id: owner_id.to_string(),
            handle: handle.to_string(),
            display_name: display_name.trim().to_string(),
            avatar_ref: avatar_ref.to_string(),
            registered_at: crate::time::now_timestamp_millis(),
            active: true,
        };
        records.push(record.clone());

        tracing::info!("Registered handle '{}' for owner {}", handle, owner_id);
        Ok(record)
    }

    fn is_available(&self, handle: &str) -> bool {
        !self.records.read().iter().any(|r| r.handle == handle)
    }

    fn find_by_handle(&self, handle: &str) -> Option<RegistryRecord> {
        self.records
            .read()
            .iter()
            .find(|r| r.handle == handle)
            .cloned()
    }

    fn find_by_owner(&self, owner_id: &str) -> Option<RegistryRecord> {
        self.records
            .read()
            .iter()
            .find(|r| r.owner_id.eq_ignore_ascii_case(owner_id))
            .cloned()
    }

    fn list_all(&self) -> Vec<RegistryRecord> {
        self.records.read().clone()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = InMemoryRegistry::new();
        let record = registry
            .register("0xAbC123", "alice", "Alice", "QmAvatar")
            .unwrap();

        assert_eq!(record.handle, "alice");
        assert!(record.active);
        assert!(record.registered_at > 0);

        let by_handle = registry.find_by_handle("alice").unwrap();
        assert_eq!(by_handle, record);

        // Owner lookup is case-insensitive
        let by_owner = registry.find_by_owner("0xabc123").unwrap();
        assert_eq!(by_owner.handle, "alice");
    }

    #[test]
    fn test_handle_uniqueness() {
        let registry = InMemoryRegistry::new();
        registry.register("0x1", "alice", "Alice", "").unwrap();

        assert!(!registry.is_available("alice"));
        assert!(registry.is_available("bob"));

        let err = registry.register("0x2", "alice", "Other Alice", "");
        assert!(matches!(err, Err(Error::NameTaken(h)) if h == "alice"));
    }

    #[test]
    fn test_handle_validation() {
        assert!(validate_handle("alice").is_ok());
        assert!(validate_handle("a1-b2").is_ok());

        // Too short
        assert!(validate_handle("ab").is_err());
        // Uppercase rejected; callers lowercase before submitting
        assert!(validate_handle("Alice").is_err());
        // Disallowed characters
        assert!(validate_handle("al!ce").is_err());
        assert!(validate_handle("al ice").is_err());
    }

    #[test]
    fn test_display_name_validation() {
        let registry = InMemoryRegistry::new();
        let err = registry.register("0x1", "alice", "A", "");
        assert!(matches!(err, Err(Error::InvalidHandle(_))));

        // Whitespace padding does not satisfy the minimum
        let err = registry.register("0x1", "alice", " B ", "");
        assert!(matches!(err, Err(Error::InvalidHandle(_))));
    }

    #[test]
    fn test_list_all_preserves_registration_order() {
        let registry = InMemoryRegistry::new();
        registry.register("0x1", "alice", "Alice", "").unwrap();
        registry.register("0x2", "bob", "Bob", "").unwrap();
        registry.register("0x3", "carol", "Carol", "").unwrap();

        let handles: Vec<_> = registry
            .list_all()
            .into_iter()
            .map(|r| r.handle)
            .collect();
        assert_eq!(handles, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_unknown_lookups_are_absent() {
        let registry = InMemoryRegistry::new();
        assert!(registry.find_by_handle("nobody").is_none());
        assert!(registry.find_by_owner("0xdead").is_none());
        assert!(registry.list_all().is_empty());
    }
}
