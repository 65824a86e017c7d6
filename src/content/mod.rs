//! # Content Module
//!
//! Resolution of opaque content references (avatar refs) into displayable
//! URLs. The chat engine never interprets avatar bytes; the presentation
//! layer hands a ref to a [`ContentResolver`] and renders whatever URL comes
//! back.
//!
//! The demo implementation, [`LocalContentStore`], mimics a content-addressed
//! store: `store` hands out `Qm…`-style refs and keeps the payload locally,
//! `resolve_ref` serves the local payload when it has one and otherwise
//! falls back to a public gateway URL.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::Rng;

/// Default public gateway for refs with no local payload
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Content reference resolution boundary
pub trait ContentResolver: Send + Sync {
    /// Resolve a content reference to a displayable URL
    ///
    /// Empty refs resolve to `None` (identities without an avatar).
    fn resolve_ref(&self, content_ref: &str) -> Option<String>;
}

/// Mock content-addressed store for the demo
pub struct LocalContentStore {
    gateway: String,
    entries: RwLock<HashMap<String, String>>,
}

impl LocalContentStore {
    /// Create a store backed by the default public gateway
    pub fn new() -> Self {
        Self::with_gateway(DEFAULT_GATEWAY)
    }

    /// Create a store with a custom gateway base URL
    pub fn with_gateway(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store a payload (e.g. an avatar data URL) and return its ref
    pub fn store(&self, payload: impl Into<String>) -> String {
        let content_ref = generate_mock_ref();
        self.entries
            .write()
            .insert(content_ref.clone(), payload.into());
        content_ref
    }
}

impl Default for LocalContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentResolver for LocalContentStore {
    fn resolve_ref(&self, content_ref: &str) -> Option<String> {
        if content_ref.is_empty() {
            return None;
        }

        if let Some(payload) = self.entries.read().get(content_ref) {
            return Some(payload.clone());
        }

        Some(format!("{}{}", self.gateway, content_ref))
    }
}

/// Generate a `Qm…`-style mock content ref
fn generate_mock_ref() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..26)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("Qm{}", suffix)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ref_resolves_to_none() {
        let store = LocalContentStore::new();
        assert!(store.resolve_ref("").is_none());
    }

    #[test]
    fn test_stored_payload_is_served_locally() {
        let store = LocalContentStore::new();
        let content_ref = store.store("data:image/png;base64,AAAA");

        assert!(content_ref.starts_with("Qm"));
        assert_eq!(
            store.resolve_ref(&content_ref).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_unknown_ref_falls_back_to_gateway() {
        let store = LocalContentStore::with_gateway("https://gw.example/");
        assert_eq!(
            store.resolve_ref("QmSomewhereElse").as_deref(),
            Some("https://gw.example/QmSomewhereElse")
        );
    }

    #[test]
    fn test_refs_are_unique() {
        let store = LocalContentStore::new();
        let a = store.store("one");
        let b = store.store("two");
        assert_ne!(a, b);
    }
}
