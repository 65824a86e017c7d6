//! # Error Handling
//!
//! Error types for Ambience Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Identity Errors                                                   │
//! │  │   ├── NoIdentity            - Caller has no registered handle       │
//! │  │   └── PartnerNotFound       - No active record for a handle         │
//! │  │                                                                      │
//! │  ├── Registry Errors                                                   │
//! │  │   ├── NameTaken             - Handle already registered             │
//! │  │   └── InvalidHandle         - Handle failed validation              │
//! │  │                                                                      │
//! │  ├── Session Errors                                                    │
//! │  │   ├── NotReady              - Session cannot accept a send          │
//! │  │   └── InvalidSend           - Empty/whitespace message content      │
//! │  │                                                                      │
//! │  └── Storage Errors                                                    │
//! │      ├── StorageReadError      - Failed to read a conversation log     │
//! │      ├── StorageWriteError     - Failed to persist a conversation log  │
//! │      └── SerializationError    - Log could not be encoded/decoded      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate treats an error as fatal to the process: storage
//! read failures degrade to an empty log, storage write failures are logged
//! and swallowed (the in-memory state is already applied), and an unknown
//! chat partner surfaces as an absent partner in the session snapshot rather
//! than as an error from [`ChatEngine::open_conversation`].
//!
//! [`ChatEngine::open_conversation`]: crate::chat::ChatEngine::open_conversation

use thiserror::Error;

/// Result type alias for Ambience Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Ambience Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Identity Errors
    // ========================================================================
    /// The caller has no registered handle
    #[error("No registered handle for this wallet. Register a handle first.")]
    NoIdentity,

    /// No active registry record exists for the given handle
    #[error("No registered user found for handle '{0}'")]
    PartnerNotFound(String),

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// The handle is already registered
    #[error("Handle '{0}' is already taken")]
    NameTaken(String),

    /// The handle or display name failed validation
    #[error("Invalid registration: {0}")]
    InvalidHandle(String),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The session is not ready to accept a send
    #[error("Chat session is not ready: {0}")]
    NotReady(&'static str),

    /// Message content was empty after trimming
    #[error("Cannot send an empty message")]
    InvalidSend,

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Failed to read a conversation log from storage
    #[error("Failed to read conversation log: {0}")]
    StorageReadError(String),

    /// Failed to persist a conversation log
    #[error("Failed to write conversation log: {0}")]
    StorageWriteError(String),

    /// A conversation log could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Check if this error is a local rejection of a send attempt
    ///
    /// Send rejections perform no mutation: the in-memory log and the
    /// persisted log are exactly as they were before the call.
    pub fn is_send_rejection(&self) -> bool {
        matches!(
            self,
            Error::NoIdentity | Error::NotReady(_) | Error::InvalidSend
        )
    }

    /// Check if this error comes from the storage layer
    ///
    /// Storage errors are never surfaced as a hard failure of a session;
    /// the engine degrades to an empty or stale-but-consistent view.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::StorageReadError(_)
                | Error::StorageWriteError(_)
                | Error::SerializationError(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageReadError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_rejections() {
        assert!(Error::NoIdentity.is_send_rejection());
        assert!(Error::NotReady("no partner").is_send_rejection());
        assert!(Error::InvalidSend.is_send_rejection());
        assert!(!Error::NameTaken("alice".into()).is_send_rejection());
    }

    #[test]
    fn test_storage_errors() {
        assert!(Error::StorageReadError("disk".into()).is_storage());
        assert!(Error::StorageWriteError("disk".into()).is_storage());
        assert!(!Error::NoIdentity.is_storage());
    }

    #[test]
    fn test_json_error_conversion() {
        let bad = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err: Error = bad.into();
        assert!(matches!(err, Error::SerializationError(_)));
    }

    #[test]
    fn test_error_messages_name_the_subject() {
        let err = Error::NameTaken("alice".into());
        assert!(err.to_string().contains("alice"));

        let err = Error::PartnerNotFound("bob".into());
        assert!(err.to_string().contains("bob"));
    }
}
