//! # Chat Module
//!
//! The chat session engine and its data model: messages, delivery status,
//! conversation keys, the partner-activity simulator and the session engine
//! itself.
//!
//! ## Delivery Status State Machine
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     MESSAGE DELIVERY STATUS                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   outgoing:   Sending ──► Sent ──► Delivered ──► (Read)                │
//! │                  │          ▲                                          │
//! │                  │          │                                          │
//! │   inbound: ──────┘      first observed here (never Sending)           │
//! │                                                                         │
//! │   Transitions only ever move forward. `Read` is reachable but is       │
//! │   never driven by this engine; recipient-side logic owns it.           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conversation Key
//!
//! A conversation is identified by the unordered pair of participant
//! handles: the pair is sorted lexicographically and joined, so both
//! participants converge on the same shared log regardless of who opened
//! the conversation first.

pub mod session;
pub mod simulator;

pub use session::{ChatConfig, ChatEngine, ChatSnapshot, SessionPhase};
pub use simulator::{PartnerActivity, RandomPartner, ReplyPlan};

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// A single chat message in a conversation log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message id; generation order is monotonic within a conversation
    pub id: String,
    /// Sender's owner key
    pub sender_id: String,
    /// Sender's registered handle
    pub sender_handle: String,
    /// Sender's display name at send time
    pub sender_display_name: String,
    /// Recipient's owner key
    pub recipient_id: String,
    /// Recipient's registered handle
    pub recipient_handle: String,
    /// Message content; non-empty after trimming
    pub content: String,
    /// When the message was created (Unix millis)
    pub created_at: i64,
    /// Content kind
    pub kind: MessageKind,
    /// Delivery status
    pub status: MessageStatus,
}

impl Message {
    /// Create an outgoing message, starting at [`MessageStatus::Sending`]
    ///
    /// `seq` is a per-engine monotonic counter baked into the id so that id
    /// generation order is observable within a conversation.
    pub fn outgoing(
        seq: u64,
        sender: &Identity,
        recipient: &Identity,
        content: &str,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: new_message_id(seq),
            sender_id: sender.id.clone(),
            sender_handle: sender.handle.clone(),
            sender_display_name: sender.display_name.clone(),
            recipient_id: recipient.id.clone(),
            recipient_handle: recipient.handle.clone(),
            content: content.to_string(),
            created_at: crate::time::now_timestamp_millis(),
            kind,
            status: MessageStatus::Sending,
        }
    }

    /// Create an inbound message, starting at [`MessageStatus::Sent`]
    ///
    /// Inbound messages never pass through `Sending`; that state belongs to
    /// the sender's optimistic pipeline.
    pub fn inbound(seq: u64, sender: &Identity, recipient: &Identity, content: &str) -> Self {
        Self {
            id: new_message_id(seq),
            sender_id: sender.id.clone(),
            sender_handle: sender.handle.clone(),
            sender_display_name: sender.display_name.clone(),
            recipient_id: recipient.id.clone(),
            recipient_handle: recipient.handle.clone(),
            content: content.to_string(),
            created_at: crate::time::now_timestamp_millis(),
            kind: MessageKind::Text,
            status: MessageStatus::Sent,
        }
    }

    /// Check whether this message was sent by the given owner key
    pub fn is_outgoing(&self, owner_id: &str) -> bool {
        self.sender_id == owner_id
    }
}

/// Build a message id from the monotonic sequence plus a random component
fn new_message_id(seq: u64) -> String {
    format!("msg-{:08x}-{}", seq, uuid::Uuid::new_v4())
}

/// Message content kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Plain text message
    Text,
    /// Reference to an image (opaque content ref in `content`)
    ImageRef,
}

/// Message delivery status
///
/// A strictly forward-moving progression; see [`MessageStatus::advance_to`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Message accepted locally, not yet sent
    Sending,
    /// Message sent but not confirmed delivered
    Sent,
    /// Message delivered to the recipient
    Delivered,
    /// Recipient has read the message (never driven by this engine)
    Read,
}

impl MessageStatus {
    /// Position of this status in the forward progression
    fn rank(&self) -> u8 {
        match self {
            Self::Sending => 0,
            Self::Sent => 1,
            Self::Delivered => 2,
            Self::Read => 3,
        }
    }

    /// Advance to `next` if that is a forward move
    ///
    /// Returns `true` when the transition was applied. Backward and
    /// same-rank transitions are rejected, which makes scheduled advances
    /// idempotent when they fire late or twice.
    pub fn advance_to(&mut self, next: MessageStatus) -> bool {
        if next.rank() > self.rank() {
            *self = next;
            true
        } else {
            false
        }
    }

    /// String form used in persisted logs and status badges
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

/// Deterministic identifier for the unordered pair of handles in a chat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Derive the key for a pair of handles
    ///
    /// The pair is sorted lexicographically before joining, so
    /// `new(a, b) == new(b, a)` and both participants share one log.
    pub fn new(handle_a: &str, handle_b: &str) -> Self {
        let (first, second) = if handle_a <= handle_b {
            (handle_a, handle_b)
        } else {
            (handle_b, handle_a)
        };
        Self(format!("{}-{}", first, second))
    }

    /// The key as a storage-friendly string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, handle: &str) -> Identity {
        Identity {
            id: id.to_string(),
            handle: handle.to_string(),
            display_name: handle.to_uppercase(),
            avatar_ref: String::new(),
            is_online: true,
            last_seen_at: 0,
        }
    }

    #[test]
    fn test_conversation_key_is_order_independent() {
        let ab = ConversationKey::new("alice", "bob");
        let ba = ConversationKey::new("bob", "alice");
        assert_eq!(ab, ba);
        assert_eq!(ab.as_str(), "alice-bob");

        let ac = ConversationKey::new("alice", "carol");
        assert_ne!(ab, ac);
    }

    #[test]
    fn test_status_moves_forward_only() {
        let mut status = MessageStatus::Sending;

        assert!(status.advance_to(MessageStatus::Sent));
        assert_eq!(status, MessageStatus::Sent);

        // Backward and same-rank transitions are no-ops
        assert!(!status.advance_to(MessageStatus::Sending));
        assert!(!status.advance_to(MessageStatus::Sent));
        assert_eq!(status, MessageStatus::Sent);

        assert!(status.advance_to(MessageStatus::Delivered));
        assert!(status.advance_to(MessageStatus::Read));
        assert!(!status.advance_to(MessageStatus::Delivered));
        assert_eq!(status, MessageStatus::Read);
    }

    #[test]
    fn test_status_can_skip_forward() {
        // Read is reachable directly; nothing requires passing Delivered
        let mut status = MessageStatus::Sent;
        assert!(status.advance_to(MessageStatus::Read));
    }

    #[test]
    fn test_outgoing_message_shape() {
        let bob = identity("0xB", "bob");
        let alice = identity("0xA", "alice");

        let msg = Message::outgoing(7, &bob, &alice, "hi", MessageKind::Text);
        assert_eq!(msg.status, MessageStatus::Sending);
        assert_eq!(msg.sender_handle, "bob");
        assert_eq!(msg.recipient_handle, "alice");
        assert!(msg.is_outgoing("0xB"));
        assert!(!msg.is_outgoing("0xA"));
        assert!(msg.created_at > 0);
    }

    #[test]
    fn test_inbound_message_never_starts_sending() {
        let bob = identity("0xB", "bob");
        let alice = identity("0xA", "alice");

        let msg = Message::inbound(8, &alice, &bob, "hey there");
        assert_eq!(msg.status, MessageStatus::Sent);
        assert_eq!(msg.kind, MessageKind::Text);
    }

    #[test]
    fn test_message_id_order_is_monotonic() {
        let bob = identity("0xB", "bob");
        let alice = identity("0xA", "alice");

        let ids: Vec<String> = (0..5)
            .map(|seq| Message::outgoing(seq, &bob, &alice, "x", MessageKind::Text).id)
            .collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_status_serialization_matches_badge_strings() {
        let json = serde_json::to_string(&MessageStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");

        let status: MessageStatus = serde_json::from_str("\"sending\"").unwrap();
        assert_eq!(status.as_str(), "sending");
    }

    #[test]
    fn test_message_log_roundtrip() {
        let bob = identity("0xB", "bob");
        let alice = identity("0xA", "alice");

        let log = vec![
            Message::outgoing(0, &bob, &alice, "hi", MessageKind::Text),
            Message::inbound(1, &alice, &bob, "hello"),
        ];

        let json = serde_json::to_string(&log).unwrap();
        let restored: Vec<Message> = serde_json::from_str(&json).unwrap();
        assert_eq!(log, restored);
    }
}
