//! # Chat Session Engine
//!
//! Orchestrates one chat session: resolving the partner, loading and
//! persisting the shared message log, driving each outgoing message through
//! the delivery-status pipeline, and simulating asynchronous partner
//! activity.
//!
//! ## Session Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SESSION LIFECYCLE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │            open_conversation(handle)                                   │
//! │   Idle ────────────────────────────────► Loading                       │
//! │                                             │                          │
//! │                         resolve self + partner, load log               │
//! │                                             │                          │
//! │                                             ▼                          │
//! │   Ready ◄───────────────────────────────────┘                          │
//! │     │  (partner resolution failure is NOT an error: the session        │
//! │     │   reaches Ready with partner = None and an empty log)            │
//! │     │                                                                  │
//! │     └── open_conversation(other) ──► Loading again; ALL session        │
//! │         state is replaced, and a bumped generation counter makes       │
//! │         every timer scheduled for the old session a no-op.             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Send Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SEND PIPELINE                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  send(content)                                                         │
//! │    │                                                                   │
//! │    ├─ 1. append Message { status: Sending } in memory, emit snapshot   │
//! │    │     (optimistic: before any persistence or timing delay)          │
//! │    │                                                                   │
//! │    ├─ 2. after sent_delay:       Sending ──► Sent       + persist      │
//! │    │                                                                   │
//! │    ├─ 3. after delivered_delay:  Sent ──► Delivered     + persist      │
//! │    │                                                                   │
//! │    └─ 4. independently, the partner simulator may plan a reply;        │
//! │          when it fires, an inbound Message { status: Sent } is         │
//! │          appended and persisted                                        │
//! │                                                                         │
//! │  Every scheduled effect carries (generation, conversation key,         │
//! │  message id) and validates them against current state before           │
//! │  applying; on any mismatch the effect discards itself.                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All public operations return without blocking: loading signals busy via
//! the `Loading` phase, and `send` returns right after the optimistic
//! append. A fresh immutable [`ChatSnapshot`] is emitted on the watch
//! channel after every mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::chat::simulator::PartnerActivity;
use crate::chat::{ConversationKey, Message, MessageKind, MessageStatus};
use crate::error::{Error, Result};
use crate::identity::{Identity, IdentityProvider, IdentityResolver};
use crate::registry::Registry;
use crate::storage::ConversationStore;

/// Timing configuration for the chat engine
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Delay before an outgoing message advances to `Sent`
    pub sent_delay: Duration,
    /// Further delay before a `Sent` message advances to `Delivered`
    pub delivered_delay: Duration,
    /// How long the typing indicator stays on after `simulate_typing`
    pub typing_duration: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            sent_delay: Duration::from_millis(500),
            delivered_delay: Duration::from_millis(1000),
            typing_duration: Duration::from_millis(2000),
        }
    }
}

/// Lifecycle phase of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No conversation has been opened yet
    Idle,
    /// A conversation is being opened (identities resolving, log loading)
    Loading,
    /// The session is serving a conversation
    Ready,
}

/// Immutable view of the session, emitted after every mutation
///
/// The presentation layer renders exactly this; it never reaches into the
/// engine's internals.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    /// The conversation log, in append order
    pub messages: Vec<Message>,
    /// The active user's identity, absent when unregistered/disconnected
    pub current_user: Option<Identity>,
    /// The partner's identity, absent when their handle did not resolve
    pub partner: Option<Identity>,
    /// Whether the session is currently loading a conversation
    pub is_loading: bool,
    /// Whether the partner's typing indicator is on
    pub is_typing: bool,
}

/// Mutable session state, guarded by one lock
struct SessionState {
    phase: SessionPhase,
    /// Bumped on every `open_conversation`; scheduled effects created for an
    /// older generation discard themselves
    generation: u64,
    /// Bumped on every `simulate_typing`; an older reset is a no-op
    typing_epoch: u64,
    current_user: Option<Identity>,
    partner: Option<Identity>,
    key: Option<ConversationKey>,
    messages: Vec<Message>,
    is_typing: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            generation: 0,
            typing_epoch: 0,
            current_user: None,
            partner: None,
            key: None,
            messages: Vec::new(),
            is_typing: false,
        }
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.messages.clone(),
            current_user: self.current_user.clone(),
            partner: self.partner.clone(),
            is_loading: self.phase == SessionPhase::Loading,
            is_typing: self.is_typing,
        }
    }
}

/// State shared between the engine and its scheduled effects
struct Shared {
    store: Arc<dyn ConversationStore>,
    state: RwLock<SessionState>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    next_seq: AtomicU64,
}

impl Shared {
    /// Emit a fresh snapshot of the current state
    fn emit(&self) {
        let snapshot = self.state.read().snapshot();
        let _ = self.snapshot_tx.send_replace(snapshot);
    }

    /// Persist a log, logging and swallowing failures
    ///
    /// The in-memory state is already applied; a write failure must not
    /// roll back the optimistic view.
    fn persist(&self, key: &ConversationKey, messages: &[Message]) {
        if let Err(e) = self.store.save(key, messages) {
            tracing::warn!("Failed to persist conversation {}: {}", key, e);
        }
    }

    /// Advance one message's delivery status, guarded against stale firing
    ///
    /// The advance applies only when the session generation and conversation
    /// key still match what the timer was scheduled for and the message is
    /// still present; otherwise it is a no-op.
    fn apply_status_advance(
        &self,
        generation: u64,
        key: &ConversationKey,
        message_id: &str,
        next: MessageStatus,
    ) {
        let persisted = {
            let mut state = self.state.write();
            if state.generation != generation || state.key.as_ref() != Some(key) {
                tracing::debug!("Discarding stale status advance for {}", message_id);
                return;
            }
            let Some(message) = state.messages.iter_mut().find(|m| m.id == message_id) else {
                tracing::debug!("Discarding status advance for missing message {}", message_id);
                return;
            };
            if !message.status.advance_to(next) {
                return;
            }
            state.messages.clone()
        };

        self.emit();
        self.persist(key, &persisted);
    }

    /// Append a simulated inbound reply, guarded against stale firing
    fn apply_inbound(&self, generation: u64, key: &ConversationKey, content: &str) {
        let persisted = {
            let mut state = self.state.write();
            if state.generation != generation || state.key.as_ref() != Some(key) {
                tracing::debug!("Discarding stale simulated reply for {}", key);
                return;
            }
            let (Some(user), Some(partner)) =
                (state.current_user.clone(), state.partner.clone())
            else {
                return;
            };
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let message = Message::inbound(seq, &partner, &user, content);
            state.messages.push(message);
            state.messages.clone()
        };

        self.emit();
        self.persist(key, &persisted);
    }
}

/// The chat session engine
///
/// One engine serves one session at a time; opening another conversation
/// replaces all session state. Collaborators (registry, identity provider,
/// store, partner simulator) are injected, so any of them can be swapped
/// for a real implementation without touching the state machine.
pub struct ChatEngine {
    shared: Arc<Shared>,
    resolver: IdentityResolver,
    provider: Arc<dyn IdentityProvider>,
    activity: Arc<dyn PartnerActivity>,
    config: ChatConfig,
}

impl ChatEngine {
    /// Create an engine over the given collaborators
    pub fn new(
        registry: Arc<dyn Registry>,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn ConversationStore>,
        activity: Arc<dyn PartnerActivity>,
        config: ChatConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(ChatSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                store,
                state: RwLock::new(SessionState::new()),
                snapshot_tx,
                next_seq: AtomicU64::new(0),
            }),
            resolver: IdentityResolver::new(registry, Arc::clone(&activity)),
            provider,
            activity,
            config,
        }
    }

    /// The latest emitted snapshot
    pub fn snapshot(&self) -> ChatSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Subscribe to the snapshot feed
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// The session's current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.shared.state.read().phase
    }

    /// Open (or switch to) a conversation with the given partner handle
    ///
    /// Enters `Loading`, resolves both identities, loads the persisted log
    /// for the pair, and enters `Ready`. A handle with no active
    /// registration is not an error: the session still reaches `Ready` with
    /// `partner` absent and an empty log, and the presentation layer decides
    /// how to react. Unreadable or corrupt storage degrades to an empty log.
    pub fn open_conversation(&self, partner_handle: &str) {
        let generation = {
            let mut state = self.shared.state.write();
            state.generation += 1;
            state.phase = SessionPhase::Loading;
            state.partner = None;
            state.key = None;
            state.messages.clear();
            state.is_typing = false;
            state.typing_epoch += 1;
            state.generation
        };
        self.shared.emit();

        tracing::info!("Opening conversation with '{}'", partner_handle);

        let current_user = self
            .provider
            .current_owner_id()
            .and_then(|owner| self.resolver.resolve_self(&owner));
        let partner = self.resolver.resolve_partner(partner_handle);
        if partner.is_none() {
            tracing::info!("No active registration for handle '{}'", partner_handle);
        }

        let (key, messages) = match (&current_user, &partner) {
            (Some(user), Some(partner)) => {
                let key = ConversationKey::new(&user.handle, &partner.handle);
                let messages = match self.shared.store.load(&key) {
                    Ok(messages) => messages,
                    Err(e) => {
                        tracing::warn!("Loading log for {} failed, starting empty: {}", key, e);
                        Vec::new()
                    }
                };
                (Some(key), messages)
            }
            _ => (None, Vec::new()),
        };

        {
            let mut state = self.shared.state.write();
            // A newer open_conversation replaced this one mid-flight
            if state.generation != generation {
                return;
            }
            state.phase = SessionPhase::Ready;
            state.current_user = current_user;
            state.partner = partner;
            state.key = key;
            state.messages = messages;
        }
        self.shared.emit();
    }

    /// Send a message to the open conversation's partner
    ///
    /// Returns the optimistically appended message (status `Sending`)
    /// immediately; the `Sent` and `Delivered` advances and any simulated
    /// reply are scheduled as timers. Rejections (`InvalidSend`,
    /// `NoIdentity`, `NotReady`) perform no mutation at all.
    ///
    /// Must be called within a tokio runtime.
    pub fn send(&self, content: &str, kind: MessageKind) -> Result<Message> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidSend);
        }

        let (message, generation, key) = {
            let mut state = self.shared.state.write();
            if state.phase != SessionPhase::Ready {
                return Err(Error::NotReady("no open conversation"));
            }
            let user = state.current_user.clone().ok_or(Error::NoIdentity)?;
            let partner = state
                .partner
                .clone()
                .ok_or(Error::NotReady("partner did not resolve"))?;
            let key = state
                .key
                .clone()
                .ok_or(Error::NotReady("no conversation key"))?;

            let seq = self.shared.next_seq.fetch_add(1, Ordering::Relaxed);
            let message = Message::outgoing(seq, &user, &partner, trimmed, kind);
            state.messages.push(message.clone());
            (message, state.generation, key)
        };
        // Optimistic append is visible before any persistence or delay
        self.shared.emit();

        // Delivery-status pipeline: Sending -> Sent -> Delivered
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let message_id = message.id.clone();
        let pipeline_key = key.clone();
        tokio::spawn(async move {
            tokio::time::sleep(config.sent_delay).await;
            shared.apply_status_advance(
                generation,
                &pipeline_key,
                &message_id,
                MessageStatus::Sent,
            );
            tokio::time::sleep(config.delivered_delay).await;
            shared.apply_status_advance(
                generation,
                &pipeline_key,
                &message_id,
                MessageStatus::Delivered,
            );
        });

        // Simulated partner reply, decided per send
        if let Some(plan) = self.activity.plan_reply() {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                tokio::time::sleep(plan.delay).await;
                shared.apply_inbound(generation, &key, &plan.content);
            });
        }

        Ok(message)
    }

    /// Turn the typing indicator on for the configured duration
    ///
    /// Repeated calls before the reset restart the window; the last call
    /// wins and there is no queueing.
    ///
    /// Must be called within a tokio runtime.
    pub fn simulate_typing(&self) {
        let epoch = {
            let mut state = self.shared.state.write();
            state.is_typing = true;
            state.typing_epoch += 1;
            state.typing_epoch
        };
        self.shared.emit();

        let shared = Arc::clone(&self.shared);
        let duration = self.config.typing_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            {
                let mut state = shared.state.write();
                // A later call restarted the window
                if state.typing_epoch != epoch {
                    return;
                }
                state.is_typing = false;
            }
            shared.emit();
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================
