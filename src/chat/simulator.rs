//! # Partner Activity Simulator
//!
//! A stand-in for a real message transport. With no network in the demo,
//! the partner's side of a conversation is simulated: their online presence
//! is synthesized at resolution time, and a send has some chance of
//! provoking a canned reply after a randomized delay.
//!
//! The simulator sits behind [`PartnerActivity`] so that a real transport
//! can later substitute genuine inbound delivery without touching the
//! engine's state machine.

use std::time::Duration;

use rand::Rng;

use crate::identity::Presence;

/// Chance that the simulated partner appears online
pub const ONLINE_PROBABILITY: f64 = 0.5;

/// Window for the simulated partner's last-seen time (the past hour)
pub const LAST_SEEN_WINDOW_MS: i64 = 60 * 60 * 1000;

/// Chance that a send provokes a simulated reply
pub const REPLY_PROBABILITY: f64 = 0.3;

/// Base delay before a simulated reply fires
pub const REPLY_DELAY_BASE: Duration = Duration::from_millis(2000);

/// Random extra delay added on top of the base
pub const REPLY_DELAY_JITTER_MS: u64 = 3000;

/// Canned replies the simulated partner picks from
const CANNED_REPLIES: &[&str] = &[
    "Hey there! 👋",
    "Thanks for reaching out!",
    "How's it going?",
    "Nice to meet you on Ambience!",
    "What's up?",
    "Great to connect!",
];

/// A planned simulated reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPlan {
    /// How long after the send the reply should fire
    pub delay: Duration,
    /// Reply text
    pub content: String,
}

/// Simulated partner behavior boundary
///
/// Presence is cosmetic only: the engine synthesizes it on each identity
/// resolution and nothing in message ordering depends on it.
pub trait PartnerActivity: Send + Sync {
    /// Synthesize a presence value for the partner
    fn presence(&self) -> Presence;

    /// Decide whether (and when, and with what) the partner replies to a
    /// send; `None` means no reply this time
    fn plan_reply(&self) -> Option<ReplyPlan>;
}

/// Randomized partner simulation used by the demo
#[derive(Debug, Clone, Default)]
pub struct RandomPartner;

impl RandomPartner {
    /// Create the default randomized simulator
    pub fn new() -> Self {
        Self
    }
}

impl PartnerActivity for RandomPartner {
    fn presence(&self) -> Presence {
        let mut rng = rand::thread_rng();
        Presence {
            is_online: rng.gen_bool(ONLINE_PROBABILITY),
            last_seen_at: crate::time::now_timestamp_millis()
                - rng.gen_range(0..LAST_SEEN_WINDOW_MS),
        }
    }

    fn plan_reply(&self) -> Option<ReplyPlan> {
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(REPLY_PROBABILITY) {
            return None;
        }

        let jitter = Duration::from_millis(rng.gen_range(0..REPLY_DELAY_JITTER_MS));
        let content = CANNED_REPLIES[rng.gen_range(0..CANNED_REPLIES.len())].to_string();
        Some(ReplyPlan {
            delay: REPLY_DELAY_BASE + jitter,
            content,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_is_within_the_window() {
        let simulator = RandomPartner::new();
        let now = crate::time::now_timestamp_millis();

        for _ in 0..32 {
            let presence = simulator.presence();
            assert!(presence.last_seen_at <= now + 1000);
            assert!(presence.last_seen_at >= now - LAST_SEEN_WINDOW_MS - 1000);
        }
    }

    #[test]
    fn test_reply_plans_stay_in_the_delay_window() {
        let simulator = RandomPartner::new();
        let max = REPLY_DELAY_BASE + Duration::from_millis(REPLY_DELAY_JITTER_MS);

        // plan_reply is probabilistic; sample until we see a few plans
        let mut seen = 0;
        for _ in 0..256 {
            if let Some(plan) = simulator.plan_reply() {
                assert!(plan.delay >= REPLY_DELAY_BASE);
                assert!(plan.delay <= max);
                assert!(!plan.content.is_empty());
                seen += 1;
            }
        }
        assert!(seen > 0, "expected at least one planned reply in 256 rolls");
    }
}
