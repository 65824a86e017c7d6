//! # Chat Session Engine Demo
//!
//! This example walks through the full demo flow:
//! 1. Two users register handles in the name registry
//! 2. Bob connects his wallet and opens a conversation with Alice
//! 3. Bob sends a message and we watch its delivery status advance
//! 4. The simulated partner may type and reply
//!
//! ## Run
//!
//! ```bash
//! cargo run --example chat_demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use ambience_core::{
    ChatConfig, ChatEngine, ContentResolver, InMemoryRegistry, LocalContentStore, LocalWallet,
    MemoryStore, MessageKind, RandomPartner, Registry,
};

#[tokio::main]
async fn main() {
    println!("=================================================");
    println!("        AMBIENCE CHAT SESSION ENGINE DEMO");
    println!("=================================================\n");

    // =========================================================================
    // STEP 1: Register two handles
    // =========================================================================
    println!("1. Registering handles...\n");

    let content = LocalContentStore::new();
    let alice_avatar = content.store("data:image/png;base64,iVBORw0KGgo=");

    let registry = Arc::new(InMemoryRegistry::new());
    registry
        .register("0xA11CE", "alice", "Alice", &alice_avatar)
        .expect("Failed to register alice");
    registry
        .register("0xB0B", "bob", "Bob", "")
        .expect("Failed to register bob");

    for record in registry.list_all() {
        let avatar = content
            .resolve_ref(&record.avatar_ref)
            .unwrap_or_else(|| "(no avatar)".into());
        println!("   @{:<8} {} — avatar: {}", record.handle, record.owner_id, avatar);
    }
    println!();

    // =========================================================================
    // STEP 2: Connect a wallet and open a conversation
    // =========================================================================
    println!("2. Bob connects and opens a chat with alice...\n");

    let wallet = Arc::new(LocalWallet::connected("0xB0B"));
    let engine = ChatEngine::new(
        registry,
        wallet,
        Arc::new(MemoryStore::new()),
        Arc::new(RandomPartner::new()),
        ChatConfig::default(),
    );

    engine.open_conversation("alice");
    let snapshot = engine.snapshot();
    let partner = snapshot.partner.expect("alice should resolve");
    println!(
        "   Partner: {} (@{}), online: {}",
        partner.display_name, partner.handle, partner.is_online
    );
    println!();

    // =========================================================================
    // STEP 3: Send a message and watch the status advance
    // =========================================================================
    println!("3. Sending a message...\n");

    let mut updates = engine.subscribe();
    engine
        .send("Hey alice, welcome to Ambience!", MessageKind::Text)
        .expect("send should be accepted");

    // Follow the snapshot feed for a few seconds
    loop {
        let timeout = tokio::time::timeout(Duration::from_secs(6), updates.changed());
        if timeout.await.is_err() {
            break;
        }
        let snapshot = updates.borrow_and_update().clone();
        for message in &snapshot.messages {
            println!(
                "   [{}] @{}: {}",
                message.status.as_str(),
                message.sender_handle,
                message.content
            );
        }
        if snapshot.is_typing {
            println!("   (alice is typing...)");
        }
        println!("   ---");
    }

    println!("\nDone.");
}
