//! Looping playback example
//!
//! Demonstrates assembling a looping player, simulating engine failures,
//! and receiving normalized error notifications through a delegate.
//!
//! Run with: cargo run -p reel-core --example looping

use std::sync::Arc;

use reel_core::{FitMode, LoopSession, MediaError, PlaybackAsset, PlaybackDelegate, PlayerError};
use url::Url;

struct PrintingDelegate;

impl PlaybackDelegate for PrintingDelegate {
    fn did_receive_error(&self, error: PlayerError) {
        println!("  delegate received: {error}");
        println!("  underlying: {}", error.underlying());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reel_core=debug".into()),
        )
        .init();

    println!("Reel Core - Looping Playback Example");
    println!("====================================\n");

    let delegate = Arc::new(PrintingDelegate);
    let mut session = LoopSession::new();
    session.set_delegate(&delegate);

    let url = Url::parse("https://cdn.example.com/background-loop.mp4").unwrap();
    session.setup_player(PlaybackAsset::new(url), FitMode::Cover);
    println!("Session {} assembled\n", session.id());

    let player = session.player().expect("player set up").clone();
    let item = session.current_item().expect("item queued");

    // Simulate the engine settling the item and consuming the queue head a
    // few times; the looper keeps the queue fed.
    println!("Simulating three loop passes...");
    item.mark_ready();
    for pass in 1..=3 {
        player.advance_to_next_item();
        tokio::task::yield_now().await;
        println!("  pass {pass}: queue depth {}", player.queue_depth());
    }

    // Simulate a player-level failure and a later recovery attempt that
    // fails again; each occurrence is reported independently.
    println!("\nSimulating player failures...");
    player.set_error(Some(MediaError::new(9, "engine stalled")));
    tokio::task::yield_now().await;
    player.set_error(None);
    tokio::task::yield_now().await;
    player.set_error(Some(MediaError::new(10, "engine gave up")));
    tokio::task::yield_now().await;

    println!("\nTearing down...");
    session.teardown();
    println!("Done.");
}
