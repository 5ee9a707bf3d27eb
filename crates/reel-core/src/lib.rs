//! Reel Core - Looping Video Library
//!
//! This crate provides the core coordination logic for looping playback of
//! a single video asset:
//! - Player assembly (item + queue player + fit mode + looper)
//! - Observer wiring on the two failure signals
//! - Error classification and delegate notification
//!
//! # Architecture
//!
//! ```text
//! setup_player(asset, fit)
//!        │
//!        ▼
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │ PlayableItem │◄─────│ QueuePlayer  │◄─────│ PlayerLooper │
//! │ (status)     │      │ (error slot) │      │ (re-enqueue) │
//! └──────┬───────┘      └──────┬───────┘      └──────────────┘
//!        │ watch               │ watch
//!        ▼                     ▼
//! ┌─────────────────────────────────────┐
//! │         LoopSession classifier      │
//! └──────────────────┬──────────────────┘
//!                    │ did_receive_error(PlayerError)
//!                    ▼
//!            PlaybackDelegate
//! ```
//!
//! Asset loading, decoding, rendering, and the UI lifecycle that starts and
//! stops playback are external collaborators and out of scope here.

pub mod engine;
pub mod error;
pub mod session;
pub mod types;

pub use engine::{PlayableItem, PlayerLooper, QueuePlayer};
pub use error::{MediaError, PlayerError};
pub use session::{LoopSession, PlaybackDelegate, WatchHandle};
pub use types::{FitMode, ItemState, ItemStatus, PlaybackAsset, SessionId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
