//! Core types shared across the player

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::error::MediaError;

/// Unique identifier for a loop session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the media content to be looped
///
/// Immutable once created; the engine derives a [`PlayableItem`] from it at
/// setup time and never touches it again.
///
/// [`PlayableItem`]: crate::engine::PlayableItem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackAsset {
    url: Url,
}

impl PlaybackAsset {
    /// Create an asset from an already-parsed URL
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Location of the media content
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for PlaybackAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// How video content is scaled within its presentation bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Stretch to fill the bounds, ignoring aspect ratio
    Stretch,
    /// Fit entirely within the bounds, preserving aspect ratio
    Contain,
    /// Fill the bounds, preserving aspect ratio and cropping overflow
    Cover,
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitMode::Stretch => "stretch",
            FitMode::Contain => "contain",
            FitMode::Cover => "cover",
        };
        write!(f, "{name}")
    }
}

/// Readiness of a playable item
///
/// Status is monotonic: an item starts `Unknown` and settles into either
/// `Ready` or `Failed`, with no transitions out of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    /// Readiness not yet determined
    #[default]
    Unknown,
    /// Item can be played
    Ready,
    /// Item cannot be played; the item carries the underlying error
    Failed,
}

impl ItemStatus {
    /// Check if a transition to the given status is allowed
    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Unknown, ItemStatus::Ready) | (ItemStatus::Unknown, ItemStatus::Failed)
        )
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Unknown)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStatus::Unknown => "unknown",
            ItemStatus::Ready => "ready",
            ItemStatus::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Snapshot of an item's status together with its error, if any
///
/// Carried as a single value through the item's watch channel so observers
/// always see the error that accompanied a `Failed` status.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemState {
    /// Current readiness
    pub status: ItemStatus,
    /// Underlying engine error; only ever set alongside `Failed`
    pub error: Option<MediaError>,
}
