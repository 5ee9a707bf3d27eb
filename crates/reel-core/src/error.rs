//! Error types for Reel Core

use thiserror::Error;

/// Opaque error surfaced by the underlying media engine
///
/// The core never inspects the payload; it is carried through to the
/// delegate for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct MediaError {
    /// Engine-specific error code
    pub code: i32,
    /// Human-readable description
    pub message: String,
}

impl MediaError {
    /// Create an engine error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Normalized playback failure reported to the delegate
///
/// All engine failures fold into `RemoteVideo`; the enum leaves room for
/// future kinds without changing the delegate contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("remote video error: {0}")]
    RemoteVideo(#[source] MediaError),
}

impl PlayerError {
    /// The underlying engine error
    pub fn underlying(&self) -> &MediaError {
        match self {
            PlayerError::RemoteVideo(error) => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_display() {
        let error = MediaError::new(-1102, "cannot open file");
        assert_eq!(error.to_string(), "cannot open file (code -1102)");
    }

    #[test]
    fn test_player_error_wraps_underlying() {
        let cause = MediaError::new(7, "decode stall");
        let error = PlayerError::RemoteVideo(cause.clone());
        assert_eq!(error.underlying(), &cause);
        assert!(error.to_string().starts_with("remote video error:"));
    }
}
