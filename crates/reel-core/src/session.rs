//! Loop session - orchestrator for looping playback
//!
//! Wires one playable item and a queue player together, watches the two
//! failure signals (item readiness, player error slot), and folds raw
//! engine errors into a single normalized delegate notification.

use std::sync::{Arc, RwLock, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{PlayableItem, PlayerLooper, QueuePlayer};
use crate::error::{MediaError, PlayerError};
use crate::types::{FitMode, ItemState, ItemStatus, PlaybackAsset, SessionId};

/// External capability notified of playback failures
///
/// Held weakly by the session; its absence is not an error, and it may be
/// swapped by the host at any time.
pub trait PlaybackDelegate: Send + Sync {
    /// A failure was classified and normalized
    fn did_receive_error(&self, error: PlayerError);
}

/// Live subscription to one of the engine's change signals
///
/// Invalidating (or dropping) the handle stops notification delivery; the
/// session invalidates handles before releasing the player they watch.
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Stop receiving notifications
    pub fn invalidate(&self) {
        self.task.abort();
    }

    /// False once the watcher has exited or been invalidated
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Session state reachable from watcher tasks
///
/// Watchers capture only a `Weak` to this, so a live subscription never
/// keeps the session alive.
#[derive(Default)]
struct SessionShared {
    delegate: RwLock<Option<Weak<dyn PlaybackDelegate>>>,
}

impl SessionShared {
    /// Item-signal classifier: only a failed status with an error is a
    /// failure event
    fn on_item_status_changed(&self, state: &ItemState) {
        if state.status != ItemStatus::Failed {
            debug!(status = %state.status, "Item status changed, nothing to report");
            return;
        }
        let Some(error) = state.error.clone() else {
            debug!("Item failed without an error payload, nothing to report");
            return;
        };
        warn!(error = %error, "Playable item failed");
        self.notify(PlayerError::RemoteVideo(error));
    }

    /// Player-signal classifier: every non-empty observation of the error
    /// slot is an independent failure event
    fn on_player_error_changed(&self, error: &Option<MediaError>) {
        let Some(error) = error else {
            debug!("Player error cleared, nothing to report");
            return;
        };
        warn!(error = %error, "Player reported an error");
        self.notify(PlayerError::RemoteVideo(error.clone()));
    }

    fn notify(&self, error: PlayerError) {
        let delegate = self
            .delegate
            .read()
            .expect("delegate lock poisoned")
            .clone();
        match delegate.and_then(|weak| weak.upgrade()) {
            Some(delegate) => delegate.did_receive_error(error),
            None => debug!("No delegate registered, dropping playback error"),
        }
    }
}

/// Coordinates looping playback of a single video asset
///
/// The session assembles the player (`setup_player`), attaches the two
/// watchers, and reports failures through the registered delegate. It does
/// not start or stop playback; that belongs to the hosting layer.
///
/// Setup must run inside a Tokio runtime: watchers are spawned tasks, and
/// the delegate is invoked from them. Pair the session with a
/// current-thread runtime to keep all callbacks on one context.
///
/// # Example
///
/// ```no_run
/// use reel_core::{FitMode, LoopSession, PlaybackAsset};
/// use url::Url;
///
/// # async fn run() {
/// let mut session = LoopSession::new();
/// let url = Url::parse("https://cdn.example.com/loop.mp4").unwrap();
/// session.setup_player(PlaybackAsset::new(url), FitMode::Cover);
/// # }
/// ```
pub struct LoopSession {
    /// Unique session ID
    id: SessionId,
    /// State shared with watcher tasks
    shared: Arc<SessionShared>,
    // Field order doubles as drop order: watch handles are invalidated
    // before the looper and player they reference go away.
    /// Subscription to the item's status signal
    item_watch: Option<WatchHandle>,
    /// Subscription to the player's error signal
    error_watch: Option<WatchHandle>,
    /// Queue refiller for the current player
    looper: Option<PlayerLooper>,
    /// Current player
    player: Option<QueuePlayer>,
}

impl LoopSession {
    /// Create a session with no player and no delegate
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            shared: Arc::new(SessionShared::default()),
            item_watch: None,
            error_watch: None,
            looper: None,
            player: None,
        }
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Register the delegate notified of failures
    ///
    /// The session holds the delegate weakly; the host keeps it alive.
    pub fn set_delegate(&self, delegate: &Arc<impl PlaybackDelegate + 'static>) {
        let weak = Arc::downgrade(delegate);
        let weak: Weak<dyn PlaybackDelegate> = weak;
        *self.shared.delegate.write().expect("delegate lock poisoned") = Some(weak);
    }

    /// Unregister the delegate; subsequent failures are dropped
    pub fn clear_delegate(&self) {
        *self.shared.delegate.write().expect("delegate lock poisoned") = None;
    }

    /// Assemble a looping player for the asset
    ///
    /// Builds one item from the asset, queues it on a fresh player with the
    /// given fit mode, starts the looper, and attaches both watchers. Any
    /// previous player is torn down first, so re-invocation replaces stale
    /// subscriptions rather than accumulating them. Cannot fail
    /// synchronously; asset problems surface through the watchers.
    pub fn setup_player(&mut self, asset: PlaybackAsset, fit_mode: FitMode) {
        info!(session_id = %self.id, url = %asset, fit = %fit_mode, "Setting up looping player");

        self.teardown();

        let item = PlayableItem::new(asset);
        let player = QueuePlayer::new(vec![item.clone()]);
        player.set_fit_mode(fit_mode);
        let looper = PlayerLooper::new(&player, &item);

        self.attach_observers(&item, &player);
        self.looper = Some(looper);
        self.player = Some(player);
    }

    /// Watch the item's status signal and the player's error signal
    ///
    /// Each watcher forwards to the classifier through a weak reference to
    /// the session's shared state; prior handles are invalidated first.
    fn attach_observers(&mut self, item: &PlayableItem, player: &QueuePlayer) {
        self.invalidate_observers();

        let mut state_rx = item.subscribe();
        let shared = Arc::downgrade(&self.shared);
        self.item_watch = Some(WatchHandle::new(tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let state = state_rx.borrow_and_update().clone();
                let Some(shared) = shared.upgrade() else { break };
                shared.on_item_status_changed(&state);
            }
        })));

        let mut error_rx = player.subscribe_error();
        let shared = Arc::downgrade(&self.shared);
        self.error_watch = Some(WatchHandle::new(tokio::spawn(async move {
            while error_rx.changed().await.is_ok() {
                let error = error_rx.borrow_and_update().clone();
                let Some(shared) = shared.upgrade() else { break };
                shared.on_player_error_changed(&error);
            }
        })));
    }

    fn invalidate_observers(&mut self) {
        if let Some(watch) = self.item_watch.take() {
            watch.invalidate();
        }
        if let Some(watch) = self.error_watch.take() {
            watch.invalidate();
        }
    }

    /// Release the current player, invalidating watchers first
    ///
    /// Order matters: subscriptions go before the looper, the looper before
    /// the player, so no in-flight notification can reach a partially
    /// released object graph.
    pub fn teardown(&mut self) {
        if self.player.is_some() {
            info!(session_id = %self.id, "Tearing down looping player");
        }
        self.invalidate_observers();
        self.looper = None;
        self.player = None;
    }

    /// The current player, if one has been set up
    pub fn player(&self) -> Option<&QueuePlayer> {
        self.player.as_ref()
    }

    /// The active loop item, if a player has been set up
    pub fn current_item(&self) -> Option<PlayableItem> {
        self.player.as_ref().and_then(|player| player.current_item())
    }
}

impl Default for LoopSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_session_starts_empty() {
        let session = LoopSession::new();
        assert!(session.player().is_none());
        assert!(session.current_item().is_none());
    }

    #[tokio::test]
    async fn test_setup_applies_fit_mode() {
        let mut session = LoopSession::new();
        let url = Url::parse("https://cdn.example.com/loop.mp4").unwrap();
        session.setup_player(PlaybackAsset::new(url), FitMode::Stretch);

        let player = session.player().expect("player set up");
        assert_eq!(player.fit_mode(), FitMode::Stretch);
    }

    #[tokio::test]
    async fn test_teardown_releases_player() {
        let mut session = LoopSession::new();
        let url = Url::parse("https://cdn.example.com/loop.mp4").unwrap();
        session.setup_player(PlaybackAsset::new(url), FitMode::Contain);
        assert!(session.player().is_some());

        session.teardown();
        assert!(session.player().is_none());
        assert!(session.current_item().is_none());
    }
}
