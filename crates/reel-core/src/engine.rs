//! Media-engine collaborator types
//!
//! Lightweight stand-ins for the platform playback engine: a playable item
//! with an observable readiness status, a queue-style player with an
//! independent error slot, and the looper that keeps the queue fed. The
//! session core only consumes their observable surface; the mutation
//! methods (`mark_ready`, `fail`, `set_error`, `advance_to_next_item`) are
//! driven by the hosting layer and by tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::error::MediaError;
use crate::types::{FitMode, ItemState, ItemStatus, PlaybackAsset};

/// A single playable item derived from an asset
///
/// Cheap to clone; clones share the same underlying state. Status is
/// monotonic (`unknown -> ready | failed`) and the failure error travels in
/// the same [`ItemState`] snapshot as the status change that carries it.
#[derive(Debug, Clone)]
pub struct PlayableItem {
    inner: Arc<ItemInner>,
}

#[derive(Debug)]
struct ItemInner {
    asset: PlaybackAsset,
    state_tx: watch::Sender<ItemState>,
}

impl PlayableItem {
    /// Create an item for the given asset, starting in `Unknown` status
    pub fn new(asset: PlaybackAsset) -> Self {
        let (state_tx, _) = watch::channel(ItemState::default());
        Self {
            inner: Arc::new(ItemInner { asset, state_tx }),
        }
    }

    /// The asset this item was derived from
    pub fn asset(&self) -> &PlaybackAsset {
        &self.inner.asset
    }

    /// Current readiness status
    pub fn status(&self) -> ItemStatus {
        self.inner.state_tx.borrow().status
    }

    /// Underlying engine error, set only alongside `Failed`
    pub fn error(&self) -> Option<MediaError> {
        self.inner.state_tx.borrow().error.clone()
    }

    /// Subscribe to state changes
    ///
    /// The returned receiver has already seen the current state; only
    /// subsequent transitions are delivered.
    pub fn subscribe(&self) -> watch::Receiver<ItemState> {
        self.inner.state_tx.subscribe()
    }

    /// Mark the item playable
    ///
    /// Returns false if the item already settled.
    pub fn mark_ready(&self) -> bool {
        self.transition(ItemStatus::Ready, None)
    }

    /// Mark the item failed with the engine error that caused it
    ///
    /// Returns false if the item already settled.
    pub fn fail(&self, error: MediaError) -> bool {
        self.transition(ItemStatus::Failed, Some(error))
    }

    fn transition(&self, status: ItemStatus, error: Option<MediaError>) -> bool {
        self.inner.state_tx.send_if_modified(|state| {
            if !state.status.can_transition_to(status) {
                warn!(from = %state.status, to = %status, "Ignoring invalid item transition");
                return false;
            }
            state.status = status;
            state.error = error;
            true
        })
    }
}

/// Queue-style player holding an ordered sequence of items
///
/// Cheap to clone; clones share the same underlying state. The error slot
/// is independent of any item and may be set and cleared repeatedly across
/// the player's life.
#[derive(Debug, Clone)]
pub struct QueuePlayer {
    inner: Arc<PlayerInner>,
}

#[derive(Debug)]
struct PlayerInner {
    queue: Mutex<VecDeque<PlayableItem>>,
    depth_tx: watch::Sender<usize>,
    error_tx: watch::Sender<Option<MediaError>>,
    fit_mode: RwLock<FitMode>,
}

impl QueuePlayer {
    /// Create a player queued with the given items, in order
    pub fn new(items: Vec<PlayableItem>) -> Self {
        let queue: VecDeque<PlayableItem> = items.into();
        let (depth_tx, _) = watch::channel(queue.len());
        let (error_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(PlayerInner {
                queue: Mutex::new(queue),
                depth_tx,
                error_tx,
                fit_mode: RwLock::new(FitMode::Contain),
            }),
        }
    }

    /// Snapshot of the queued items, head first
    pub fn items(&self) -> Vec<PlayableItem> {
        let queue = self.inner.queue.lock().expect("queue mutex poisoned");
        queue.iter().cloned().collect()
    }

    /// The item at the head of the queue, if any
    pub fn current_item(&self) -> Option<PlayableItem> {
        let queue = self.inner.queue.lock().expect("queue mutex poisoned");
        queue.front().cloned()
    }

    /// Number of queued items
    pub fn queue_depth(&self) -> usize {
        *self.inner.depth_tx.borrow()
    }

    /// Subscribe to queue-depth changes
    pub fn subscribe_queue(&self) -> watch::Receiver<usize> {
        self.inner.depth_tx.subscribe()
    }

    /// Consume the head of the queue, as playback advancing would
    pub fn advance_to_next_item(&self) {
        self.with_queue(|queue| {
            queue.pop_front();
        });
    }

    /// Append an item to the tail of the queue
    pub fn insert(&self, item: PlayableItem) {
        self.with_queue(|queue| {
            queue.push_back(item);
        });
    }

    /// Empty the queue
    pub fn remove_all_items(&self) {
        self.with_queue(|queue| {
            queue.clear();
        });
    }

    fn with_queue<R>(&self, f: impl FnOnce(&mut VecDeque<PlayableItem>) -> R) -> R {
        let mut queue = self.inner.queue.lock().expect("queue mutex poisoned");
        let result = f(&mut queue);
        let depth = queue.len();
        drop(queue);
        self.inner.depth_tx.send_replace(depth);
        result
    }

    /// Apply a presentation fit mode
    pub fn set_fit_mode(&self, fit_mode: FitMode) {
        *self.inner.fit_mode.write().expect("fit mode lock poisoned") = fit_mode;
    }

    /// Current presentation fit mode
    pub fn fit_mode(&self) -> FitMode {
        *self.inner.fit_mode.read().expect("fit mode lock poisoned")
    }

    /// Set or clear the player-level error slot
    ///
    /// Every call notifies subscribers, so a clear followed by a new error
    /// is observed as two independent changes.
    pub fn set_error(&self, error: Option<MediaError>) {
        self.inner.error_tx.send_replace(error);
    }

    /// Current player-level error, if any
    pub fn error(&self) -> Option<MediaError> {
        self.inner.error_tx.borrow().clone()
    }

    /// Subscribe to error-slot changes
    pub fn subscribe_error(&self) -> watch::Receiver<Option<MediaError>> {
        self.inner.error_tx.subscribe()
    }
}

/// Keeps a player's queue non-empty by re-enqueueing the same item
///
/// Holds only a weak reference to the player: when the player is dropped
/// the refill task exits on its own. Dropping or invalidating the looper
/// stops the refilling, which ends the loop after the current pass.
#[derive(Debug)]
pub struct PlayerLooper {
    task: JoinHandle<()>,
}

impl PlayerLooper {
    /// Start looping `item` on `player`
    pub fn new(player: &QueuePlayer, item: &PlayableItem) -> Self {
        let mut depth_rx = player.subscribe_queue();
        let player = Arc::downgrade(&player.inner);
        let item = item.clone();
        let task = tokio::spawn(async move {
            loop {
                if *depth_rx.borrow_and_update() == 0 {
                    let Some(inner) = player.upgrade() else { break };
                    trace!(url = %item.asset(), "Queue drained, re-enqueueing loop item");
                    QueuePlayer { inner }.insert(item.clone());
                }
                if depth_rx.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { task }
    }

    /// Stop refilling the queue
    pub fn invalidate(&self) {
        self.task.abort();
    }

    /// False once the refill task has exited or been invalidated
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PlayerLooper {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn asset(path: &str) -> PlaybackAsset {
        PlaybackAsset::new(Url::parse(&format!("https://cdn.example.com/{path}")).unwrap())
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_item_starts_unknown() {
        let item = PlayableItem::new(asset("a.mp4"));
        assert_eq!(item.status(), ItemStatus::Unknown);
        assert_eq!(item.error(), None);
    }

    #[test]
    fn test_item_fail_is_terminal() {
        let item = PlayableItem::new(asset("a.mp4"));
        let error = MediaError::new(-1, "no such asset");

        assert!(item.fail(error.clone()));
        assert_eq!(item.status(), ItemStatus::Failed);
        assert_eq!(item.error(), Some(error.clone()));

        // Settled items reject further transitions
        assert!(!item.mark_ready());
        assert!(!item.fail(MediaError::new(-2, "again")));
        assert_eq!(item.status(), ItemStatus::Failed);
        assert_eq!(item.error(), Some(error));
    }

    #[test]
    fn test_item_ready_rejects_failure() {
        let item = PlayableItem::new(asset("a.mp4"));
        assert!(item.mark_ready());
        assert!(!item.fail(MediaError::new(-1, "late failure")));
        assert_eq!(item.status(), ItemStatus::Ready);
        assert_eq!(item.error(), None);
    }

    #[test]
    fn test_queue_advance_and_depth() {
        let item = PlayableItem::new(asset("a.mp4"));
        let player = QueuePlayer::new(vec![item.clone()]);
        assert_eq!(player.queue_depth(), 1);
        assert_eq!(
            player.current_item().map(|i| i.asset().clone()),
            Some(item.asset().clone())
        );

        player.advance_to_next_item();
        assert_eq!(player.queue_depth(), 0);
        assert!(player.current_item().is_none());

        player.insert(item);
        assert_eq!(player.queue_depth(), 1);
    }

    #[test]
    fn test_remove_all_items_empties_queue() {
        let item = PlayableItem::new(asset("a.mp4"));
        let player = QueuePlayer::new(vec![item.clone(), item]);
        let mut depth_rx = player.subscribe_queue();
        assert_eq!(player.queue_depth(), 2);

        player.remove_all_items();
        assert_eq!(player.queue_depth(), 0);
        assert!(player.current_item().is_none());
        assert!(depth_rx.has_changed().unwrap());
        assert_eq!(*depth_rx.borrow_and_update(), 0);
    }

    #[test]
    fn test_player_fit_mode() {
        let player = QueuePlayer::new(vec![]);
        assert_eq!(player.fit_mode(), FitMode::Contain);
        player.set_fit_mode(FitMode::Cover);
        assert_eq!(player.fit_mode(), FitMode::Cover);
    }

    #[test]
    fn test_player_error_slot_is_clearable() {
        let player = QueuePlayer::new(vec![]);
        assert_eq!(player.error(), None);

        let error = MediaError::new(9, "engine stalled");
        player.set_error(Some(error.clone()));
        assert_eq!(player.error(), Some(error));

        player.set_error(None);
        assert_eq!(player.error(), None);
    }

    #[tokio::test]
    async fn test_looper_refills_drained_queue() {
        let item = PlayableItem::new(asset("loop.mp4"));
        let player = QueuePlayer::new(vec![item.clone()]);
        let looper = PlayerLooper::new(&player, &item);

        player.advance_to_next_item();
        settle().await;

        assert_eq!(player.queue_depth(), 1);
        assert_eq!(
            player.current_item().map(|i| i.asset().clone()),
            Some(item.asset().clone())
        );
        assert!(looper.is_active());
    }

    #[tokio::test]
    async fn test_looper_does_not_keep_player_alive() {
        let item = PlayableItem::new(asset("loop.mp4"));
        let player = QueuePlayer::new(vec![item.clone()]);
        let looper = PlayerLooper::new(&player, &item);

        drop(player);
        settle().await;

        assert!(!looper.is_active());
    }

    #[tokio::test]
    async fn test_looper_invalidate_stops_refill() {
        let item = PlayableItem::new(asset("loop.mp4"));
        let player = QueuePlayer::new(vec![item.clone()]);
        let looper = PlayerLooper::new(&player, &item);

        looper.invalidate();
        settle().await;

        player.advance_to_next_item();
        settle().await;

        assert_eq!(player.queue_depth(), 0);
        assert!(!looper.is_active());
    }
}
